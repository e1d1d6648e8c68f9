//! Tracing initialization
//!
//! Installs the global subscriber: an `EnvFilter` (overridable through `RUST_LOG`) plus a
//! console formatter in either compact or JSON form.

mod init_basic;

pub use init_basic::init_telemetry;
