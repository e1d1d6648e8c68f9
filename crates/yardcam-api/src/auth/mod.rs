//! Function-key authentication

pub mod middleware;

pub use middleware::function_key_middleware;
