//! Business services used by the HTTP handlers

pub mod upload;
