//! Shared utilities: error types and configuration

pub mod config;
pub mod error;

pub use config::RuntimeConfig;
pub use error::{NagareError, Result};
