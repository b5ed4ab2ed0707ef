//! Core module - settings, configuration, errors, pacing, scope

pub mod config;
pub mod error;
pub mod rate_limit;
pub mod scope;
pub mod settings;

pub use config::ScanConfig;
pub use error::{ConfigError, DictionaryError, TransportError};
pub use rate_limit::RateLimiter;
pub use scope::Scope;
