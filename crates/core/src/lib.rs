pub mod config;
pub mod error;
pub mod logging;

pub use config::{AccountConfig, Config, ConfigError, CorrelationConfig, LoggingConfig};
pub use error::{Result, TernError};
