//! Runtime configuration: schema, layered loading and validation.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, ENV_PREFIX, load_config};
pub use schema::{
    ClientConfig, HeraldConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig,
};
pub use validation::validate_config;
