//! Runtime error types.

use std::io;

use herald_framework::CommandError;
use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::TryInitError;

use crate::config::ConfigError;

/// Errors raised while setting up or running the command runtime.
///
/// Per-message failures never show up here; the pipeline reports those as
/// `command_error` events.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A command could not be registered at startup.
    #[error("failed to register command: {0}")]
    Registration(#[from] CommandError),

    #[error("invalid log filter directive '{directive}': {source}")]
    InvalidDirective {
        directive: String,
        #[source]
        source: ParseError,
    },

    /// The log writer could not be set up.
    #[error("log output unavailable: {0}")]
    LogOutput(String),

    /// A global subscriber is already installed.
    #[error("failed to install the log subscriber: {0}")]
    Logging(#[from] TryInitError),

    /// The shutdown signal handler could not be installed.
    #[error("failed to listen for shutdown signals: {0}")]
    Signal(#[source] io::Error),
}

impl RuntimeError {
    pub fn log_output(message: impl Into<String>) -> Self {
        Self::LogOutput(message.into())
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
