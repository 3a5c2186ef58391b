//! Error types for the Herald framework.

use std::time::Duration;

use thiserror::Error;

pub use herald_core::BoxError;

/// Everything that can go wrong between registering a command and running it.
///
/// The first two variants are registration-time errors: they are returned
/// synchronously from [`command`](crate::command()) / [`Registry::add`](crate::Registry::add)
/// and indicate a programming mistake. All other variants are produced while
/// handling a message and only ever reach the outside world through a
/// `command_error` event.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A command or converter was declared incorrectly.
    #[error("invalid command declaration: {0}")]
    Configuration(String),

    /// An alias is already owned by another registered command.
    #[error("alias '{alias}' is already registered by command '{owner}'")]
    DuplicateAlias {
        /// The conflicting alias.
        alias: String,
        /// Name of the command that already owns it.
        owner: String,
    },

    /// The message did not contain enough tokens for a positional parameter.
    #[error("missing argument '{parameter}'")]
    MissingArgument {
        /// Name of the parameter that received no token.
        parameter: String,
    },

    /// A converter produces values of a different type than its parameter.
    #[error("converter for '{parameter}' produces {produced}, expected {expected}")]
    InvalidConverter {
        /// Name of the parameter.
        parameter: String,
        /// Type the parameter expects.
        expected: &'static str,
        /// Type the converter produced.
        produced: &'static str,
    },

    /// A converter rejected its raw input.
    #[error("cannot convert '{raw}' for '{parameter}': {source}")]
    Conversion {
        /// Name of the parameter.
        parameter: String,
        /// The raw token handed to the converter.
        raw: String,
        /// The converter's own error.
        #[source]
        source: BoxError,
    },

    /// Any other failure while gating or invoking a command.
    #[error("command failed: {0}")]
    Runtime(#[source] BoxError),

    /// Binding and invocation did not finish within the configured limit.
    #[error("command timed out after {0:?}")]
    Timeout(Duration),
}

impl CommandError {
    /// Creates a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Wraps an arbitrary error raised by a guard or handler.
    pub fn runtime(err: impl Into<BoxError>) -> Self {
        Self::Runtime(err.into())
    }

    /// Returns `true` for errors raised while registering commands.
    pub fn is_registration_error(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::DuplicateAlias { .. })
    }
}

/// Result type for command operations.
pub type CommandResult<T> = Result<T, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_errors() {
        assert!(CommandError::configuration("bad").is_registration_error());
        assert!(
            CommandError::DuplicateAlias {
                alias: "p".into(),
                owner: "ping".into(),
            }
            .is_registration_error()
        );
        assert!(!CommandError::runtime("boom").is_registration_error());
        assert!(!CommandError::Timeout(Duration::from_secs(1)).is_registration_error());
    }

    #[test]
    fn test_conversion_error_message() {
        let source = "abc".parse::<i64>().unwrap_err();
        let err = CommandError::Conversion {
            parameter: "amount".into(),
            raw: "abc".into(),
            source: Box::new(source),
        };
        assert_eq!(
            err.to_string(),
            "cannot convert 'abc' for 'amount': invalid digit found in string"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
