//! The client contract.
//!
//! A [`Client`] represents the account a bot is logged in as. The command
//! framework reads three things from it: who the account is, which prefixes
//! mark a message as a command, and where to publish client events.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Name of the event published once per failed command invocation.
pub const COMMAND_ERROR: &str = "command_error";

/// Payload carried by a client event.
pub type EventPayload = Arc<dyn std::error::Error + Send + Sync>;

/// How the client decides whose messages it acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    /// Multi-user mode: commands from every author are processed.
    #[default]
    Normal,
    /// Self-only mode: only messages authored by the client's own identity
    /// are processed.
    ///
    /// This is the mode of a user account driven by automation, as opposed
    /// to a dedicated bot account.
    SelfOnly,
}

/// The identity of the logged-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// The account id, as reported by the transport.
    pub id: String,
    /// Whose messages this client acts on.
    #[serde(default)]
    pub mode: OperatingMode,
}

impl Identity {
    /// Creates an identity for a dedicated bot account.
    pub fn bot(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            mode: OperatingMode::Normal,
        }
    }

    /// Creates an identity for a user account that only obeys itself.
    pub fn self_only(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            mode: OperatingMode::SelfOnly,
        }
    }

    /// Returns `true` if the client runs in self-only mode.
    pub fn is_self_only(&self) -> bool {
        self.mode == OperatingMode::SelfOnly
    }

    /// Returns `true` if a message from `author_id` may trigger commands.
    pub fn permits(&self, author_id: &str) -> bool {
        match self.mode {
            OperatingMode::Normal => true,
            OperatingMode::SelfOnly => author_id == self.id,
        }
    }
}

/// The client collaborator consumed by the command framework.
///
/// # Example
///
/// ```rust,ignore
/// struct MyClient {
///     identity: Identity,
///     prefixes: Vec<String>,
/// }
///
/// #[async_trait]
/// impl Client for MyClient {
///     fn identity(&self) -> &Identity {
///         &self.identity
///     }
///
///     fn prefixes(&self) -> &[String] {
///         &self.prefixes
///     }
///
///     async fn emit(&self, event: &str, payload: EventPayload) {
///         tracing::error!(event, "{payload}");
///     }
/// }
/// ```
#[async_trait]
pub trait Client: Send + Sync + 'static {
    /// Returns the identity of the logged-in account.
    fn identity(&self) -> &Identity;

    /// Returns the configured command prefixes, in priority order.
    fn prefixes(&self) -> &[String];

    /// Publishes a client event to whatever listeners the client keeps.
    async fn emit(&self, event: &str, payload: EventPayload);
}

/// A shared client trait object.
pub type BoxedClient = Arc<dyn Client>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_mode_permits_everyone() {
        let identity = Identity::bot("1");
        assert!(identity.permits("1"));
        assert!(identity.permits("2"));
        assert!(!identity.is_self_only());
    }

    #[test]
    fn test_self_only_mode_permits_only_self() {
        let identity = Identity::self_only("1");
        assert!(identity.permits("1"));
        assert!(!identity.permits("2"));
        assert!(identity.is_self_only());
    }

    #[test]
    fn test_mode_deserializes_snake_case() {
        let identity: Identity =
            serde_json::from_str(r#"{"id": "42", "mode": "self_only"}"#).unwrap();
        assert_eq!(identity, Identity::self_only("42"));

        let identity: Identity = serde_json::from_str(r#"{"id": "42"}"#).unwrap();
        assert_eq!(identity.mode, OperatingMode::Normal);
    }
}
