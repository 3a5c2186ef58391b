//! The message contract.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SendResult;

/// Options attached to a reply.
///
/// Transports honour the fields they understand and ignore the rest.
/// Anything protocol-specific goes into [`extra`](Self::extra).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplyOptions {
    /// Ping the author of the message being replied to.
    #[serde(default)]
    pub mention_author: bool,
    /// Suppress notifications for the reply.
    #[serde(default)]
    pub silent: bool,
    /// Protocol-specific options.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl ReplyOptions {
    /// Enables or disables mentioning the author.
    pub fn mention_author(mut self, enabled: bool) -> Self {
        self.mention_author = enabled;
        self
    }

    /// Enables or disables silent delivery.
    pub fn silent(mut self, enabled: bool) -> Self {
        self.silent = enabled;
        self
    }

    /// Sets a protocol-specific option.
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// One incoming chat message.
#[async_trait]
pub trait Message: Send + Sync + 'static {
    /// The raw text of the message.
    fn text(&self) -> &str;

    /// The id of the message author.
    fn author_id(&self) -> &str;

    /// Sends `text` as a reply to this message.
    ///
    /// Returns the id of the sent message.
    async fn reply(&self, text: &str, options: ReplyOptions) -> SendResult<String>;
}

/// A shared message trait object.
pub type BoxedMessage = Arc<dyn Message>;
