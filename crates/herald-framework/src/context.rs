//! Per-message invocation context.
//!
//! One [`InvocationContext`] is created for every incoming message and
//! shared behind an `Arc` by the guard, the converters and the handler. It
//! holds read-only references to the client, the message and the registry.
//! Resolution (prefix, alias, command, command content) happens exactly once
//! in [`InvocationContext::new`]; the derived fields cannot be changed
//! afterwards.

use std::sync::Arc;

use herald_core::{BoxedClient, BoxedMessage, Identity, ReplyOptions, SendResult};

use crate::command::{CommandSpec, Registry, Resolution, Resolver};

/// Everything known about one incoming message.
pub struct InvocationContext {
    client: BoxedClient,
    message: BoxedMessage,
    registry: Arc<Registry>,
    resolution: Resolution,
}

impl InvocationContext {
    /// Creates the context and resolves the message against the client's
    /// prefixes and the registry.
    pub fn new(client: BoxedClient, message: BoxedMessage, registry: Arc<Registry>) -> Self {
        let resolution = Resolver::new(client.prefixes(), &registry).resolve(message.text());
        Self {
            client,
            message,
            registry,
            resolution,
        }
    }

    /// The client the message arrived on.
    pub fn client(&self) -> &BoxedClient {
        &self.client
    }

    /// The identity of the client's account.
    pub fn identity(&self) -> &Identity {
        self.client.identity()
    }

    /// The message being handled.
    pub fn message(&self) -> &BoxedMessage {
        &self.message
    }

    /// The registry the message was resolved against.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// The author of the message.
    pub fn author_id(&self) -> &str {
        self.message.author_id()
    }

    /// The full message text.
    pub fn text(&self) -> &str {
        self.message.text()
    }

    /// How the message resolved.
    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    /// The matched prefix.
    pub fn prefix(&self) -> Option<&str> {
        self.resolution.prefix()
    }

    /// The matched alias.
    pub fn alias(&self) -> Option<&str> {
        self.resolution.command().map(|resolved| resolved.alias())
    }

    /// The resolved command.
    pub fn command(&self) -> Option<&Arc<CommandSpec>> {
        self.resolution.command().map(|resolved| resolved.command())
    }

    /// The text after the prefix and alias, untrimmed.
    pub fn command_content(&self) -> Option<&str> {
        self.resolution
            .command()
            .map(|resolved| resolved.content(self.message.text()))
    }

    /// Replies to the message with default options.
    pub async fn reply(&self, text: &str) -> SendResult<String> {
        self.message.reply(text, ReplyOptions::default()).await
    }

    /// Replies to the message.
    pub async fn reply_with(&self, text: &str, options: ReplyOptions) -> SendResult<String> {
        self.message.reply(text, options).await
    }
}

impl std::fmt::Debug for InvocationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvocationContext")
            .field("identity", self.client.identity())
            .field("author_id", &self.message.author_id())
            .field("text", &self.message.text())
            .field("resolution", &self.resolution)
            .finish_non_exhaustive()
    }
}
