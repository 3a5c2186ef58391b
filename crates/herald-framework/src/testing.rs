//! In-memory client and message used by unit tests.

use std::sync::Arc;

use async_trait::async_trait;
use herald_core::{Client, EventPayload, Identity, Message, ReplyOptions, SendResult};
use parking_lot::Mutex;

pub(crate) struct MockClient {
    identity: Identity,
    prefixes: Vec<String>,
    events: Mutex<Vec<(String, String)>>,
}

impl MockClient {
    pub(crate) fn new<const N: usize>(identity: Identity, prefixes: [&str; N]) -> Arc<Self> {
        Arc::new(Self {
            identity,
            prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
            events: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn bot<const N: usize>(id: &str, prefixes: [&str; N]) -> Arc<Self> {
        Self::new(Identity::bot(id), prefixes)
    }

    pub(crate) fn events(&self) -> Vec<(String, String)> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl Client for MockClient {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    async fn emit(&self, event: &str, payload: EventPayload) {
        self.events.lock().push((event.to_owned(), payload.to_string()));
    }
}

pub(crate) struct MockMessage {
    author_id: String,
    text: String,
    replies: Mutex<Vec<String>>,
    options: Mutex<Vec<ReplyOptions>>,
}

impl MockMessage {
    pub(crate) fn new(author_id: &str, text: &str) -> Arc<Self> {
        Arc::new(Self {
            author_id: author_id.to_owned(),
            text: text.to_owned(),
            replies: Mutex::new(Vec::new()),
            options: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn replies(&self) -> Vec<String> {
        self.replies.lock().clone()
    }

    pub(crate) fn options(&self) -> Vec<ReplyOptions> {
        self.options.lock().clone()
    }
}

#[async_trait]
impl Message for MockMessage {
    fn text(&self) -> &str {
        &self.text
    }

    fn author_id(&self) -> &str {
        &self.author_id
    }

    async fn reply(&self, text: &str, options: ReplyOptions) -> SendResult<String> {
        self.options.lock().push(options);
        let mut replies = self.replies.lock();
        replies.push(text.to_owned());
        Ok(format!("reply-{}", replies.len()))
    }
}
