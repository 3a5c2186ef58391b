//! The invocation pipeline.
//!
//! Every incoming message runs through the same state machine:
//!
//! ```text
//! RESOLVING ──(no command)──────────────▶ SKIPPED
//!     │
//! AUTH_GATE ──(foreign author, self-only)─▶ SKIPPED
//!     │
//! CHECK_GATE ──(guard false)─────────────▶ SKIPPED
//!     │
//! BINDING ─▶ INVOKING ─▶ COMPLETED
//!     │          │
//!     └──────────┴──(error / timeout)────▶ FAILED ─▶ one `command_error`
//! ```
//!
//! Errors from the guard, the binder or the handler never leave
//! [`Pipeline::handle`]: each failed run reports exactly one
//! [`CommandErrorEvent`] to the pipeline's [`ErrorSink`] and returns
//! [`Outcome::Failed`].
//!
//! # Example
//!
//! ```rust,ignore
//! let pipeline = Pipeline::new(Arc::new(registry), client)
//!     .with_timeout(Duration::from_secs(30));
//!
//! match pipeline.handle(message).await {
//!     Outcome::Completed => {}
//!     Outcome::Skipped(reason) => tracing::trace!(?reason, "ignored"),
//!     Outcome::Failed(_) => { /* already reported */ }
//! }
//! ```

use std::any::Any;
use std::convert::Infallible;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use herald_core::{BoxedClient, BoxedMessage, COMMAND_ERROR};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{Instrument, debug, info_span, warn};

use crate::command::{ArgumentBinder, Registry, ResolvedCommand};
use crate::context::InvocationContext;
use crate::error::{CommandError, CommandResult};

// ============================================================================
// Outcome
// ============================================================================

/// Why a message did not reach its handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No prefix or no alias matched.
    NotACommand,
    /// The client is in self-only mode and someone else wrote the message.
    Unauthorized,
    /// The command's guard returned `false`.
    CheckFailed,
}

/// The terminal state of one pipeline run.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The handler was not run; nothing was reported.
    Skipped(SkipReason),
    /// The handler ran to completion.
    Completed,
    /// The run failed and the error was reported.
    Failed(Arc<CommandError>),
}

impl Outcome {
    /// Returns `true` if the handler completed.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// The error of a failed run.
    pub fn error(&self) -> Option<&CommandError> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }
}

// ============================================================================
// Error reporting
// ============================================================================

/// A failed invocation, as reported to an [`ErrorSink`].
#[derive(Debug, Clone)]
pub struct CommandErrorEvent {
    /// Name of the command that failed.
    pub command: String,
    /// The alias it was invoked with.
    pub alias: String,
    /// Author of the triggering message.
    pub author_id: String,
    /// The error.
    pub error: Arc<CommandError>,
}

impl fmt::Display for CommandErrorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "command '{}' failed: {}", self.command, self.error)
    }
}

/// Receives one event per failed invocation.
#[async_trait]
pub trait ErrorSink: Send + Sync + 'static {
    async fn report(&self, event: CommandErrorEvent);
}

#[async_trait]
impl ErrorSink for mpsc::UnboundedSender<CommandErrorEvent> {
    async fn report(&self, event: CommandErrorEvent) {
        if self.send(event).is_err() {
            debug!("error receiver dropped");
        }
    }
}

#[async_trait]
impl ErrorSink for mpsc::Sender<CommandErrorEvent> {
    async fn report(&self, event: CommandErrorEvent) {
        if self.send(event).await.is_err() {
            debug!("error receiver dropped");
        }
    }
}

/// Publishes errors as the client's `command_error` event.
///
/// This is the sink a [`Pipeline`] uses unless another one is set.
#[derive(Clone)]
pub struct ClientSink(pub BoxedClient);

#[async_trait]
impl ErrorSink for ClientSink {
    async fn report(&self, event: CommandErrorEvent) {
        self.0.emit(COMMAND_ERROR, event.error).await;
    }
}

/// An [`ErrorSink`] backed by a closure; see [`sink_fn`].
#[derive(Clone)]
pub struct FnSink<F>(F);

#[async_trait]
impl<F> ErrorSink for FnSink<F>
where
    F: Fn(CommandErrorEvent) + Send + Sync + 'static,
{
    async fn report(&self, event: CommandErrorEvent) {
        (self.0)(event)
    }
}

/// Wraps a closure as an [`ErrorSink`].
pub fn sink_fn<F>(f: F) -> FnSink<F>
where
    F: Fn(CommandErrorEvent) + Send + Sync + 'static,
{
    FnSink(f)
}

// ============================================================================
// Pipeline
// ============================================================================

/// Runs messages through resolution, gating, binding and invocation.
///
/// Cloning is cheap; clones share the registry, client and sink.
#[derive(Clone)]
pub struct Pipeline {
    registry: Arc<Registry>,
    client: BoxedClient,
    sink: Arc<dyn ErrorSink>,
    timeout: Option<Duration>,
}

impl Pipeline {
    /// Creates a pipeline reporting errors through the client.
    pub fn new(registry: Arc<Registry>, client: BoxedClient) -> Self {
        Self {
            registry,
            sink: Arc::new(ClientSink(Arc::clone(&client))),
            client,
            timeout: None,
        }
    }

    /// Reports errors to `sink` instead of the client.
    pub fn with_sink(mut self, sink: impl ErrorSink) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Bounds binding and invocation of every command to `limit`.
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// The registry commands are resolved against.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// The client messages arrive on.
    pub fn client(&self) -> &BoxedClient {
        &self.client
    }

    /// The configured invocation time limit.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Handles one incoming message.
    pub async fn handle(&self, message: BoxedMessage) -> Outcome {
        let ctx = InvocationContext::new(
            Arc::clone(&self.client),
            message,
            Arc::clone(&self.registry),
        );
        self.invoke(Arc::new(ctx)).await
    }

    /// Runs an already resolved context through the pipeline.
    pub async fn invoke(&self, ctx: Arc<InvocationContext>) -> Outcome {
        let Some(resolved) = ctx.resolution().command().cloned() else {
            debug!(prefix = ?ctx.prefix(), "message is not a command");
            return Outcome::Skipped(SkipReason::NotACommand);
        };

        let span = info_span!(
            "command",
            command = resolved.command().name(),
            alias = resolved.alias(),
            author = ctx.author_id(),
        );
        self.run(ctx, resolved).instrument(span).await
    }

    async fn run(&self, ctx: Arc<InvocationContext>, resolved: ResolvedCommand) -> Outcome {
        if !ctx.identity().permits(ctx.author_id()) {
            debug!("author is not permitted in self-only mode");
            return Outcome::Skipped(SkipReason::Unauthorized);
        }

        match self.execute(&ctx, &resolved).await {
            Ok(outcome) => outcome,
            Err(error) => {
                let error = Arc::new(error);
                warn!(%error, "command failed");
                self.sink
                    .report(CommandErrorEvent {
                        command: resolved.command().name().to_owned(),
                        alias: resolved.alias().to_owned(),
                        author_id: ctx.author_id().to_owned(),
                        error: Arc::clone(&error),
                    })
                    .await;
                Outcome::Failed(error)
            }
        }
    }

    async fn execute(
        &self,
        ctx: &Arc<InvocationContext>,
        resolved: &ResolvedCommand,
    ) -> CommandResult<Outcome> {
        let command = resolved.command();

        if let Some(guard) = command.guard() {
            let passed = catch_panic("guard", guard.evaluate(ctx))
                .await?
                .map_err(CommandError::Runtime)?;
            if !passed {
                debug!("guard rejected the invocation");
                return Ok(Outcome::Skipped(SkipReason::CheckFailed));
            }
        }

        let content = resolved.content(ctx.text());
        let call = async {
            let args = ArgumentBinder::new(command.parameters())
                .bind(ctx, content)
                .await?;
            command.invoke(Arc::clone(ctx), args).await
        };
        let call = catch_panic("command", call).map(|result| result.and_then(|inner| inner));

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| CommandError::Timeout(limit))??,
            None => call.await?,
        }

        debug!("command completed");
        Ok(Outcome::Completed)
    }
}

/// Turns a panic inside `future` into a `Runtime` error naming `stage`.
async fn catch_panic<F: Future>(stage: &str, future: F) -> CommandResult<F::Output> {
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| CommandError::runtime(panic_message(stage, panic)))
}

fn panic_message(stage: &str, panic: Box<dyn Any + Send>) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned());
    format!("{stage} panicked: {detail}")
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("commands", &self.registry.len())
            .field("identity", self.client.identity())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// tower integration
// ============================================================================

impl tower::Service<BoxedMessage> for Pipeline {
    type Response = Outcome;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Outcome, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, message: BoxedMessage) -> Self::Future {
        let pipeline = self.clone();
        async move { Ok(pipeline.handle(message).await) }.boxed()
    }
}
