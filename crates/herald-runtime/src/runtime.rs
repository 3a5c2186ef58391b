//! The message loop.
//!
//! [`CommandRuntime`] owns a [`Pipeline`] and runs every incoming message as
//! its own tokio task. Messages arrive on an mpsc channel fed by whatever
//! transport the application uses:
//!
//! ```rust,ignore
//! use herald_runtime::{CommandRuntime, config::load_config};
//!
//! let config = load_config()?;
//! let runtime = CommandRuntime::from_config(registry, client, &config.client);
//!
//! let (tx, rx) = tokio::sync::mpsc::channel(64);
//! tokio::spawn(read_messages(tx));
//!
//! // Returns on channel close, Ctrl+C or SIGTERM, after in-flight
//! // invocations have finished.
//! runtime.run(rx).await?;
//! ```

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use herald_core::{BoxedClient, BoxedMessage};
use herald_framework::{Outcome, Pipeline, Registry};
use serde::Serialize;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::error::{RuntimeError, RuntimeResult};

// =============================================================================
// Statistics
// =============================================================================

/// A snapshot of the runtime counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RuntimeStats {
    /// Messages handed to the runtime.
    pub received: u64,
    /// Invocations whose handler completed.
    pub completed: u64,
    /// Messages that never reached a handler.
    pub skipped: u64,
    /// Invocations that failed and were reported.
    pub failed: u64,
    /// Tasks still running.
    pub in_flight: usize,
}

#[derive(Debug, Default)]
struct Counters {
    received: AtomicU64,
    completed: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    fn record(&self, outcome: &Outcome) {
        let counter = match outcome {
            Outcome::Completed => &self.completed,
            Outcome::Skipped(_) => &self.skipped,
            Outcome::Failed(_) => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

// =============================================================================
// CommandRuntime
// =============================================================================

/// Runs messages through a [`Pipeline`], one task per message.
#[derive(Debug, Clone)]
pub struct CommandRuntime {
    pipeline: Pipeline,
    tracker: TaskTracker,
    shutdown: CancellationToken,
    counters: Arc<Counters>,
}

impl CommandRuntime {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            tracker: TaskTracker::new(),
            shutdown: CancellationToken::new(),
            counters: Arc::default(),
        }
    }

    /// Builds the pipeline from a registry, a client and the configured
    /// invocation time limit.
    pub fn from_config(
        registry: impl Into<Arc<Registry>>,
        client: BoxedClient,
        config: &ClientConfig,
    ) -> Self {
        let mut pipeline = Pipeline::new(registry.into(), client);
        if let Some(limit) = config.invoke_timeout() {
            pipeline = pipeline.with_timeout(limit);
        }
        Self::new(pipeline)
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// A token that stops [`run`](Self::run) when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn stats(&self) -> RuntimeStats {
        RuntimeStats {
            received: self.counters.received.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            skipped: self.counters.skipped.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            in_flight: self.tracker.len(),
        }
    }

    /// Spawns the pipeline for one message.
    pub fn dispatch(&self, message: BoxedMessage) -> JoinHandle<Outcome> {
        self.counters.received.fetch_add(1, Ordering::Relaxed);

        let pipeline = self.pipeline.clone();
        let counters = Arc::clone(&self.counters);
        self.tracker.spawn(async move {
            let outcome = pipeline.handle(message).await;
            counters.record(&outcome);
            outcome
        })
    }

    /// Consumes `messages` until the channel closes, the shutdown token is
    /// cancelled, or the process receives Ctrl+C (or SIGTERM on Unix).
    pub async fn run(&self, messages: mpsc::Receiver<BoxedMessage>) -> RuntimeResult<()> {
        let signal = shutdown_signal()?;
        self.run_until(messages, signal).await;
        Ok(())
    }

    /// Like [`run`](Self::run), with `shutdown` in place of the OS signals.
    pub async fn run_until<F>(&self, mut messages: mpsc::Receiver<BoxedMessage>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(
            commands = self.pipeline.registry().len(),
            timeout = ?self.pipeline.timeout(),
            "Command runtime started"
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                message = messages.recv() => match message {
                    Some(message) => {
                        self.dispatch(message);
                    }
                    None => {
                        info!("Message channel closed");
                        break;
                    }
                },
                () = &mut shutdown => break,
                () = self.shutdown.cancelled() => {
                    info!("Shutdown requested");
                    break;
                }
            }
        }

        self.drain().await;
    }

    /// Waits for every dispatched invocation to finish.
    pub async fn drain(&self) {
        self.tracker.close();
        if !self.tracker.is_empty() {
            info!(in_flight = self.tracker.len(), "Waiting for running commands");
        }
        self.tracker.wait().await;
        self.tracker.reopen();

        let stats = self.stats();
        info!(
            received = stats.received,
            completed = stats.completed,
            skipped = stats.skipped,
            failed = stats.failed,
            "Command runtime stopped"
        );
    }
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
fn shutdown_signal() -> RuntimeResult<impl Future<Output = ()>> {
    #[cfg(unix)]
    let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
        .map_err(RuntimeError::Signal)?;

    Ok(async move {
        #[cfg(unix)]
        let terminate = async {
            terminate.recv().await;
            info!("Received SIGTERM, shutting down");
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        let interrupt = async {
            match signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C, shutting down"),
                Err(err) => {
                    warn!(error = %err, "Cannot listen for Ctrl+C");
                    std::future::pending::<()>().await;
                }
            }
        };

        tokio::select! {
            () = interrupt => {}
            () = terminate => {}
        }
    })
}
