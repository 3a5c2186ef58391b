//! Guard predicates evaluated before a command runs.

use std::fmt;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::context::InvocationContext;
use crate::error::BoxError;

/// Values a guard may return: a plain `bool`, or a `Result` whose error is
/// reported as a `command_error`.
pub trait GuardOutput: Send + 'static {
    /// Normalizes the guard's verdict.
    fn into_verdict(self) -> Result<bool, BoxError>;
}

impl GuardOutput for bool {
    fn into_verdict(self) -> Result<bool, BoxError> {
        Ok(self)
    }
}

impl<E: Into<BoxError> + Send + 'static> GuardOutput for Result<bool, E> {
    fn into_verdict(self) -> Result<bool, BoxError> {
        self.map_err(Into::into)
    }
}

type SyncGuardFn = Arc<dyn Fn(&InvocationContext) -> Result<bool, BoxError> + Send + Sync>;
type AsyncGuardFn =
    Arc<dyn Fn(Arc<InvocationContext>) -> BoxFuture<'static, Result<bool, BoxError>> + Send + Sync>;

/// An optional predicate attached to a command.
///
/// A guard returning `false` silently blocks the command: the handler does
/// not run and no error is reported.
#[derive(Clone)]
pub enum Guard {
    /// Evaluated inline.
    Sync(SyncGuardFn),
    /// Awaited.
    Async(AsyncGuardFn),
}

impl Guard {
    /// Wraps a synchronous predicate.
    pub fn sync<F, R>(predicate: F) -> Self
    where
        F: Fn(&InvocationContext) -> R + Send + Sync + 'static,
        R: GuardOutput,
    {
        Self::Sync(Arc::new(
            move |ctx: &InvocationContext| -> Result<bool, BoxError> {
                predicate(ctx).into_verdict()
            },
        ))
    }

    /// Wraps an asynchronous predicate.
    pub fn from_async<F, Fut, R>(predicate: F) -> Self
    where
        F: Fn(Arc<InvocationContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: GuardOutput,
    {
        Self::Async(Arc::new(move |ctx: Arc<InvocationContext>| {
            predicate(ctx).map(GuardOutput::into_verdict).boxed()
        }))
    }

    /// Evaluates the guard against an invocation.
    pub async fn evaluate(&self, ctx: &Arc<InvocationContext>) -> Result<bool, BoxError> {
        match self {
            Self::Sync(predicate) => predicate(ctx),
            Self::Async(predicate) => predicate(Arc::clone(ctx)).await,
        }
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Guard::Sync"),
            Self::Async(_) => f.write_str("Guard::Async"),
        }
    }
}
