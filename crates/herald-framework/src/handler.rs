//! Handler system for the Herald framework.
//!
//! Command handlers are plain async functions. The first argument is always
//! the invocation context; every further argument implements
//! [`Parameter`] and is filled from the message's tokens:
//!
//! ```rust,ignore
//! // No arguments
//! async fn ping(ctx: Arc<InvocationContext>) -> &'static str {
//!     "Pong!"
//! }
//!
//! // A converted positional argument and an optional remainder
//! async fn pay(ctx: Arc<InvocationContext>, amount: u64, note: Rest<String>) -> String {
//!     format!("paid {amount} ({})", note.into_inner().unwrap_or_default())
//! }
//! ```
//!
//! [`Handler`] is implemented for every such function with up to 12
//! parameters after the context, similar to Axum's handler system.

use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;

use crate::command::param::{BoundArguments, Parameter, ParameterDescriptor};
use crate::context::InvocationContext;
use crate::error::{BoxError, CommandError, CommandResult};

// ============================================================================
// HandlerResponse - Handle handler return values
// ============================================================================

/// A trait for types that can be returned from handlers.
#[async_trait]
pub trait HandlerResponse: Send + 'static {
    /// Performs the response's side effects and reports failure.
    async fn respond(self, ctx: &InvocationContext) -> CommandResult<()>;
}

/// Implementation for `()` - no response needed.
#[async_trait]
impl HandlerResponse for () {
    async fn respond(self, _ctx: &InvocationContext) -> CommandResult<()> {
        Ok(())
    }
}

/// Implementation for `String` - replies to the triggering message.
#[async_trait]
impl HandlerResponse for String {
    async fn respond(self, ctx: &InvocationContext) -> CommandResult<()> {
        ctx.reply(&self).await.map_err(CommandError::runtime)?;
        Ok(())
    }
}

/// Implementation for `&'static str` - replies to the triggering message.
#[async_trait]
impl HandlerResponse for &'static str {
    async fn respond(self, ctx: &InvocationContext) -> CommandResult<()> {
        self.to_owned().respond(ctx).await
    }
}

/// Implementation for `Option<T>` where T implements HandlerResponse.
///
/// On Some, the inner value's response is handled. On None, no action is taken.
#[async_trait]
impl<T: HandlerResponse> HandlerResponse for Option<T> {
    async fn respond(self, ctx: &InvocationContext) -> CommandResult<()> {
        match self {
            Some(t) => t.respond(ctx).await,
            None => Ok(()),
        }
    }
}

/// Implementation for `Result<T, E>` where T implements HandlerResponse.
///
/// On Ok, the inner value's response is handled. On Err, the invocation
/// fails and the error is reported as a `command_error`.
#[async_trait]
impl<T, E> HandlerResponse for Result<T, E>
where
    T: HandlerResponse,
    E: Into<BoxError> + Send + 'static,
{
    async fn respond(self, ctx: &InvocationContext) -> CommandResult<()> {
        match self {
            Ok(t) => t.respond(ctx).await,
            Err(e) => Err(CommandError::runtime(e)),
        }
    }
}

// ============================================================================
// Handler Trait
// ============================================================================

/// The core trait for command handlers.
///
/// # Blanket Implementation
///
/// This trait is automatically implemented for async functions that:
/// - Take an `Arc<InvocationContext>` followed by 0-12 [`Parameter`]s
/// - Return a type that implements [`HandlerResponse`]
pub trait Handler<T>: Clone + Send + Sync + 'static {
    /// Describes the parameters after the context, in declaration order.
    ///
    /// Names default to `arg1`, `arg2`, ...
    fn parameters() -> Vec<ParameterDescriptor>;

    /// Extracts the arguments and runs the handler.
    fn call(
        self,
        ctx: Arc<InvocationContext>,
        args: BoundArguments,
        params: Arc<[ParameterDescriptor]>,
    ) -> BoxFuture<'static, CommandResult<()>>;
}

// ============================================================================
// ErasedHandler - Type-erased handler stored in a CommandSpec
// ============================================================================

/// A type-erased handler that can be stored in a [`CommandSpec`](crate::CommandSpec).
pub type ErasedHandler = Arc<
    dyn Fn(
            Arc<InvocationContext>,
            BoundArguments,
            Arc<[ParameterDescriptor]>,
        ) -> BoxFuture<'static, CommandResult<()>>
        + Send
        + Sync,
>;

/// Convert a handler function into an erased handler.
pub fn into_handler<H, T>(handler: H) -> ErasedHandler
where
    H: Handler<T>,
    T: 'static,
{
    Arc::new(move |ctx, args, params| handler.clone().call(ctx, args, params))
}

/// Returns the declared identifier of a handler function.
///
/// This is the last path segment of the function item's type name, or
/// `None` for closures and other anonymous callables.
pub fn declared_identifier<H>() -> Option<&'static str> {
    let path = std::any::type_name::<H>();
    let path = path.split('<').next().unwrap_or(path);
    let name = path.rsplit("::").next().unwrap_or(path);
    let anonymous = name.is_empty() || name.contains(['{', '}', ' ', '(', '&']);
    (!anonymous).then_some(name)
}

fn default_parameter_name(type_param: &str) -> String {
    format!("arg{}", type_param.trim_start_matches('T'))
}

// ============================================================================
// Handler implementations for functions (Axum-style)
// ============================================================================

/// Macro to generate Handler implementations for functions with different arities.
macro_rules! impl_handler {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<F, Fut, Res, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: Fn(Arc<InvocationContext>, $($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Res> + Send + 'static,
            Res: HandlerResponse,
            $( $ty: Parameter, )*
        {
            fn parameters() -> Vec<ParameterDescriptor> {
                vec![$( $ty::descriptor(default_parameter_name(stringify!($ty))), )*]
            }

            fn call(
                self,
                ctx: Arc<InvocationContext>,
                mut args: BoundArguments,
                params: Arc<[ParameterDescriptor]>,
            ) -> BoxFuture<'static, CommandResult<()>> {
                async move {
                    let mut declared = params.iter();
                    $(
                        let Some(param) = declared.next() else {
                            return Err(CommandError::configuration(
                                "handler takes more parameters than its command declares",
                            ));
                        };
                        let $ty = $ty::extract(&mut args, param)?;
                    )*

                    let res = (self)(Arc::clone(&ctx), $($ty,)*).await;
                    res.respond(&ctx).await
                }
                .boxed()
            }
        }
    };
}

// Generate implementations for 0-12 parameters
impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::param::{ParamKind, Rest, Variadic};

    async fn ping(_ctx: Arc<InvocationContext>) {}

    async fn pay(_ctx: Arc<InvocationContext>, _amount: u64, _note: Rest<String>) {}

    async fn sum(_ctx: Arc<InvocationContext>, _numbers: Variadic<i64>) -> String {
        String::new()
    }

    fn parameters_of<H: Handler<T>, T>(_handler: H) -> Vec<ParameterDescriptor> {
        H::parameters()
    }

    fn identifier_of<H>(_handler: H) -> Option<&'static str> {
        declared_identifier::<H>()
    }

    #[test]
    fn test_parameters_from_signature() {
        assert!(parameters_of(ping).is_empty());

        let params = parameters_of(pay);
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name(), "arg1");
        assert_eq!(params[0].kind(), ParamKind::Positional);
        assert_eq!(params[1].name(), "arg2");
        assert_eq!(params[1].kind(), ParamKind::KeywordRemainder);

        let params = parameters_of(sum);
        assert_eq!(params[0].kind(), ParamKind::Variadic);
    }

    #[test]
    fn test_declared_identifier() {
        assert_eq!(identifier_of(ping), Some("ping"));
        assert_eq!(identifier_of(pay), Some("pay"));
        assert_eq!(identifier_of(|_ctx: Arc<InvocationContext>| async {}), None);
    }
}
