//! Pluggable conversion of raw tokens into typed values.
//!
//! A [`Converter`] is decided once, when the command is built, and is one of:
//!
//! - [`Converter::Identity`]: the raw token, unchanged, as a `String`;
//! - [`Converter::Plain`]: a synchronous function of the raw token;
//! - [`Converter::Stateful`]: a capability type instantiated per token from
//!   the invocation context and the raw token, whose `convert` method
//!   produces the value, either synchronously ([`ConvertSync`]) or
//!   asynchronously ([`Convert`]).
//!
//! Converted values travel type-erased as [`ConvertedValue`] until the handler
//! extracts them, so every converter records its [`ValueType`].
//!
//! # Example
//!
//! ```rust,ignore
//! struct Member(String);
//!
//! struct MemberLookup;
//!
//! #[async_trait]
//! impl Convert for MemberLookup {
//!     type Output = Member;
//!
//!     fn new(_ctx: &InvocationContext, _raw: &str) -> Self {
//!         MemberLookup
//!     }
//!
//!     async fn convert(self, ctx: &InvocationContext, raw: &str) -> Result<Member, BoxError> {
//!         let id = raw.trim_start_matches("<@").trim_end_matches('>');
//!         Ok(Member(id.to_owned()))
//!     }
//! }
//!
//! let converter = Converter::stateful::<MemberLookup>();
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;

use crate::context::InvocationContext;
use crate::error::BoxError;

// ============================================================================
// Type-erased values
// ============================================================================

/// Runtime description of the type a converter produces or a parameter expects.
#[derive(Clone, Copy)]
pub struct ValueType {
    id: TypeId,
    name: &'static str,
}

impl ValueType {
    /// Describes the type `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The full type name, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ValueType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ValueType {}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A converted argument whose concrete type is only known to the handler.
pub struct ConvertedValue {
    value: Box<dyn Any + Send>,
    ty: ValueType,
}

impl ConvertedValue {
    /// Erases `value`.
    pub fn new<T: Send + 'static>(value: T) -> Self {
        Self {
            value: Box::new(value),
            ty: ValueType::of::<T>(),
        }
    }

    /// The type of the erased value.
    pub fn value_type(&self) -> ValueType {
        self.ty
    }

    /// Recovers the concrete value, or returns `self` if the type differs.
    pub fn downcast<T: 'static>(self) -> Result<T, Self> {
        let ty = self.ty;
        self.value
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|value| Self { value, ty })
    }
}

impl fmt::Debug for ConvertedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvertedValue")
            .field("type", &self.ty)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Stateful converter traits
// ============================================================================

/// A converter capability whose conversion may suspend.
///
/// A fresh instance is built with [`new`](Convert::new) for every token it
/// converts, then consumed by [`convert`](Convert::convert).
#[async_trait]
pub trait Convert: Send + Sized + 'static {
    /// The value produced for a parameter.
    type Output: Send + 'static;

    /// Builds the converter for one token.
    fn new(ctx: &InvocationContext, raw: &str) -> Self;

    /// Converts the token.
    async fn convert(self, ctx: &InvocationContext, raw: &str) -> Result<Self::Output, BoxError>;
}

/// A converter capability that converts without suspending.
pub trait ConvertSync: Sized + 'static {
    /// The value produced for a parameter.
    type Output: Send + 'static;

    /// Builds the converter for one token.
    fn new(ctx: &InvocationContext, raw: &str) -> Self;

    /// Converts the token.
    fn convert(self, ctx: &InvocationContext, raw: &str) -> Result<Self::Output, BoxError>;
}

// ============================================================================
// Converter
// ============================================================================

/// A synchronous conversion function.
pub type PlainFn = Arc<dyn Fn(&str) -> Result<ConvertedValue, BoxError> + Send + Sync>;

/// A stateful conversion that runs to completion without suspending.
pub type StatefulSyncFn =
    Arc<dyn Fn(&InvocationContext, &str) -> Result<ConvertedValue, BoxError> + Send + Sync>;

/// A stateful conversion that may suspend.
pub type StatefulAsyncFn = Arc<
    dyn Fn(Arc<InvocationContext>, String) -> BoxFuture<'static, Result<ConvertedValue, BoxError>>
        + Send
        + Sync,
>;

/// How a stateful converter is driven.
#[derive(Clone)]
pub enum Dispatch {
    /// Called directly.
    Sync(StatefulSyncFn),
    /// Awaited.
    Async(StatefulAsyncFn),
}

/// A per-parameter conversion strategy.
#[derive(Clone)]
pub enum Converter {
    /// Pass the raw token through as a `String`.
    Identity,
    /// Apply a plain function to the raw token.
    Plain {
        /// The type the function produces.
        output: ValueType,
        /// The function.
        func: PlainFn,
    },
    /// Instantiate a capability per token and call its `convert` method.
    Stateful {
        /// The type the capability produces.
        output: ValueType,
        /// Whether `convert` is awaited.
        dispatch: Dispatch,
    },
}

impl Converter {
    /// The identity converter.
    pub fn identity() -> Self {
        Self::Identity
    }

    /// Wraps a fallible plain function.
    pub fn plain<T, E, F>(func: F) -> Self
    where
        T: Send + 'static,
        E: Into<BoxError>,
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
    {
        Self::Plain {
            output: ValueType::of::<T>(),
            func: Arc::new(move |raw: &str| -> Result<ConvertedValue, BoxError> {
                func(raw).map(ConvertedValue::new).map_err(Into::into)
            }),
        }
    }

    /// Parses the raw token with [`FromStr`].
    pub fn parse<T>() -> Self
    where
        T: FromStr + Send + 'static,
        T::Err: Into<BoxError>,
    {
        Self::plain(str::parse::<T>)
    }

    /// Uses the asynchronous capability `C`.
    pub fn stateful<C: Convert>() -> Self {
        let func: StatefulAsyncFn = Arc::new(|ctx: Arc<InvocationContext>, raw: String| {
            async move {
                let converter = C::new(&ctx, &raw);
                converter
                    .convert(&ctx, &raw)
                    .await
                    .map(ConvertedValue::new)
            }
            .boxed()
        });
        Self::Stateful {
            output: ValueType::of::<C::Output>(),
            dispatch: Dispatch::Async(func),
        }
    }

    /// Uses the synchronous capability `C`.
    pub fn stateful_sync<C: ConvertSync>() -> Self {
        let func: StatefulSyncFn = Arc::new(
            |ctx: &InvocationContext, raw: &str| -> Result<ConvertedValue, BoxError> {
                C::new(ctx, raw)
                    .convert(ctx, raw)
                    .map(ConvertedValue::new)
            },
        );
        Self::Stateful {
            output: ValueType::of::<C::Output>(),
            dispatch: Dispatch::Sync(func),
        }
    }

    /// The type this converter produces.
    pub fn output(&self) -> ValueType {
        match self {
            Self::Identity => ValueType::of::<String>(),
            Self::Plain { output, .. } | Self::Stateful { output, .. } => *output,
        }
    }

    /// Returns `true` if applying this converter may suspend.
    pub fn is_async(&self) -> bool {
        matches!(
            self,
            Self::Stateful {
                dispatch: Dispatch::Async(_),
                ..
            }
        )
    }

    /// Converts one raw token.
    pub async fn convert(
        &self,
        ctx: &Arc<InvocationContext>,
        raw: &str,
    ) -> Result<ConvertedValue, BoxError> {
        match self {
            Self::Identity => Ok(ConvertedValue::new(raw.to_owned())),
            Self::Plain { func, .. } => func(raw),
            Self::Stateful {
                dispatch: Dispatch::Sync(func),
                ..
            } => func(ctx, raw),
            Self::Stateful {
                dispatch: Dispatch::Async(func),
                ..
            } => func(Arc::clone(ctx), raw.to_owned()).await,
        }
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => f.write_str("Identity"),
            Self::Plain { output, .. } => f.debug_tuple("Plain").field(output).finish(),
            Self::Stateful { output, dispatch } => f
                .debug_struct("Stateful")
                .field("output", output)
                .field(
                    "dispatch",
                    &match dispatch {
                        Dispatch::Sync(_) => "sync",
                        Dispatch::Async(_) => "async",
                    },
                )
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converted_value_downcast() {
        let value = ConvertedValue::new(42i64);
        assert_eq!(value.value_type(), ValueType::of::<i64>());

        let value = value.downcast::<String>().unwrap_err();
        assert_eq!(value.downcast::<i64>().unwrap(), 42);
    }

    #[test]
    fn test_output_types() {
        assert_eq!(Converter::identity().output(), ValueType::of::<String>());
        assert_eq!(Converter::parse::<u8>().output(), ValueType::of::<u8>());
        assert_ne!(Converter::parse::<u8>().output(), ValueType::of::<i64>());
    }

    #[test]
    fn test_plain_converter_errors_are_boxed() {
        let Converter::Plain { func, .. } = Converter::parse::<i64>() else {
            panic!("expected a plain converter");
        };
        assert_eq!(func("42").unwrap().downcast::<i64>().unwrap(), 42);
        assert!(func("abc").is_err());
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", Converter::identity()), "Identity");
        assert_eq!(format!("{:?}", Converter::parse::<u8>()), "Plain(u8)");
    }
}
