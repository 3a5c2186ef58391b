//! Command declaration, lookup and argument binding.
//!
//! - [`spec`]: the immutable [`CommandSpec`] and the registration API
//!   ([`command`], [`register`]);
//! - [`registry`]: the alias-indexed [`Registry`];
//! - [`resolver`]: prefix and longest-alias matching of message text;
//! - [`split`]: shell-style tokenization with quotes kept;
//! - [`binder`]: binding tokens to parameters through their converters;
//! - [`converter`], [`param`], [`guard`]: the building blocks a command is
//!   declared with.
//!
//! # Example
//!
//! ```rust,ignore
//! use herald_framework::{Registry, Rest, command};
//!
//! async fn say(ctx: Arc<InvocationContext>, text: Rest<String>) -> String {
//!     text.into_inner().unwrap_or_else(|| "...".into())
//! }
//!
//! let mut registry = Registry::new();
//! registry.add(command("say").aliases(["s", "echo"]).handler(say)?)?;
//! ```

pub mod binder;
pub mod converter;
pub mod guard;
pub mod param;
pub mod registry;
pub mod resolver;
pub mod spec;
pub mod split;

pub use binder::ArgumentBinder;
pub use converter::{
    Convert, ConvertSync, ConvertedValue, Converter, Dispatch, PlainFn, StatefulAsyncFn,
    StatefulSyncFn, ValueType,
};
pub use guard::{Guard, GuardOutput};
pub use param::{
    ArgValue, BoundArguments, ParamKind, Parameter, ParameterDescriptor, Parsed, Rest, Variadic,
};
pub use registry::Registry;
pub use resolver::{Resolution, ResolvedCommand, Resolver};
pub use spec::{
    CommandBuilder, CommandInfo, CommandSpec, IntoAliases, ParamRef, ParameterInfo, command,
    register,
};
pub use split::{UnclosedQuote, shell_split, split_arguments, strip_quotes};
