//! # Herald Framework
//!
//! Command resolution and invocation for chat clients.
//!
//! This layer provides:
//! - [`CommandSpec`] and the registration API ([`command`], [`register`])
//! - An alias-indexed [`Registry`] with atomic, conflict-checked insertion
//! - Prefix and longest-alias resolution ([`Resolver`])
//! - Shell-style tokenization and typed argument binding ([`ArgumentBinder`])
//! - Pluggable [`Converter`]s, plain or stateful, sync or async
//! - The [`Pipeline`] that gates, binds and invokes, reporting every failure
//!   as a single `command_error`
//!
//! Transport concerns live behind the [`Client`](herald_core::Client) and
//! [`Message`](herald_core::Message) traits of `herald-core`.

pub mod command;
pub mod context;
pub mod error;
pub mod handler;
pub mod pipeline;

#[cfg(test)]
mod testing;

pub use command::{
    ArgValue, ArgumentBinder, BoundArguments, CommandBuilder, CommandInfo, CommandSpec, Convert,
    ConvertSync, ConvertedValue, Converter, Guard, GuardOutput, IntoAliases, ParamKind, ParamRef,
    Parameter, ParameterDescriptor, ParameterInfo, Parsed, Registry, Resolution, ResolvedCommand,
    Resolver, Rest, ValueType, Variadic, command, register,
};
pub use context::InvocationContext;
pub use error::{BoxError, CommandError, CommandResult};
pub use handler::{ErasedHandler, Handler, HandlerResponse, into_handler};
pub use pipeline::{
    ClientSink, CommandErrorEvent, ErrorSink, FnSink, Outcome, Pipeline, SkipReason, sink_fn,
};

/// Re-export of `async_trait` for implementing [`Convert`] without a direct
/// dependency.
pub use async_trait::async_trait;
