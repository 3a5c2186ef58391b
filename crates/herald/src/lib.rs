//! # Herald
//!
//! Prefix commands for chat bots.
//!
//! ## Overview
//!
//! Herald turns messages such as `!pay @bob 20` into calls of ordinary
//! `async fn` handlers with typed arguments. Registration validates
//! everything it can up front; at runtime, each message goes through one
//! pipeline and every failure is reported exactly once as a
//! `command_error` client event.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐  Message  ┌──────────┐   ┌──────────┐   ┌─────────┐   ┌─────────┐   ┌──────────┐
//! │ Transport │──────────▶│ Resolver │──▶│ Auth +   │──▶│ Binder  │──▶│ Handler │──▶│  reply   │
//! └───────────┘           │ (prefix, │   │ guard    │   │ (split, │   │         │   └──────────┘
//!                         │  alias)  │   └──────────┘   │ convert)│   └─────────┘
//!                         └──────────┘                  └─────────┘
//!                                  any failure ──▶ ErrorSink ──▶ "command_error"
//! ```
//!
//! - **core**: the `Client` and `Message` contracts a transport implements
//! - **framework**: `Registry`, `Resolver`, `ArgumentBinder`, converters,
//!   guards and the `Pipeline`
//! - **macros**: the `#[command]` attribute
//! - **runtime**: configuration, logging and the `CommandRuntime` loop
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herald::prelude::*;
//!
//! /// Adds numbers together.
//! #[command(aliases = ["sum", "+"])]
//! async fn add(_ctx: Arc<InvocationContext>, numbers: Variadic<i64>) -> String {
//!     numbers.iter().sum::<i64>().to_string()
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     let _guard = init_from_config(&config.logging)?;
//!
//!     let mut registry = Registry::new();
//!     registry.add(add()?)?;
//!
//!     let (tx, rx) = tokio::sync::mpsc::channel(64);
//!     let client = MyClient::connect(tx).await?;
//!     CommandRuntime::from_config(registry, client, &config.client)
//!         .run(rx)
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! `#[command]` expands to paths under `herald_framework`, so crates using
//! the attribute depend on `herald-framework` directly as well.
//!
//! ## Features
//!
//! - `toml-config` *(default)*: read `herald.toml`
//! - `yaml-config`: read `herald.yaml`
//! - `json-log`: JSON log lines

pub use herald_core as core;
pub use herald_framework as framework;
pub use herald_runtime as runtime;

/// Declares a command from an `async fn`. See [`herald_macros::command`].
pub use herald_macros::command;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use herald::prelude::*;
/// ```
pub mod prelude {
    pub use std::sync::Arc;

    // Transport contracts
    pub use herald_core::{
        BoxedClient, BoxedMessage, COMMAND_ERROR, Client, EventPayload, Identity, Message,
        OperatingMode, ReplyOptions, SendError, SendResult,
    };

    // Registration
    pub use herald_framework::{
        ArgValue, CommandBuilder, CommandInfo, CommandSpec, Convert, ConvertSync, Converter,
        Registry, Rest, Variadic, register,
    };
    // `command` as both the builder function and the attribute.
    pub use herald_framework::command;
    pub use herald_macros::command;

    // Invocation
    pub use herald_framework::{
        BoxError, ClientSink, CommandError, CommandErrorEvent, CommandResult, ErrorSink,
        InvocationContext, Outcome, Pipeline, SkipReason, async_trait, sink_fn,
    };

    // Runtime
    pub use herald_runtime::{
        CommandRuntime, HeraldConfig, RuntimeError, RuntimeStats, init_from_config, load_config,
    };
    pub use herald_runtime::prelude::*;
}
