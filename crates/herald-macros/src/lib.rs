//! Procedural macros for the Herald command framework.
//!
//! This crate provides:
//!
//! - `#[command]` - Declares a command from an `async fn` handler
//!
//! Handlers do not need a macro: any `async fn` taking the invocation
//! context followed by its parameters can be passed to
//! `herald_framework::command(..).handler(..)` directly. The attribute adds
//! what a plain function cannot express: parameter names, per-parameter
//! converters and the doc comment as help text.
//!
//! ```rust,ignore
//! use herald::prelude::*;
//!
//! /// Repeats what you said.
//! #[command(aliases = ["say", "repeat"])]
//! async fn echo(ctx: Arc<InvocationContext>, text: Rest<String>) -> Option<String> {
//!     text.into_inner()
//! }
//!
//! registry.add(echo()?)?;
//! ```

mod command;

use proc_macro::TokenStream;
use syn::{ItemFn, parse_macro_input};

/// Turns an `async fn` handler into a function returning its `CommandSpec`.
///
/// # Attributes
///
/// - `#[command(name = "...")]` - Set the command name (default: the function name)
/// - `#[command(aliases = ...)]` - A single alias or an array of aliases
/// - `#[command(help = "...")]` - Override the help text taken from the doc comment
/// - `#[command(guard = path)]` - A synchronous guard `Fn(&InvocationContext) -> bool`
/// - `#[command(async_guard = path)]` - An asynchronous guard
///
/// Parameters after the context may carry `#[convert(expr)]`, where `expr`
/// evaluates to a `Converter`.
///
/// # Example
///
/// ```rust,ignore
/// /// Transfers money.
/// #[command(aliases = "give", guard = is_member)]
/// async fn pay(
///     ctx: Arc<InvocationContext>,
///     #[convert(Converter::stateful::<MemberLookup>())] to: Member,
///     amount: u64,
/// ) -> String {
///     format!("sent {amount} to {}", to.0)
/// }
/// ```
#[proc_macro_attribute]
pub fn command(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut args = command::CommandArgs::default();
    let parser = syn::meta::parser(|meta| args.parse(meta));
    parse_macro_input!(attr with parser);
    let func = parse_macro_input!(item as ItemFn);

    match command::expand(args, func) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
