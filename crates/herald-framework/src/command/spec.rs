//! Command descriptors and the registration API.
//!
//! A [`CommandSpec`] is built in one of two equivalent ways:
//!
//! ```rust,ignore
//! // Direct call
//! let spec = register(Some("ping"), ["p"], ping)?;
//!
//! // Builder, applied to the handler last
//! let spec = command("ping").aliases(["p"]).handler(ping)?;
//! ```
//!
//! The `#[command]` attribute from `herald-macros` expands into the builder
//! form.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::Serialize;

use super::converter::Converter;
use super::guard::{Guard, GuardOutput};
use super::param::{BoundArguments, ParamKind, ParameterDescriptor};
use crate::context::InvocationContext;
use crate::error::{CommandError, CommandResult};
use crate::handler::{ErasedHandler, Handler, declared_identifier, into_handler};

// ============================================================================
// CommandSpec
// ============================================================================

/// An immutable description of one registered command.
#[derive(Clone)]
pub struct CommandSpec {
    name: String,
    aliases: Vec<String>,
    help: Option<String>,
    guard: Option<Guard>,
    parameters: Arc<[ParameterDescriptor]>,
    handler: ErasedHandler,
}

impl CommandSpec {
    /// The command's unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every alias, starting with the name.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// One-paragraph description, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// The guard evaluated before the handler runs.
    pub fn guard(&self) -> Option<&Guard> {
        self.guard.as_ref()
    }

    /// Handler parameters after the context, in declaration order.
    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    /// A one-line usage string such as `pay <amount> [note]`.
    pub fn usage(&self) -> String {
        let mut usage = self.name.clone();
        for param in self.parameters.iter() {
            usage.push(' ');
            match param.kind() {
                ParamKind::Positional => usage.push_str(&format!("<{}>", param.name())),
                ParamKind::Variadic => usage.push_str(&format!("[{}...]", param.name())),
                ParamKind::KeywordRemainder => usage.push_str(&format!("[{}]", param.name())),
            }
        }
        usage
    }

    /// A serializable summary of this command.
    pub fn info(&self) -> CommandInfo {
        CommandInfo {
            name: self.name.clone(),
            aliases: self.aliases.clone(),
            help: self.help.clone(),
            usage: self.usage(),
            parameters: self
                .parameters
                .iter()
                .map(|param| ParameterInfo {
                    name: param.name().to_owned(),
                    kind: param.kind(),
                    value_type: param.expected().name(),
                    async_converter: param.converter().is_some_and(Converter::is_async),
                })
                .collect(),
        }
    }

    /// Runs the handler with already bound arguments.
    pub(crate) fn invoke(
        &self,
        ctx: Arc<InvocationContext>,
        args: BoundArguments,
    ) -> BoxFuture<'static, CommandResult<()>> {
        (self.handler)(ctx, args, Arc::clone(&self.parameters))
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("guard", &self.guard)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// Serializable summary of a [`CommandSpec`], for help listings.
#[derive(Debug, Clone, Serialize)]
pub struct CommandInfo {
    pub name: String,
    pub aliases: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    pub usage: String,
    pub parameters: Vec<ParameterInfo>,
}

/// Serializable summary of one parameter.
#[derive(Debug, Clone, Serialize)]
pub struct ParameterInfo {
    pub name: String,
    pub kind: ParamKind,
    #[serde(rename = "type")]
    pub value_type: &'static str,
    /// Converting this parameter may suspend.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub async_converter: bool,
}

// ============================================================================
// Alias / parameter references
// ============================================================================

/// Anything that can be turned into a list of aliases.
///
/// Accepts a single string as well as sequences of strings.
pub trait IntoAliases {
    fn into_aliases(self) -> Vec<String>;
}

impl IntoAliases for () {
    fn into_aliases(self) -> Vec<String> {
        Vec::new()
    }
}

impl IntoAliases for &str {
    fn into_aliases(self) -> Vec<String> {
        vec![self.to_owned()]
    }
}

impl IntoAliases for String {
    fn into_aliases(self) -> Vec<String> {
        vec![self]
    }
}

impl<S: Into<String>> IntoAliases for Vec<S> {
    fn into_aliases(self) -> Vec<String> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<S: Into<String>, const N: usize> IntoAliases for [S; N] {
    fn into_aliases(self) -> Vec<String> {
        self.into_iter().map(Into::into).collect()
    }
}

impl IntoAliases for &[&str] {
    fn into_aliases(self) -> Vec<String> {
        self.iter().map(|alias| (*alias).to_owned()).collect()
    }
}

/// Refers to a handler parameter by position or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamRef {
    /// Zero-based position after the context.
    Index(usize),
    /// Parameter name.
    Name(String),
}

impl From<usize> for ParamRef {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for ParamRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for ParamRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl fmt::Display for ParamRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "#{index}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

// ============================================================================
// CommandBuilder
// ============================================================================

/// Builder for a [`CommandSpec`]; the handler is supplied last.
///
/// # Example
///
/// ```rust,ignore
/// let spec = command("pay")
///     .aliases(["give", "send"])
///     .help("Transfers money to a member.")
///     .param_names(["member", "amount"])
///     .converter("member", Converter::stateful::<MemberLookup>())
///     .guard(|ctx: &InvocationContext| ctx.author_id() != "banned")
///     .handler(pay)?;
/// ```
#[derive(Debug, Default, Clone)]
#[must_use = "a command builder does nothing until `.handler(..)` is called"]
pub struct CommandBuilder {
    name: Option<String>,
    aliases: Vec<String>,
    help: Option<String>,
    guard: Option<Guard>,
    param_names: Option<Vec<String>>,
    converters: Vec<(ParamRef, Converter)>,
}

impl CommandBuilder {
    /// Creates a builder whose name is taken from the handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the command name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds aliases besides the name.
    pub fn aliases(mut self, aliases: impl IntoAliases) -> Self {
        self.aliases.extend(aliases.into_aliases());
        self
    }

    /// Sets the help text.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Gates the command with a synchronous predicate.
    pub fn guard<F, R>(mut self, predicate: F) -> Self
    where
        F: Fn(&InvocationContext) -> R + Send + Sync + 'static,
        R: GuardOutput,
    {
        self.guard = Some(Guard::sync(predicate));
        self
    }

    /// Gates the command with an asynchronous predicate.
    pub fn async_guard<F, Fut, R>(mut self, predicate: F) -> Self
    where
        F: Fn(Arc<InvocationContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: GuardOutput,
    {
        self.guard = Some(Guard::from_async(predicate));
        self
    }

    /// Names the handler's parameters in declaration order.
    ///
    /// Without this, parameters are called `arg1`, `arg2`, ...
    pub fn param_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.param_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Declares the converter of one parameter, overriding its default.
    pub fn converter(mut self, param: impl Into<ParamRef>, converter: Converter) -> Self {
        self.converters.push((param.into(), converter));
        self
    }

    /// Applies the builder to `handler`, producing the command.
    pub fn handler<H, T>(self, handler: H) -> CommandResult<CommandSpec>
    where
        H: Handler<T>,
        T: 'static,
    {
        let name = match self.name {
            Some(name) => name,
            None => declared_identifier::<H>()
                .map(str::to_owned)
                .ok_or_else(|| {
                    CommandError::configuration(
                        "cannot take a command name from an anonymous handler, set one with `.name(..)`",
                    )
                })?,
        };
        if name.is_empty() {
            return Err(CommandError::configuration("command name is empty"));
        }

        let mut aliases = Vec::with_capacity(self.aliases.len() + 1);
        for alias in std::iter::once(name.clone()).chain(self.aliases) {
            if alias.is_empty() {
                return Err(CommandError::configuration(format!(
                    "command '{name}' has an empty alias"
                )));
            }
            if !aliases.contains(&alias) {
                aliases.push(alias);
            }
        }

        let parameters = build_parameters::<H, T>(&name, self.param_names, self.converters)?;

        Ok(CommandSpec {
            name,
            aliases,
            help: self.help,
            guard: self.guard,
            parameters: parameters.into(),
            handler: into_handler(handler),
        })
    }
}

fn build_parameters<H, T>(
    command: &str,
    names: Option<Vec<String>>,
    converters: Vec<(ParamRef, Converter)>,
) -> CommandResult<Vec<ParameterDescriptor>>
where
    H: Handler<T>,
{
    let mut parameters = H::parameters();

    if let Some(names) = names {
        if names.len() != parameters.len() {
            return Err(CommandError::configuration(format!(
                "command '{command}' names {} parameters but its handler takes {}",
                names.len(),
                parameters.len()
            )));
        }
        for (param, name) in parameters.iter_mut().zip(names) {
            param.rename(name);
        }
    }

    let mut seen = HashSet::new();
    for param in &parameters {
        if !seen.insert(param.name()) {
            return Err(CommandError::configuration(format!(
                "command '{command}' has two parameters named '{}'",
                param.name()
            )));
        }
    }

    for (target, converter) in converters {
        let param = match &target {
            ParamRef::Index(index) => parameters.get_mut(*index),
            ParamRef::Name(name) => parameters.iter_mut().find(|param| param.name() == name.as_str()),
        }
        .ok_or_else(|| {
            CommandError::configuration(format!(
                "command '{command}' declares a converter for unknown parameter '{target}'"
            ))
        })?;
        param.set_converter(converter)?;
    }

    let mut greedy: Option<&str> = None;
    for param in &parameters {
        if param.converter().is_none() {
            return Err(CommandError::configuration(format!(
                "parameter '{}' of command '{command}' has type {} and no converter",
                param.name(),
                param.expected().name()
            )));
        }
        match (param.kind(), greedy) {
            (ParamKind::Positional, Some(previous)) => {
                return Err(CommandError::configuration(format!(
                    "positional parameter '{}' of command '{command}' follows '{previous}', which takes every remaining token",
                    param.name()
                )));
            }
            (kind, None) if kind.is_greedy() => greedy = Some(param.name()),
            _ => {}
        }
    }

    Ok(parameters)
}

/// Starts building a command called `name`.
pub fn command(name: impl Into<String>) -> CommandBuilder {
    CommandBuilder::new().name(name)
}

/// Builds a command in one call.
///
/// `name` defaults to the handler's function name.
pub fn register<H, T>(
    name: Option<&str>,
    aliases: impl IntoAliases,
    handler: H,
) -> CommandResult<CommandSpec>
where
    H: Handler<T>,
    T: 'static,
{
    let mut builder = CommandBuilder::new().aliases(aliases);
    if let Some(name) = name {
        builder = builder.name(name);
    }
    builder.handler(handler)
}
