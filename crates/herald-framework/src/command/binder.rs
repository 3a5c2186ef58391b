//! Binding of command content to handler parameters.
//!
//! The binder walks the command's parameters in order and feeds them from
//! the tokens of the command content:
//!
//! - a **positional** parameter takes the next token, with one layer of
//!   surrounding quotes removed;
//! - a **variadic** parameter converts every remaining token on its own;
//! - a **keyword-remainder** parameter converts the remaining tokens joined
//!   by single spaces, and is left out entirely when no token remains.
//!
//! Tokens left over after the last parameter are ignored.

use std::sync::Arc;

use tracing::trace;

use super::converter::{ConvertedValue, Converter};
use super::param::{BoundArguments, ParamKind, ParameterDescriptor};
use super::split::{split_arguments, strip_quotes};
use crate::context::InvocationContext;
use crate::error::{CommandError, CommandResult};

/// Binds command content to a parameter list.
#[derive(Debug, Clone, Copy)]
pub struct ArgumentBinder<'a> {
    params: &'a [ParameterDescriptor],
}

impl<'a> ArgumentBinder<'a> {
    /// Creates a binder for `params`.
    pub fn new(params: &'a [ParameterDescriptor]) -> Self {
        Self { params }
    }

    /// Tokenizes `content` and converts the tokens.
    ///
    /// Converters run one at a time, in parameter order; the first failure
    /// stops binding.
    pub async fn bind(
        &self,
        ctx: &Arc<InvocationContext>,
        content: &str,
    ) -> CommandResult<BoundArguments> {
        let mut tokens = split_arguments(content).into_iter();
        let mut args = BoundArguments::default();

        for param in self.params {
            match param.kind() {
                ParamKind::Positional => {
                    let token = tokens.next().ok_or_else(|| CommandError::MissingArgument {
                        parameter: param.name().to_owned(),
                    })?;
                    let value = convert(ctx, param, strip_quotes(&token)).await?;
                    args.push_positional(value);
                }
                ParamKind::Variadic => {
                    let mut values = Vec::new();
                    for token in tokens.by_ref() {
                        values.push(convert(ctx, param, &token).await?);
                    }
                    args.insert_variadic(param.name(), values);
                }
                ParamKind::KeywordRemainder => {
                    let rest: Vec<String> = tokens.by_ref().collect();
                    if !rest.is_empty() {
                        let value = convert(ctx, param, &rest.join(" ")).await?;
                        args.insert_keyword(param.name(), value);
                    }
                }
            }
        }

        if tokens.len() > 0 {
            trace!(ignored = tokens.len(), "extra tokens after the last parameter");
        }
        Ok(args)
    }
}

async fn convert(
    ctx: &Arc<InvocationContext>,
    param: &ParameterDescriptor,
    raw: &str,
) -> CommandResult<ConvertedValue> {
    let identity = Converter::Identity;
    let converter = param.converter().unwrap_or(&identity);
    param.check_output(converter)?;

    trace!(parameter = param.name(), raw, ?converter, "converting argument");
    converter
        .convert(ctx, raw)
        .await
        .map_err(|source| CommandError::Conversion {
            parameter: param.name().to_owned(),
            raw: raw.to_owned(),
            source,
        })
}
