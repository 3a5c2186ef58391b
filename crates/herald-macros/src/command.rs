//! `#[command]` attribute implementation.
//!
//! The attribute turns an `async fn` handler into a constructor of the same
//! name returning its `CommandSpec`:
//!
//! ```rust,ignore
//! /// Pays someone.
//! #[command(aliases = ["give"], guard = not_banned)]
//! async fn pay(ctx: Arc<InvocationContext>, #[convert(Converter::stateful::<MemberLookup>())] to: Member, amount: u64) -> String {
//!     format!("paid {amount} to {}", to.0)
//! }
//! ```
//!
//! expands to
//!
//! ```rust,ignore
//! /// Pays someone.
//! fn pay() -> ::herald_framework::CommandResult<::herald_framework::CommandSpec> {
//!     async fn pay(ctx: Arc<InvocationContext>, to: Member, amount: u64) -> String { ... }
//!
//!     ::herald_framework::command("pay")
//!         .aliases(["give"])
//!         .help("Pays someone.")
//!         .param_names(["to", "amount"])
//!         .converter("to", Converter::stateful::<MemberLookup>())
//!         .guard(not_banned)
//!         .handler(pay)
//! }
//! ```
//!
//! | Key | Example | Description |
//! |-----|---------|-------------|
//! | `name` | `"pay"` | Command name (default: the function name) |
//! | `aliases` | `"p"` or `["p", "give"]` | Extra aliases |
//! | `help` | `"..."` | Help text (default: the doc comment) |
//! | `guard` | `is_admin` | Synchronous guard |
//! | `async_guard` | `can_pay` | Asynchronous guard |

use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    Attribute, Expr, FnArg, ItemFn, LitStr, Pat, meta::ParseNestedMeta, spanned::Spanned,
};

// ============================================================================
// Attribute arguments
// ============================================================================

#[derive(Default)]
pub struct CommandArgs {
    name: Option<LitStr>,
    aliases: Option<Expr>,
    help: Option<LitStr>,
    guard: Option<Expr>,
    async_guard: Option<Expr>,
}

impl CommandArgs {
    pub fn parse(&mut self, meta: ParseNestedMeta) -> syn::Result<()> {
        if meta.path.is_ident("name") {
            self.name = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("aliases") {
            self.aliases = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("help") {
            self.help = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("guard") {
            self.guard = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("async_guard") {
            self.async_guard = Some(meta.value()?.parse()?);
        } else {
            return Err(meta.error(
                "unknown command option; expected name, aliases, help, guard or async_guard",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Expansion
// ============================================================================

/// One handler parameter after the context.
struct Param {
    name: String,
    converter: Option<Expr>,
}

pub fn expand(args: CommandArgs, mut func: ItemFn) -> syn::Result<TokenStream> {
    let sig = &func.sig;
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(
            sig.fn_token.span(),
            "#[command] handlers must be `async fn`",
        ));
    }
    if !sig.generics.params.is_empty() || sig.generics.where_clause.is_some() {
        return Err(syn::Error::new(
            sig.generics.span(),
            "#[command] handlers cannot be generic",
        ));
    }
    if args.guard.is_some() && args.async_guard.is_some() {
        return Err(syn::Error::new(
            sig.ident.span(),
            "use either `guard` or `async_guard`, not both",
        ));
    }

    let params = collect_params(&mut func)?;

    let ident = func.sig.ident.clone();
    let vis = func.vis.clone();
    let (docs, attrs): (Vec<Attribute>, Vec<Attribute>) = std::mem::take(&mut func.attrs)
        .into_iter()
        .partition(|attr| attr.path().is_ident("doc"));
    func.attrs = attrs;
    func.vis = syn::Visibility::Inherited;

    let name = args
        .name
        .map(|name| name.value())
        .unwrap_or_else(|| ident.to_string());

    let aliases = args.aliases.map(|aliases| quote!(.aliases(#aliases)));
    let help = args
        .help
        .map(|help| help.value())
        .or_else(|| doc_text(&docs))
        .map(|help| quote!(.help(#help)));
    let guard = match (args.guard, args.async_guard) {
        (Some(guard), _) => Some(quote!(.guard(#guard))),
        (None, Some(guard)) => Some(quote!(.async_guard(#guard))),
        (None, None) => None,
    };

    let param_names = (!params.is_empty()).then(|| {
        let names = params.iter().map(|param| &param.name);
        quote!(.param_names([#(#names),*]))
    });
    let converters = params.iter().filter_map(|param| {
        let name = &param.name;
        param
            .converter
            .as_ref()
            .map(|converter| quote!(.converter(#name, #converter)))
    });

    Ok(quote! {
        #(#docs)*
        #vis fn #ident() -> ::herald_framework::CommandResult<::herald_framework::CommandSpec> {
            #func

            ::herald_framework::command(#name)
                #aliases
                #help
                #param_names
                #(#converters)*
                #guard
                .handler(#ident)
        }
    })
}

/// Collects parameter names and strips `#[convert(..)]` attributes.
fn collect_params(func: &mut ItemFn) -> syn::Result<Vec<Param>> {
    let span = func.sig.ident.span();
    let mut inputs = func.sig.inputs.iter_mut();

    match inputs.next() {
        Some(FnArg::Typed(ctx)) => {
            if let Some(attr) = ctx.attrs.iter().find(|attr| attr.path().is_ident("convert")) {
                return Err(syn::Error::new_spanned(
                    attr,
                    "the context parameter cannot have a converter",
                ));
            }
        }
        Some(FnArg::Receiver(receiver)) => {
            return Err(syn::Error::new_spanned(
                receiver,
                "#[command] handlers cannot take `self`",
            ));
        }
        None => {
            return Err(syn::Error::new(
                span,
                "#[command] handlers take the invocation context as their first parameter",
            ));
        }
    }

    let mut params = Vec::new();
    for (index, input) in inputs.enumerate() {
        let arg = match input {
            FnArg::Typed(arg) => arg,
            FnArg::Receiver(receiver) => {
                return Err(syn::Error::new_spanned(receiver, "unexpected `self` parameter"));
            }
        };

        let mut converter = None;
        let mut kept = Vec::with_capacity(arg.attrs.len());
        for attr in std::mem::take(&mut arg.attrs) {
            if attr.path().is_ident("convert") {
                if converter.is_some() {
                    return Err(syn::Error::new_spanned(attr, "duplicate #[convert]"));
                }
                converter = Some(attr.parse_args::<Expr>()?);
            } else {
                kept.push(attr);
            }
        }
        arg.attrs = kept;

        let name = match &*arg.pat {
            Pat::Ident(pat) => pat.ident.to_string().trim_start_matches('_').to_owned(),
            _ => String::new(),
        };
        let name = if name.is_empty() {
            format!("arg{}", index + 1)
        } else {
            name
        };

        params.push(Param { name, converter });
    }

    Ok(params)
}

/// Joins `#[doc = "..."]` lines into one paragraph.
fn doc_text(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter_map(|attr| match &attr.meta {
            syn::Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(s),
                    ..
                }) => Some(s.value().trim().to_owned()),
                _ => None,
            },
            _ => None,
        })
        .take_while(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join(" "))
    }
}
