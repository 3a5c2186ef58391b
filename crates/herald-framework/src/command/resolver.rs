//! Resolution of message text into a command.
//!
//! Resolution happens in two steps:
//!
//! 1. **Prefix**: the first configured prefix, in declared order, that the
//!    text starts with. Without one the message is not a command.
//! 2. **Alias**: among all registered aliases that the text continues with
//!    after the prefix, the longest wins. Equal lengths are decided by
//!    registration order, then by the command's own alias order. This keeps
//!    `x` from shadowing `x.y`.
//!
//! Whatever follows `prefix + alias` is the command content, untrimmed.

use std::sync::Arc;

use super::registry::Registry;
use super::spec::CommandSpec;

/// A message that resolved to a registered command.
#[derive(Debug, Clone)]
pub struct ResolvedCommand {
    prefix: String,
    alias: String,
    command: Arc<CommandSpec>,
}

impl ResolvedCommand {
    /// The prefix that matched.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The alias that matched.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// The command the alias belongs to.
    pub fn command(&self) -> &Arc<CommandSpec> {
        &self.command
    }

    /// The part of `text` after the prefix and alias.
    ///
    /// `text` must be the text this command was resolved from.
    pub fn content<'t>(&self, text: &'t str) -> &'t str {
        &text[self.prefix.len() + self.alias.len()..]
    }
}

/// The result of resolving one message.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// No configured prefix matched.
    NoPrefix,
    /// A prefix matched but no alias followed it.
    UnknownCommand {
        /// The prefix that matched.
        prefix: String,
    },
    /// A command was found.
    Command(ResolvedCommand),
}

impl Resolution {
    /// The matched prefix, if any.
    pub fn prefix(&self) -> Option<&str> {
        match self {
            Self::NoPrefix => None,
            Self::UnknownCommand { prefix } => Some(prefix),
            Self::Command(resolved) => Some(resolved.prefix()),
        }
    }

    /// The resolved command, if any.
    pub fn command(&self) -> Option<&ResolvedCommand> {
        match self {
            Self::Command(resolved) => Some(resolved),
            _ => None,
        }
    }
}

/// Resolves message text against a set of prefixes and a registry.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    prefixes: &'a [String],
    registry: &'a Registry,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver.
    pub fn new(prefixes: &'a [String], registry: &'a Registry) -> Self {
        Self { prefixes, registry }
    }

    /// Returns the first configured prefix that `text` starts with.
    pub fn prefix(&self, text: &str) -> Option<&'a str> {
        self.prefixes
            .iter()
            .map(String::as_str)
            .find(|prefix| text.starts_with(prefix))
    }

    /// Resolves `text`.
    pub fn resolve(&self, text: &str) -> Resolution {
        let Some(prefix) = self.prefix(text) else {
            return Resolution::NoPrefix;
        };

        let rest = &text[prefix.len()..];
        match self.registry.match_alias(rest) {
            Some((alias, command)) => Resolution::Command(ResolvedCommand {
                prefix: prefix.to_owned(),
                alias: alias.to_owned(),
                command: Arc::clone(command),
            }),
            None => Resolution::UnknownCommand {
                prefix: prefix.to_owned(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::spec::command;
    use crate::context::InvocationContext;

    async fn noop(_ctx: Arc<InvocationContext>) {}

    fn registry(commands: &[(&str, &[&str])]) -> Registry {
        let mut registry = Registry::new();
        for (name, aliases) in commands {
            let spec = command(*name).aliases(aliases.to_vec()).handler(noop).unwrap();
            registry.add(spec).unwrap();
        }
        registry
    }

    fn prefixes(values: &[&str]) -> Vec<String> {
        values.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_resolve_exact() {
        let registry = registry(&[("ping", &[])]);
        let prefixes = prefixes(&["py."]);
        let resolver = Resolver::new(&prefixes, &registry);

        let text = "py.ping";
        let resolution = resolver.resolve(text);
        let resolved = resolution.command().unwrap();
        assert_eq!(resolved.command().name(), "ping");
        assert_eq!(resolved.alias(), "ping");
        assert_eq!(resolved.content(text), "");
    }

    #[test]
    fn test_resolve_without_prefix() {
        let registry = registry(&[("ping", &[])]);
        let prefixes = prefixes(&["py."]);
        let resolver = Resolver::new(&prefixes, &registry);

        assert!(matches!(resolver.resolve("pyping"), Resolution::NoPrefix));
        assert!(resolver.resolve("pyping").prefix().is_none());
    }

    #[test]
    fn test_resolve_unknown_command() {
        let registry = registry(&[("ping", &[])]);
        let prefixes = prefixes(&["!"]);
        let resolver = Resolver::new(&prefixes, &registry);

        let resolution = resolver.resolve("!pong");
        assert_eq!(resolution.prefix(), Some("!"));
        assert!(resolution.command().is_none());
    }

    #[test]
    fn test_first_declared_prefix_wins() {
        let registry = registry(&[("ping", &[]), ("!ping", &[])]);
        let prefixes = prefixes(&["!", "!!"]);
        let resolver = Resolver::new(&prefixes, &registry);

        let resolution = resolver.resolve("!!ping");
        let resolved = resolution.command().unwrap();
        assert_eq!(resolved.prefix(), "!");
        assert_eq!(resolved.command().name(), "!ping");
    }

    #[test]
    fn test_content_is_not_trimmed() {
        let registry = registry(&[("say", &["s"])]);
        let prefixes = prefixes(&["!"]);
        let resolver = Resolver::new(&prefixes, &registry);

        let text = "!say  hello ";
        let resolution = resolver.resolve(text);
        let resolved = resolution.command().unwrap();
        let content = resolved.content(text);
        assert_eq!(content, "  hello ");
        assert_eq!(
            content.len(),
            text.len() - resolved.prefix().len() - resolved.alias().len()
        );
    }

    #[test]
    fn test_longest_alias_wins_regardless_of_order() {
        for order in [[("x", "x"), ("xy", "x.y")], [("xy", "x.y"), ("x", "x")]] {
            let mut registry = Registry::new();
            for (name, alias) in order {
                let spec = command(name).aliases(alias).handler(noop).unwrap();
                registry.add(spec).unwrap();
            }
            let prefixes = prefixes(&["!"]);
            let resolver = Resolver::new(&prefixes, &registry);

            let resolution = resolver.resolve("!x.y 1");
            let resolved = resolution.command().unwrap();
            assert_eq!(resolved.alias(), "x.y");
            assert_eq!(resolved.content("!x.y 1"), " 1");

            let resolution = resolver.resolve("!x 1");
            assert_eq!(resolution.command().unwrap().alias(), "x");
        }
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let registry = registry(&[("ping", &["p"]), ("poll", &["po"])]);
        let prefixes = prefixes(&["!"]);
        let resolver = Resolver::new(&prefixes, &registry);

        let first = resolver.resolve("!poll now");
        let second = resolver.resolve("!poll now");
        let (first, second) = (first.command().unwrap(), second.command().unwrap());
        assert!(Arc::ptr_eq(first.command(), second.command()));
        assert_eq!(first.alias(), second.alias());
        assert_eq!(first.content("!poll now"), second.content("!poll now"));
    }
}
