//! Command registry.
//!
//! The [`Registry`] maps every alias to exactly one [`CommandSpec`] through a
//! single alias index built at registration time. It is filled once at
//! startup and then shared read-only behind an `Arc`, so lookups during
//! message handling need no locking.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::spec::CommandSpec;
use crate::error::{CommandError, CommandResult};

/// Registry of all known commands, keyed by alias.
///
/// # Example
///
/// ```rust,ignore
/// let mut registry = Registry::new();
/// registry.add(command("ping").aliases("p").handler(ping)?)?;
///
/// assert!(registry.get("p").is_some());
/// for spec in &registry {
///     println!("{}", spec.usage());
/// }
/// ```
#[derive(Debug, Default)]
pub struct Registry {
    /// Commands in registration order.
    commands: Vec<Arc<CommandSpec>>,
    /// Alias → position in `commands`.
    index: HashMap<String, usize>,
    /// Every alias with its command position, longest alias first.
    by_length: Vec<(String, usize)>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command under all of its aliases.
    ///
    /// Fails with [`CommandError::DuplicateAlias`] if any alias already
    /// belongs to a registered command; the registry is left unchanged.
    pub fn add(&mut self, spec: impl Into<Arc<CommandSpec>>) -> CommandResult<Arc<CommandSpec>> {
        let spec = spec.into();

        if let Some((alias, &owner)) = spec
            .aliases()
            .iter()
            .find_map(|alias| self.index.get_key_value(alias.as_str()))
        {
            return Err(CommandError::DuplicateAlias {
                alias: alias.clone(),
                owner: self.commands[owner].name().to_owned(),
            });
        }

        let position = self.commands.len();
        for alias in spec.aliases() {
            self.index.insert(alias.clone(), position);
            self.by_length.push((alias.clone(), position));
        }
        // Stable sort keeps registration order among equal lengths.
        self.by_length.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        self.commands.push(Arc::clone(&spec));

        debug!(command = spec.name(), aliases = ?spec.aliases(), "command registered");
        Ok(spec)
    }

    /// Looks up a command by any of its aliases.
    pub fn get(&self, alias: &str) -> Option<&Arc<CommandSpec>> {
        self.index.get(alias).map(|&position| &self.commands[position])
    }

    /// Looks up a command by alias, returning `fallback` if it is absent.
    pub fn get_or<'a>(&'a self, alias: &str, fallback: &'a Arc<CommandSpec>) -> &'a Arc<CommandSpec> {
        self.get(alias).unwrap_or(fallback)
    }

    /// Returns `true` if `alias` belongs to a registered command.
    pub fn contains(&self, alias: &str) -> bool {
        self.index.contains_key(alias)
    }

    /// Iterates over all registered commands in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Arc<CommandSpec>> {
        self.commands.iter()
    }

    /// Number of registered commands.
    ///
    /// Note: This counts commands, not aliases.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if no command is registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Finds the longest alias that `text` starts with.
    pub(crate) fn match_alias(&self, text: &str) -> Option<(&str, &Arc<CommandSpec>)> {
        self.by_length
            .iter()
            .find(|(alias, _)| text.starts_with(alias.as_str()))
            .map(|(alias, position)| (alias.as_str(), &self.commands[*position]))
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a Arc<CommandSpec>;
    type IntoIter = std::slice::Iter<'a, Arc<CommandSpec>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::spec::command;
    use crate::context::InvocationContext;

    async fn ping(_ctx: Arc<InvocationContext>) {}

    async fn poll(_ctx: Arc<InvocationContext>) {}

    #[test]
    fn test_add_and_get() {
        let mut registry = Registry::new();
        let spec = registry
            .add(command("ping").aliases(["p", "pong"]).handler(ping).unwrap())
            .unwrap();

        for alias in ["ping", "p", "pong"] {
            assert!(Arc::ptr_eq(registry.get(alias).unwrap(), &spec));
        }
        assert!(registry.get("pin").is_none());
        assert!(registry.contains("pong"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_or_fallback() {
        let mut registry = Registry::new();
        let spec = registry.add(command("ping").handler(ping).unwrap()).unwrap();
        let fallback = Arc::new(command("help").handler(poll).unwrap());

        assert!(Arc::ptr_eq(registry.get_or("ping", &fallback), &spec));
        assert!(Arc::ptr_eq(registry.get_or("nope", &fallback), &fallback));
    }

    #[test]
    fn test_duplicate_alias_is_atomic() {
        let mut registry = Registry::new();
        registry
            .add(command("ping").aliases("p").handler(ping).unwrap())
            .unwrap();

        let err = registry
            .add(command("poll").aliases(["survey", "p"]).handler(poll).unwrap())
            .unwrap_err();
        assert!(matches!(
            &err,
            CommandError::DuplicateAlias { alias, owner } if alias == "p" && owner == "ping"
        ));

        // Nothing of the failed command leaked into the index.
        assert!(registry.get("poll").is_none());
        assert!(registry.get("survey").is_none());
        assert_eq!(registry.get("p").unwrap().name(), "ping");
        assert_eq!(registry.len(), 1);
        assert!(registry.match_alias("survey").is_none());
    }

    #[test]
    fn test_duplicate_name() {
        let mut registry = Registry::new();
        registry.add(command("ping").handler(ping).unwrap()).unwrap();
        let err = registry
            .add(command("ping").handler(poll).unwrap())
            .unwrap_err();
        assert!(matches!(err, CommandError::DuplicateAlias { .. }));
    }

    #[test]
    fn test_iteration_is_restartable_and_ordered() {
        let mut registry = Registry::new();
        registry.add(command("ping").handler(ping).unwrap()).unwrap();
        registry.add(command("poll").handler(poll).unwrap()).unwrap();

        let first: Vec<_> = registry.iter().map(|spec| spec.name().to_owned()).collect();
        let second: Vec<_> = (&registry).into_iter().map(|spec| spec.name().to_owned()).collect();
        assert_eq!(first, vec!["ping", "poll"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_match_alias_prefers_longest() {
        let mut registry = Registry::new();
        registry.add(command("p").handler(ping).unwrap()).unwrap();
        registry.add(command("poll").handler(poll).unwrap()).unwrap();

        let (alias, spec) = registry.match_alias("poll now").unwrap();
        assert_eq!(alias, "poll");
        assert_eq!(spec.name(), "poll");

        let (alias, _) = registry.match_alias("pizza").unwrap();
        assert_eq!(alias, "p");
    }
}
