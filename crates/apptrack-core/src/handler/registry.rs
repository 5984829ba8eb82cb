use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use super::{DummyHandler, HandlerError, HandlerOptions, JsonFeedHandler, ProductHandler};

/// Builds a handler from its configuration options.
pub type HandlerFactory =
    Arc<dyn Fn(&HandlerOptions) -> Result<Box<dyn ProductHandler>, HandlerError> + Send + Sync>;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Unknown handler '{name}' (available: {available})")]
    Unknown { name: String, available: String },

    #[error("Handler '{name}' rejected its options: {source}")]
    Options {
        name: String,
        #[source]
        source: HandlerError,
    },
}

/// Compile-time registry mapping handler names to factories.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    factories: BTreeMap<String, HandlerFactory>,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

impl HandlerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in `dummy` and `json-feed` handlers.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(DummyHandler::NAME, DummyHandler::from_options);
        registry.register(JsonFeedHandler::NAME, JsonFeedHandler::from_options);
        registry
    }

    /// Register (or replace) a handler factory.
    pub fn register<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(&HandlerOptions) -> Result<Box<dyn ProductHandler>, HandlerError>
            + Send
            + Sync
            + 'static,
    {
        self.factories
            .insert(name.to_lowercase(), Arc::new(factory));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_lowercase())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Create a fresh handler instance.
    pub fn create(
        &self,
        name: &str,
        options: &HandlerOptions,
    ) -> Result<Box<dyn ProductHandler>, RegistryError> {
        let factory = self
            .factories
            .get(&name.to_lowercase())
            .ok_or_else(|| RegistryError::Unknown {
                name: name.to_string(),
                available: self.names().collect::<Vec<_>>().join(", "),
            })?;
        factory(options).map_err(|source| RegistryError::Options {
            name: name.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_handlers() {
        let registry = HandlerRegistry::with_builtin();
        assert_eq!(registry.names().collect::<Vec<_>>(), ["dummy", "json-feed"]);
        assert!(registry.contains("Dummy"));

        let handler = registry.create("dummy", &HandlerOptions::new()).unwrap();
        assert_eq!(handler.state().name, "Dummy Product");
    }

    #[test]
    fn unknown_and_rejected() {
        let registry = HandlerRegistry::with_builtin();
        let err = registry.create("nope", &HandlerOptions::new()).err().unwrap();
        assert!(matches!(err, RegistryError::Unknown { .. }));
        assert!(err.to_string().contains("json-feed"));

        let err = registry
            .create("json-feed", &HandlerOptions::new())
            .err().unwrap();
        assert!(matches!(err, RegistryError::Options { .. }));
    }
}
