//! Adapter registry for resolving documentation references.
//!
//! Holds the named adapters active for a build. The registry is filled once
//! at startup and only read while pages are being parsed.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::sass::SassAdapter;
use crate::script::ScriptAdapter;
use crate::traits::{AdapterError, AdapterRef, AdapterResolution, DocAdapter};

/// A registry of named documentation adapters.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn DocAdapter>>,
}

impl AdapterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the bundled adapters, resolving patterns against `base_dir`.
    ///
    /// Registers `sass` and `js`.
    pub fn with_bundled(base_dir: &Path) -> Self {
        let mut registry = Self::new();
        registry.register("sass", SassAdapter::new(base_dir));
        registry.register("js", ScriptAdapter::new(base_dir));
        registry
    }

    /// Register an adapter under `name`, returning any adapter it replaces.
    pub fn register<A>(&mut self, name: impl Into<String>, adapter: A) -> Option<Arc<dyn DocAdapter>>
    where
        A: DocAdapter + 'static,
    {
        self.register_shared(name, Arc::new(adapter))
    }

    /// Register an already shared adapter under `name`.
    pub fn register_shared(
        &mut self,
        name: impl Into<String>,
        adapter: Arc<dyn DocAdapter>,
    ) -> Option<Arc<dyn DocAdapter>> {
        let name = name.into();
        tracing::debug!("Registered adapter '{}' ({})", name, adapter.name());
        self.adapters.insert(name, adapter)
    }

    /// Look up an adapter by name.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn DocAdapter>> {
        self.adapters.get(name).cloned()
    }

    /// Check if an adapter is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.adapters.contains_key(name)
    }

    /// All registered adapter names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Parse and categorize a documentation reference with the adapter
    /// registered under `name`.
    ///
    /// Returns `Ok(None)` when no such adapter is registered; the caller keeps
    /// the reference as it was declared. Adapter failures are passed through.
    pub async fn run(
        &self,
        name: &str,
        reference: &AdapterRef,
    ) -> Result<Option<AdapterResolution>, AdapterError> {
        let Some(adapter) = self.resolve(name) else {
            tracing::debug!("No adapter registered for '{}', leaving reference as-is", name);
            return Ok(None);
        };

        let raw = adapter.parse(reference).await?;
        let count = raw.len();
        let doclets = adapter.categorize(raw);

        tracing::debug!("Adapter '{}' produced {} doclets", name, count);

        Ok(Some(AdapterResolution {
            adapter: name.to_string(),
            doclets,
        }))
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("adapters", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{CategorizedDoclets, RawDoclets};
    use async_trait::async_trait;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl DocAdapter for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        async fn parse(&self, reference: &AdapterRef) -> Result<RawDoclets, AdapterError> {
            Ok(reference
                .patterns()?
                .into_iter()
                .map(|p| json!({ "kind": "pattern", "name": p }))
                .collect())
        }

        fn categorize(&self, doclets: RawDoclets) -> CategorizedDoclets {
            let mut out = CategorizedDoclets::new();
            out.insert("pattern".to_string(), doclets);
            out
        }
    }

    struct Broken;

    #[async_trait]
    impl DocAdapter for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn parse(&self, _: &AdapterRef) -> Result<RawDoclets, AdapterError> {
            Err(AdapterError::InvalidReference("always".to_string()))
        }

        fn categorize(&self, _: RawDoclets) -> CategorizedDoclets {
            CategorizedDoclets::new()
        }
    }

    #[test]
    fn registers_and_resolves() {
        let mut registry = AdapterRegistry::new();
        assert!(registry.register("style", Echo).is_none());
        assert!(registry.register("style", Echo).is_some());

        assert!(registry.contains("style"));
        assert!(registry.resolve("script").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn bundled_adapters_are_registered() {
        let registry = AdapterRegistry::with_bundled(Path::new("."));

        assert_eq!(registry.names(), vec!["js", "sass"]);
    }

    #[tokio::test]
    async fn runs_registered_adapter() {
        let mut registry = AdapterRegistry::new();
        registry.register("style", Echo);

        let resolution = registry
            .run("style", &AdapterRef::from("*.scss"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(resolution.adapter, "style");
        assert_eq!(
            resolution.doclets["pattern"],
            vec![json!({ "kind": "pattern", "name": "*.scss" })]
        );
    }

    #[tokio::test]
    async fn unknown_adapter_is_not_an_error() {
        let registry = AdapterRegistry::new();

        let result = registry.run("missing", &AdapterRef::from("x")).await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn adapter_errors_are_surfaced() {
        let mut registry = AdapterRegistry::new();
        registry.register("broken", Broken);

        let result = registry.run("broken", &AdapterRef::from("x")).await;

        assert!(matches!(result, Err(AdapterError::InvalidReference(_))));
    }
}
