//! The persisted catalog of tracked products.
//!
//! The catalog is a single JSON document holding, per product, the three
//! lifecycle slots `pulled`, `fetched` and `approved`. An empty slot is
//! written as `{}`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::product::{ProductId, ProductState};

/// Catalog schema version, rewritten on every load.
pub const CATALOG_VERSION: &str = "0.2.0";

/// Banner stored in the catalog file.
pub const CATALOG_WARNING: &str = "This file is managed by apptrack, do not edit.";

/// Catalog of all tracked products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Schema version of the file.
    #[serde(rename = "__version__", default = "default_version")]
    pub version: String,
    /// Do-not-edit banner.
    #[serde(rename = "__warning__", default = "default_warning")]
    pub warning: String,
    /// Naive local ISO-8601 timestamp of the last write.
    #[serde(default)]
    pub modified: Option<String>,
    /// Per-product lifecycle slots, sorted by id.
    #[serde(default)]
    pub products: BTreeMap<ProductId, CatalogEntry>,
}

fn default_version() -> String {
    CATALOG_VERSION.to_string()
}

fn default_warning() -> String {
    CATALOG_WARNING.to_string()
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// Create an empty catalog that has never been written.
    pub fn new() -> Self {
        Self {
            version: default_version(),
            warning: default_warning(),
            modified: None,
            products: BTreeMap::new(),
        }
    }

    /// Entry of a product, if the catalog knows it.
    pub fn entry(&self, id: &ProductId) -> Option<&CatalogEntry> {
        self.products.get(id)
    }

    /// Mutable entry of a product, created empty if absent.
    pub fn entry_mut(&mut self, id: &ProductId) -> &mut CatalogEntry {
        self.products.entry(id.clone()).or_default()
    }

    /// Approved state of a product, if any.
    pub fn approved(&self, id: &ProductId) -> Option<&ProductState> {
        self.entry(id).and_then(|entry| entry.approved.as_ref())
    }
}

/// Lifecycle slots of one product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Newer version found at the editor, not downloaded yet.
    #[serde(default, with = "slot")]
    pub pulled: Option<ProductState>,
    /// Downloaded and verified version, waiting for approval.
    #[serde(default, with = "slot")]
    pub fetched: Option<ProductState>,
    /// Version promoted to deployment.
    #[serde(default, with = "slot")]
    pub approved: Option<ProductState>,
}

impl CatalogEntry {
    /// Record a newer version found at the editor.
    pub fn record_pulled(&mut self, state: ProductState) {
        self.pulled = Some(state);
    }

    /// Record a downloaded installer and clear the `pulled` slot.
    pub fn record_fetched(&mut self, state: ProductState) {
        self.fetched = Some(state);
        self.pulled = None;
    }

    /// Promote the fetched state to `approved`.
    ///
    /// Returns the newly approved state, or `None` (and changes nothing) if
    /// no version is waiting for approval.
    pub fn approve(&mut self) -> Option<&ProductState> {
        let fetched = self.fetched.take()?;
        self.approved = Some(fetched);
        self.approved.as_ref()
    }
}

/// Serde adapter writing `None` as `{}`.
mod slot {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::product::ProductState;

    pub(super) fn serialize<S: Serializer>(
        value: &Option<ProductState>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(state) => state.serialize(serializer),
            None => serde_json::Map::new().serialize(serializer),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<ProductState>, D::Error> {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        match value {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(serde_json::Value::Object(map)) if map.is_empty() => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state(version: &str) -> ProductState {
        ProductState {
            name: "Example".to_string(),
            version: version.to_string(),
            ..ProductState::default()
        }
    }

    #[test]
    fn empty_slots_are_written_as_empty_objects() {
        let mut catalog = Catalog::new();
        catalog.entry_mut(&ProductId::new("example"));
        let value = serde_json::to_value(&catalog).unwrap();
        assert_eq!(
            value["products"]["example"],
            json!({"pulled": {}, "fetched": {}, "approved": {}})
        );
        assert_eq!(value["__version__"], CATALOG_VERSION);
        assert_eq!(value["modified"], serde_json::Value::Null);
    }

    #[test]
    fn reads_empty_objects_and_nulls_as_empty_slots() {
        let catalog: Catalog = serde_json::from_value(json!({
            "__version__": "0.1.0",
            "products": {
                "Example": {"pulled": {}, "fetched": null, "approved": {"version": "1.2.3"}}
            }
        }))
        .unwrap();
        let entry = catalog.entry(&ProductId::new("example")).unwrap();
        assert!(entry.pulled.is_none());
        assert!(entry.fetched.is_none());
        assert_eq!(entry.approved.as_ref().unwrap().version, "1.2.3");
        assert_eq!(catalog.warning, CATALOG_WARNING);
    }

    #[test]
    fn fetch_clears_pulled() {
        let mut entry = CatalogEntry::default();
        entry.record_pulled(state("1.1.0"));
        entry.record_fetched(state("1.1.0"));
        assert!(entry.pulled.is_none());
        assert_eq!(entry.fetched.as_ref().unwrap().version, "1.1.0");
    }

    #[test]
    fn approve_moves_fetched() {
        let mut entry = CatalogEntry {
            fetched: Some(state("2.0.0")),
            approved: Some(state("1.0.0")),
            ..CatalogEntry::default()
        };
        assert_eq!(entry.approve().unwrap().version, "2.0.0");
        assert!(entry.fetched.is_none());
        assert_eq!(entry.approved.as_ref().unwrap().version, "2.0.0");

        // nothing waiting: approved untouched
        assert!(entry.approve().is_none());
        assert_eq!(entry.approved.as_ref().unwrap().version, "2.0.0");
    }
}
