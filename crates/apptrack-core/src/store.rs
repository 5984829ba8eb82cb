//! Durable catalog storage: `<store>/catalog.json`.

use std::io::Write;
use std::path::{Path, PathBuf};

use apptrack_schema::{CATALOG_VERSION, Catalog};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::paths::catalog_path;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Cannot read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupted catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot write catalog {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    /// Catalog of the store directory `store`.
    pub fn new(store: &Path) -> Self {
        Self {
            path: catalog_path(store),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the catalog. An absent file is an empty catalog.
    pub fn load(&self) -> Result<Catalog, CatalogError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "Catalog {} does not exist, starting from an empty one",
                    self.path.display()
                );
                return Ok(Catalog::new());
            }
            Err(source) => {
                return Err(CatalogError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let mut catalog: Catalog =
            serde_json::from_str(&text).map_err(|source| CatalogError::Parse {
                path: self.path.clone(),
                source,
            })?;
        catalog.version = CATALOG_VERSION.to_string();
        debug!(
            "Catalog loaded from {} ({} products)",
            self.path.display(),
            catalog.products.len()
        );
        Ok(catalog)
    }

    /// Stamp `catalog.modified` and replace the catalog file atomically.
    pub fn save(&self, catalog: &mut Catalog) -> Result<(), CatalogError> {
        catalog.modified = Some(
            chrono::Local::now()
                .naive_local()
                .format("%Y-%m-%dT%H:%M:%S")
                .to_string(),
        );
        let write_err = |source: std::io::Error| CatalogError::Write {
            path: self.path.clone(),
            source,
        };

        let bytes = to_pretty_json(catalog).map_err(|e| write_err(std::io::Error::other(e)))?;
        let dir = self.path.parent().unwrap_or(Path::new("."));
        std::fs::create_dir_all(dir).map_err(write_err)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(&bytes).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;
        debug!("Catalog written to {}", self.path.display());
        Ok(())
    }
}

/// JSON with sorted keys and 4-space indentation.
fn to_pretty_json(catalog: &Catalog) -> serde_json::Result<Vec<u8>> {
    // Going through `Value` sorts every object's keys.
    let value = serde_json::to_value(catalog)?;
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    out.push(b'\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apptrack_schema::{ProductId, ProductState};

    #[test]
    fn absent_catalog_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = CatalogStore::new(dir.path()).load().unwrap();
        assert!(catalog.products.is_empty());
        assert!(catalog.modified.is_none());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = CatalogStore::new(dir.path());
        let mut catalog = Catalog::new();
        catalog.entry_mut(&ProductId::new("dummy")).record_pulled(ProductState {
            version: "1.0.1".to_string(),
            ..ProductState::default()
        });
        store.save(&mut catalog).unwrap();
        assert!(catalog.modified.is_some());

        let loaded = store.load().unwrap();
        assert_eq!(loaded, catalog);

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(text.starts_with("{\n    \"__version__\": \"0.2.0\",\n    \"__warning__\""));
        assert!(text.contains("\"fetched\": {}"));
        // only the catalog itself, no temporary file left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn version_is_rewritten_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = CatalogStore::new(dir.path());
        std::fs::write(
            store.path(),
            r#"{"__version__": "0.1.0", "modified": null, "products": {}}"#,
        )
        .unwrap();
        assert_eq!(store.load().unwrap().version, CATALOG_VERSION);
    }

    #[test]
    fn corrupted_catalog_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = CatalogStore::new(dir.path());
        std::fs::write(store.path(), "{ not json").unwrap();
        assert!(matches!(store.load(), Err(CatalogError::Parse { .. })));
    }
}
