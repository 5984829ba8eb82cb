//! Tracker configuration, read from a TOML file.
//!
//! ```toml
//! [core]
//! store = "/srv/apptrack"
//! reports = "/srv/reports"
//! timeout = 600
//!
//! [sets]
//! office = ["office", "all"]
//!
//! [products.firefox]
//! handler = "json-feed"
//! set = "office"
//! options = { feed = "https://example.com/firefox.json" }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use apptrack_schema::ProductId;
use serde::{Deserialize, Deserializer, de};
use thiserror::Error;
use tracing::{debug, warn};

use crate::handler::{HandlerOptions, HandlerRegistry, RegistryError};

/// Set used by products that do not name one.
pub const DEFAULT_SET: &str = "__all__";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("'core.store' must not be empty")]
    EmptyStore,

    #[error("Set '{set}' of product '{product}' is not declared in [sets]")]
    UndeclaredSet { product: ProductId, set: String },

    #[error("Product '{product}': {source}")]
    Handler {
        product: ProductId,
        #[source]
        source: RegistryError,
    },

    #[error("Set '{set}' names an invalid deployment list '{name}'")]
    InvalidList { set: String, name: String },

    #[error("Cannot create store directory {path}: {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackerConfig {
    pub core: CoreConfig,
    /// Set name -> deployment list names.
    #[serde(default)]
    pub sets: BTreeMap<String, Vec<String>>,
    /// Product tables, keyed by normalized id.
    #[serde(default, deserialize_with = "unique_products")]
    pub products: BTreeMap<ProductId, ProductConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoreConfig {
    /// Catalog, installers and deployment lists live here.
    pub store: PathBuf,
    /// Directory receiving one report file per phase.
    #[serde(default)]
    pub reports: Option<PathBuf>,
    /// Per-retrieval deadline, in seconds.
    #[serde(default)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductConfig {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Handler name, the product id when absent.
    #[serde(default)]
    pub handler: Option<String>,
    /// Installer directory, `<store>/<id>` when absent.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub set: Option<String>,
    #[serde(default)]
    pub options: HandlerOptions,
}

/// List names end up in `applist-<name>.txt` inside the store.
fn is_valid_list_name(name: &str) -> bool {
    !name.contains(['/', '\\']) && !name.contains("..")
}

/// Product ids name a directory of the store.
fn is_valid_product_id(id: &ProductId) -> bool {
    let id = id.as_str();
    !id.is_empty() && !id.starts_with('.') && !id.contains(['/', '\\'])
}

/// Product tables whose names differ only by case or surrounding blanks
/// designate the same product and are rejected.
fn unique_products<'de, D>(deserializer: D) -> Result<BTreeMap<ProductId, ProductConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    let tables = BTreeMap::<String, ProductConfig>::deserialize(deserializer)?;
    let mut names: BTreeMap<ProductId, String> = BTreeMap::new();
    let mut products = BTreeMap::new();
    for (name, product) in tables {
        let id = ProductId::new(&name);
        if !is_valid_product_id(&id) {
            return Err(de::Error::custom(format!("invalid product id '{name}'")));
        }
        if let Some(first) = names.insert(id.clone(), name.clone()) {
            return Err(de::Error::custom(format!(
                "products '{first}' and '{name}' share the id '{id}'"
            )));
        }
        products.insert(id, product);
    }
    Ok(products)
}

fn enabled_by_default() -> bool {
    true
}

impl Default for ProductConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            handler: None,
            path: None,
            set: None,
            options: HandlerOptions::new(),
        }
    }
}

impl TrackerConfig {
    /// Read and parse a configuration file. The result is not validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Configuration read from {}", path.display());
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Check the configuration against `registry` and create the store.
    ///
    /// Every enabled product must resolve to a handler accepting its options
    /// and reference a declared set.
    pub fn validate(&self, registry: &HandlerRegistry) -> Result<(), ConfigError> {
        if self.core.store.as_os_str().is_empty() {
            return Err(ConfigError::EmptyStore);
        }

        for (set, lists) in &self.sets {
            if lists.iter().all(|name| name.trim().is_empty()) {
                warn!("Set '{set}' contains no names or an empty one");
            }
            if let Some(name) = lists.iter().find(|name| !is_valid_list_name(name.trim())) {
                return Err(ConfigError::InvalidList {
                    set: set.clone(),
                    name: name.clone(),
                });
            }
        }

        for (id, product) in &self.products {
            if let Some(set) = &product.set {
                if !self.sets.contains_key(set) {
                    return Err(ConfigError::UndeclaredSet {
                        product: id.clone(),
                        set: set.clone(),
                    });
                }
            }
            if !product.enabled {
                debug!("{id}: tracking deactivated, handler not checked");
                continue;
            }
            registry
                .create(self.handler_name(id), &product.options)
                .map_err(|source| ConfigError::Handler {
                    product: id.clone(),
                    source,
                })?;
        }

        std::fs::create_dir_all(&self.core.store).map_err(|source| ConfigError::Store {
            path: self.core.store.clone(),
            source,
        })?;
        Ok(())
    }

    pub fn product(&self, id: &ProductId) -> Option<&ProductConfig> {
        self.products.get(id)
    }

    pub fn is_enabled(&self, id: &ProductId) -> bool {
        self.product(id).is_some_and(|p| p.enabled)
    }

    /// Handler name of a product, its id by default.
    pub fn handler_name<'a>(&'a self, id: &'a ProductId) -> &'a str {
        self.product(id)
            .and_then(|p| p.handler.as_deref())
            .unwrap_or(id.as_str())
    }

    /// Installer directory of a product, `<store>/<id>` by default.
    pub fn product_dir(&self, id: &ProductId) -> PathBuf {
        self.product(id)
            .and_then(|p| p.path.clone())
            .unwrap_or_else(|| self.core.store.join(id.as_str()))
    }

    /// Set of a product, [`DEFAULT_SET`] by default.
    pub fn set_of<'a>(&'a self, id: &ProductId) -> &'a str {
        self.product(id)
            .and_then(|p| p.set.as_deref())
            .unwrap_or(DEFAULT_SET)
    }

    /// Deployment lists a product belongs to.
    ///
    /// Empty when its set is not declared (only possible for the default set).
    pub fn lists_of(&self, id: &ProductId) -> Vec<&str> {
        self.sets
            .get(self.set_of(id))
            .map(|lists| {
                lists
                    .iter()
                    .map(|name| name.trim())
                    .filter(|name| !name.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every deployment list name referenced by `[sets]`, deduplicated.
    pub fn list_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .sets
            .values()
            .flatten()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.core.timeout.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(store: &Path, products: &str) -> TrackerConfig {
        let text = format!(
            "[core]\nstore = {:?}\n\n[sets]\noffice = [\"office\", \"all\"]\nall = [\"all\", \" \"]\n\n{products}",
            store.display().to_string()
        );
        TrackerConfig::from_toml(&text).unwrap()
    }

    #[test]
    fn defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), "[products.Dummy]\n");
        let id = ProductId::new("dummy");

        assert!(cfg.is_enabled(&id));
        assert_eq!(cfg.handler_name(&id), "dummy");
        assert_eq!(cfg.product_dir(&id), dir.path().join("dummy"));
        assert_eq!(cfg.set_of(&id), DEFAULT_SET);
        assert!(cfg.lists_of(&id).is_empty());
        assert_eq!(cfg.timeout(), None);
        assert_eq!(cfg.list_names(), ["all", "office"]);
        cfg.validate(&HandlerRegistry::with_builtin()).unwrap();
    }

    #[test]
    fn explicit_values() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(
            dir.path(),
            "[products.word]\nhandler = \"json-feed\"\nset = \"office\"\npath = \"/opt/word\"\noptions = { feed = \"http://x/word.json\" }\n",
        );
        let id = ProductId::new("word");
        assert_eq!(cfg.handler_name(&id), "json-feed");
        assert_eq!(cfg.product_dir(&id), PathBuf::from("/opt/word"));
        assert_eq!(cfg.lists_of(&id), ["office", "all"]);
        cfg.validate(&HandlerRegistry::with_builtin()).unwrap();
    }

    #[test]
    fn undeclared_set_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), "[products.dummy]\nset = \"games\"\n");
        assert!(matches!(
            cfg.validate(&HandlerRegistry::with_builtin()),
            Err(ConfigError::UndeclaredSet { .. })
        ));
    }

    #[test]
    fn unknown_handler_is_rejected_unless_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), "[products.unknown]\n");
        assert!(matches!(
            cfg.validate(&HandlerRegistry::with_builtin()),
            Err(ConfigError::Handler { .. })
        ));

        let cfg = config(dir.path(), "[products.unknown]\nenabled = false\n");
        cfg.validate(&HandlerRegistry::with_builtin()).unwrap();
    }

    #[test]
    fn syntax_and_missing_store() {
        assert!(matches!(
            TrackerConfig::from_toml("[core\n"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            TrackerConfig::from_toml("[sets]\n"),
            Err(ConfigError::Parse(_))
        ));
        let cfg = TrackerConfig::from_toml("[core]\nstore = \"\"\n").unwrap();
        assert!(matches!(
            cfg.validate(&HandlerRegistry::new()),
            Err(ConfigError::EmptyStore)
        ));
    }

    #[test]
    fn colliding_product_ids_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let text = format!(
            "[core]\nstore = {:?}\n\n[products.Dummy]\n\n[products.dummy]\nenabled = false\n",
            dir.path().display().to_string()
        );
        let err = TrackerConfig::from_toml(&text).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        let message = err.to_string();
        assert!(message.contains("'Dummy' and 'dummy'"), "{message}");
    }

    #[test]
    fn product_ids_stay_inside_the_store() {
        for name in ["\"../x\"", "\"a/b\"", "\" \""] {
            let text = format!("[core]\nstore = \"/srv/apptrack\"\n\n[products.{name}]\n");
            assert!(
                matches!(TrackerConfig::from_toml(&text), Err(ConfigError::Parse(_))),
                "{name}"
            );
        }
    }

    #[test]
    fn list_names_stay_inside_the_store() {
        let dir = tempfile::tempdir().unwrap();
        for list in ["../outside", "sub/list", "a\\\\b"] {
            let text = format!(
                "[core]\nstore = {:?}\n\n[sets]\noffice = [\"office\", {list:?}]\n",
                dir.path().display().to_string()
            );
            let cfg = TrackerConfig::from_toml(&text).unwrap();
            match cfg.validate(&HandlerRegistry::with_builtin()) {
                Err(ConfigError::InvalidList { set, name }) => {
                    assert_eq!(set, "office");
                    assert_eq!(name, list);
                }
                other => panic!("{list}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn unreadable_file() {
        let err = TrackerConfig::load(Path::new("/nonexistent/apptrack.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
