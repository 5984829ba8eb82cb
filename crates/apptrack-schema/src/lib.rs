//! Shared data model of apptrack: versions, hashes, product states and the
//! catalog format.

pub mod catalog;
/// Secure hash algorithms and published digests.
pub mod hash;
/// Product identifiers and persisted product states.
pub mod product;
/// Installer target platforms.
pub mod target;
pub mod version;

// Re-exports
pub use catalog::{CATALOG_VERSION, CATALOG_WARNING, Catalog, CatalogEntry};
pub use hash::*;
pub use product::{ProductId, ProductState};
pub use target::Target;
pub use version::{Version, VersionError, is_newer};
