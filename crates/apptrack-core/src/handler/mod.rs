//! Product handlers: the per-product knowledge of where and how an editor
//! publishes its releases.
//!
//! A handler owns a [`ProductState`] and fills it from the editor's site
//! ([`ProductHandler::fetch_origin`]), then downloads the installer it
//! describes ([`ProductHandler::fetch_installer`]). Handlers are created by
//! name through the [`HandlerRegistry`], one instance per product and phase.

pub mod dummy;
pub mod feed;
pub mod installer;
pub mod registry;

use std::path::Path;
use std::time::Duration;

use apptrack_schema::{ProductId, ProductState, VersionError, is_newer};
use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::io::retrieve::RetrievalError;
use crate::reporter::Reporter;

pub use dummy::DummyHandler;
pub use feed::JsonFeedHandler;
pub use registry::{HandlerFactory, HandlerRegistry, RegistryError};

/// Options of a product handler, as written in the configuration.
pub type HandlerOptions = toml::Table;

#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error("Invalid product data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid handler options: {0}")]
    Options(String),

    #[error("No installer location for version {0}")]
    NoLocation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared resources handed to a handler for one operation.
#[derive(Clone, Copy)]
pub struct HandlerContext<'a> {
    pub client: &'a Client,
    pub product: &'a ProductId,
    pub reporter: &'a dyn Reporter,
    /// Per-retrieval deadline.
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for HandlerContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerContext")
            .field("product", self.product)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait ProductHandler: Send + Sync {
    /// The persisted state of the product.
    fn state(&self) -> &ProductState;

    fn state_mut(&mut self) -> &mut ProductState;

    /// Populate the state with the latest release published by the editor.
    ///
    /// `prior_version` is the approved version, if any. Errors are reserved
    /// for transport and parsing failures: finding no newer version is not
    /// an error.
    async fn fetch_origin(
        &mut self,
        ctx: &HandlerContext<'_>,
        prior_version: Option<&str>,
    ) -> Result<(), HandlerError>;

    /// Download and verify the installer described by the state into `dir`.
    ///
    /// On success `installer`, `file_size` and `secure_hash` describe the
    /// local file. On error the state is unchanged and no file is left
    /// behind.
    async fn fetch_installer(
        &mut self,
        ctx: &HandlerContext<'_>,
        dir: &Path,
    ) -> Result<(), HandlerError> {
        installer::fetch_installer(ctx, self.state_mut(), dir).await
    }

    /// `true` if this state is an update of `reference` (the deployed one).
    fn is_update(&self, reference: &ProductState) -> Result<bool, HandlerError> {
        Ok(is_newer(&reference.version, &self.state().version)?)
    }

    /// Restore the persisted fields from a catalog snapshot.
    fn load_state(&mut self, snapshot: &ProductState) {
        *self.state_mut() = snapshot.clone();
    }

    /// Snapshot of the persisted fields.
    fn dump_state(&self) -> ProductState {
        self.state().clone()
    }
}
