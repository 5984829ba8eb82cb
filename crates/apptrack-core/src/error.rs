use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::handler::{HandlerError, RegistryError};
use crate::store::CatalogError;

/// Errors aborting a whole phase.
#[derive(Error, Debug)]
pub enum TrackError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Cannot build the HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Cannot write deployment list {path}: {source}")]
    Applist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of one product within a phase. Recorded in the phase summary,
/// never propagated past the engine loop.
#[derive(Error, Debug)]
pub enum ProductError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Handler(#[from] HandlerError),

    #[error("Approval failed: {0}")]
    Approval(anyhow::Error),
}
