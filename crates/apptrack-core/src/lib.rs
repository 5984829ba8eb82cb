pub mod applist;
pub mod approval;
pub mod config;
pub mod engine;
pub mod error;
pub mod handler;
pub mod io;
pub mod paths;
pub mod reporter;
pub mod store;
pub mod summary;

pub use apptrack_schema as schema;
pub use approval::{Approver, AutoApprove, RejectAll};
pub use config::{ConfigError, TrackerConfig};
pub use engine::Tracker;
pub use error::{ProductError, TrackError};
pub use handler::{HandlerContext, HandlerError, HandlerRegistry, ProductHandler};
pub use reporter::{NullReporter, Reporter};
pub use store::{CatalogError, CatalogStore};
pub use summary::{Phase, PhaseSummary, RunSummary};

/// User Agent string for core operations
pub const USER_AGENT: &str = concat!("apptrack-core/", env!("CARGO_PKG_VERSION"));
