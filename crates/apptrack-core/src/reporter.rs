//! Reporter trait for dependency injection
//!
//! This trait allows the engine to report progress and findings without
//! being coupled to a specific console or report format.

use apptrack_schema::{ProductId, ProductState};

use crate::summary::{Phase, PhaseSummary};

pub trait Reporter: Send + Sync {
    /// A phase starts over `products` configured products.
    fn phase_started(&self, phase: Phase, products: usize);

    /// Updates the progress of a download.
    fn progress(&self, id: &ProductId, current: u64, total: Option<u64>);

    /// Adds a product section to the report of a phase.
    fn section(&self, phase: Phase, id: &ProductId, state: &ProductState);

    /// Publishes the report of a phase. Failures are logged by the caller and
    /// never abort a run.
    fn publish(&self, phase: Phase) -> anyhow::Result<()>;

    /// A phase is over.
    fn phase_finished(&self, summary: &PhaseSummary);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn phase_started(&self, phase: Phase, products: usize) {
        (**self).phase_started(phase, products);
    }
    fn progress(&self, id: &ProductId, current: u64, total: Option<u64>) {
        (**self).progress(id, current, total);
    }
    fn section(&self, phase: Phase, id: &ProductId, state: &ProductState) {
        (**self).section(phase, id, state);
    }
    fn publish(&self, phase: Phase) -> anyhow::Result<()> {
        (**self).publish(phase)
    }
    fn phase_finished(&self, summary: &PhaseSummary) {
        (**self).phase_finished(summary);
    }
}

/// A no-op reporter for silent operations (e.g., testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn phase_started(&self, _: Phase, _: usize) {}
    fn progress(&self, _: &ProductId, _: u64, _: Option<u64>) {}
    fn section(&self, _: Phase, _: &ProductId, _: &ProductState) {}
    fn publish(&self, _: Phase) -> anyhow::Result<()> {
        Ok(())
    }
    fn phase_finished(&self, _: &PhaseSummary) {}
}
