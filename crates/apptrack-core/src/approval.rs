//! Approval strategies for fetched versions.

use apptrack_schema::{ProductId, ProductState};

/// Decides whether a fetched version is promoted to deployment.
pub trait Approver: Send {
    /// `Ok(true)` approves `candidate`. An error aborts the approval of this
    /// product only.
    fn approve(&mut self, id: &ProductId, candidate: &ProductState) -> anyhow::Result<bool>;
}

/// Approves every fetched version (`run`, `approve -y`).
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl Approver for AutoApprove {
    fn approve(&mut self, _: &ProductId, _: &ProductState) -> anyhow::Result<bool> {
        Ok(true)
    }
}

/// Rejects every fetched version.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectAll;

impl Approver for RejectAll {
    fn approve(&mut self, _: &ProductId, _: &ProductState) -> anyhow::Result<bool> {
        Ok(false)
    }
}

impl<F> Approver for F
where
    F: FnMut(&ProductId, &ProductState) -> bool + Send,
{
    fn approve(&mut self, id: &ProductId, candidate: &ProductState) -> anyhow::Result<bool> {
        Ok(self(id, candidate))
    }
}
