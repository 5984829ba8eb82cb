//! Outcome of the tracking phases.

use apptrack_schema::ProductId;

/// A step of the product lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Look for newer versions at the editors.
    Pull,
    /// Download and verify the installers of pulled versions.
    Fetch,
    /// Promote fetched versions to deployment.
    Approve,
    /// Regenerate the deployment lists.
    Make,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pull => "pull",
            Self::Fetch => "fetch",
            Self::Approve => "approve",
            Self::Make => "make",
        }
    }

    /// Human readable title, used for report headings.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Pull => "New versions found",
            Self::Fetch => "Installers fetched",
            Self::Approve => "Versions approved",
            Self::Make => "Deployment lists",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-product outcome of one phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseSummary {
    pub phase: Phase,
    /// Products whose catalog entry moved forward.
    pub updated: Vec<ProductId>,
    /// Products checked without change (no newer version, not approved).
    pub unchanged: Vec<ProductId>,
    /// Disabled products and products with nothing to do in this phase.
    pub skipped: Vec<ProductId>,
    /// Products whose processing failed, with the cause.
    pub failed: Vec<(ProductId, String)>,
}

impl PhaseSummary {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            updated: Vec::new(),
            unchanged: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// `false` when any product failed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn is_failed(&self, id: &ProductId) -> bool {
        self.failed.iter().any(|(failed, _)| failed == id)
    }
}

impl std::fmt::Display for PhaseSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} updated, {} unchanged, {} skipped, {} failed",
            self.phase,
            self.updated.len(),
            self.unchanged.len(),
            self.skipped.len(),
            self.failed.len()
        )
    }
}

/// Summaries of a full `run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub phases: Vec<PhaseSummary>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.phases.iter().all(PhaseSummary::is_success)
    }

    pub fn phase(&self, phase: Phase) -> Option<&PhaseSummary> {
        self.phases.iter().find(|s| s.phase == phase)
    }
}
