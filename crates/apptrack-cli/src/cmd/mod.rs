pub mod check;
pub mod hash;
pub mod status;
pub mod track;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use apptrack_core::{HandlerRegistry, Tracker, TrackerConfig};

use crate::ui::ConsoleReporter;

/// Read the configuration file, ready to be validated.
pub fn load_config(path: &Path) -> Result<TrackerConfig> {
    TrackerConfig::load(path).with_context(|| format!("Invalid configuration {}", path.display()))
}

/// Build a tracker over the built-in handlers, reporting to the console.
pub fn tracker(path: &Path) -> Result<Tracker> {
    let config = load_config(path)?;
    let reporter = Arc::new(ConsoleReporter::new(config.core.reports.clone()));
    let tracker = Tracker::new(config, HandlerRegistry::with_builtin())
        .with_context(|| format!("Invalid configuration {}", path.display()))?;
    Ok(tracker.with_reporter(reporter))
}
