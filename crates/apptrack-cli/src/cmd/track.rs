//! The lifecycle commands: pull, fetch, approve, make and run.

use std::path::Path;

use anyhow::Result;
use apptrack_core::{Approver, AutoApprove};

use super::tracker;
use crate::ui::ConsoleApprover;

pub async fn pull(config: &Path) -> Result<bool> {
    let summary = tracker(config)?.pull().await?;
    Ok(summary.is_success())
}

pub async fn fetch(config: &Path) -> Result<bool> {
    let summary = tracker(config)?.fetch().await?;
    Ok(summary.is_success())
}

/// The prompt reads stdin, so the phase runs on a blocking thread.
pub async fn approve(config: &Path, yes: bool) -> Result<bool> {
    let config = config.to_path_buf();
    tokio::task::spawn_blocking(move || approve_blocking(&config, yes)).await?
}

fn approve_blocking(config: &Path, yes: bool) -> Result<bool> {
    let tracker = tracker(config)?;
    let mut auto = AutoApprove;
    let mut console = ConsoleApprover::stdio();
    let approver: &mut dyn Approver = if yes { &mut auto } else { &mut console };
    let summary = tracker.approve(approver)?;
    Ok(summary.is_success())
}

pub fn make(config: &Path) -> Result<bool> {
    let summary = tracker(config)?.make()?;
    Ok(summary.is_success())
}

pub async fn run(config: &Path) -> Result<bool> {
    let summary = tracker(config)?.run().await?;
    Ok(summary.is_success())
}
