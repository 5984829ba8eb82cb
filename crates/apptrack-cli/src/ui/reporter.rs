//! Console reporter and phase report files

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use apptrack_core::schema::{ProductId, ProductState};
use apptrack_core::{Phase, PhaseSummary, Reporter};
use crossterm::style::Stylize;

use super::progress::format_download_progress;

/// Prints the phases to the terminal and collects one report per phase.
///
/// Reports are written to `<reports>/<phase>.txt` when a reports directory is
/// configured; otherwise they are only printed.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    reports: Option<PathBuf>,
    sections: Mutex<BTreeMap<Phase, Vec<String>>>,
    downloading: AtomicBool,
}

impl ConsoleReporter {
    pub fn new(reports: Option<PathBuf>) -> Self {
        Self {
            reports,
            ..Self::default()
        }
    }

    fn end_progress_line(&self) {
        if self.downloading.swap(false, Ordering::Relaxed) {
            eprintln!();
        }
    }

    fn take_sections(&self, phase: Phase) -> Vec<String> {
        self.sections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&phase)
            .unwrap_or_default()
    }
}

/// Text of a phase report.
pub fn render_report(phase: Phase, sections: &[String]) -> String {
    let title = phase.title();
    let mut text = format!("{title}\n{}\n", "=".repeat(title.len()));
    for section in sections {
        text.push('\n');
        text.push_str(section);
    }
    text
}

/// Write a phase report into `dir`, replacing the previous one.
pub fn write_report(dir: &Path, phase: Phase, sections: &[String]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create reports directory {}", dir.display()))?;
    let path = dir.join(format!("{phase}.txt"));
    std::fs::write(&path, render_report(phase, sections))
        .with_context(|| format!("Failed to write report {}", path.display()))?;
    Ok(path)
}

impl Reporter for ConsoleReporter {
    fn phase_started(&self, phase: Phase, products: usize) {
        println!(
            "{} {}",
            format!("==> {}", phase.title()).bold(),
            format!("({products} products)").dark_grey()
        );
    }

    fn progress(&self, id: &ProductId, current: u64, total: Option<u64>) {
        self.downloading.store(true, Ordering::Relaxed);
        let mut stderr = std::io::stderr().lock();
        let _ = write!(
            stderr,
            "\r    {:<24} {:<32}",
            id.as_str(),
            format_download_progress(current, total)
        );
        let _ = stderr.flush();
    }

    fn section(&self, phase: Phase, id: &ProductId, state: &ProductState) {
        self.end_progress_line();
        println!("  {} {:<24} {}", "✓".green(), id.as_str(), state.version);
        self.sections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(phase)
            .or_default()
            .push(format!("[{id}] {state}"));
    }

    fn publish(&self, phase: Phase) -> Result<()> {
        let sections = self.take_sections(phase);
        let Some(dir) = &self.reports else {
            return Ok(());
        };
        if sections.is_empty() {
            return Ok(());
        }
        let path = write_report(dir, phase, &sections)?;
        println!("  {} {}", "report:".dark_grey(), path.display());
        Ok(())
    }

    fn phase_finished(&self, summary: &PhaseSummary) {
        self.end_progress_line();
        for (id, cause) in &summary.failed {
            println!("  {} {:<24} {}", "✗".red(), id.as_str(), cause.as_str().red());
        }
        let line = format!(
            "{} updated, {} unchanged, {} skipped, {} failed",
            summary.updated.len(),
            summary.unchanged.len(),
            summary.skipped.len(),
            summary.failed.len()
        );
        if summary.is_success() {
            println!("  {}", line.green());
        } else {
            println!("  {}", line.red());
        }
        println!();
    }
}
