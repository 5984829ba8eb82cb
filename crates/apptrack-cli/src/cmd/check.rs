use std::path::Path;

use anyhow::{Context, Result};
use apptrack_core::HandlerRegistry;
use crossterm::style::Stylize;

use super::load_config;

/// Validate the configuration without touching the catalog.
pub fn check(path: &Path) -> Result<bool> {
    let config = load_config(path)?;
    config
        .validate(&HandlerRegistry::with_builtin())
        .with_context(|| format!("Invalid configuration {}", path.display()))?;

    let enabled = config
        .products
        .keys()
        .filter(|id| config.is_enabled(id))
        .count();
    println!("{} {}", "✓".green(), path.display());
    println!(
        "  {} products ({enabled} enabled), {} deployment lists",
        config.products.len(),
        config.list_names().len()
    );
    println!("  store: {}", config.core.store.display());
    Ok(true)
}
