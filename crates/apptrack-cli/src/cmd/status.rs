//! Status command: the catalog slots of every product

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use apptrack_core::schema::{Catalog, ProductState};
use apptrack_core::{CatalogStore, TrackerConfig};
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, Color, Table};
use crossterm::style::Stylize;

use super::load_config;

/// Placeholder for an empty slot.
const NONE: &str = "-";

pub fn status(path: &Path) -> Result<bool> {
    let config = load_config(path)?;
    let store = CatalogStore::new(&config.core.store);
    let catalog = store.load().context("Failed to read the catalog")?;

    println!("{} {}", "Catalog".bold(), store.path().display());
    match &catalog.modified {
        Some(modified) => println!("{} {modified}", "Modified".bold()),
        None => println!("{} never", "Modified".bold()),
    }
    println!();
    println!("{}", status_table(&config, &catalog));
    Ok(true)
}

/// One row per configured or catalogued product.
pub fn status_table(config: &TrackerConfig, catalog: &Catalog) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED).set_header(vec![
        "Product", "Handler", "Set", "Pulled", "Fetched", "Approved",
    ]);

    let ids: BTreeSet<_> = config.products.keys().chain(catalog.products.keys()).collect();
    for id in ids {
        let entry = catalog.entry(id);
        let name = match config.product(id) {
            Some(product) if product.enabled => Cell::new(id),
            Some(_) => Cell::new(format!("{id} (disabled)")).fg(Color::DarkGrey),
            None => Cell::new(format!("{id} (not configured)")).fg(Color::DarkGrey),
        };
        let (handler, set) = if config.product(id).is_some() {
            (config.handler_name(id), config.set_of(id))
        } else {
            (NONE, NONE)
        };
        let pulled = version_of(entry.and_then(|e| e.pulled.as_ref()));
        let fetched = version_of(entry.and_then(|e| e.fetched.as_ref()));
        let approved = version_of(entry.and_then(|e| e.approved.as_ref()));

        table.add_row(vec![
            name,
            Cell::new(handler),
            Cell::new(set),
            Cell::new(pulled).fg(if pulled == NONE { Color::Reset } else { Color::Yellow }),
            Cell::new(fetched).fg(if fetched == NONE { Color::Reset } else { Color::Cyan }),
            Cell::new(approved).fg(if approved == NONE { Color::Reset } else { Color::Green }),
        ]);
    }
    table
}

fn version_of(state: Option<&ProductState>) -> &str {
    state.map_or(NONE, |state| state.version.as_str())
}
