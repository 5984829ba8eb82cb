//! Deployment lists (`applist-<name>.txt`) read by the deployment tool.
//!
//! One line per approved product:
//! `target;display_name;version;installer;silent_inst_args`.

use std::collections::BTreeMap;
use std::path::Path;

use apptrack_schema::{Catalog, ProductState};
use tracing::{debug, info, warn};

use crate::config::TrackerConfig;
use crate::error::TrackError;
use crate::paths::{applist_path, is_applist_file};
use crate::reporter::Reporter;
use crate::summary::{Phase, PhaseSummary};

pub const SEPARATOR: &str = ";";

const RULE: &str =
    "# ------------------------------------------------------------------------------\n";

/// Comment header of a list. Stamped with the catalog date so that an
/// unchanged catalog gives identical files.
pub fn header(name: &str, modified: Option<&str>) -> String {
    format!(
        "{RULE}\
         # This applist file generated on {} for '{name}'.\n\
         # This file is automatically generated, and must not be manually modified.\n\
         # Please modify the configuration file instead (apptrack.toml by default).\n\
         {RULE}",
        modified.unwrap_or("never")
    )
}

pub fn line(state: &ProductState) -> String {
    [
        state.target.as_str(),
        state.display_name.as_str(),
        state.version.as_str(),
        state.installer.as_str(),
        state.silent_inst_args.as_str(),
    ]
    .join(SEPARATOR)
}

/// Delete every deployment list of `store`.
pub fn remove_applists(store: &Path) -> Result<(), TrackError> {
    let entries = match std::fs::read_dir(store) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(source) => {
            return Err(TrackError::Applist {
                path: store.to_path_buf(),
                source,
            });
        }
    };
    for entry in entries.flatten() {
        let is_list = entry.file_type().is_ok_and(|t| t.is_file())
            && is_applist_file(&entry.file_name().to_string_lossy());
        if is_list {
            debug!("Deleting obsolete applist file {}", entry.path().display());
            std::fs::remove_file(entry.path()).map_err(|source| TrackError::Applist {
                path: entry.path(),
                source,
            })?;
        }
    }
    Ok(())
}

/// Regenerate the deployment lists of the store from the `approved` slots.
pub fn write_applists(
    config: &TrackerConfig,
    catalog: &Catalog,
    reporter: &dyn Reporter,
) -> Result<PhaseSummary, TrackError> {
    let store = &config.core.store;
    let mut summary = PhaseSummary::new(Phase::Make);
    remove_applists(store)?;

    let mut lists: BTreeMap<&str, String> = config
        .list_names()
        .into_iter()
        .map(|name| (name, header(name, catalog.modified.as_deref())))
        .collect();

    for (id, product) in &config.products {
        if !product.enabled {
            info!("{id}: tracking deactivated");
            summary.skipped.push(id.clone());
            continue;
        }
        let Some(entry) = catalog.entry(id) else {
            warn!("{id}: not found in the catalog");
            summary.skipped.push(id.clone());
            continue;
        };
        let Some(approved) = &entry.approved else {
            info!("{id}: no approved version");
            summary.skipped.push(id.clone());
            continue;
        };

        let names = config.lists_of(id);
        if names.is_empty() {
            debug!("{id}: set '{}' has no deployment list", config.set_of(id));
            summary.unchanged.push(id.clone());
            continue;
        }
        let entry_line = line(approved);
        for name in names {
            if let Some(content) = lists.get_mut(name) {
                content.push_str(&entry_line);
                content.push('\n');
            }
        }
        info!("{id}: adding '{}'", approved.display_name);
        reporter.section(Phase::Make, id, approved);
        summary.updated.push(id.clone());
    }

    for (name, content) in &lists {
        let path = applist_path(store, name);
        std::fs::write(&path, content).map_err(|source| TrackError::Applist { path, source })?;
    }
    debug!("{} deployment lists written", lists.len());
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apptrack_schema::Target;

    #[test]
    fn line_format() {
        let state = ProductState {
            target: Target::X64,
            display_name: "Example 2.1.0".to_string(),
            version: "2.1.0".to_string(),
            installer: "/srv/store/example/example_v2.1.0_x64.msi".to_string(),
            silent_inst_args: "/qn".to_string(),
            ..ProductState::default()
        };
        assert_eq!(
            line(&state),
            "x64;Example 2.1.0;2.1.0;/srv/store/example/example_v2.1.0_x64.msi;/qn"
        );
    }

    #[test]
    fn header_names_list_and_date() {
        let text = header("office", Some("2024-05-01T10:00:00"));
        assert!(text.contains("generated on 2024-05-01T10:00:00 for 'office'"));
        assert!(text.lines().all(|l| l.starts_with('#')));
    }
}
