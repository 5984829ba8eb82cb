use std::path::{Path, PathBuf};

use apptrack_schema::{ProductId, ProductState};

/// Catalog path: <store>/catalog.json
pub fn catalog_path(store: &Path) -> PathBuf {
    store.join("catalog.json")
}

/// Deployment list path: <store>/applist-<name>.txt
pub fn applist_path(store: &Path, name: &str) -> PathBuf {
    store.join(format!("applist-{name}.txt"))
}

/// `true` if `file_name` looks like a deployment list generated by `make`.
pub fn is_applist_file(file_name: &str) -> bool {
    file_name.starts_with("applist-") && file_name.ends_with(".txt")
}

/// Extract the filename from a URL, ignoring the query string and fragment.
pub fn filename_from_url(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or("");
    path.split('/').next_back().unwrap_or("")
}

/// Extension of a remote file name, dot included (`.msi`), or empty.
pub fn extension_of(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(0) | None => "",
        Some(pos) => &file_name[pos..],
    }
}

/// Name of a fetched installer: `<id>_v<version>_<target><ext>`.
pub fn installer_file_name(id: &ProductId, state: &ProductState, remote_name: &str) -> String {
    format!(
        "{id}_v{}_{}{}",
        state.version,
        state.target,
        extension_of(remote_name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use apptrack_schema::Target;

    #[test]
    fn filename_from_url_strips_query() {
        assert_eq!(
            filename_from_url("https://example.com/dl/setup-1.2.exe?token=abc"),
            "setup-1.2.exe"
        );
        assert_eq!(filename_from_url("https://example.com/dl/"), "");
    }

    #[test]
    fn installer_name_uses_version_and_target() {
        let state = ProductState {
            version: "1.2.3".to_string(),
            target: Target::X64,
            ..ProductState::default()
        };
        let name = installer_file_name(&ProductId::new("Example"), &state, "setup.exe");
        assert_eq!(name, "example_v1.2.3_x64.exe");
        assert_eq!(
            installer_file_name(&ProductId::new("noext"), &state, "download"),
            "noext_v1.2.3_x64"
        );
    }

    #[test]
    fn applist_names() {
        let store = Path::new("/srv/store");
        assert_eq!(
            applist_path(store, "office"),
            Path::new("/srv/store/applist-office.txt")
        );
        assert!(is_applist_file("applist-office.txt"));
        assert!(!is_applist_file("catalog.json"));
    }
}
