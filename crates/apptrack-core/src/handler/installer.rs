//! Shared installer download, composed by handlers that do not need a custom
//! `fetch_installer`.

use std::path::Path;

use apptrack_schema::ProductState;
use tracing::info;

use super::{HandlerContext, HandlerError};
use crate::io::retrieve::RetrievalRequest;
use crate::paths::installer_file_name;

/// Download the installer of `state` into `dir`, verified against the
/// published size and hash, and record the local file in `state`.
///
/// The file is named `<id>_v<version>_<target><ext>`. `state` is left
/// untouched on error.
pub async fn fetch_installer(
    ctx: &HandlerContext<'_>,
    state: &mut ProductState,
    dir: &Path,
) -> Result<(), HandlerError> {
    if state.location.trim().is_empty() {
        return Err(HandlerError::NoLocation(state.version.clone()));
    }

    let progress = |current: u64, total: Option<u64>| {
        ctx.reporter.progress(ctx.product, current, total);
    };
    let snapshot: &ProductState = state;
    let (path, retrieved) = RetrievalRequest::new(ctx.client, &snapshot.location)
        .expect_length(snapshot.known_size())
        .expect_hash(snapshot.secure_hash.clone())
        .with_progress(&progress)
        .with_timeout(ctx.timeout)
        .retrieve_into(dir, |retrieved| {
            installer_file_name(ctx.product, snapshot, &retrieved.file_name)
        })
        .await?;

    info!(
        "{} {} fetched to {} ({} bytes)",
        ctx.product,
        state.version,
        path.display(),
        retrieved.length
    );
    state.installer = path.display().to_string();
    state.file_size = i64::try_from(retrieved.length).unwrap_or(i64::MAX);
    state.secure_hash = Some(retrieved.hash);
    Ok(())
}
