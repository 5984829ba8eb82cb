use std::path::PathBuf;

use anyhow::{Context, Result};
use apptrack_core::io::hashing::hash_file;
use apptrack_core::schema::HashAlgorithm;

/// Print the digest of each file, in the `sha256sum` layout.
pub async fn hash(files: &[PathBuf], algorithm: HashAlgorithm) -> Result<bool> {
    for path in files {
        let hash = hash_file(path, algorithm)
            .await
            .with_context(|| format!("Failed to hash {}", path.display()))?;
        println!("{}  {}", hash.digest(), path.display());
    }
    Ok(true)
}
