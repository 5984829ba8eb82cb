//! Streaming secure hashes over the supported algorithms.

use std::path::Path;

use apptrack_schema::{HashAlgorithm, SecureHash};
use sha2::Digest;
use tokio::io::AsyncReadExt;

/// Incremental hasher for one of the supported algorithms.
pub enum StreamingHasher {
    Sha1(sha1::Sha1),
    Sha256(sha2::Sha256),
    Sha512(sha2::Sha512),
}

impl StreamingHasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha1 => Self::Sha1(sha1::Sha1::new()),
            HashAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Sha512 => Self::Sha512(sha2::Sha512::new()),
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        match self {
            Self::Sha1(_) => HashAlgorithm::Sha1,
            Self::Sha256(_) => HashAlgorithm::Sha256,
            Self::Sha512(_) => HashAlgorithm::Sha512,
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha1(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
        }
    }

    /// Consume the hasher and return the lowercase hex digest.
    pub fn finalize_hex(self) -> String {
        match self {
            Self::Sha1(h) => hex::encode(h.finalize()),
            Self::Sha256(h) => hex::encode(h.finalize()),
            Self::Sha512(h) => hex::encode(h.finalize()),
        }
    }

    pub fn finalize(self) -> SecureHash {
        let algorithm = self.algorithm();
        SecureHash::new(algorithm.as_str(), self.finalize_hex())
    }
}

impl std::fmt::Debug for StreamingHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StreamingHasher")
            .field(&self.algorithm())
            .finish()
    }
}

/// Compute the secure hash of a local file.
pub async fn hash_file(path: &Path, algorithm: HashAlgorithm) -> std::io::Result<SecureHash> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = StreamingHasher::new(algorithm);
    let mut buffer = vec![0u8; 8192];
    loop {
        let count = file.read(&mut buffer).await?;
        if count == 0 {
            break;
        }
        hasher.update(&buffer[..count]);
    }
    Ok(hasher.finalize())
}
