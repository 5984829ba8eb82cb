use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Secure hash algorithms the retrieval pipeline can compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    /// SHA-1, the fallback when no (supported) algorithm is requested.
    #[default]
    Sha1,
    /// SHA-256.
    Sha256,
    /// SHA-512.
    Sha512,
}

impl HashAlgorithm {
    /// Canonical lowercase name (`sha1`, `sha256`, `sha512`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    /// Look up an algorithm by name, ignoring case and dashes (`SHA-256`).
    ///
    /// Returns `None` for algorithms that are not supported.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "sha1" => Some(Self::Sha1),
            "sha256" => Some(Self::Sha256),
            "sha512" => Some(Self::Sha512),
            _ => None,
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A secure hash as published by an editor or observed on a download:
/// an algorithm name and a hex digest.
///
/// The algorithm is kept as a free-form name because editors may announce an
/// algorithm this tool cannot compute; such a hash is carried along but not
/// verified. Serialized as a two-element array `["sha256", "<hex>"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecureHash {
    algorithm: String,
    digest: String,
}

impl SecureHash {
    /// Create a hash from an algorithm name and a hex digest (lowercased).
    pub fn new(algorithm: impl Into<String>, digest: impl AsRef<str>) -> Self {
        Self {
            algorithm: algorithm.into(),
            digest: digest.as_ref().trim().to_ascii_lowercase(),
        }
    }

    /// Algorithm name as declared.
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Hex digest, lowercase.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// The algorithm, if this tool can compute it.
    pub fn supported_algorithm(&self) -> Option<HashAlgorithm> {
        HashAlgorithm::from_name(&self.algorithm)
    }

    /// `true` if both digests are equal (case-insensitive).
    pub fn matches_digest(&self, digest: &str) -> bool {
        self.digest.eq_ignore_ascii_case(digest.trim())
    }
}

impl std::fmt::Display for SecureHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.digest, self.algorithm)
    }
}

impl Serialize for SecureHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.algorithm)?;
        tuple.serialize_element(&self.digest)?;
        tuple.end()
    }
}

impl<'de> Deserialize<'de> for SecureHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PairVisitor;

        impl<'de> Visitor<'de> for PairVisitor {
            type Value = SecureHash;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("an [algorithm, hexdigest] pair")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let algorithm: String = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let digest: String = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                if seq.next_element::<de::IgnoredAny>()?.is_some() {
                    return Err(de::Error::invalid_length(3, &self));
                }
                Ok(SecureHash::new(algorithm, digest))
            }
        }

        deserializer.deserialize_tuple(2, PairVisitor)
    }
}
