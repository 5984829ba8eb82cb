//! Semantic version identifiers and their precedence.
//!
//! Editors publish version strings following the Semantic Versioning 2.0.0
//! grammar (`major.minor.patch[-prerelease][+build]`). A [`Version`] is totally
//! ordered by SemVer precedence: build metadata is carried along for display
//! but never takes part in ordering, equality or hashing.
//!
//! # Example
//!
//! ```
//! use apptrack_schema::Version;
//!
//! let beta = Version::parse("1.0.0-beta+exp.sha.5114f85").unwrap();
//! let release = Version::parse("1.0.0").unwrap();
//! assert!(beta < release);
//! assert_eq!(beta, Version::parse("1.0.0-beta").unwrap());
//! assert_eq!(beta.to_string(), "1.0.0-beta+exp.sha.5114f85");
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A version string that violates the SemVer grammar.
#[derive(Error, Debug)]
#[error("malformed version '{input}': {source}")]
pub struct VersionError {
    input: String,
    #[source]
    source: semver::Error,
}

impl VersionError {
    /// The rejected input.
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// A parsed semantic version.
#[derive(Debug, Clone)]
pub struct Version(semver::Version);

impl Version {
    /// Parse a version string.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError`] if `s` is not a valid SemVer 2.0.0 string
    /// (negative or leading-zero numbers, empty identifiers, missing
    /// components, ...).
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        semver::Version::parse(s)
            .map(Self)
            .map_err(|source| VersionError {
                input: s.to_string(),
                source,
            })
    }

    /// Build metadata, or an empty string.
    pub fn build(&self) -> &str {
        self.0.build.as_str()
    }

    /// `true` for `0.y.z` versions and pre-releases.
    ///
    /// Informational only, it does not affect ordering.
    pub fn is_unstable(&self) -> bool {
        self.0.major == 0 || !self.0.pre.is_empty()
    }

    /// `true` if `self` has a strictly higher precedence than `other`.
    pub fn is_newer_than(&self, other: &Self) -> bool {
        self > other
    }
}

/// Compare two version strings. Returns true if `latest` is newer than `current`.
///
/// # Errors
///
/// Returns [`VersionError`] if either string is malformed.
pub fn is_newer(current: &str, latest: &str) -> Result<bool, VersionError> {
    let current = Version::parse(current)?;
    let latest = Version::parse(latest)?;
    Ok(latest.is_newer_than(&current))
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (&self.0, &other.0);
        a.major
            .cmp(&b.major)
            .then(a.minor.cmp(&b.minor))
            .then(a.patch.cmp(&b.patch))
            // An empty pre-release sorts after any non-empty one; identifiers
            // compare numerically when both are numeric, numeric ones lowest.
            .then_with(|| a.pre.cmp(&b.pre))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.major.hash(state);
        self.0.minor.hash(state);
        self.0.patch.hash(state);
        self.0.pre.hash(state);
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
