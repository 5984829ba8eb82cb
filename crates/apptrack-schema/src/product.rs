use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;

use crate::hash::SecureHash;
use crate::target::Target;
use crate::version::{Version, VersionError};

/// A normalized product identifier, as declared in the configuration.
///
/// Identifiers are case-insensitive and stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductId(String);

impl ProductId {
    /// Create a new identifier, normalizing the input to lowercase.
    pub fn new(id: &str) -> Self {
        Self(id.trim().to_lowercase())
    }

    /// Return the normalized identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ProductId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl Serialize for ProductId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

/// Snapshot of a product at one point of its lifecycle.
///
/// This is the persisted part of a product handler: everything a handler
/// keeps for its own work (feed handles, parsed documents) lives outside this
/// struct and never reaches the catalog. Unknown keys are ignored when
/// reading; missing keys take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductState {
    /// Product name as published by the editor.
    pub name: String,
    /// Name shown to users, usually the name followed by the version.
    pub display_name: String,
    /// Version string, compliant with the editor's versioning rules.
    pub version: String,
    /// Publication date as announced by the editor (free-form, ISO-8601 when
    /// known).
    pub published: String,
    /// Target platform of the installer.
    pub target: Target,
    /// Short description of the product.
    pub description: String,
    /// Editor (vendor) name.
    pub editor: String,
    /// Editor web site.
    pub web_site_location: String,
    /// Product icon location.
    pub icon: Option<String>,
    /// Location of the release announce.
    pub announce_location: String,
    /// Location of the information feed the handler reads.
    pub feed_location: String,
    /// Location of the release notes.
    pub release_note_location: String,
    /// Summary of the changes of this version.
    pub change_summary: String,
    /// Remote location of the installer.
    pub location: String,
    /// Local path of the installer once fetched.
    pub installer: String,
    /// Installer size in bytes, `-1` when unknown.
    pub file_size: i64,
    /// Secure hash of the installer, when published or observed.
    pub secure_hash: Option<SecureHash>,
    /// Installer arguments for a standard installation.
    pub std_inst_args: String,
    /// Installer arguments for a silent installation.
    pub silent_inst_args: String,
}

impl Default for ProductState {
    fn default() -> Self {
        Self {
            name: String::new(),
            display_name: String::new(),
            version: "0.0.0".to_string(),
            published: String::new(),
            target: Target::default(),
            description: String::new(),
            editor: String::new(),
            web_site_location: String::new(),
            icon: None,
            announce_location: String::new(),
            feed_location: String::new(),
            release_note_location: String::new(),
            change_summary: String::new(),
            location: String::new(),
            installer: String::new(),
            file_size: -1,
            secure_hash: None,
            std_inst_args: String::new(),
            silent_inst_args: String::new(),
        }
    }
}

impl ProductState {
    /// Parse the version string.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError`] if the version is not a SemVer string.
    pub fn parsed_version(&self) -> Result<Version, VersionError> {
        Version::parse(&self.version)
    }

    /// Installer size, `None` when unknown.
    ///
    /// A zero or negative size means "unknown" and disables length checks.
    pub fn known_size(&self) -> Option<u64> {
        u64::try_from(self.file_size).ok().filter(|size| *size > 0)
    }

    /// Apply a partial JSON object to this state.
    ///
    /// Keys naming a persisted field overwrite it, unknown keys are ignored
    /// and fields absent from `fields` keep their current value.
    ///
    /// # Errors
    ///
    /// Returns an error if a value has the wrong type for its field (for
    /// example a string `file_size`); `self` is left unchanged in that case.
    pub fn merge_json(
        &mut self,
        fields: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), serde_json::Error> {
        let mut current = serde_json::to_value(&*self)?;
        if let serde_json::Value::Object(map) = &mut current {
            for (key, value) in fields {
                if map.contains_key(key) {
                    map.insert(key.clone(), value.clone());
                }
            }
        }
        *self = serde_json::from_value(current)?;
        Ok(())
    }
}

impl std::fmt::Display for ProductState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} {}", self.name, self.version)?;
        writeln!(f, "  Display name: {}", self.display_name)?;
        writeln!(f, "  Published:    {}", self.published)?;
        writeln!(f, "  Target:       {}", self.target)?;
        writeln!(f, "  Editor:       {}", self.editor)?;
        writeln!(f, "  Web site:     {}", self.web_site_location)?;
        writeln!(f, "  URL:          {}", self.location)?;
        writeln!(f, "  Installer:    {}", self.installer)?;
        match self.known_size() {
            Some(size) => writeln!(f, "  Size:         {size} bytes")?,
            None => writeln!(f, "  Size:         unknown")?,
        }
        match &self.secure_hash {
            Some(hash) => writeln!(f, "  Hash:         {hash}")?,
            None => writeln!(f, "  Hash:         none")?,
        }
        writeln!(f, "  Silent args:  {}", self.silent_inst_args)?;
        if !self.change_summary.is_empty() {
            writeln!(f, "  Changes:")?;
            for line in self.change_summary.lines() {
                writeln!(f, "    {line}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ProductState {
        ProductState {
            name: "Example".to_string(),
            display_name: "Example 2.1.0".to_string(),
            version: "2.1.0".to_string(),
            published: "2024-05-01T10:00:00".to_string(),
            target: Target::X64,
            location: "https://example.com/example-2.1.0.msi".to_string(),
            installer: "/srv/store/example/example_v2.1.0_x64.msi".to_string(),
            file_size: 1024,
            secure_hash: Some(SecureHash::new("sha256", "ab".repeat(32))),
            silent_inst_args: "/qn".to_string(),
            icon: Some("https://example.com/icon.png".to_string()),
            ..ProductState::default()
        }
    }

    #[test]
    fn product_id_is_case_insensitive() {
        assert_eq!(ProductId::new("FireFox"), ProductId::new("firefox"));
        assert_eq!(ProductId::new(" Dummy ").as_str(), "dummy");
    }

    #[test]
    fn json_roundtrip_keeps_every_field() {
        let state = sample();
        let json = serde_json::to_string(&state).unwrap();
        let back: ProductState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn missing_and_unknown_keys() {
        let state: ProductState =
            serde_json::from_value(json!({"name": "Partial", "_catalog_url": "x"})).unwrap();
        assert_eq!(state.name, "Partial");
        assert_eq!(state.version, "0.0.0");
        assert_eq!(state.file_size, -1);
        assert_eq!(state.target, Target::Unified);
    }

    #[test]
    fn merge_keeps_absent_fields() {
        let mut state = sample();
        let patch = json!({"version": "2.2.0", "unknown": true, "file_size": 2048});
        state.merge_json(patch.as_object().unwrap()).unwrap();
        assert_eq!(state.version, "2.2.0");
        assert_eq!(state.file_size, 2048);
        assert_eq!(state.name, "Example");
        assert_eq!(state.silent_inst_args, "/qn");
    }

    #[test]
    fn merge_rejects_wrong_types_without_side_effects() {
        let mut state = sample();
        let patch = json!({"version": "9.9.9", "file_size": "big"});
        assert!(state.merge_json(patch.as_object().unwrap()).is_err());
        assert_eq!(state, sample());
    }

    #[test]
    fn known_size_treats_non_positive_as_unknown() {
        let mut state = sample();
        assert_eq!(state.known_size(), Some(1024));
        state.file_size = -1;
        assert_eq!(state.known_size(), None);
        state.file_size = 0;
        assert_eq!(state.known_size(), None);
    }
}
