/// Target platform of an installer.
///
/// The deployment tool uses the target to skip installers that do not match
/// the architecture of the workstation.
///
/// # Example
///
/// ```
/// use apptrack_schema::Target;
///
/// let target: Target = "x64".parse().unwrap();
/// assert_eq!(target.to_string(), "x64");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// The installer works only on 32-bit systems.
    X86,
    /// The installer works only on 64-bit systems.
    X64,
    /// The installer works on both architectures (default).
    #[default]
    Unified,
}

impl Target {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::X64 => "x64",
            Self::Unified => "unified",
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "x86" | "i386" | "i686" | "win32" => Ok(Self::X86),
            "x64" | "x86_64" | "amd64" | "win64" => Ok(Self::X64),
            "unified" | "universal" => Ok(Self::Unified),
            _ => Err(format!("Unknown target: {s}")),
        }
    }
}
