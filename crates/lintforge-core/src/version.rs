//! Dependency references and resolved versions.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ForgeError;
use crate::Result;

/// The literal that asks the registry for its newest version.
pub const LATEST: &str = "latest";

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^v(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(-[0-9A-Za-z-]+(\.[0-9A-Za-z-]+)*)?(\+[0-9A-Za-z-]+(\.[0-9A-Za-z-]+)*)?$",
        )
        .expect("version pattern is valid")
    })
}

/// A requested version: the moving `latest` or one exact version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VersionSpec {
    Latest,
    Exact(String),
}

impl VersionSpec {
    /// Parse user input. Empty input means latest.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() || input == LATEST {
            return Ok(VersionSpec::Latest);
        }
        if version_pattern().is_match(input) {
            Ok(VersionSpec::Exact(input.to_string()))
        } else {
            Err(ForgeError::InvalidVersion(input.to_string()))
        }
    }

    pub fn is_latest(&self) -> bool {
        matches!(self, VersionSpec::Latest)
    }
}

impl FromStr for VersionSpec {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self> {
        VersionSpec::parse(s)
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSpec::Latest => f.write_str(LATEST),
            VersionSpec::Exact(v) => f.write_str(v),
        }
    }
}

/// A registry module and the version wanted from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRef {
    /// Registry path, e.g. `example.org/lint/policy`
    pub name: String,
    pub version: VersionSpec,
}

impl DependencyRef {
    pub fn new(name: &str, version: &str) -> Result<Self> {
        Ok(DependencyRef {
            name: name.trim().to_string(),
            version: VersionSpec::parse(version)?,
        })
    }
}

impl fmt::Display for DependencyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// A concrete version as reported by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedVersion {
    #[serde(rename = "Version")]
    pub version: String,
    /// Publication time as sent by the registry (RFC 3339)
    #[serde(rename = "Time", default)]
    pub time: String,
}

impl ResolvedVersion {
    pub fn new(version: &str, time: &str) -> Self {
        ResolvedVersion {
            version: version.to_string(),
            time: time.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_latest() {
        assert_eq!(VersionSpec::parse("latest").unwrap(), VersionSpec::Latest);
        assert_eq!(VersionSpec::parse("").unwrap(), VersionSpec::Latest);
        assert_eq!(VersionSpec::parse("  ").unwrap(), VersionSpec::Latest);
    }

    #[test]
    fn test_parse_exact() {
        for v in [
            "v1.2.3",
            "v0.0.0",
            "v2.0.0-rc.1",
            "v0.0.0-20240101120000-abcdef123456",
            "v1.0.0+incompatible",
        ] {
            assert_eq!(VersionSpec::parse(v).unwrap(), VersionSpec::Exact(v.to_string()));
        }
    }

    #[test]
    fn test_parse_rejects_invalid() {
        for v in ["1.2.3", "v1.2", "v01.2.3", "LATEST", "v1.2.3-", "master"] {
            assert!(
                matches!(VersionSpec::parse(v), Err(ForgeError::InvalidVersion(_))),
                "{v} should be rejected"
            );
        }
    }

    #[test]
    fn test_dependency_display() {
        let dep = DependencyRef::new("example.org/policy", "latest").unwrap();
        assert_eq!(dep.to_string(), "example.org/policy@latest");
        assert!(dep.version.is_latest());
    }

    #[test]
    fn test_resolved_version_from_registry_json() {
        let json = r#"{"Version":"v3.0.0","Time":"2024-05-01T10:00:00Z","Origin":{"VCS":"git"}}"#;
        let resolved: ResolvedVersion = serde_json::from_str(json).unwrap();
        assert_eq!(resolved, ResolvedVersion::new("v3.0.0", "2024-05-01T10:00:00Z"));
    }
}
