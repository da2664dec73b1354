//! Declared dependencies.
//!
//! A recipe pins each external package to an exact version. The set is
//! static: it never depends on the active settings.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use serde::{Deserialize, Serialize};

/// Check a package name.
///
/// Names become file names (`<name>-config.cmake`, `<prefix>/<name>`) and
/// CMake identifiers (`<name>_DIR`, `<name>::<name>`), so only ASCII
/// letters, digits, `-`, `_`, `.` and `+` are accepted.
pub fn validate_package_name(name: &str) -> anyhow::Result<()> {
    if name.is_empty() {
        bail!("package name must not be empty");
    }
    if name == "." || name == ".." {
        bail!("invalid package name `{}`", name);
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '+')))
    {
        bail!("invalid character {:?} in package name `{}`", c, name);
    }
    Ok(())
}

/// Check a pinned version. Versions are opaque but name a directory in a
/// prefix tree.
pub fn validate_version(version: &str) -> anyhow::Result<()> {
    if version.trim().is_empty() {
        bail!("version must not be empty");
    }
    if version == "." || version == ".." {
        bail!("invalid version `{}`", version);
    }
    if version
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_whitespace() || c.is_control())
    {
        bail!("invalid version `{}`: separators and whitespace are not allowed", version);
    }
    Ok(())
}

/// A pinned package requirement (`glfw/3.4`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Requirement {
    pub name: String,
    pub version: String,
}

impl Requirement {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Requirement {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

impl FromStr for Requirement {
    type Err = anyhow::Error;

    /// Parse `name/version`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((name, version)) = s.split_once('/') else {
            bail!("invalid requirement `{}`: expected NAME/VERSION", s);
        };
        if name.is_empty() || version.is_empty() {
            bail!("invalid requirement `{}`: expected NAME/VERSION", s);
        }
        validate_package_name(name)?;
        validate_version(version)?;
        Ok(Requirement::new(name, version))
    }
}

/// The set of pinned requirements, unique by package name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencySpec {
    packages: BTreeMap<String, String>,
}

impl DependencySpec {
    pub fn new() -> Self {
        DependencySpec::default()
    }

    /// Add a requirement. A later requirement for the same name replaces the earlier one.
    pub fn require(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.packages.insert(name.into(), version.into());
        self
    }

    /// Pinned version for a package.
    pub fn version_of(&self, name: &str) -> Option<&str> {
        self.packages.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Iterate over the requirements (sorted by name).
    pub fn iter(&self) -> impl Iterator<Item = Requirement> + '_ {
        self.packages
            .iter()
            .map(|(name, version)| Requirement::new(name, version))
    }

    /// The `{name: version}` mapping.
    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.packages
    }
}

impl FromIterator<Requirement> for DependencySpec {
    fn from_iter<T: IntoIterator<Item = Requirement>>(iter: T) -> Self {
        DependencySpec {
            packages: iter.into_iter().map(|r| (r.name, r.version)).collect(),
        }
    }
}
