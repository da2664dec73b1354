//! Build directory layout.
//!
//! The build directory name is derived from a declared list of settings
//! (the build folder key), so that two configurations differing in any of
//! those settings never share a build tree, while changes to any other
//! setting leave the directory name untouched.
//!
//! ```text
//! build-folder-vars = ["os", "os.api_level?", "arch", "compiler", "compiler.version"]
//!
//! os=windows arch=x86_64 compiler=msvc compiler.version=193
//!     -> build/windows-x86_64-msvc-193
//! os=android os.api_level=31 arch=armv8 compiler=clang compiler.version=15
//!     -> build/android-31-armv8-clang-15
//! ```
//!
//! Inside a value, `%` and `-` are percent-encoded (`apple-clang` becomes
//! `apple%2Dclang`) so that the separator only ever appears between values.
//! Values that cannot name a single directory are rejected.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::core::settings::{Setting, Settings, SettingsError};

/// Separator between setting values in a build folder name.
pub const SEPARATOR: &str = "-";

/// Name of the generated-artifacts directory inside a build directory.
pub const GENERATORS_DIR: &str = "generators";

/// A declared setting was not supplied.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("missing setting `{key}` required by the build folder layout")]
pub struct MissingSettingError {
    /// The dotted setting name (e.g. `compiler.version`)
    pub key: String,
}

/// A setting value that cannot be part of a folder name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("setting `{key}` = `{value}` cannot be used in a build folder name: {reason}")]
pub struct InvalidFolderValueError {
    pub key: String,
    pub value: String,
    pub reason: &'static str,
}

/// Why a build folder name could not be computed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error(transparent)]
    MissingSetting(#[from] MissingSettingError),

    #[error(transparent)]
    InvalidValue(#[from] InvalidFolderValueError),
}

/// Encode one setting value as a folder name component.
fn encode_value(key: Setting, value: &str) -> Result<String, InvalidFolderValueError> {
    let invalid = |reason| InvalidFolderValueError {
        key: key.as_str().to_string(),
        value: value.to_string(),
        reason,
    };

    if value.is_empty() {
        return Err(invalid("the value is empty"));
    }
    if value == "." || value == ".." {
        return Err(invalid("the value is a relative directory"));
    }
    if value.contains(['/', '\\']) {
        return Err(invalid("the value contains a path separator"));
    }
    if value.chars().any(char::is_control) {
        return Err(invalid("the value contains a control character"));
    }

    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '%' => out.push_str("%25"),
            '-' => out.push_str("%2D"),
            c => out.push(c),
        }
    }
    Ok(out)
}

/// One dimension of the build folder key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimension {
    pub setting: Setting,
    /// Optional dimensions are skipped when the setting is absent.
    pub optional: bool,
}

impl Dimension {
    pub fn required(setting: Setting) -> Self {
        Dimension {
            setting,
            optional: false,
        }
    }

    pub fn optional(setting: Setting) -> Self {
        Dimension {
            setting,
            optional: true,
        }
    }
}

impl FromStr for Dimension {
    type Err = SettingsError;

    /// Parse `settings.os`, `os` or `os.api_level?` (trailing `?` = optional).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_suffix('?') {
            Some(name) => Ok(Dimension::optional(name.parse()?)),
            None => Ok(Dimension::required(s.parse()?)),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.optional {
            write!(f, "{}?", self.setting)
        } else {
            write!(f, "{}", self.setting)
        }
    }
}

impl Serialize for Dimension {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Dimension {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Ordered list of settings that name a build directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildFolderKey {
    dimensions: Vec<Dimension>,
}

impl BuildFolderKey {
    pub fn new(dimensions: Vec<Dimension>) -> Self {
        BuildFolderKey { dimensions }
    }

    /// A key where every dimension is required.
    pub fn required(settings: impl IntoIterator<Item = Setting>) -> Self {
        BuildFolderKey {
            dimensions: settings.into_iter().map(Dimension::required).collect(),
        }
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// Number of optional dimensions.
    ///
    /// With more than one, two configurations that each skip a different
    /// optional dimension could share a folder name.
    pub fn optional_count(&self) -> usize {
        self.dimensions.iter().filter(|d| d.optional).count()
    }

    /// Compute the folder name for the given settings.
    ///
    /// Reads only the declared dimensions, in order. The result is always a
    /// single path component (or empty for an empty key).
    pub fn resolve(&self, settings: &Settings) -> Result<String, LayoutError> {
        let mut parts = Vec::with_capacity(self.dimensions.len());
        for dim in &self.dimensions {
            match settings.get(dim.setting) {
                Some(value) => parts.push(encode_value(dim.setting, value)?),
                None if dim.optional => continue,
                None => {
                    return Err(MissingSettingError {
                        key: dim.setting.as_str().to_string(),
                    }
                    .into())
                }
            }
        }

        let segment = parts.join(SEPARATOR);
        debug_assert!(segment.is_empty() || Path::new(&segment).components().count() == 1);
        Ok(segment)
    }
}

/// A resolved build directory layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
    /// Folder name computed from the build folder key
    pub segment: String,
    /// Build directory (`<build-root>/<segment>`)
    pub build_dir: PathBuf,
    /// Directory holding generated artifacts
    pub generators_dir: PathBuf,
}

impl BuildLayout {
    /// Resolve the layout under `build_root`.
    ///
    /// An empty key places the build directly in `build_root`.
    pub fn resolve(
        build_root: &Path,
        key: &BuildFolderKey,
        settings: &Settings,
    ) -> Result<Self, LayoutError> {
        let segment = key.resolve(settings)?;
        let build_dir = if segment.is_empty() {
            build_root.to_path_buf()
        } else {
            build_root.join(&segment)
        };
        let generators_dir = build_dir.join(GENERATORS_DIR);

        Ok(BuildLayout {
            segment,
            build_dir,
            generators_dir,
        })
    }

    /// Name used for presets; falls back to `default` for an empty key.
    pub fn preset_name(&self) -> &str {
        if self.segment.is_empty() {
            "default"
        } else {
            &self.segment
        }
    }
}
