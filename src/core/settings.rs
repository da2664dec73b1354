//! Build settings.
//!
//! Settings are the external build configuration (platform, architecture,
//! compiler, build type). Only well-known names are accepted so that a typo
//! in a recipe or on the command line is reported instead of silently
//! producing a different build directory.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A well-known setting name.
///
/// Declaration order is the iteration order of [`Settings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Setting {
    Os,
    OsApiLevel,
    OsVersion,
    Arch,
    Compiler,
    CompilerVersion,
    CompilerCppstd,
    CompilerLibcxx,
    CompilerRuntime,
    CompilerRuntimeType,
    BuildType,
}

impl Setting {
    /// All well-known settings, in declaration order.
    pub const ALL: [Setting; 11] = [
        Setting::Os,
        Setting::OsApiLevel,
        Setting::OsVersion,
        Setting::Arch,
        Setting::Compiler,
        Setting::CompilerVersion,
        Setting::CompilerCppstd,
        Setting::CompilerLibcxx,
        Setting::CompilerRuntime,
        Setting::CompilerRuntimeType,
        Setting::BuildType,
    ];

    /// The dotted name of this setting (e.g. `compiler.version`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Setting::Os => "os",
            Setting::OsApiLevel => "os.api_level",
            Setting::OsVersion => "os.version",
            Setting::Arch => "arch",
            Setting::Compiler => "compiler",
            Setting::CompilerVersion => "compiler.version",
            Setting::CompilerCppstd => "compiler.cppstd",
            Setting::CompilerLibcxx => "compiler.libcxx",
            Setting::CompilerRuntime => "compiler.runtime",
            Setting::CompilerRuntimeType => "compiler.runtime_type",
            Setting::BuildType => "build_type",
        }
    }

    /// The top-level setting this one belongs to.
    ///
    /// `compiler.version` belongs to `compiler`; root settings return themselves.
    pub fn root(&self) -> Setting {
        match self {
            Setting::Os | Setting::OsApiLevel | Setting::OsVersion => Setting::Os,
            Setting::Arch => Setting::Arch,
            Setting::Compiler
            | Setting::CompilerVersion
            | Setting::CompilerCppstd
            | Setting::CompilerLibcxx
            | Setting::CompilerRuntime
            | Setting::CompilerRuntimeType => Setting::Compiler,
            Setting::BuildType => Setting::BuildType,
        }
    }

    /// Whether this is a top-level setting.
    pub fn is_root(&self) -> bool {
        self.root() == *self
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Setting {
    type Err = SettingsError;

    /// Parse a setting name, accepting an optional `settings.` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.strip_prefix("settings.").unwrap_or(s);
        Setting::ALL
            .iter()
            .copied()
            .find(|setting| setting.as_str() == name)
            .ok_or_else(|| SettingsError::UnknownSetting {
                name: s.to_string(),
            })
    }
}

impl Serialize for Setting {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Setting {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors from parsing settings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("unknown setting `{name}`")]
    UnknownSetting { name: String },

    #[error("invalid setting `{input}`: expected KEY=VALUE")]
    MalformedAssignment { input: String },
}

/// An ordered, immutable-by-convention mapping from setting to value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    values: BTreeMap<Setting, String>,
}

impl Settings {
    /// Create an empty settings set.
    pub fn new() -> Self {
        Settings::default()
    }

    /// Set a value, replacing any previous one.
    pub fn with(mut self, setting: Setting, value: impl Into<String>) -> Self {
        self.insert(setting, value);
        self
    }

    /// Insert a value, replacing any previous one.
    pub fn insert(&mut self, setting: Setting, value: impl Into<String>) {
        self.values.insert(setting, value.into());
    }

    /// Look up a value.
    pub fn get(&self, setting: Setting) -> Option<&str> {
        self.values.get(&setting).map(String::as_str)
    }

    /// Whether a value is present.
    pub fn contains(&self, setting: Setting) -> bool {
        self.values.contains_key(&setting)
    }

    /// Iterate over settings in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Setting, &str)> {
        self.values.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Merge another settings set into this one (other takes precedence).
    pub fn merge(&mut self, other: &Settings) {
        for (setting, value) in other.iter() {
            self.insert(setting, value);
        }
    }

    /// Keep only the settings whose root is in `declared`.
    pub fn restrict_to(&self, declared: &[Setting]) -> Settings {
        let values = self
            .values
            .iter()
            .filter(|(setting, _)| declared.contains(&setting.root()))
            .map(|(k, v)| (*k, v.clone()))
            .collect();
        Settings { values }
    }

    /// Parse a single `key=value` assignment.
    ///
    /// The split happens at the first `=`, so values may contain `=`.
    pub fn parse_assignment(input: &str) -> Result<(Setting, String), SettingsError> {
        let (key, value) = input
            .split_once('=')
            .ok_or_else(|| SettingsError::MalformedAssignment {
                input: input.to_string(),
            })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(SettingsError::MalformedAssignment {
                input: input.to_string(),
            });
        }
        Ok((key.parse()?, value.trim().to_string()))
    }

    /// Build settings from a list of `key=value` assignments.
    pub fn from_assignments<I, S>(assignments: I) -> Result<Settings, SettingsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut settings = Settings::new();
        for assignment in assignments {
            let (setting, value) = Settings::parse_assignment(assignment.as_ref())?;
            settings.insert(setting, value);
        }
        Ok(settings)
    }

    /// Build settings from a string table (config files, profiles).
    pub fn from_table(table: &BTreeMap<String, String>) -> Result<Settings, SettingsError> {
        let mut settings = Settings::new();
        for (key, value) in table {
            settings.insert(key.parse()?, value.clone());
        }
        Ok(settings)
    }
}

impl FromIterator<(Setting, String)> for Settings {
    fn from_iter<T: IntoIterator<Item = (Setting, String)>>(iter: T) -> Self {
        Settings {
            values: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(setting, value)| format!("{}={}", setting, value))
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}
