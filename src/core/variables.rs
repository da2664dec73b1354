//! Raw toolchain variable overrides.
//!
//! Overrides are an escape hatch: any name and any value are accepted and
//! written to the toolchain file exactly as given. They are kept apart from
//! the typed [`Setting`](crate::core::settings::Setting)s so that only the
//! well-known keys are validated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Variable name → literal value, applied unconditionally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawVariables {
    values: BTreeMap<String, String>,
}

/// A suspicious override, reported but never rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideLint {
    /// The key has leading or trailing whitespace.
    SurroundingWhitespace { key: String },
    /// Two keys are identical once whitespace is trimmed.
    NearDuplicate { first: String, second: String },
}

impl std::fmt::Display for OverrideLint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverrideLint::SurroundingWhitespace { key } => {
                write!(f, "toolchain variable {:?} has surrounding whitespace", key)
            }
            OverrideLint::NearDuplicate { first, second } => write!(
                f,
                "toolchain variables {:?} and {:?} differ only by whitespace",
                first, second
            ),
        }
    }
}

impl RawVariables {
    pub fn new() -> Self {
        RawVariables::default()
    }

    /// Set a variable. The key is stored byte-for-byte.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Merge another set of overrides into this one (other takes precedence).
    pub fn merge(&mut self, other: &RawVariables) {
        for (key, value) in other.iter() {
            self.insert(key, value);
        }
    }

    /// Parse `KEY=VALUE`, splitting at the first `=`. Nothing is trimmed.
    pub fn parse_define(input: &str) -> Option<(String, String)> {
        input
            .split_once('=')
            .filter(|(key, _)| !key.is_empty())
            .map(|(key, value)| (key.to_string(), value.to_string()))
    }

    /// Report keys that look like mistakes.
    pub fn lint(&self) -> Vec<OverrideLint> {
        let mut lints = Vec::new();
        let mut by_trimmed: BTreeMap<&str, &str> = BTreeMap::new();

        for key in self.values.keys() {
            let trimmed = key.trim();
            if trimmed != key {
                lints.push(OverrideLint::SurroundingWhitespace { key: key.clone() });
            }
            if let Some(first) = by_trimmed.insert(trimmed, key) {
                lints.push(OverrideLint::NearDuplicate {
                    first: first.to_string(),
                    second: key.clone(),
                });
            }
        }

        lints
    }
}

impl FromIterator<(String, String)> for RawVariables {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        RawVariables {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_stored_verbatim() {
        let vars = RawVariables::new().set("CMAKE_CXX_MODULE_STD ", "ON");
        assert_eq!(vars.get("CMAKE_CXX_MODULE_STD "), Some("ON"));
        assert_eq!(vars.get("CMAKE_CXX_MODULE_STD"), None);
    }

    #[test]
    fn test_parse_define() {
        assert_eq!(
            RawVariables::parse_define("A=b=c"),
            Some(("A".to_string(), "b=c".to_string()))
        );
        assert_eq!(
            RawVariables::parse_define("KEY =ON"),
            Some(("KEY ".to_string(), "ON".to_string()))
        );
        assert_eq!(RawVariables::parse_define("=ON"), None);
        assert_eq!(RawVariables::parse_define("NOVALUE"), None);
    }

    #[test]
    fn test_lint_flags_whitespace_and_near_duplicates() {
        let vars = RawVariables::new()
            .set("CMAKE_CXX_MODULE_STD", "ON")
            .set("CMAKE_CXX_MODULE_STD ", "ON")
            .set("CMAKE_VERBOSE_MAKEFILE", "ON");

        let lints = vars.lint();
        assert_eq!(lints.len(), 2);
        assert!(lints.contains(&OverrideLint::SurroundingWhitespace {
            key: "CMAKE_CXX_MODULE_STD ".to_string()
        }));
        assert!(lints
            .iter()
            .any(|l| matches!(l, OverrideLint::NearDuplicate { .. })));
    }

    #[test]
    fn test_clean_overrides_have_no_lints() {
        let vars = RawVariables::new()
            .set("CMAKE_EXPERIMENTAL_CXX_IMPORT_STD", "0e5b6991-d74f-4b3d-a41c-cf096e0b2508")
            .set("CMAKE_VERBOSE_MAKEFILE", "ON");
        assert!(vars.lint().is_empty());
    }
}
