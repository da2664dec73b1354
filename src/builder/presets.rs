//! CMakePresets.json generation.
//!
//! One configure preset and one build preset named after the build folder,
//! so IDEs and plain `cmake --preset` reuse the layout berth computed.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::util::fs::cmake_path;

/// File name of the generated presets.
pub const PRESETS_FILE: &str = "CMakePresets.json";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CMakePresets {
    version: u32,
    cmake_minimum_required: CMakeVersion,
    configure_presets: Vec<ConfigurePreset>,
    build_presets: Vec<BuildPreset>,
}

#[derive(Debug, Serialize)]
struct CMakeVersion {
    major: u32,
    minor: u32,
    patch: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigurePreset {
    name: String,
    display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    generator: Option<String>,
    binary_dir: String,
    toolchain_file: String,
    cache_variables: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildPreset {
    name: String,
    configure_preset: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    configuration: Option<String>,
}

/// Inputs for the presets file.
#[derive(Debug, Clone, Copy)]
pub struct PresetsInput<'a> {
    pub name: &'a str,
    pub build_dir: &'a Path,
    pub toolchain_file: &'a Path,
    pub generator: Option<&'a str>,
    pub build_type: Option<&'a str>,
}

/// Render CMakePresets.json (pretty-printed, trailing newline).
pub fn render_presets(input: &PresetsInput<'_>) -> String {
    let mut cache_variables = BTreeMap::new();
    if let Some(build_type) = input.build_type {
        cache_variables.insert("CMAKE_BUILD_TYPE".to_string(), build_type.to_string());
    }

    let presets = CMakePresets {
        version: 3,
        cmake_minimum_required: CMakeVersion {
            major: 3,
            minor: 21,
            patch: 0,
        },
        configure_presets: vec![ConfigurePreset {
            name: input.name.to_string(),
            display_name: format!("berth {}", input.name),
            generator: input.generator.map(str::to_string),
            binary_dir: cmake_path(input.build_dir),
            toolchain_file: cmake_path(input.toolchain_file),
            cache_variables,
        }],
        build_presets: vec![BuildPreset {
            name: input.name.to_string(),
            configure_preset: input.name.to_string(),
            configuration: input.build_type.map(str::to_string),
        }],
    };

    let mut json = serde_json::to_string_pretty(&presets).unwrap_or_default();
    json.push('\n');
    json
}
