//! Test fixtures for common test scenarios.
//!
//! Recipes, settings and resolved packages shared by the unit tests.

use std::path::{Path, PathBuf};

use crate::builder::PhaseContext;
use crate::core::{Recipe, Setting, Settings};
use crate::ops::resolve::{PlanOptions, RunPlan};
use crate::sources::ResolvedPackage;

/// A Vulkan application recipe with three pinned dependencies.
pub const VULKAN_RECIPE: &str = r#"[package]
name = "LearningVulkan"
version = "1.0"
type = "application"
license = "MIT"
settings = ["os", "compiler", "build_type", "arch"]
exports-sources = ["CMakeLists.txt", "src/*"]

[layout]
build-folder-vars = [
    "settings.os", "settings.os.api_level?",
    "settings.arch",
    "settings.compiler",
    "settings.compiler.version",
]

[requires]
vulkan-loader = "1.3.239.0"
vulkan-validationlayers = "1.3.239.0"
glfw = "3.4"

[toolchain.variables]
CMAKE_EXPERIMENTAL_CXX_IMPORT_STD = "0e5b6991-d74f-4b3d-a41c-cf096e0b2508"
CMAKE_CXX_MODULE_STD = "ON"
"#;

/// Write `content` as `dir/Berth.toml` and return its path.
pub fn write_recipe(dir: &Path, content: &str) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join("Berth.toml");
    std::fs::write(&path, content).unwrap();
    path
}

/// Settings for a Windows MSVC release build.
pub fn sample_settings() -> Settings {
    Settings::new()
        .with(Setting::Os, "windows")
        .with(Setting::Arch, "x86_64")
        .with(Setting::Compiler, "msvc")
        .with(Setting::CompilerVersion, "193")
        .with(Setting::BuildType, "Release")
}

/// The recipe's dependencies, installed under `root/deps`.
pub fn sample_packages(root: &Path) -> Vec<ResolvedPackage> {
    let deps = root.join("deps");
    vec![
        ResolvedPackage::at_root("glfw", "3.4", deps.join("glfw"))
            .with_libs(vec!["glfw3".to_string()]),
        ResolvedPackage::at_root("vulkan-loader", "1.3.239.0", deps.join("vulkan-loader"))
            .with_libs(vec!["vulkan-1".to_string()]),
        ResolvedPackage::at_root(
            "vulkan-validationlayers",
            "1.3.239.0",
            deps.join("vulkan-validationlayers"),
        ),
    ]
}

/// A run plan for [`VULKAN_RECIPE`] written into `root`.
pub fn sample_plan(root: &Path) -> RunPlan {
    let recipe = Recipe::load(&write_recipe(root, VULKAN_RECIPE)).unwrap();
    RunPlan::new(recipe, sample_settings(), &PlanOptions::default()).unwrap()
}

/// Phase inputs rooted at `root`.
pub fn phase_context(root: &Path) -> PhaseContext {
    let build_dir = root.join("build").join("linux-x86_64-gcc-13");
    PhaseContext {
        source_dir: root.to_path_buf(),
        toolchain_file: build_dir.join("generators").join("berth_toolchain.cmake"),
        build_dir,
        build_type: None,
        install_prefix: root.join("package"),
        generator: None,
        jobs: None,
    }
}
