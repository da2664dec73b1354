//! Berth.toml recipe parsing and schema.
//!
//! The recipe is the declarative description of one buildable unit: its
//! metadata, the settings it consumes, the build folder layout rule, the
//! pinned dependencies and the toolchain variable overrides.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use miette::{Diagnostic as MietteDiagnostic, NamedSource, SourceSpan};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::dependency::{validate_package_name, validate_version, DependencySpec};
use crate::core::layout::BuildFolderKey;
use crate::core::settings::Setting;
use crate::core::variables::RawVariables;

/// Recipe file name.
pub const RECIPE_FILE: &str = "Berth.toml";

/// Default build root, relative to the recipe directory.
pub const DEFAULT_BUILD_ROOT: &str = "build";

/// Errors locating a recipe.
#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("no recipe found in `{dir}` or any parent directory (looking for {RECIPE_FILE})")]
    NotFound { dir: PathBuf },
}

/// A recipe that is not valid TOML or does not match the schema.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("failed to parse {path}: {message}")]
#[diagnostic(
    code(berth::recipe::parse),
    help("A recipe needs a `[package]` table with `name` and `version`")
)]
pub struct RecipeParseError {
    pub path: String,
    pub message: String,
    #[source_code]
    pub src: NamedSource<String>,
    #[label("here")]
    pub span: Option<SourceSpan>,
}

impl RecipeParseError {
    fn new(err: &toml::de::Error, content: &str, path: &Path) -> Self {
        let path = path.display().to_string();
        RecipeParseError {
            message: err.message().trim_end().to_string(),
            src: NamedSource::new(&path, content.to_string()),
            span: err.span().map(SourceSpan::from),
            path,
        }
    }
}

/// What the recipe produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageType {
    #[default]
    Application,
    Library,
    HeaderLibrary,
}

/// The `[package]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackageMetadata {
    pub name: String,
    pub version: String,

    #[serde(default, rename = "type")]
    pub package_type: PackageType,

    #[serde(default)]
    pub license: Option<String>,

    #[serde(default)]
    pub authors: Vec<String>,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub topics: Vec<String>,

    /// Root settings this recipe consumes
    #[serde(default)]
    pub settings: Vec<Setting>,

    /// Glob patterns of source files shipped with the recipe
    #[serde(default)]
    pub exports_sources: Vec<String>,
}

/// The `[layout]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LayoutSection {
    #[serde(default)]
    pub build_root: Option<PathBuf>,

    #[serde(default)]
    pub build_folder_vars: BuildFolderKey,
}

/// The `[toolchain]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolchainSection {
    /// CMake generator (e.g. "Ninja")
    #[serde(default)]
    pub generator: Option<String>,

    #[serde(default)]
    pub variables: RawVariables,
}

#[derive(Debug, Deserialize)]
struct RawRecipe {
    package: PackageMetadata,
    #[serde(default)]
    layout: LayoutSection,
    #[serde(default)]
    requires: DependencySpec,
    #[serde(default)]
    toolchain: ToolchainSection,
}

/// A parsed and validated recipe.
#[derive(Debug, Clone)]
pub struct Recipe {
    pub package: PackageMetadata,
    pub layout: LayoutSection,
    pub requires: DependencySpec,
    pub toolchain: ToolchainSection,
    recipe_dir: PathBuf,
}

impl Recipe {
    /// Load a recipe from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read recipe: {}", path.display()))?;

        Self::parse(&content, path)
    }

    /// Parse recipe content.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let raw: RawRecipe =
            toml::from_str(content).map_err(|e| RecipeParseError::new(&e, content, path))?;

        let recipe_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();

        let recipe = Recipe {
            package: raw.package,
            layout: raw.layout,
            requires: raw.requires,
            toolchain: raw.toolchain,
            recipe_dir,
        };
        recipe
            .validate()
            .with_context(|| format!("invalid recipe at {}", path.display()))?;

        Ok(recipe)
    }

    fn validate(&self) -> Result<()> {
        if self.package.name.trim().is_empty() {
            bail!("`package.name` must not be empty");
        }
        if self.package.version.trim().is_empty() {
            bail!("`package.version` must not be empty");
        }

        for setting in &self.package.settings {
            if !setting.is_root() {
                bail!(
                    "`package.settings` lists `{}`; only top-level settings may be declared",
                    setting
                );
            }
        }

        for dim in self.layout.build_folder_vars.dimensions() {
            let root = dim.setting.root();
            if !self.package.settings.contains(&root) {
                bail!(
                    "build folder var `{}` uses setting `{}`, which is not declared in `package.settings`",
                    dim,
                    root
                );
            }
        }

        if self.layout.build_folder_vars.optional_count() > 1 {
            bail!(
                "`layout.build-folder-vars` may mark at most one setting optional (`?`); \
                 with more, different settings could share a build folder"
            );
        }

        for req in self.requires.iter() {
            validate_package_name(&req.name)
                .with_context(|| format!("invalid requirement `{}`", req.name))?;
            validate_version(&req.version)
                .with_context(|| format!("requirement `{}` has an invalid version", req.name))?;
        }

        Ok(())
    }

    /// Directory containing the recipe (also the CMake source directory).
    pub fn recipe_dir(&self) -> &Path {
        &self.recipe_dir
    }

    /// Path of the recipe file itself.
    pub fn recipe_path(&self) -> PathBuf {
        self.recipe_dir.join(RECIPE_FILE)
    }

    /// The pinned dependencies. Independent of any settings.
    pub fn requirements(&self) -> &DependencySpec {
        &self.requires
    }

    /// The declared root settings.
    pub fn declared_settings(&self) -> &[Setting] {
        &self.package.settings
    }

    /// Build root, resolved against the recipe directory.
    pub fn build_root(&self) -> PathBuf {
        match &self.layout.build_root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => self.recipe_dir.join(root),
            None => self.recipe_dir.join(DEFAULT_BUILD_ROOT),
        }
    }
}

/// Find the recipe by searching `start` and its parents.
pub fn find_recipe(start: &Path) -> Result<PathBuf, RecipeError> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(RECIPE_FILE);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if !current.pop() {
            return Err(RecipeError::NotFound {
                dir: start.to_path_buf(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::layout::Dimension;
    use miette::Diagnostic as _;
    use tempfile::TempDir;

    const VULKAN_RECIPE: &str = r#"
[package]
name = "LearningVulkan"
version = "1.0"
type = "application"
license = "MIT"
topics = ["vulkan", "graphics", "rendering"]
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
"CMAKE_CXX_MODULE_STD " = "ON"
CMAKE_VERBOSE_MAKEFILE = "ON"
"#;

    #[test]
    fn test_parse_full_recipe() {
        let recipe = Recipe::parse(VULKAN_RECIPE, Path::new("/proj/Berth.toml")).unwrap();

        assert_eq!(recipe.package.name, "LearningVulkan");
        assert_eq!(recipe.package.package_type, PackageType::Application);
        assert_eq!(recipe.package.exports_sources.len(), 2);
        assert_eq!(recipe.declared_settings().len(), 4);

        let dims = recipe.layout.build_folder_vars.dimensions();
        assert_eq!(dims.len(), 5);
        assert_eq!(dims[1], Dimension::optional(Setting::OsApiLevel));

        assert_eq!(recipe.requirements().len(), 3);
        assert_eq!(recipe.requirements().version_of("glfw"), Some("3.4"));

        assert_eq!(
            recipe.toolchain.variables.get("CMAKE_CXX_MODULE_STD "),
            Some("ON")
        );
        assert_eq!(recipe.build_root(), Path::new("/proj/build"));
    }

    #[test]
    fn test_unknown_setting_in_layout_is_rejected() {
        let content = r#"
[package]
name = "demo"
version = "1.0"
settings = ["os"]

[layout]
build-folder-vars = ["settings.os.apilevel"]
"#;
        let err = Recipe::parse(content, Path::new("Berth.toml")).unwrap_err();
        assert!(format!("{:#}", err).contains("unknown setting"));
    }

    #[test]
    fn test_parse_error_points_at_source() {
        let content = "[package]\nname = \"demo\"\nversion = 1.0\n";
        let err = Recipe::parse(content, Path::new("Berth.toml")).unwrap_err();
        let parse = err.downcast_ref::<RecipeParseError>().unwrap();

        assert_eq!(parse.path, "Berth.toml");
        assert_eq!(
            parse.code().map(|c| c.to_string()),
            Some("berth::recipe::parse".to_string())
        );
        assert!(parse.message.contains("invalid type"));
        assert!(parse.span.is_some());
    }

    #[test]
    fn test_layout_var_must_use_declared_setting() {
        let content = r#"
[package]
name = "demo"
version = "1.0"
settings = ["os"]

[layout]
build-folder-vars = ["compiler.version"]
"#;
        let err = Recipe::parse(content, Path::new("Berth.toml")).unwrap_err();
        assert!(format!("{:#}", err).contains("not declared"));
    }

    #[test]
    fn test_empty_version_is_rejected() {
        let content = r#"
[package]
name = "demo"
version = "1.0"

[requires]
glfw = ""
"#;
        assert!(Recipe::parse(content, Path::new("Berth.toml")).is_err());
    }

    #[test]
    fn test_requirement_name_with_path_is_rejected() {
        let content = r#"
[package]
name = "demo"
version = "1.0"

[requires]
"../../x" = "1.0"
"#;
        let err = Recipe::parse(content, Path::new("Berth.toml")).unwrap_err();
        assert!(format!("{:#}", err).contains("invalid requirement `../../x`"));
    }

    #[test]
    fn test_requirement_version_with_path_is_rejected() {
        let content = r#"
[package]
name = "demo"
version = "1.0"

[requires]
glfw = "3.4/../../.."
"#;
        assert!(Recipe::parse(content, Path::new("Berth.toml")).is_err());
    }

    #[test]
    fn test_two_optional_layout_vars_are_rejected() {
        let content = r#"
[package]
name = "demo"
version = "1.0"
settings = ["os"]

[layout]
build-folder-vars = ["os", "os.api_level?", "os.version?"]
"#;
        let err = Recipe::parse(content, Path::new("Berth.toml")).unwrap_err();
        assert!(format!("{:#}", err).contains("at most one"));
    }

    #[test]
    fn test_find_recipe_searches_parents() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(RECIPE_FILE),
            "[package]\nname = \"demo\"\nversion = \"1.0\"\n",
        )
        .unwrap();
        let nested = tmp.path().join("src").join("deep");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_recipe(&nested).unwrap();
        assert_eq!(found, tmp.path().join(RECIPE_FILE));
    }

    #[test]
    fn test_find_recipe_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = find_recipe(tmp.path());
        assert!(matches!(err, Err(RecipeError::NotFound { .. })));
    }
}
