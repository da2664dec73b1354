//! Process-wide paths: the working directory and the berth home.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::recipe::{find_recipe, RecipeError};
use crate::util::config::global_config_dir;

/// Environment variable overriding the berth home (`~/.berth`).
pub const BERTH_HOME_ENV: &str = "BERTH_HOME";

/// Where berth looks for the recipe and the global config.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    cwd: PathBuf,
    home: PathBuf,
}

impl GlobalContext {
    /// Context for the current process: `$BERTH_HOME`, else `~/.berth`.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(GlobalContext::with_cwd(cwd))
    }

    pub fn with_cwd(cwd: PathBuf) -> Self {
        let home = std::env::var_os(BERTH_HOME_ENV)
            .map(PathBuf::from)
            .or_else(global_config_dir)
            .unwrap_or_else(|| cwd.join(".berth"));
        GlobalContext { cwd, home }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// `<home>/config.toml`
    pub fn config_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    /// The nearest Berth.toml at or above the working directory.
    pub fn find_recipe(&self) -> Result<PathBuf, RecipeError> {
        find_recipe(&self.cwd)
    }
}

/// The project-local berth directory next to a recipe.
pub fn project_berth_dir(recipe_dir: &Path) -> PathBuf {
    recipe_dir.join(".berth")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_recipe_searches_parents() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("Berth.toml"),
            "[package]\nname = \"demo\"\nversion = \"1.0\"\n",
        )
        .unwrap();
        let nested = tmp.path().join("src").join("render");
        std::fs::create_dir_all(&nested).unwrap();

        let ctx = GlobalContext::with_cwd(nested.clone());
        assert_eq!(ctx.cwd(), nested);
        assert_eq!(ctx.find_recipe().unwrap(), tmp.path().join("Berth.toml"));
        assert!(ctx.config_path().ends_with("config.toml"));
    }

    #[test]
    fn test_find_recipe_reports_start_dir() {
        let tmp = TempDir::new().unwrap();
        let err = GlobalContext::with_cwd(tmp.path().to_path_buf())
            .find_recipe()
            .unwrap_err();
        assert!(err.to_string().contains("Berth.toml"));
    }

    #[test]
    fn test_project_berth_dir() {
        assert_eq!(
            project_berth_dir(Path::new("/proj")),
            Path::new("/proj").join(".berth")
        );
    }
}
