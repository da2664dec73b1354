//! Implementation of `berth export`.
//!
//! Copies the recipe and the files matched by `exports-sources` into a
//! destination directory, preserving paths relative to the recipe.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::core::recipe::{Recipe, RECIPE_FILE};
use crate::util::fs::{copy_file, ensure_dir, glob_files, relative_path};

/// Result of an export.
#[derive(Debug, Clone, Default)]
pub struct ExportOutcome {
    /// Exported paths, relative to the destination
    pub files: Vec<PathBuf>,
    /// `exports-sources` patterns that matched no file
    pub unmatched: Vec<String>,
}

/// Export `recipe` into `dest`.
pub fn export(recipe: &Recipe, dest: &Path) -> Result<ExportOutcome> {
    let source_dir = recipe.recipe_dir();
    if dest == source_dir {
        bail!("export destination is the recipe directory itself");
    }

    ensure_dir(dest)?;

    let mut outcome = ExportOutcome {
        files: vec![PathBuf::from(RECIPE_FILE)],
        unmatched: Vec::new(),
    };
    copy_file(&recipe.recipe_path(), &dest.join(RECIPE_FILE))?;

    let build_root = recipe.build_root();
    for pattern in &recipe.package.exports_sources {
        let mut matched = false;
        for file in glob_files(source_dir, std::slice::from_ref(pattern))? {
            // Never export build output or a previous export
            if file.starts_with(&build_root) || file.starts_with(dest) {
                continue;
            }
            matched = true;
            let rel = relative_path(source_dir, &file);
            if rel == Path::new(RECIPE_FILE) || outcome.files.contains(&rel) {
                continue;
            }
            copy_file(&file, &dest.join(&rel))?;
            outcome.files.push(rel);
        }
        if !matched {
            outcome.unmatched.push(pattern.clone());
        }
    }

    tracing::debug!("exported {} file(s) to {}", outcome.files.len(), dest.display());
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{write_recipe, VULKAN_RECIPE};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_export_copies_recipe_and_sources() {
        let tmp = TempDir::new().unwrap();
        let recipe_path = write_recipe(tmp.path(), VULKAN_RECIPE);
        fs::write(tmp.path().join("CMakeLists.txt"), "project(LearningVulkan)").unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src").join("main.cpp"), "int main() {}").unwrap();
        fs::write(tmp.path().join("notes.txt"), "not exported").unwrap();

        let recipe = Recipe::load(&recipe_path).unwrap();
        let dest = TempDir::new().unwrap();
        let outcome = export(&recipe, dest.path()).unwrap();

        assert_eq!(outcome.files.len(), 3);
        assert!(outcome.unmatched.is_empty());
        assert!(dest.path().join("Berth.toml").is_file());
        assert!(dest.path().join("CMakeLists.txt").is_file());
        assert!(dest.path().join("src").join("main.cpp").is_file());
        assert!(!dest.path().join("notes.txt").exists());
    }

    #[test]
    fn test_export_reports_unmatched_patterns() {
        let tmp = TempDir::new().unwrap();
        let recipe_path = write_recipe(tmp.path(), VULKAN_RECIPE);
        fs::write(tmp.path().join("CMakeLists.txt"), "project(LearningVulkan)").unwrap();

        let recipe = Recipe::load(&recipe_path).unwrap();
        let dest = TempDir::new().unwrap();
        let outcome = export(&recipe, dest.path()).unwrap();

        assert_eq!(outcome.files.len(), 2);
        assert_eq!(outcome.unmatched, vec!["src/*".to_string()]);
    }

    #[test]
    fn test_export_refuses_recipe_dir() {
        let tmp = TempDir::new().unwrap();
        let recipe = Recipe::load(&write_recipe(tmp.path(), VULKAN_RECIPE)).unwrap();
        assert!(export(&recipe, tmp.path()).is_err());
    }
}
