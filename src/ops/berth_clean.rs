//! Implementation of `berth clean`.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::util::fs::remove_dir_all_if_exists;

/// Remove a build directory (or the whole build root).
///
/// Refuses to remove the recipe directory or any of its ancestors, which a
/// misconfigured `build-root` (such as `.` or `out/..`) would otherwise point
/// at. Both paths are compared after resolving `..` and symlinks.
/// Returns whether anything was removed.
pub fn clean(target: &Path, recipe_dir: &Path) -> Result<bool> {
    if !target.exists() {
        tracing::debug!("nothing to clean at {}", target.display());
        return Ok(false);
    }

    let recipe_dir = recipe_dir
        .canonicalize()
        .with_context(|| format!("failed to resolve {}", recipe_dir.display()))?;
    let resolved = target
        .canonicalize()
        .with_context(|| format!("failed to resolve {}", target.display()))?;

    if recipe_dir.starts_with(&resolved) {
        bail!(
            "refusing to remove `{}`: it contains the recipe\n\
             hint: check `[layout] build-root` in Berth.toml",
            target.display()
        );
    }

    remove_dir_all_if_exists(target)?;
    tracing::debug!("cleaned {}", resolved.display());
    Ok(true)
}
