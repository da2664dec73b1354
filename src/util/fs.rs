//! Filesystem helpers.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::Pattern;

/// Remove `path` recursively. A missing directory is not an error.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
            Err(e).with_context(|| format!("failed to remove {}", path.display()))
        }
        _ => Ok(()),
    }
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("failed to create {}", path.display()))
}

/// Copy a file, creating the destination's parent directories.
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        ensure_dir(parent)?;
    }
    fs::copy(src, dst)
        .with_context(|| format!("failed to copy {} to {}", src.display(), dst.display()))?;
    Ok(())
}

/// Files under `base` matching any of `patterns` (relative globs), sorted
/// and deduplicated. Directories never match.
pub fn glob_files(base: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    // Glob metacharacters in the base path must match literally
    let escaped_base = Pattern::escape(&base.to_string_lossy());

    let mut files = Vec::new();
    for pattern in patterns {
        let full = format!("{}/{}", escaped_base, pattern);
        let entries =
            glob::glob(&full).with_context(|| format!("invalid glob pattern `{}`", pattern))?;

        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(_) => {}
                Err(e) => tracing::warn!("skipping unreadable path: {}", e),
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// `path` relative to `base`, or `path` itself when no relative form exists.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// A path as CMake scripts expect it: forward slashes on every platform.
pub fn cmake_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
