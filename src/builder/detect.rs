//! Host settings detection.
//!
//! Detection supplies the lowest-precedence settings: the running platform,
//! its architecture, a default build type and the C++ compiler found via
//! `CXX` or `PATH`.

use std::path::Path;

use crate::core::{Setting, Settings};
use crate::util::process::{find_cxx_compiler, ProcessBuilder};

/// Default build type for detected settings.
pub const DEFAULT_BUILD_TYPE: &str = "Release";

/// Map a Rust `target_arch` name to a setting value.
pub fn normalize_arch(arch: &str) -> String {
    match arch {
        "x86_64" => "x86_64".to_string(),
        "aarch64" => "armv8".to_string(),
        "x86" => "x86".to_string(),
        "arm" => "armv7".to_string(),
        other => other.to_string(),
    }
}

/// The platform berth is running on (`os` and `arch` only).
///
/// Rust `target_os` names (`windows`, `linux`, `macos`, ...) are used as-is.
pub fn host_platform() -> Settings {
    Settings::new()
        .with(Setting::Os, std::env::consts::OS)
        .with(Setting::Arch, normalize_arch(std::env::consts::ARCH))
}

/// Full host detection: platform, build type and compiler.
pub fn detect_host_settings() -> Settings {
    let mut settings = host_platform().with(Setting::BuildType, DEFAULT_BUILD_TYPE);

    match find_cxx_compiler() {
        Some(cxx) => {
            if let Some((compiler, version)) = detect_compiler(&cxx) {
                tracing::debug!("detected compiler {} {:?} at {}", compiler, version, cxx.display());
                settings.insert(Setting::Compiler, compiler);
                if let Some(version) = version {
                    settings.insert(Setting::CompilerVersion, version);
                }
            }
        }
        None => tracing::debug!("no C++ compiler found on PATH"),
    }

    settings
}

/// Identify a compiler family and major version.
fn detect_compiler(cxx: &Path) -> Option<(&'static str, Option<String>)> {
    let name = cxx
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_lowercase();

    if name == "cl" {
        return Some(("msvc", None));
    }

    let version_output = ProcessBuilder::new(cxx).arg("--version").exec().ok()?;
    let banner = version_output.stdout.to_lowercase();

    let family = if banner.contains("apple") && banner.contains("clang") {
        "apple-clang"
    } else if banner.contains("clang") || name.contains("clang") {
        "clang"
    } else if banner.contains("gcc") || banner.contains("free software foundation") {
        "gcc"
    } else {
        return None;
    };

    let version = ProcessBuilder::new(cxx)
        .arg("-dumpversion")
        .exec()
        .ok()
        .filter(|out| out.success())
        .and_then(|out| major_version(&out.stdout))
        .or_else(|| major_version_from_banner(&banner));

    Some((family, version))
}

/// Major component of a dotted version (`13.2.0` -> `13`).
pub fn major_version(text: &str) -> Option<String> {
    let major = text.trim().split('.').next()?;
    (!major.is_empty() && major.chars().all(|c| c.is_ascii_digit())).then(|| major.to_string())
}

/// Find the first dotted version in a `--version` banner.
fn major_version_from_banner(banner: &str) -> Option<String> {
    banner
        .split_whitespace()
        .find(|word| word.contains('.') && word.starts_with(|c: char| c.is_ascii_digit()))
        .and_then(major_version)
}
