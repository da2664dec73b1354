//! CMake toolchain file generation.
//!
//! The toolchain file carries two kinds of variables:
//! - [`KnownVariable`]s derived from typed settings (build type, C++
//!   standard, MSVC runtime, target system when cross-building)
//! - raw overrides from the recipe and `--define`, written last and verbatim
//!   so that they win over anything derived

use std::fmt::{self, Write};
use std::path::PathBuf;

use crate::core::{RawVariables, Setting, Settings};
use crate::util::fs::cmake_path;

/// File name of the generated toolchain.
pub const TOOLCHAIN_FILE: &str = "berth_toolchain.cmake";

/// A toolchain variable berth derives from settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KnownVariable {
    SystemName,
    SystemVersion,
    SystemProcessor,
    BuildType,
    CxxStandard,
    CxxExtensions,
    MsvcRuntimeLibrary,
}

impl KnownVariable {
    pub const ALL: [KnownVariable; 7] = [
        KnownVariable::SystemName,
        KnownVariable::SystemVersion,
        KnownVariable::SystemProcessor,
        KnownVariable::BuildType,
        KnownVariable::CxxStandard,
        KnownVariable::CxxExtensions,
        KnownVariable::MsvcRuntimeLibrary,
    ];

    /// The CMake variable name.
    pub fn name(&self) -> &'static str {
        match self {
            KnownVariable::SystemName => "CMAKE_SYSTEM_NAME",
            KnownVariable::SystemVersion => "CMAKE_SYSTEM_VERSION",
            KnownVariable::SystemProcessor => "CMAKE_SYSTEM_PROCESSOR",
            KnownVariable::BuildType => "CMAKE_BUILD_TYPE",
            KnownVariable::CxxStandard => "CMAKE_CXX_STANDARD",
            KnownVariable::CxxExtensions => "CMAKE_CXX_EXTENSIONS",
            KnownVariable::MsvcRuntimeLibrary => "CMAKE_MSVC_RUNTIME_LIBRARY",
        }
    }

    /// Find the known variable with exactly this name.
    pub fn from_name(name: &str) -> Option<KnownVariable> {
        KnownVariable::ALL.iter().copied().find(|v| v.name() == name)
    }
}

impl fmt::Display for KnownVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// CMake system name for an `os` setting value.
pub fn cmake_system_name(os: &str) -> &str {
    match os {
        "windows" => "Windows",
        "linux" => "Linux",
        "macos" => "Darwin",
        "android" => "Android",
        "ios" => "iOS",
        "freebsd" => "FreeBSD",
        other => other,
    }
}

/// CMake processor name for an `arch` setting value.
pub fn cmake_system_processor(arch: &str) -> &str {
    match arch {
        "armv8" => "aarch64",
        "armv7" => "armv7-a",
        "x86" => "i686",
        other => other,
    }
}

/// Split `compiler.cppstd` into (standard, extensions): `gnu20` -> ("20", true).
pub fn parse_cppstd(cppstd: &str) -> (&str, bool) {
    match cppstd.strip_prefix("gnu") {
        Some(std) => (std, true),
        None => (cppstd, false),
    }
}

/// Value of `CMAKE_MSVC_RUNTIME_LIBRARY` for `compiler.runtime`.
///
/// Without `compiler.runtime_type` the debug suffix follows the active
/// configuration.
pub fn msvc_runtime_library(runtime: &str, runtime_type: Option<&str>) -> String {
    let dll = if runtime == "static" { "" } else { "DLL" };
    match runtime_type {
        Some("Debug") => format!("MultiThreadedDebug{}", dll),
        Some(_) => format!("MultiThreaded{}", dll),
        None => format!("MultiThreaded$<$<CONFIG:Debug>:Debug>{}", dll),
    }
}

/// Derive the settings-backed toolchain variables.
///
/// `host` is the machine running the build; the target system is only set
/// when it differs from the host (or for Android, which is always a cross
/// build).
pub fn derive_variables(settings: &Settings, host: &Settings) -> Vec<(KnownVariable, String)> {
    let mut vars = Vec::new();

    if let Some(os) = settings.get(Setting::Os) {
        let cross_os = host.get(Setting::Os).is_some_and(|h| h != os);
        let cross_arch = match (settings.get(Setting::Arch), host.get(Setting::Arch)) {
            (Some(arch), Some(host_arch)) => arch != host_arch,
            _ => false,
        };

        if cross_os || cross_arch || os == "android" {
            vars.push((KnownVariable::SystemName, cmake_system_name(os).to_string()));

            let version = settings
                .get(Setting::OsApiLevel)
                .or_else(|| settings.get(Setting::OsVersion));
            if let Some(version) = version {
                vars.push((KnownVariable::SystemVersion, version.to_string()));
            }

            if let Some(arch) = settings.get(Setting::Arch) {
                vars.push((
                    KnownVariable::SystemProcessor,
                    cmake_system_processor(arch).to_string(),
                ));
            }
        }
    }

    if let Some(build_type) = settings.get(Setting::BuildType) {
        vars.push((KnownVariable::BuildType, build_type.to_string()));
    }

    if let Some(cppstd) = settings.get(Setting::CompilerCppstd) {
        let (std, extensions) = parse_cppstd(cppstd);
        vars.push((KnownVariable::CxxStandard, std.to_string()));
        vars.push((
            KnownVariable::CxxExtensions,
            if extensions { "ON" } else { "OFF" }.to_string(),
        ));
    }

    if settings.get(Setting::Compiler) == Some("msvc") {
        if let Some(runtime) = settings.get(Setting::CompilerRuntime) {
            vars.push((
                KnownVariable::MsvcRuntimeLibrary,
                msvc_runtime_library(runtime, settings.get(Setting::CompilerRuntimeType)),
            ));
        }
    }

    vars
}

/// Raw override keys that also name a settings-derived variable.
pub fn shadowed_variables(overrides: &RawVariables) -> Vec<KnownVariable> {
    overrides
        .iter()
        .filter_map(|(key, _)| KnownVariable::from_name(key))
        .collect()
}

/// Quote a string as a CMake quoted argument.
///
/// Only the characters CMake would otherwise interpret are escaped, so the
/// variable receives exactly the given text.
pub fn cmake_quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '\\' | '"' | '$' => {
                quoted.push('\\');
                quoted.push(c);
            }
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Contents of the toolchain file.
#[derive(Debug, Clone)]
pub struct ToolchainFile<'a> {
    /// Build folder segment, recorded in the header
    pub segment: &'a str,
    pub variables: Vec<(KnownVariable, String)>,
    /// Directory holding the dependency descriptors
    pub generators_dir: PathBuf,
    /// Dependency names with a descriptor in `generators_dir`
    pub packages: Vec<&'a str>,
    pub overrides: &'a RawVariables,
}

impl ToolchainFile<'_> {
    /// Render the file. Identical inputs give identical bytes.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let generators = cmake_path(&self.generators_dir);

        // Infallible: writing to a String
        let _ = writeln!(out, "# Generated by berth. Do not edit.");
        if !self.segment.is_empty() {
            let _ = writeln!(out, "# Configuration: {}", self.segment);
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "include_guard()");

        if !self.variables.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "# Settings");
            for (var, value) in &self.variables {
                match var {
                    KnownVariable::BuildType => {
                        let _ = writeln!(
                            out,
                            "set({} {} CACHE STRING \"Build type\" FORCE)",
                            var,
                            cmake_quote(value)
                        );
                    }
                    KnownVariable::MsvcRuntimeLibrary => {
                        // Generator expressions must reach CMake unescaped
                        let _ = writeln!(out, "cmake_policy(SET CMP0091 NEW)");
                        let _ = writeln!(out, "set({} \"{}\")", var, value);
                    }
                    _ => {
                        let _ = writeln!(out, "set({} {})", var, cmake_quote(value));
                    }
                }
                if *var == KnownVariable::CxxStandard {
                    let _ = writeln!(out, "set(CMAKE_CXX_STANDARD_REQUIRED ON)");
                }
            }
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "# Dependencies");
        for name in &self.packages {
            let _ = writeln!(out, "set({}_DIR {})", name, cmake_quote(&generators));
        }
        let _ = writeln!(out, "list(PREPEND CMAKE_PREFIX_PATH {})", cmake_quote(&generators));
        let _ = writeln!(out, "list(REMOVE_DUPLICATES CMAKE_PREFIX_PATH)");
        let _ = writeln!(out, "set(CMAKE_FIND_PACKAGE_PREFER_CONFIG ON)");

        if !self.overrides.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "# Variable overrides");
            for (key, value) in self.overrides.iter() {
                let doc = format!("Variable {} defined by berth", key);
                let _ = writeln!(
                    out,
                    "set({} {} CACHE STRING {} FORCE)",
                    cmake_quote(key),
                    cmake_quote(value),
                    cmake_quote(&doc)
                );
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn linux_host() -> Settings {
        Settings::new()
            .with(Setting::Os, "linux")
            .with(Setting::Arch, "x86_64")
    }

    fn render(settings: &Settings, overrides: &RawVariables) -> String {
        ToolchainFile {
            segment: "linux-x86_64-gcc-13",
            variables: derive_variables(settings, &linux_host()),
            generators_dir: Path::new("/proj/build/linux-x86_64-gcc-13/generators").to_path_buf(),
            packages: vec!["glfw", "vulkan-loader"],
            overrides,
        }
        .render()
    }

    #[test]
    fn test_native_build_has_no_system_name() {
        let settings = linux_host()
            .with(Setting::Compiler, "gcc")
            .with(Setting::BuildType, "Release");
        let vars = derive_variables(&settings, &linux_host());

        assert_eq!(vars, vec![(KnownVariable::BuildType, "Release".to_string())]);
    }

    #[test]
    fn test_cross_build_sets_target_system() {
        let settings = Settings::new()
            .with(Setting::Os, "windows")
            .with(Setting::OsVersion, "10.0")
            .with(Setting::Arch, "x86_64");
        let vars = derive_variables(&settings, &linux_host());

        assert!(vars.contains(&(KnownVariable::SystemName, "Windows".to_string())));
        assert!(vars.contains(&(KnownVariable::SystemVersion, "10.0".to_string())));
        assert!(vars.contains(&(KnownVariable::SystemProcessor, "x86_64".to_string())));
    }

    #[test]
    fn test_android_is_always_cross() {
        let settings = Settings::new()
            .with(Setting::Os, "android")
            .with(Setting::OsApiLevel, "31")
            .with(Setting::Arch, "armv8");
        let vars = derive_variables(&settings, &linux_host());

        assert!(vars.contains(&(KnownVariable::SystemName, "Android".to_string())));
        assert!(vars.contains(&(KnownVariable::SystemVersion, "31".to_string())));
        assert!(vars.contains(&(KnownVariable::SystemProcessor, "aarch64".to_string())));
    }

    #[test]
    fn test_cppstd_mapping() {
        assert_eq!(parse_cppstd("20"), ("20", false));
        assert_eq!(parse_cppstd("gnu17"), ("17", true));

        let settings = linux_host().with(Setting::CompilerCppstd, "gnu23");
        let vars = derive_variables(&settings, &linux_host());
        assert!(vars.contains(&(KnownVariable::CxxStandard, "23".to_string())));
        assert!(vars.contains(&(KnownVariable::CxxExtensions, "ON".to_string())));
    }

    #[test]
    fn test_msvc_runtime() {
        assert_eq!(msvc_runtime_library("static", Some("Release")), "MultiThreaded");
        assert_eq!(msvc_runtime_library("dynamic", Some("Debug")), "MultiThreadedDebugDLL");
        assert_eq!(
            msvc_runtime_library("dynamic", None),
            "MultiThreaded$<$<CONFIG:Debug>:Debug>DLL"
        );

        // Only applies to msvc
        let gcc = linux_host()
            .with(Setting::Compiler, "gcc")
            .with(Setting::CompilerRuntime, "static");
        assert!(derive_variables(&gcc, &linux_host())
            .iter()
            .all(|(v, _)| *v != KnownVariable::MsvcRuntimeLibrary));
    }

    #[test]
    fn test_override_keys_written_verbatim() {
        let overrides = RawVariables::new()
            .set("CMAKE_CXX_MODULE_STD ", "ON")
            .set(
                "CMAKE_EXPERIMENTAL_CXX_IMPORT_STD",
                "0e5b6991-d74f-4b3d-a41c-cf096e0b2508",
            );
        let content = render(&linux_host(), &overrides);

        assert!(content.contains(
            "set(\"CMAKE_CXX_MODULE_STD \" \"ON\" CACHE STRING \"Variable CMAKE_CXX_MODULE_STD  defined by berth\" FORCE)"
        ));
        assert!(content.contains(
            "set(\"CMAKE_EXPERIMENTAL_CXX_IMPORT_STD\" \"0e5b6991-d74f-4b3d-a41c-cf096e0b2508\""
        ));
    }

    #[test]
    fn test_overrides_come_after_settings() {
        let settings = linux_host().with(Setting::BuildType, "Debug");
        let overrides = RawVariables::new().set("CMAKE_BUILD_TYPE", "RelWithDebInfo");
        let content = render(&settings, &overrides);

        let derived = content.find("set(CMAKE_BUILD_TYPE \"Debug\"").unwrap();
        let overridden = content.find("set(\"CMAKE_BUILD_TYPE\" \"RelWithDebInfo\"").unwrap();
        assert!(derived < overridden);
        assert_eq!(shadowed_variables(&overrides), vec![KnownVariable::BuildType]);
    }

    #[test]
    fn test_dependency_hints() {
        let content = render(&linux_host(), &RawVariables::new());
        let generators = "\"/proj/build/linux-x86_64-gcc-13/generators\"";

        assert!(content.contains(&format!("set(glfw_DIR {})", generators)));
        assert!(content.contains(&format!("set(vulkan-loader_DIR {})", generators)));
        assert!(content.contains(&format!("list(PREPEND CMAKE_PREFIX_PATH {})", generators)));
    }

    #[test]
    fn test_render_is_deterministic() {
        let overrides = RawVariables::new().set("CMAKE_VERBOSE_MAKEFILE", "ON");
        assert_eq!(
            render(&linux_host(), &overrides),
            render(&linux_host(), &overrides)
        );
    }

    #[test]
    fn test_cmake_quote() {
        assert_eq!(cmake_quote("ON"), "\"ON\"");
        assert_eq!(cmake_quote("a\"b"), "\"a\\\"b\"");
        assert_eq!(cmake_quote("C:\\x"), "\"C:\\\\x\"");
        assert_eq!(cmake_quote("${X}"), "\"\\${X}\"");
    }
}
