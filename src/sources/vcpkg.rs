//! Vcpkg provider - installs pinned packages with vcpkg in manifest mode.
//!
//! For each run a `vcpkg.json` is written under `<build_dir>/vcpkg/`, with
//! every requirement pinned through `overrides`, and `vcpkg install` installs
//! into `<build_dir>/vcpkg/installed/<triplet>`. Everything vcpkg reports on
//! failure is passed through unchanged.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::{DependencySpec, Setting, Settings};
use crate::sources::provider::{
    library_name, DependencyProvider, DependencyResolutionError, ResolveRequest,
    ResolvedPackage,
};
use crate::util::config::VcpkgConfig;
use crate::util::process::{find_executable, ProcessBuilder};

const PROVIDER: &str = "vcpkg";

/// Manifest name written into the staged `vcpkg.json`.
const MANIFEST_NAME: &str = "berth-deps";

/// Resolves packages by running vcpkg.
#[derive(Debug, Clone)]
pub struct VcpkgProvider {
    root: Option<PathBuf>,
    triplet: Option<String>,
    baseline: Option<String>,
    ports: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
struct VcpkgManifest {
    name: &'static str,
    #[serde(rename = "version-string")]
    version_string: &'static str,
    #[serde(rename = "builtin-baseline", skip_serializing_if = "Option::is_none")]
    builtin_baseline: Option<String>,
    dependencies: Vec<String>,
    overrides: Vec<VcpkgOverride>,
}

#[derive(Debug, Serialize)]
struct VcpkgOverride {
    name: String,
    version: String,
}

impl VcpkgProvider {
    /// Create a provider from configuration, locating the vcpkg root.
    ///
    /// Priority: config file > `VCPKG_ROOT` > `vcpkg` found in PATH. A missing
    /// root is only an error once something has to be installed.
    pub fn from_config(config: &VcpkgConfig) -> Self {
        let root = config
            .root
            .clone()
            .or_else(|| std::env::var_os("VCPKG_ROOT").map(PathBuf::from))
            .or_else(|| {
                find_executable("vcpkg").and_then(|bin| bin.parent().map(Path::to_path_buf))
            });

        VcpkgProvider {
            root,
            triplet: config.triplet.clone(),
            baseline: config.baseline.clone(),
            ports: config.ports.clone(),
        }
    }

    /// Path to the vcpkg binary.
    pub fn vcpkg_binary(&self) -> Result<PathBuf, DependencyResolutionError> {
        let root = self.root.as_ref().ok_or_else(|| {
            DependencyResolutionError::new(
                PROVIDER,
                "vcpkg root not found; set VCPKG_ROOT or `[deps.vcpkg] root` in .berth/config.toml",
            )
        })?;
        let exe = if cfg!(windows) { "vcpkg.exe" } else { "vcpkg" };
        Ok(root.join(exe))
    }

    /// Port name for a recipe package name (identity unless mapped in config).
    pub fn port_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.ports.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Target triplet: configured, or inferred from settings.
    pub fn triplet(&self, settings: &Settings) -> Result<String, DependencyResolutionError> {
        if let Some(triplet) = &self.triplet {
            return Ok(triplet.clone());
        }
        infer_triplet(settings).ok_or_else(|| {
            DependencyResolutionError::new(
                PROVIDER,
                format!(
                    "cannot infer a vcpkg triplet from settings `{}`; set `[deps.vcpkg] triplet`",
                    settings
                ),
            )
        })
    }

    fn manifest(&self, spec: &DependencySpec) -> VcpkgManifest {
        let mut dependencies = Vec::with_capacity(spec.len());
        let mut overrides = Vec::with_capacity(spec.len());
        for req in spec.iter() {
            let port = self.port_name(&req.name).to_string();
            dependencies.push(port.clone());
            overrides.push(VcpkgOverride {
                name: port,
                version: req.version,
            });
        }

        VcpkgManifest {
            name: MANIFEST_NAME,
            version_string: "0",
            builtin_baseline: self.baseline.clone(),
            dependencies,
            overrides,
        }
    }

    fn write_manifest(
        &self,
        dir: &Path,
        spec: &DependencySpec,
    ) -> Result<(), DependencyResolutionError> {
        let manifest = self.manifest(spec);
        let json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| DependencyResolutionError::new(PROVIDER, e.to_string()))?;

        std::fs::create_dir_all(dir)
            .and_then(|_| std::fs::write(dir.join("vcpkg.json"), json + "\n"))
            .map_err(|e| {
                DependencyResolutionError::new(
                    PROVIDER,
                    format!("failed to stage vcpkg.json in {}: {}", dir.display(), e),
                )
            })
    }

    fn install(
        &self,
        manifest_dir: &Path,
        install_root: &Path,
        triplet: &str,
    ) -> Result<(), DependencyResolutionError> {
        let vcpkg = self.vcpkg_binary()?;
        if !vcpkg.exists() {
            return Err(DependencyResolutionError::new(
                PROVIDER,
                format!(
                    "vcpkg binary not found at {}; run bootstrap-vcpkg in the vcpkg root",
                    vcpkg.display()
                ),
            ));
        }

        tracing::info!("installing dependencies with vcpkg ({})", triplet);

        let output = ProcessBuilder::new(&vcpkg)
            .arg("install")
            .arg(format!("--triplet={}", triplet))
            .arg(format!("--x-manifest-root={}", manifest_dir.display()))
            .arg(format!("--x-install-root={}", install_root.display()))
            .cwd(manifest_dir)
            .env("VCPKG_DISABLE_METRICS", "1")
            .exec()
            .map_err(|e| DependencyResolutionError::new(PROVIDER, format!("{:#}", e)))?;

        if !output.success() {
            return Err(DependencyResolutionError::new(
                PROVIDER,
                format!("`vcpkg install` failed\n{}{}", output.stdout, output.stderr),
            ));
        }

        Ok(())
    }

    /// Libraries installed by one port, read from vcpkg's per-port file list.
    fn port_libraries(
        &self,
        install_root: &Path,
        triplet: &str,
        port: &str,
        debug: bool,
    ) -> Vec<String> {
        let info_dir = install_root.join("vcpkg").join("info");
        let prefix = format!("{}_", port);
        let suffix = format!("_{}.list", triplet);
        let lib_prefix = if debug {
            format!("{}/debug/lib/", triplet)
        } else {
            format!("{}/lib/", triplet)
        };

        let Ok(entries) = std::fs::read_dir(&info_dir) else {
            return Vec::new();
        };

        let mut libs = Vec::new();
        for entry in entries.filter_map(|e| e.ok()) {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if !file_name.starts_with(&prefix) || !file_name.ends_with(&suffix) {
                continue;
            }
            let Ok(contents) = std::fs::read_to_string(entry.path()) else {
                continue;
            };
            libs.extend(parse_port_list(&contents, &lib_prefix));
        }

        libs.sort();
        libs.dedup();
        libs
    }
}

impl DependencyProvider for VcpkgProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn resolve(
        &self,
        spec: &DependencySpec,
        request: &ResolveRequest<'_>,
    ) -> Result<Vec<ResolvedPackage>, DependencyResolutionError> {
        if spec.is_empty() {
            return Ok(Vec::new());
        }

        let triplet = self.triplet(request.settings)?;
        let manifest_dir = request.build_dir.join("vcpkg");
        let install_root = manifest_dir.join("installed");

        self.write_manifest(&manifest_dir, spec)?;
        self.install(&manifest_dir, &install_root, &triplet)?;

        let debug = request.settings.get(Setting::BuildType) == Some("Debug");
        let prefix = install_root.join(&triplet);

        let packages = spec
            .iter()
            .map(|req| {
                let port = self.port_name(&req.name);
                let libs = self.port_libraries(&install_root, &triplet, port, debug);
                let mut pkg = ResolvedPackage::at_root(&req.name, &req.version, prefix.clone())
                    .with_libs(libs);
                if debug {
                    pkg.lib_dirs.insert(0, prefix.join("debug").join("lib"));
                    pkg.bin_dirs.insert(0, prefix.join("debug").join("bin"));
                }
                pkg
            })
            .collect();

        Ok(packages)
    }
}

/// Infer a vcpkg triplet from `arch`, `os` and (on Windows) `compiler.runtime`.
pub fn infer_triplet(settings: &Settings) -> Option<String> {
    let arch = match settings.get(Setting::Arch)? {
        "x86_64" => "x64",
        "x86" => "x86",
        "armv8" | "arm64" => "arm64",
        "armv7" => "arm",
        _ => return None,
    };

    let os = match settings.get(Setting::Os)? {
        "windows" => "windows",
        "linux" => "linux",
        "macos" => "osx",
        "android" => "android",
        "freebsd" => "freebsd",
        _ => return None,
    };

    let static_crt = os == "windows" && settings.get(Setting::CompilerRuntime) == Some("static");
    if static_crt {
        Some(format!("{}-{}-static", arch, os))
    } else {
        Some(format!("{}-{}", arch, os))
    }
}

/// Pick link names of libraries directly under `lib_prefix` from a port file list.
fn parse_port_list(contents: &str, lib_prefix: &str) -> Vec<String> {
    contents
        .lines()
        .filter_map(|line| line.trim().strip_prefix(lib_prefix))
        .filter(|rest| !rest.contains('/'))
        .filter_map(library_name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> VcpkgProvider {
        let mut ports = BTreeMap::new();
        ports.insert("glfw".to_string(), "glfw3".to_string());
        VcpkgProvider {
            root: Some(PathBuf::from("/opt/vcpkg")),
            triplet: None,
            baseline: Some("abc123".to_string()),
            ports,
        }
    }

    #[test]
    fn test_infer_triplet() {
        let settings = Settings::new()
            .with(Setting::Os, "windows")
            .with(Setting::Arch, "x86_64");
        assert_eq!(infer_triplet(&settings), Some("x64-windows".to_string()));

        let settings = settings.with(Setting::CompilerRuntime, "static");
        assert_eq!(
            infer_triplet(&settings),
            Some("x64-windows-static".to_string())
        );

        let android = Settings::new()
            .with(Setting::Os, "android")
            .with(Setting::Arch, "armv8");
        assert_eq!(infer_triplet(&android), Some("arm64-android".to_string()));

        let unknown = Settings::new()
            .with(Setting::Os, "plan9")
            .with(Setting::Arch, "x86_64");
        assert_eq!(infer_triplet(&unknown), None);
    }

    #[test]
    fn test_missing_root_fails_only_when_installing() {
        let mut p = provider();
        p.root = None;
        assert!(p.vcpkg_binary().is_err());

        let tmp = tempfile::TempDir::new().unwrap();
        let settings = Settings::new();
        let request = ResolveRequest {
            settings: &settings,
            build_dir: tmp.path(),
        };
        assert!(p.resolve(&DependencySpec::new(), &request).unwrap().is_empty());
    }

    #[test]
    fn test_configured_triplet_wins() {
        let mut p = provider();
        p.triplet = Some("x64-linux-dynamic".to_string());
        assert_eq!(p.triplet(&Settings::new()).unwrap(), "x64-linux-dynamic");
        assert!(provider().triplet(&Settings::new()).is_err());
    }

    #[test]
    fn test_manifest_pins_every_requirement() {
        let spec = DependencySpec::new()
            .require("glfw", "3.4")
            .require("vulkan-loader", "1.3.239.0");
        let json = serde_json::to_value(provider().manifest(&spec)).unwrap();

        assert_eq!(json["name"], "berth-deps");
        assert_eq!(json["builtin-baseline"], "abc123");
        assert_eq!(json["dependencies"][0], "glfw3");
        assert_eq!(json["overrides"][0]["name"], "glfw3");
        assert_eq!(json["overrides"][0]["version"], "3.4");
        assert_eq!(json["overrides"][1]["version"], "1.3.239.0");
    }

    #[test]
    fn test_parse_port_list() {
        let list = "\
x64-linux/
x64-linux/include/GLFW/glfw3.h
x64-linux/lib/libglfw3.a
x64-linux/lib/pkgconfig/glfw3.pc
x64-linux/debug/lib/libglfw3.a
x64-linux/share/glfw3/glfw3Config.cmake
";
        assert_eq!(parse_port_list(list, "x64-linux/lib/"), vec!["glfw3".to_string()]);
        assert_eq!(
            parse_port_list(list, "x64-linux/debug/lib/"),
            vec!["glfw3".to_string()]
        );
    }

    #[test]
    fn test_port_libraries_reads_info_lists() {
        let tmp = tempfile::TempDir::new().unwrap();
        let info = tmp.path().join("vcpkg").join("info");
        std::fs::create_dir_all(&info).unwrap();
        std::fs::write(
            info.join("glfw3_3.4_x64-linux.list"),
            "x64-linux/lib/libglfw3.a\n",
        )
        .unwrap();
        std::fs::write(
            info.join("vulkan-loader_1.3.239.0_x64-linux.list"),
            "x64-linux/lib/libvulkan.so\n",
        )
        .unwrap();

        let libs = provider().port_libraries(tmp.path(), "x64-linux", "glfw3", false);
        assert_eq!(libs, vec!["glfw3".to_string()]);
    }
}
