//! Dependency descriptor files.
//!
//! Each resolved package gets one `<name>-config.cmake` so that
//! `find_package(<name>)` in the project's CMakeLists.txt finds it through
//! the prefix path set by the toolchain file.

use std::fmt::Write;
use std::path::PathBuf;

use crate::sources::ResolvedPackage;
use crate::util::fs::cmake_path;

/// Descriptor file name for a package.
pub fn descriptor_file_name(name: &str) -> String {
    format!("{}-config.cmake", name)
}

fn cmake_list(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| cmake_path(p))
        .collect::<Vec<_>>()
        .join(";")
}

/// Render the descriptor for a resolved package.
pub fn render_descriptor(pkg: &ResolvedPackage) -> String {
    let name = &pkg.name;
    let target = format!("{0}::{0}", name);
    let mut out = String::new();

    let _ = writeln!(out, "# Generated by berth for {}/{}. Do not edit.", name, pkg.version);
    let _ = writeln!(out);
    let _ = writeln!(out, "set({}_FOUND TRUE)", name);
    let _ = writeln!(out, "set({}_VERSION \"{}\")", name, pkg.version);
    let _ = writeln!(out, "set({}_ROOT \"{}\")", name, cmake_path(&pkg.root));
    let _ = writeln!(out, "set({}_INCLUDE_DIRS \"{}\")", name, cmake_list(&pkg.include_dirs));
    let _ = writeln!(out, "set({}_LIBRARY_DIRS \"{}\")", name, cmake_list(&pkg.lib_dirs));
    let _ = writeln!(out, "set({}_BIN_DIRS \"{}\")", name, cmake_list(&pkg.bin_dirs));
    let _ = writeln!(out, "set({}_LIBRARIES \"{}\")", name, pkg.libs.join(";"));
    let _ = writeln!(out);
    let _ = writeln!(out, "if(NOT TARGET {})", target);
    let _ = writeln!(out, "  add_library({} INTERFACE IMPORTED)", target);
    let _ = writeln!(
        out,
        "  set_target_properties({} PROPERTIES INTERFACE_INCLUDE_DIRECTORIES \"${{{}_INCLUDE_DIRS}}\")",
        target, name
    );
    if !pkg.libs.is_empty() {
        let _ = writeln!(
            out,
            "  target_link_directories({} INTERFACE ${{{}_LIBRARY_DIRS}})",
            target, name
        );
        let _ = writeln!(
            out,
            "  target_link_libraries({} INTERFACE ${{{}_LIBRARIES}})",
            target, name
        );
    }
    let _ = writeln!(out, "endif()");

    out
}
