//! `berth build` command

use anyhow::{bail, Result};

use crate::cli::BuildArgs;
use crate::commands::Session;
use berth::builder::cmake::is_cmake_project;
use berth::builder::CMakeBuildSystem;
use berth::ops::{build, BuildOptions};
use berth::util::context::project_berth_dir;
use berth::util::shell::{format_duration, Status};
use berth::util::Shell;

pub fn execute(args: BuildArgs, shell: &Shell) -> Result<()> {
    let session = Session::load()?;
    let provider = session.provider(&args.install.provider)?;

    // CLI > config
    let cmake_path = args.cmake.or_else(|| session.config.build.cmake.clone());
    let jobs = args.jobs.or(session.config.build.jobs);
    let install_prefix = args
        .install_prefix
        .or_else(|| session.config.build.install_prefix.clone());

    let plan = session.plan(
        &args.install.settings,
        &args.install.provider.defines,
        args.install.generator,
    )?;

    if !is_cmake_project(plan.source_dir()) {
        bail!(
            "no CMakeLists.txt in {}\n\
             hint: `berth build` drives a CMake project next to Berth.toml",
            plan.source_dir().display()
        );
    }

    // Check the tool before anything is written
    let cmake = CMakeBuildSystem::locate(cmake_path.as_deref())?.inherit_output(shell.is_verbose());
    cmake.check_version()?;

    let install_prefix = match install_prefix {
        Some(prefix) if prefix.is_absolute() => prefix,
        Some(prefix) => plan.source_dir().join(prefix),
        None => project_berth_dir(plan.source_dir()).join("package"),
    };

    let opts = BuildOptions {
        install_prefix,
        jobs,
    };
    let outcome = build(&plan, provider.as_ref(), &cmake, &opts, shell)?;

    shell.status(
        Status::Finished,
        format!(
            "{} v{} in {}, installed to {}",
            plan.recipe.package.name,
            plan.recipe.package.version,
            format_duration(outcome.duration),
            outcome.install_prefix.display()
        ),
    );

    Ok(())
}
