//! `berth clean` command

use anyhow::Result;

use crate::cli::CleanArgs;
use crate::commands::Session;
use berth::ops::{clean, resolve_build_root};
use berth::util::shell::Status;
use berth::util::Shell;

pub fn execute(args: CleanArgs, shell: &Shell) -> Result<()> {
    let session = Session::load()?;
    let recipe_dir = session.recipe.recipe_dir().to_path_buf();

    // The whole build root needs no settings
    let target = if args.all {
        let build_root = args
            .settings
            .build_root
            .clone()
            .or_else(|| session.config.build.build_root.clone());
        resolve_build_root(&session.recipe, build_root.as_deref())
    } else {
        session.plan(&args.settings, &[], None)?.layout.build_dir
    };

    if clean(&target, &recipe_dir)? {
        shell.status(Status::Removed, target.display());
    } else {
        shell.status(Status::Info, format!("nothing to clean at {}", target.display()));
    }

    Ok(())
}
