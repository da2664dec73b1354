//! `berth install` command

use anyhow::Result;

use crate::cli::InstallArgs;
use crate::commands::Session;
use berth::ops::install;
use berth::util::shell::Status;
use berth::util::Shell;

pub fn execute(args: InstallArgs, shell: &Shell) -> Result<()> {
    let session = Session::load()?;
    let provider = session.provider(&args.provider)?;
    let plan = session.plan(&args.settings, &args.provider.defines, args.generator)?;

    let outcome = install(&plan, provider.as_ref(), shell)?;

    shell.status(
        Status::Finished,
        format!(
            "{} v{} dependencies ({} package(s))",
            plan.recipe.package.name,
            plan.recipe.package.version,
            outcome.packages.len()
        ),
    );

    Ok(())
}
