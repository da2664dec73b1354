//! `berth layout` command

use anyhow::Result;

use crate::cli::LayoutArgs;
use crate::commands::Session;
use berth::builder::RunEvent;
use berth::util::Shell;

pub fn execute(args: LayoutArgs, shell: &Shell) -> Result<()> {
    let plan = Session::load()?.plan(&args.settings, &[], None)?;

    if shell.is_json() {
        shell.event(&RunEvent::LayoutResolved {
            segment: plan.layout.segment.clone(),
            build_dir: plan.layout.build_dir.clone(),
        });
    } else {
        println!("{}", plan.layout.build_dir.display());
    }

    Ok(())
}
