//! `berth export` command

use anyhow::{Context, Result};

use crate::cli::ExportArgs;
use crate::commands::Session;
use berth::ops::export;
use berth::util::shell::Status;
use berth::util::Shell;

pub fn execute(args: ExportArgs, shell: &Shell) -> Result<()> {
    let session = Session::load()?;

    let dest = if args.dest.is_absolute() {
        args.dest
    } else {
        std::env::current_dir()
            .context("failed to get current directory")?
            .join(args.dest)
    };

    let outcome = export(&session.recipe, &dest)?;

    for pattern in &outcome.unmatched {
        shell.warn(format!("`{}` in `exports-sources` matched no files", pattern));
    }
    for path in &outcome.files {
        tracing::debug!("exported {}", path.display());
    }
    shell.status(
        Status::Exported,
        format!(
            "{} v{} ({} file(s)) to {}",
            session.recipe.package.name,
            session.recipe.package.version,
            outcome.files.len(),
            dest.display()
        ),
    );

    Ok(())
}
