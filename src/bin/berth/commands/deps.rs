//! `berth deps` command

use anyhow::Result;

use crate::cli::DepsArgs;
use crate::commands::Session;

pub fn execute(args: DepsArgs) -> Result<()> {
    let session = Session::load()?;
    let spec = session.recipe.requirements();

    if args.json {
        println!("{}", serde_json::to_string_pretty(spec)?);
        return Ok(());
    }

    for req in spec.iter() {
        println!("{}", req);
    }

    Ok(())
}
