use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::Path;

use super::open_local;

#[derive(Debug, Args)]
pub struct ClearArgs {
    /// Document id
    pub id: String,
}

pub fn clear(args: ClearArgs, cwd: &Path) -> Result<()> {
    let (_, provider) = open_local(cwd, &args.id)?;
    provider.clear();

    println!("  {} Cleared {}", "✓".green(), provider.storage_key());
    Ok(())
}
