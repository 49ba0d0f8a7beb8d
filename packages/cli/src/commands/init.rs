use anyhow::Result;
use clap::Args;
use colored::Colorize;
use outliner::{OutlinerConfig, DEFAULT_CONFIG_NAME};
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Quiet period before a snapshot is written, in milliseconds
    #[arg(long, default_value = "800")]
    pub debounce_ms: u64,

    /// Directory holding stored documents
    #[arg(short, long, default_value = ".outliner")]
    pub storage_dir: String,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    let config = OutlinerConfig {
        debounce_ms: args.debounce_ms,
        storage_dir: args.storage_dir,
        ..OutlinerConfig::default()
    };
    config.save(cwd)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("Next steps:");
    println!("  1. Run: outliner edit demo '{{\"type\": \"doc\", \"content\": []}}'");
    println!("  2. Run: outliner show demo");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_config() {
        let dir = tempfile::tempdir().unwrap();
        let args = InitArgs {
            debounce_ms: 100,
            storage_dir: "docs".to_string(),
            force: false,
        };

        init(args, dir.path()).unwrap();

        let config = OutlinerConfig::load(dir.path()).unwrap();
        assert_eq!(config.debounce_ms, 100);
        assert_eq!(config.storage_dir, "docs");
    }

    #[test]
    fn test_init_keeps_existing_config_without_force() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_NAME), "{\"debounceMs\": 5}").unwrap();

        let args = InitArgs {
            debounce_ms: 100,
            storage_dir: ".outliner".to_string(),
            force: false,
        };
        init(args, dir.path()).unwrap();

        assert_eq!(OutlinerConfig::load(dir.path()).unwrap().debounce_ms, 5);
    }
}
