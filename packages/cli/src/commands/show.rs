use anyhow::Result;
use clap::Args;
use colored::Colorize;
use outliner::DocumentProvider;
use std::path::Path;

use super::open_local;

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Document id
    pub id: String,
}

pub fn show(args: ShowArgs, cwd: &Path) -> Result<()> {
    let (_, provider) = open_local(cwd, &args.id)?;

    match provider.get_json_snapshot() {
        Some(snapshot) => {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        None => {
            println!(
                "{} No snapshot stored under {}",
                "⚠️".yellow(),
                provider.storage_key().bright_white()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use outliner::{DirectoryStorage, KeyValueStorage, OutlinerConfig};

    #[test]
    fn test_show_missing_document_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = ShowArgs {
            id: "absent".to_string(),
        };
        assert!(show(args, dir.path()).is_ok());
    }

    #[test]
    fn test_show_reads_stored_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DirectoryStorage::new(OutlinerConfig::default().get_storage_dir(dir.path()));
        storage.set_item("outliner-notes/a", "{\"a\":1}").unwrap();

        let (_, provider) = open_local(dir.path(), "notes/a").unwrap();
        assert_eq!(provider.get_json_snapshot(), Some(serde_json::json!({"a": 1})));

        let args = ShowArgs {
            id: "notes/a".to_string(),
        };
        assert!(show(args, dir.path()).is_ok());
    }
}
