pub mod clear;
pub mod edit;
pub mod init;
pub mod remote;
pub mod show;

pub use clear::{clear, ClearArgs};
pub use edit::{edit, EditArgs};
pub use init::{init, InitArgs};
pub use remote::{remote, RemoteArgs};
pub use show::{show, ShowArgs};

use anyhow::Result;
use outliner::{DirectoryStorage, LocalDocProvider, OutlinerConfig};
use std::path::Path;
use std::sync::Arc;

/// Local provider for `id`, stored under the configured storage directory
pub(crate) fn open_local(cwd: &Path, id: &str) -> Result<(OutlinerConfig, Arc<LocalDocProvider>)> {
    let config = OutlinerConfig::load(cwd)?;
    let storage = Arc::new(DirectoryStorage::new(config.get_storage_dir(cwd)));
    let provider = Arc::new(LocalDocProvider::from_config(id, &config, storage));
    Ok((config, provider))
}
