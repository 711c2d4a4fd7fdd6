//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` so the server can prepare the
//! environment from its storage configuration without knowing which backend
//! touches the local disk.

use std::path::Path;

use configs::{BackendKind, StorageConfig};

/// Ensure expected directories exist; warn on missing optional ones.
pub async fn ensure_env(static_dir: &str, storage: &StorageConfig) -> anyhow::Result<()> {
    let data_file = match storage.resolved_backend() {
        BackendKind::File => Some(Path::new(&storage.file_path)),
        _ => None,
    };
    common::env::ensure_env(static_dir, data_file).await
}
