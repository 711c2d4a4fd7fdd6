//! Environment/runtime helpers
//!
//! Sanity checks run once at startup, before the store is built.

use std::path::Path;

use tracing::warn;

/// Warn when the static page is missing and make sure the directory that will
/// hold the comments file exists.
pub async fn ensure_env(static_dir: &str, data_file: Option<&Path>) -> anyhow::Result<()> {
    let index = Path::new(static_dir).join("index.html");
    if tokio::fs::metadata(&index).await.is_err() {
        warn!(%static_dir, "index.html not found; GET / will 404");
    }
    if let Some(parent) = data_file.and_then(Path::parent) {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
