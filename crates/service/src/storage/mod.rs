//! Comment persistence.
//!
//! Every backend stores the whole list as one JSON array and overwrites it
//! whole on each change. There is no conditional write anywhere, so two
//! concurrent read-modify-write cycles can lose an update.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use configs::{BackendKind, StorageConfig};
use models::{seed_comments, Comment};
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub mod blob;
pub mod file;
pub mod kv;
pub mod memory;

pub use blob::BlobCommentStore;
pub use file::FileCommentStore;
pub use kv::KvCommentStore;
pub use memory::MemoryCommentStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("decode error: {0}")]
    Decode(#[from] models::errors::ModelError),
    #[error("remote store error: {0}")]
    Remote(String),
    #[error("no credentials configured for the {0} store")]
    MissingCredentials(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    File,
    Kv,
    Blob,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File => "file",
            Self::Kv => "kv",
            Self::Blob => "blob",
        }
    }
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whole-list comment persistence.
///
/// Implementors provide the raw `load`/`save` pair; callers use
/// [`fetch_all`](CommentStore::fetch_all) and [`persist`](CommentStore::persist),
/// which never fail outward.
#[async_trait]
pub trait CommentStore: Send + Sync {
    fn kind(&self) -> StoreKind;

    /// Read the persisted list. `Ok(None)` means nothing was ever written.
    async fn load(&self) -> Result<Option<Vec<Comment>>, StoreError>;

    /// Replace the persisted list with `comments`.
    async fn save(&self, comments: &[Comment]) -> Result<(), StoreError>;

    /// List served when `load` fails.
    fn fallback(&self) -> Vec<Comment> {
        seed_comments()
    }

    /// Persisted list, the seed list when nothing was written yet, or
    /// [`fallback`](CommentStore::fallback) when the substrate fails.
    async fn fetch_all(&self) -> Vec<Comment> {
        match self.load().await {
            Ok(Some(comments)) => comments,
            Ok(None) => {
                debug!(store = %self.kind(), "nothing persisted yet; serving seed comments");
                seed_comments()
            }
            Err(e) => {
                warn!(store = %self.kind(), error = %e, "comment store unavailable; serving fallback list");
                self.fallback()
            }
        }
    }

    /// Overwrite the persisted list. Failures are logged and swallowed.
    async fn persist(&self, comments: &[Comment]) {
        match self.save(comments).await {
            Ok(()) => debug!(store = %self.kind(), count = comments.len(), "comments persisted"),
            Err(e) => error!(
                store = %self.kind(),
                count = comments.len(),
                error = %e,
                "failed to persist comments; the write is lost"
            ),
        }
    }
}

/// Build the store selected by `cfg`, resolving `auto` from the credentials
/// that are present.
pub fn build_store(cfg: &StorageConfig) -> Result<Arc<dyn CommentStore>, StoreError> {
    let backend = cfg.resolved_backend();
    let store: Arc<dyn CommentStore> = match backend {
        BackendKind::Memory => Arc::new(MemoryCommentStore::new()),
        BackendKind::File | BackendKind::Auto => Arc::new(FileCommentStore::new(&cfg.file_path)),
        BackendKind::Kv => {
            let client = http_client(cfg)?;
            Arc::new(KvCommentStore::from_config(client, &cfg.kv))
        }
        BackendKind::Blob => {
            let client = http_client(cfg)?;
            Arc::new(BlobCommentStore::from_config(client, &cfg.blob))
        }
    };
    info!(requested = ?cfg.backend, store = %store.kind(), "comment store selected");
    Ok(store)
}

fn http_client(cfg: &StorageConfig) -> Result<reqwest::Client, StoreError> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.request_timeout_secs))
        .build()?)
}

/// Turn a non-2xx response into [`StoreError::Status`].
pub(crate) fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(StoreError::Status { status: status.as_u16(), url: resp.url().to_string() })
    }
}
