use std::{io::ErrorKind, path::PathBuf};

use async_trait::async_trait;
use models::{decode_list, encode_list, Comment};
use tokio::fs;
use uuid::Uuid;

use super::{CommentStore, StoreError, StoreKind};

/// JSON file on the local disk, durable on one host.
///
/// A missing file means nothing was written yet. Unreadable or corrupt
/// files fall back to an empty list rather than the seed.
#[derive(Clone, Debug)]
pub struct FileCommentStore {
    file_path: PathBuf,
}

impl FileCommentStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { file_path: path.into() }
    }

    /// Sibling temp file, unique per write so concurrent saves never share one.
    fn temp_path(&self) -> PathBuf {
        let name = self
            .file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "comments.json".into());
        self.file_path.with_file_name(format!(".{name}.{}.tmp", Uuid::new_v4()))
    }
}

#[async_trait]
impl CommentStore for FileCommentStore {
    fn kind(&self) -> StoreKind {
        StoreKind::File
    }

    async fn load(&self) -> Result<Option<Vec<Comment>>, StoreError> {
        let bytes = match fs::read(&self.file_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(decode_list(&bytes)?))
    }

    async fn save(&self, comments: &[Comment]) -> Result<(), StoreError> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let data = encode_list(comments)?;
        let tmp = self.temp_path();
        fs::write(&tmp, data).await?;
        if let Err(e) = fs::rename(&tmp, &self.file_path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    fn fallback(&self) -> Vec<Comment> {
        Vec::new()
    }
}
