use async_trait::async_trait;
use models::Comment;
use tokio::sync::RwLock;

use super::{CommentStore, StoreError, StoreKind};

/// Process-local store. Lost on restart and not shared between instances.
#[derive(Default)]
pub struct MemoryCommentStore {
    comments: RwLock<Option<Vec<Comment>>>,
}

impl MemoryCommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `comments` as if they had already been persisted.
    pub fn with_comments(comments: Vec<Comment>) -> Self {
        Self { comments: RwLock::new(Some(comments)) }
    }
}

#[async_trait]
impl CommentStore for MemoryCommentStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Memory
    }

    async fn load(&self) -> Result<Option<Vec<Comment>>, StoreError> {
        Ok(self.comments.read().await.clone())
    }

    async fn save(&self, comments: &[Comment]) -> Result<(), StoreError> {
        *self.comments.write().await = Some(comments.to_vec());
        Ok(())
    }
}
