use std::sync::Arc;

use chrono::Utc;
use models::{normalize_text, Comment};
use tracing::{debug, info, instrument};

use crate::errors::ServiceError;
use crate::storage::{CommentStore, StoreKind};

/// Outcome of probing the backing store with a raw read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreStatus {
    Reachable,
    Unreachable(String),
}

/// Validates posts and runs the read-prepend-write cycle.
///
/// No lock is held between the read and the write: two concurrent submits
/// can read the same list and the later write drops the other's comment.
#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn CommentStore>,
}

impl CommentService {
    pub fn new(store: Arc<dyn CommentStore>) -> Self {
        Self { store }
    }

    pub fn store_kind(&self) -> StoreKind {
        self.store.kind()
    }

    /// Full list, newest first.
    pub async fn list(&self) -> Vec<Comment> {
        self.store.fetch_all().await
    }

    /// Trim and validate `raw_text`, then prepend a new comment and write the
    /// whole list back. A failed write is logged by the store, not returned.
    #[instrument(skip(self, raw_text), fields(store = %self.store.kind(), len = raw_text.len()))]
    pub async fn submit(&self, raw_text: &str) -> Result<Comment, ServiceError> {
        let text = normalize_text(raw_text)?;
        let comment = Comment::new(text, Utc::now());
        if comment.exceeds_soft_limit() {
            debug!(id = comment.id, "comment longer than the page's soft limit");
        }

        let mut comments = self.store.fetch_all().await;
        comments.insert(0, comment.clone());
        self.store.persist(&comments).await;

        info!(id = comment.id, total = comments.len(), "comment_posted");
        Ok(comment)
    }

    /// Probe the store with a raw read, bypassing the seed fallback.
    pub async fn store_status(&self) -> StoreStatus {
        match self.store.load().await {
            Ok(_) => StoreStatus::Reachable,
            Err(e) => StoreStatus::Unreachable(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{BlobCommentStore, FileCommentStore, KvCommentStore, MemoryCommentStore, StoreError};
    use async_trait::async_trait;
    use configs::{BlobConfig, KvConfig};
    use models::seed_comments;
    use tokio::sync::Barrier;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    fn memory_service() -> CommentService {
        CommentService::new(Arc::new(MemoryCommentStore::new()))
    }

    fn texts(list: &[Comment]) -> Vec<&str> {
        list.iter().map(|c| c.text.as_str()).collect()
    }

    #[tokio::test]
    async fn never_written_store_lists_seed() {
        assert_eq!(memory_service().list().await, seed_comments());
    }

    #[tokio::test]
    async fn submit_trims_and_prepends() -> anyhow::Result<()> {
        let svc = memory_service();
        let created = svc.submit("  hi  ").await?;
        assert_eq!(created.text, "hi");

        let list = svc.list().await;
        assert_eq!(list[0], created);
        assert_eq!(list.len(), seed_comments().len() + 1);
        Ok(())
    }

    #[tokio::test]
    async fn sequential_posts_are_newest_first() -> anyhow::Result<()> {
        let svc = memory_service();
        svc.submit("a").await?;
        svc.submit("b").await?;
        let list = svc.list().await;
        assert_eq!(&texts(&list)[..2], &["b", "a"]);
        Ok(())
    }

    #[tokio::test]
    async fn blank_text_rejected_and_list_untouched() {
        let svc = memory_service();
        for raw in ["", "   ", "\n\t "] {
            let err = svc.submit(raw).await.unwrap_err();
            assert!(matches!(&err, ServiceError::Validation(_)));
            assert_eq!(err.client_message(), Some("Comment text is required"));
        }
        // nothing was persisted, so the store still reports "never written"
        assert_eq!(svc.store_status().await, StoreStatus::Reachable);
        assert_eq!(svc.list().await, seed_comments());
    }

    #[tokio::test]
    async fn unreachable_store_reports_status_but_submit_succeeds() -> anyhow::Result<()> {
        let cfg = KvConfig { url: "http://127.0.0.1:9".into(), token: "t".into(), key: "comments".into() };
        let svc = CommentService::new(Arc::new(KvCommentStore::from_config(reqwest::Client::new(), &cfg)));
        assert!(matches!(svc.store_status().await, StoreStatus::Unreachable(_)));

        // the write fails and is only logged; the caller still gets the comment
        let created = svc.submit("lost").await?;
        assert_eq!(created.text, "lost");
        assert_eq!(svc.list().await, seed_comments());
        Ok(())
    }

    /// Holds every `load` until `n` callers have read, forcing the
    /// interleaving where concurrent submits all see the same prior list.
    struct LockstepReads<S> {
        inner: S,
        barrier: Barrier,
    }

    #[async_trait]
    impl<S: CommentStore> CommentStore for LockstepReads<S> {
        fn kind(&self) -> StoreKind {
            self.inner.kind()
        }
        async fn load(&self) -> Result<Option<Vec<Comment>>, StoreError> {
            let res = self.inner.load().await;
            self.barrier.wait().await;
            res
        }
        async fn save(&self, comments: &[Comment]) -> Result<(), StoreError> {
            self.inner.save(comments).await
        }
    }

    #[tokio::test]
    async fn concurrent_submits_can_lose_an_update_on_file_store() -> anyhow::Result<()> {
        let path = std::env::temp_dir()
            .join(format!("comment_race_{}", uuid::Uuid::new_v4()))
            .join("comments.json");
        let store = LockstepReads { inner: FileCommentStore::new(&path), barrier: Barrier::new(2) };
        let svc = CommentService::new(Arc::new(store));

        let (a, b) = tokio::join!(svc.submit("a"), svc.submit("b"));
        let (a, b) = (a?, b?);

        let reread = FileCommentStore::new(&path).fetch_all().await;
        let survivors = reread.iter().filter(|c| *c == &a || *c == &b).count();
        assert_eq!(survivors, 1, "last write wins; one comment is silently dropped");
        assert_eq!(reread.len(), seed_comments().len() + 1);

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
        Ok(())
    }

    /// In-memory stand-in for the KV REST service: remembers the last `set`.
    #[derive(Clone, Default)]
    struct KvMemory(Arc<std::sync::Mutex<Option<String>>>);

    impl Respond for KvMemory {
        fn respond(&self, req: &Request) -> ResponseTemplate {
            let mut slot = self.0.lock().unwrap();
            if req.url.path().starts_with("/set/") {
                *slot = Some(String::from_utf8_lossy(&req.body).into_owned());
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": "OK" }))
            } else {
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": slot.clone() }))
            }
        }
    }

    #[tokio::test]
    async fn concurrent_submits_can_lose_an_update_on_kv_store() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        let kv = KvMemory::default();
        Mock::given(method("GET")).and(path("/get/comments")).respond_with(kv.clone()).mount(&server).await;
        Mock::given(method("POST")).and(path("/set/comments")).respond_with(kv.clone()).mount(&server).await;

        let cfg = KvConfig { url: server.uri(), token: "t".into(), key: "comments".into() };
        let store = LockstepReads {
            inner: KvCommentStore::from_config(reqwest::Client::new(), &cfg),
            barrier: Barrier::new(2),
        };
        let svc = CommentService::new(Arc::new(store));

        let (a, b) = tokio::join!(svc.submit("a"), svc.submit("b"));
        let (a, b) = (a?, b?);

        let direct = KvCommentStore::from_config(reqwest::Client::new(), &cfg);
        let stored = direct.fetch_all().await;
        let survivors = stored.iter().filter(|c| *c == &a || *c == &b).count();
        assert_eq!(survivors, 1);
        assert_eq!(stored.len(), seed_comments().len() + 1);
        Ok(())
    }

    /// In-memory stand-in for the blob API: `PUT /comments.json` replaces the
    /// object, `GET /` lists it, and `GET /objects/comments.json` serves it.
    #[derive(Clone)]
    struct BlobMemory {
        base: String,
        object: Arc<std::sync::Mutex<Option<Vec<u8>>>>,
    }

    impl Respond for BlobMemory {
        fn respond(&self, req: &Request) -> ResponseTemplate {
            let mut object = self.object.lock().unwrap();
            match (req.method.as_str(), req.url.path()) {
                ("PUT", "/comments.json") => {
                    *object = Some(req.body.clone());
                    ResponseTemplate::new(200).set_body_json(serde_json::json!({ "pathname": "comments.json" }))
                }
                ("GET", "/") => {
                    let blobs = match object.as_ref() {
                        Some(_) => serde_json::json!([{
                            "url": format!("{}/objects/comments.json", self.base),
                            "pathname": "comments.json",
                            "uploadedAt": "2024-01-01T00:00:00.000Z"
                        }]),
                        None => serde_json::json!([]),
                    };
                    ResponseTemplate::new(200).set_body_json(serde_json::json!({ "blobs": blobs }))
                }
                ("GET", "/objects/comments.json") => match object.as_ref() {
                    Some(bytes) => ResponseTemplate::new(200).set_body_bytes(bytes.clone()),
                    None => ResponseTemplate::new(404),
                },
                _ => ResponseTemplate::new(404),
            }
        }
    }

    #[tokio::test]
    async fn concurrent_submits_can_lose_an_update_on_blob_store() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        let blob = BlobMemory { base: server.uri(), object: Arc::default() };
        Mock::given(wiremock::matchers::any()).respond_with(blob.clone()).mount(&server).await;

        let cfg = BlobConfig { api_url: server.uri(), token: "t".into(), pathname: "comments.json".into() };
        let store = LockstepReads {
            inner: BlobCommentStore::from_config(reqwest::Client::new(), &cfg),
            barrier: Barrier::new(2),
        };
        let svc = CommentService::new(Arc::new(store));

        let (a, b) = tokio::join!(svc.submit("a"), svc.submit("b"));
        let (a, b) = (a?, b?);

        let direct = BlobCommentStore::from_config(reqwest::Client::new(), &cfg);
        let stored = direct.load().await?.unwrap_or_default();
        let survivors = stored.iter().filter(|c| *c == &a || *c == &b).count();
        assert_eq!(survivors, 1, "the later overwrite replaces the whole object");
        assert_eq!(stored.len(), seed_comments().len() + 1);
        Ok(())
    }
}
