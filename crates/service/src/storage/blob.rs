use async_trait::async_trait;
use chrono::{DateTime, Utc};
use configs::BlobConfig;
use models::{decode_list, encode_list, Comment};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use super::{check_status, CommentStore, StoreError, StoreKind};

const API_VERSION: &str = "7";

/// Blob store holding the list as a single JSON object.
///
/// The object is located by listing with its pathname as prefix and taking
/// the newest exact match, then fetched from its public URL. Writes replace
/// the whole object under the same pathname.
pub struct BlobCommentStore {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
    pathname: String,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    blobs: Vec<BlobEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlobEntry {
    url: String,
    pathname: String,
    uploaded_at: DateTime<Utc>,
}

impl BlobCommentStore {
    pub fn from_config(client: reqwest::Client, cfg: &BlobConfig) -> Self {
        let token = cfg.has_credentials().then(|| cfg.token.trim().to_string());
        Self {
            client,
            api_url: cfg.api_url.trim().trim_end_matches('/').to_string(),
            token,
            pathname: cfg.pathname.clone(),
        }
    }

    fn token(&self) -> Result<&str, StoreError> {
        self.token.as_deref().ok_or(StoreError::MissingCredentials("blob"))
    }

    /// URL of the newest object stored under our pathname, if any.
    async fn locate(&self, token: &str) -> Result<Option<String>, StoreError> {
        let resp = self
            .client
            .get(&self.api_url)
            .query(&[("prefix", self.pathname.as_str())])
            .bearer_auth(token)
            .header("x-api-version", API_VERSION)
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let listing: ListResponse = check_status(resp)?.json().await?;
        Ok(listing
            .blobs
            .into_iter()
            .filter(|b| b.pathname == self.pathname)
            .max_by_key(|b| b.uploaded_at)
            .map(|b| b.url))
    }
}

#[async_trait]
impl CommentStore for BlobCommentStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Blob
    }

    async fn load(&self) -> Result<Option<Vec<Comment>>, StoreError> {
        let token = self.token()?;
        let Some(url) = self.locate(token).await? else {
            return Ok(None);
        };
        debug!(%url, "fetching comments blob");
        let resp = self.client.get(&url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let bytes = check_status(resp)?.bytes().await?;
        Ok(Some(decode_list(&bytes)?))
    }

    async fn save(&self, comments: &[Comment]) -> Result<(), StoreError> {
        let token = self.token()?;
        let resp = self
            .client
            .put(format!("{}/{}", self.api_url, self.pathname))
            .bearer_auth(token)
            .header("x-api-version", API_VERSION)
            .header("x-add-random-suffix", "0")
            .header("x-allow-overwrite", "1")
            .header("x-content-type", "application/json")
            .body(encode_list(comments)?)
            .send()
            .await?;
        check_status(resp)?;
        Ok(())
    }
}
