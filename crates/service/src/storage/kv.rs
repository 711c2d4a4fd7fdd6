use async_trait::async_trait;
use configs::KvConfig;
use models::{decode_list, encode_list, Comment};
use serde::Deserialize;
use serde_json::Value;

use super::{check_status, CommentStore, StoreError, StoreKind};

/// Key-value store reached over its REST interface
/// (`GET {url}/get/{key}`, `POST {url}/set/{key}`, bearer auth).
pub struct KvCommentStore {
    client: reqwest::Client,
    endpoint: Option<KvEndpoint>,
    key: String,
}

struct KvEndpoint {
    base_url: String,
    token: String,
}

#[derive(Deserialize)]
struct KvResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

impl KvResponse {
    fn into_result(self) -> Result<Option<Value>, StoreError> {
        match self.error {
            Some(msg) => Err(StoreError::Remote(msg)),
            None => Ok(self.result.filter(|v| !v.is_null())),
        }
    }
}

impl KvCommentStore {
    /// Credentials are optional; without them every call reports
    /// [`StoreError::MissingCredentials`].
    pub fn from_config(client: reqwest::Client, cfg: &KvConfig) -> Self {
        let endpoint = cfg.has_credentials().then(|| KvEndpoint {
            base_url: cfg.url.trim().trim_end_matches('/').to_string(),
            token: cfg.token.trim().to_string(),
        });
        Self { client, endpoint, key: cfg.key.clone() }
    }

    fn endpoint(&self) -> Result<&KvEndpoint, StoreError> {
        self.endpoint.as_ref().ok_or(StoreError::MissingCredentials("kv"))
    }
}

#[async_trait]
impl CommentStore for KvCommentStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Kv
    }

    async fn load(&self) -> Result<Option<Vec<Comment>>, StoreError> {
        let ep = self.endpoint()?;
        let resp = self
            .client
            .get(format!("{}/get/{}", ep.base_url, self.key))
            .bearer_auth(&ep.token)
            .send()
            .await?;
        let body: KvResponse = check_status(resp)?.json().await?;
        match body.into_result()? {
            None => Ok(None),
            // values written by `save` come back as the raw JSON string
            Some(Value::String(raw)) => Ok(Some(decode_list(raw.as_bytes())?)),
            // clients that auto-serialize store the array itself
            Some(other) => Ok(Some(
                serde_json::from_value::<Vec<Comment>>(other).map_err(models::errors::ModelError::from)?,
            )),
        }
    }

    async fn save(&self, comments: &[Comment]) -> Result<(), StoreError> {
        let ep = self.endpoint()?;
        let resp = self
            .client
            .post(format!("{}/set/{}", ep.base_url, self.key))
            .bearer_auth(&ep.token)
            .body(encode_list(comments)?)
            .send()
            .await?;
        let body: KvResponse = check_status(resp)?.json().await?;
        body.into_result()?;
        Ok(())
    }
}
