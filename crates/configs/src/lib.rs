use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            worker_threads: Some(4),
        }
    }
}

/// Which substrate holds the comment list.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Remote store when credentials are present, local file otherwise.
    #[default]
    Auto,
    Memory,
    File,
    Kv,
    Blob,
}

impl std::str::FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(Self::Auto),
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            "kv" => Ok(Self::Kv),
            "blob" => Ok(Self::Blob),
            other => Err(anyhow!("unknown storage backend `{other}` (expected auto|memory|file|kv|blob)")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default = "default_file_path")]
    pub file_path: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub kv: KvConfig,
    #[serde(default)]
    pub blob: BlobConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Auto,
            file_path: default_file_path(),
            request_timeout_secs: default_request_timeout(),
            kv: KvConfig::default(),
            blob: BlobConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct KvConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_kv_key")]
    pub key: String,
}

impl Default for KvConfig {
    fn default() -> Self {
        Self { url: String::new(), token: String::new(), key: default_kv_key() }
    }
}

impl KvConfig {
    pub fn has_credentials(&self) -> bool {
        !self.url.trim().is_empty() && !self.token.trim().is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlobConfig {
    #[serde(default = "default_blob_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_blob_pathname")]
    pub pathname: String,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self { api_url: default_blob_api_url(), token: String::new(), pathname: default_blob_pathname() }
    }
}

impl BlobConfig {
    pub fn has_credentials(&self) -> bool {
        !self.token.trim().is_empty()
    }
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 3000 }
fn default_static_dir() -> String { "public".into() }
fn default_file_path() -> String { "data/comments.json".into() }
fn default_request_timeout() -> u64 { 10 }
fn default_kv_key() -> String { "comments".into() }
fn default_blob_api_url() -> String { "https://blob.vercel-storage.com".into() }
fn default_blob_pathname() -> String { "comments.json".into() }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or defaults when it is absent), overlay the
    /// process environment, then validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_not_found(&e) => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.apply_env(|key| std::env::var(key).ok())?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Overlay environment variables through `lookup` so tests can supply
    /// their own map instead of mutating the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = get("PORT") {
            self.server.port = port
                .trim()
                .parse::<u16>()
                .map_err(|e| anyhow!("PORT `{port}` is not a port in 1..=65535: {e}"))?;
        }
        if let Some(host) = get("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(dir) = get("STATIC_DIR") {
            self.server.static_dir = dir;
        }
        if let Some(w) = get("TOKIO_WORKER_THREADS") {
            let threads = w
                .trim()
                .parse::<usize>()
                .map_err(|e| anyhow!("TOKIO_WORKER_THREADS `{w}` is not a thread count: {e}"))?;
            self.server.worker_threads = Some(threads);
        }
        if let Some(backend) = get("STORAGE_BACKEND") {
            self.storage.backend = backend.parse()?;
        }
        if let Some(path) = get("COMMENTS_FILE") {
            self.storage.file_path = path;
        }
        if let Some(url) = get("KV_REST_API_URL") {
            self.storage.kv.url = url;
        }
        if let Some(token) = get("KV_REST_API_TOKEN") {
            self.storage.kv.token = token;
        }
        if let Some(token) = get("BLOB_READ_WRITE_TOKEN") {
            self.storage.blob.token = token;
        }
        if let Some(url) = get("BLOB_API_URL") {
            self.storage.blob.api_url = url;
        }
        Ok(())
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.storage.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = default_host();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        if self.static_dir.trim().is_empty() {
            self.static_dir = default_static_dir();
        }
        match self.worker_threads {
            Some(w) if w > 0 => {}
            _ => self.worker_threads = Some(4),
        }
        Ok(())
    }
}

impl StorageConfig {
    /// Resolve `auto` to a concrete backend based on which credentials are set.
    pub fn resolved_backend(&self) -> BackendKind {
        match self.backend {
            BackendKind::Auto if self.kv.has_credentials() => BackendKind::Kv,
            BackendKind::Auto if self.blob.has_credentials() => BackendKind::Blob,
            BackendKind::Auto => BackendKind::File,
            explicit => explicit,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(anyhow!("storage.request_timeout_secs must be a positive number of seconds"));
        }
        if self.file_path.trim().is_empty() {
            return Err(anyhow!("storage.file_path must not be empty"));
        }
        if self.kv.key.trim().is_empty() {
            return Err(anyhow!("storage.kv.key must not be empty"));
        }
        if self.blob.pathname.trim().is_empty() || self.blob.pathname.starts_with('/') {
            return Err(anyhow!("storage.blob.pathname must be a non-empty relative path"));
        }
        let api = self.blob.api_url.to_lowercase();
        if !(api.starts_with("http://") || api.starts_with("https://")) {
            return Err(anyhow!("storage.blob.api_url must start with http:// or https://"));
        }
        Ok(())
    }
}

fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<std::io::Error>()
        .map(|e| e.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}
