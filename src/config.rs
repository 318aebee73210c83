use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub vector: VectorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Directory holding `.well-known/ai-plugin.json`, `openapi.yaml` and `logo.png`
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    /// CORS origin; `*` allows any
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            static_dir: default_static_dir(),
            allowed_origin: default_allowed_origin(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:5003".to_string()
}
fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}
fn default_allowed_origin() -> String {
    "https://chat.openai.com".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_secret: String,
    /// Fixed OAuth redirect URL. Derived from the request Host header when unset.
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_oauth_base")]
    pub oauth_base: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_url: None,
            scope: default_scope(),
            api_base: default_api_base(),
            oauth_base: default_oauth_base(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_scope() -> String {
    "repo".to_string()
}
fn default_api_base() -> String {
    "https://api.github.com".to_string()
}
fn default_oauth_base() -> String {
    "https://github.com".to_string()
}
fn default_user_agent() -> String {
    concat!("gitbridge/", env!("CARGO_PKG_VERSION")).to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_backend")]
    pub backend: StoreBackend,
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
    /// Seconds an issued OAuth state stays valid; 0 disables expiry
    #[serde(default = "default_state_ttl_secs")]
    pub state_ttl_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: default_database_path(),
            state_ttl_secs: default_state_ttl_secs(),
        }
    }
}

fn default_store_backend() -> StoreBackend {
    StoreBackend::Sqlite
}
fn default_database_path() -> PathBuf {
    default_database_path_in(Path::new("."))
}
fn default_state_ttl_secs() -> u64 {
    600
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model: default_model(),
            max_length: default_max_length(),
        }
    }
}

fn default_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}
fn default_max_length() -> usize {
    512
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    Sqlite,
    Pinecone,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorConfig {
    #[serde(default = "default_vector_backend")]
    pub backend: VectorBackend,
    #[serde(default)]
    pub pinecone_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinecone_api_key: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            backend: default_vector_backend(),
            pinecone_host: None,
            pinecone_api_key: None,
            namespace: None,
        }
    }
}

fn default_vector_backend() -> VectorBackend {
    VectorBackend::Sqlite
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("gitbridge.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".gitbridge").join("gitbridge.db")
}

impl Config {
    /// Load the config file (defaults when it does not exist), apply
    /// environment overrides and validate.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = load_config(path)?.unwrap_or_default();
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Override secrets and the bind address from the environment.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(id) = var("GITHUB_CLIENT_ID") {
            self.github.client_id = id;
        }
        if let Some(secret) = var("GITHUB_CLIENT_SECRET") {
            self.github.client_secret = secret;
        }
        if let Some(key) = var("PINECONE_API_KEY") {
            self.vector.pinecone_api_key = Some(key);
        }
        if let Some(bind) = var("GITBRIDGE_BIND") {
            self.server.bind = bind;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.embedding.enabled && self.embedding.max_length == 0 {
            anyhow::bail!("embedding.max_length must be > 0");
        }

        if self.embedding.enabled && self.vector.backend == VectorBackend::Pinecone {
            if self.vector.pinecone_host.as_deref().is_none_or(str::is_empty) {
                anyhow::bail!("vector.pinecone_host is required when vector.backend = \"pinecone\"");
            }
            if self.vector.pinecone_api_key.as_deref().is_none_or(str::is_empty) {
                anyhow::bail!("PINECONE_API_KEY (or vector.pinecone_api_key) is required for the pinecone backend");
            }
        }

        if self.github.client_id.is_empty() {
            tracing::warn!("github.client_id is empty; OAuth flows will be rejected by GitHub");
        }

        Ok(())
    }
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<Config>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &Config, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn ensure_gitignore(project_root: &Path) -> anyhow::Result<()> {
    let gitignore_path = project_root.join(".gitignore");
    let entry = ".gitbridge/";

    let mut content = String::new();
    if gitignore_path.exists() {
        content = std::fs::read_to_string(&gitignore_path)?;
        if content.lines().any(|line| line.trim() == entry) {
            return Ok(());
        }
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
    }
    content.push_str(entry);
    content.push('\n');
    std::fs::write(&gitignore_path, content)?;
    Ok(())
}
