use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;

use crate::adapter::default_registry;
use crate::config::{Config, StoreBackend, VectorBackend, ensure_db_dir};
use crate::embedding::{Embedder, FastEmbedder};
use crate::github::{GitHubApi, build_http_client};
use crate::indexer::CodeIndexer;
use crate::oauth::OAuthClient;
use crate::session::{KeyValueStore, MemoryStore, TokenStore};
use crate::storage::SqliteStore;
use crate::vector::{PineconeIndex, VectorIndex};
use crate::{Error, Result};

pub mod error;
pub mod routes;

/// Shared by every handler; cloning is cheap
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tokens: TokenStore,
    pub github: GitHubApi,
    pub oauth: OAuthClient,
    /// `None` when embeddings are disabled
    pub indexer: Option<Arc<CodeIndexer>>,
}

impl AppState {
    /// Wire up stores and clients from configuration.
    ///
    /// Loads the embedding model when enabled, which may download it.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let http = build_http_client(&config.github)?;

        let sqlite = match (&config.store.backend, &config.vector.backend, config.embedding.enabled) {
            (StoreBackend::Sqlite, _, _) | (_, VectorBackend::Sqlite, true) => {
                ensure_db_dir(&config.store.path)?;
                Some(Arc::new(SqliteStore::open(&config.store.path)?))
            }
            _ => None,
        };

        let kv: Arc<dyn KeyValueStore> = match (&config.store.backend, &sqlite) {
            (StoreBackend::Sqlite, Some(store)) => store.clone(),
            _ => Arc::new(MemoryStore::new()),
        };
        let tokens = TokenStore::new(kv, state_ttl(&config));

        let indexer = if config.embedding.enabled {
            let embedder: Arc<dyn Embedder> = Arc::new(FastEmbedder::new(&config.embedding)?);
            let index = vector_index(&config, http.clone(), sqlite.clone())?;
            Some(Arc::new(CodeIndexer::new(default_registry(), embedder, index)))
        } else {
            tracing::info!("Embeddings disabled; /query_similar_code will reject requests");
            None
        };

        Ok(Self {
            github: GitHubApi::new(http.clone(), &config.github),
            oauth: OAuthClient::new(http, &config.github),
            tokens,
            indexer,
            config: Arc::new(config),
        })
    }
}

fn state_ttl(config: &Config) -> Option<std::time::Duration> {
    match config.store.state_ttl_secs {
        0 => None,
        secs => Some(std::time::Duration::from_secs(secs)),
    }
}

fn vector_index(
    config: &Config,
    http: reqwest::Client,
    sqlite: Option<Arc<SqliteStore>>,
) -> Result<Arc<dyn VectorIndex>> {
    match config.vector.backend {
        VectorBackend::Sqlite => {
            let store = sqlite.ok_or_else(|| Error::Config("SQLite vector index not opened".to_string()))?;
            Ok(store as Arc<dyn VectorIndex>)
        }
        VectorBackend::Pinecone => {
            let (Some(host), Some(key)) = (&config.vector.pinecone_host, &config.vector.pinecone_api_key) else {
                return Err(Error::Config(
                    "vector.pinecone_host and vector.pinecone_api_key are required".to_string(),
                ));
            };
            let index = PineconeIndex::new(http, host, key, config.vector.namespace.clone());
            Ok(Arc::new(index) as Arc<dyn VectorIndex>)
        }
    }
}

fn cors_layer(allowed_origin: &str) -> Result<CorsLayer> {
    if allowed_origin == "*" {
        return Ok(CorsLayer::permissive());
    }

    let origin = HeaderValue::from_str(allowed_origin)
        .map_err(|e| Error::Config(format!("invalid allowed_origin '{}': {}", allowed_origin, e)))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

pub fn build_router(state: AppState) -> Result<Router> {
    let static_dir = state.config.server.static_dir.clone();
    let cors = cors_layer(&state.config.server.allowed_origin)?;

    let app = Router::new()
        .route("/generate_auth_url", get(routes::generate_auth_url))
        .route("/callback", get(routes::callback))
        .route("/device/start", post(routes::device_start))
        .route("/device/poll", post(routes::device_poll))
        .route("/repository_info/{user}/{repo}", get(routes::repository_info))
        .route("/list_repository_directory/{user}/{repo}", get(routes::list_repository_root))
        .route("/list_repository_directory/{user}/{repo}/{*path}", get(routes::list_repository_directory))
        .route("/repository_file_contents/{user}/{repo}/{*path}", get(routes::repository_file_contents))
        .route("/create_issue/{user}/{repo}", post(routes::create_issue))
        .route("/search_code", get(routes::search_code))
        .route("/commit_history/{user}/{repo}", get(routes::commit_history))
        .route("/query_similar_code", post(routes::query_similar_code))
        .route("/health", get(routes::health))
        .route_service(
            "/.well-known/ai-plugin.json",
            ServeFile::new(static_dir.join(".well-known").join("ai-plugin.json")),
        )
        .route_service("/openapi.yaml", ServeFile::new(static_dir.join("openapi.yaml")))
        .route_service("/logo.png", ServeFile::new(static_dir.join("logo.png")))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    Ok(app)
}

/// Bind and serve until the process is stopped
pub async fn start_server(state: AppState) -> anyhow::Result<()> {
    let bind = state.config.server.bind.clone();
    let app = build_router(state)?;

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!("Starting server on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
