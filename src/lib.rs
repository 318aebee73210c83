//! # gitbridge - GitHub plugin backend
//!
//! HTTP service exposing GitHub repository operations to a conversational agent.
//!
//! gitbridge provides:
//! - GitHub OAuth web and device flows with a per-session token store
//! - Thin, authenticated wrappers over the GitHub REST API
//! - Tree-sitter based extraction of functions and classes from fetched files
//! - Local embeddings and a vector index for similar-code queries

pub mod adapter;
pub mod config;
pub mod embedding;
pub mod github;
pub mod indexer;
pub mod oauth;
pub mod server;
pub mod session;
pub mod storage;
pub mod ui;
pub mod vector;

// Re-exports for convenient access
pub use adapter::{CodeEntity, EntityKind};
pub use config::Config;
pub use github::{CommitSummary, GitHubApi, GitHubClient};
pub use session::{SessionRecord, TokenStore};
pub use storage::SqliteStore;

/// Result type alias for gitbridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for gitbridge operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("User access token not found")]
    AuthMissing,

    #[error("Invalid state parameter")]
    InvalidState,

    #[error("Failed to get access token: {0}")]
    TokenExchange(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Embeddings are disabled")]
    EmbeddingsDisabled,

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Unexpected upstream payload: {0}")]
    UnexpectedPayload(String),

    #[error("Vector index error: {0}")]
    VectorIndex(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
