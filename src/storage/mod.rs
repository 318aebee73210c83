//! Storage Layer - SQLite-backed persistence
//!
//! One database file holds:
//! - kv(key, value, updated_at) - session nonces and tokens
//! - code_embeddings(id, vector, metadata, updated_at) - local vector index

pub mod schema;
pub mod sqlite;

pub use sqlite::{DbStats, SqliteStore};
