//! SQLite storage implementation

use super::schema;
use crate::session::KeyValueStore;
use crate::{Error, Result};
use crate::vector::{self, EntityMetadata, ScoredMatch, VectorIndex, VectorRecord};
use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// SQLite-backed token store and local vector index.
///
/// Clones share one connection. The async trait impls run queries on the
/// blocking pool.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn();
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, [])?;
        }
        Ok(())
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock leaves the connection itself usable
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `f` against a clone of this store on the blocking pool
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&SqliteStore) -> Result<T> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))?
    }

    // ========== Key-Value Operations ==========

    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        self.conn()
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()
            .map_err(Into::into)
    }

    pub fn set_value(&self, key: &str, value: &str) -> Result<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn delete_value(&self, key: &str) -> Result<()> {
        self.conn().execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }

    // ========== Embedding Operations ==========

    /// Insert or replace embeddings in a single transaction
    pub fn insert_embeddings(&self, records: &[VectorRecord]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let now = chrono::Utc::now().to_rfc3339();
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO code_embeddings (id, vector, metadata, updated_at) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for record in records {
                stmt.execute(params![
                    record.id,
                    vector::vec_to_blob(&record.values),
                    serde_json::to_string(&record.metadata)?,
                    now,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Get an embedding by id
    pub fn get_embedding(&self, id: &str) -> Result<Option<Vec<f32>>> {
        let blob: Option<Vec<u8>> = self
            .conn()
            .query_row("SELECT vector FROM code_embeddings WHERE id = ?1", [id], |row| row.get(0))
            .optional()?;

        Ok(blob.map(|b| vector::blob_to_vec(&b)))
    }

    /// Rank every stored embedding against `query_vector` by cosine similarity
    pub fn search_by_vector(&self, query_vector: &[f32], limit: usize) -> Result<Vec<ScoredMatch>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, vector, metadata FROM code_embeddings")?;

        let candidates = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            let blob: Vec<u8> = row.get(1)?;
            let metadata: String = row.get(2)?;
            Ok((id, blob, metadata))
        })?;

        let mut scored_results = Vec::new();
        for candidate in candidates {
            let (id, blob, metadata) = candidate?;
            let score = vector::cosine_similarity(query_vector, &vector::blob_to_vec(&blob));
            let metadata: Option<EntityMetadata> = serde_json::from_str(&metadata).ok();
            scored_results.push(ScoredMatch { id, score, metadata });
        }

        // Sort by score descending
        scored_results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored_results.truncate(limit);

        Ok(scored_results)
    }

    /// Count embeddings
    pub fn count_embeddings(&self) -> Result<usize> {
        let count: i64 = self.conn().query_row("SELECT COUNT(*) FROM code_embeddings", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Count sessions holding an access token
    pub fn count_sessions(&self) -> Result<usize> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM kv WHERE key LIKE 'session:%:access_token'",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Count issued, not yet consumed OAuth states
    pub fn count_pending_states(&self) -> Result<usize> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM kv WHERE key LIKE 'oauth_state:%'", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            sessions: self.count_sessions()?,
            pending_states: self.count_pending_states()?,
            embeddings: self.count_embeddings()?,
        })
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.blocking(move |store| store.get_value(&key)).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let (key, value) = (key.to_string(), value.to_string());
        self.blocking(move |store| store.set_value(&key, &value)).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.blocking(move |store| store.delete_value(&key)).await
    }
}

#[async_trait]
impl VectorIndex for SqliteStore {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<()> {
        self.blocking(move |store| store.insert_embeddings(&records)).await
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredMatch>> {
        let vector = vector.to_vec();
        self.blocking(move |store| store.search_by_vector(&vector, top_k)).await
    }
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub sessions: usize,
    pub pending_states: usize,
    pub embeddings: usize,
}
