//! Vector index abstraction
//!
//! Embeddings of extracted code entities are upserted under a composite id
//! (`owner/repo/path/name`) and queried for nearest neighbours. Backends:
//! - SQLite (local, brute-force cosine; see [`crate::storage::SqliteStore`])
//! - Pinecone (remote, REST)

pub mod pinecone;

use crate::Result;
use crate::adapter::EntityKind;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use pinecone::PineconeIndex;

/// What is stored next to each vector so query results are self-describing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub name: String,
    pub kind: EntityKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<String>,
    pub repo: String,
    pub path: String,
    pub snippet: String,
}

#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: EntityMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredMatch {
    pub id: String,
    pub score: f32,
    pub metadata: Option<EntityMetadata>,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace records by id
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<()>;

    /// The `top_k` nearest records, best first
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredMatch>>;
}

/// Composite id under which an entity's embedding is stored
pub fn code_id(owner: &str, repo: &str, path: &str, name: &str) -> String {
    format!("{}/{}/{}/{}", owner, repo, path, name)
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}

pub fn vec_to_blob(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}

pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_blob_encoding() {
        let v = vec![0.5, -1.25, 3.0];
        assert_eq!(blob_to_vec(&vec_to_blob(&v)), v);
    }

    #[test]
    fn test_code_id() {
        assert_eq!(code_id("octo", "hello", "src/app.py", "main"), "octo/hello/src/app.py/main");
    }
}
