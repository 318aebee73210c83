//! Extracts, embeds and stores code entities from fetched files.

use crate::adapter::ExtractorRegistry;
use crate::embedding::{Embedder, embed_blocking, embed_query_blocking};
use crate::vector::{EntityMetadata, ScoredMatch, VectorIndex, VectorRecord, code_id};
use crate::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

pub struct CodeIndexer {
    registry: ExtractorRegistry,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl CodeIndexer {
    pub fn new(registry: ExtractorRegistry, embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            registry,
            embedder,
            index,
        }
    }

    /// Index one file from a GitHub contents response.
    ///
    /// Returns the number of entities upserted. Directory listings, files
    /// without inline content and unsupported languages index nothing.
    pub async fn index_file(&self, owner: &str, repo: &str, path: &str, file_info: &Value) -> Result<usize> {
        let Some(source) = decode_content(file_info)? else {
            return Ok(0);
        };

        let entities = self.registry.extract(Path::new(path), &source)?;
        if entities.is_empty() {
            return Ok(0);
        }

        let snippets: Vec<String> = entities.iter().map(|e| e.snippet.clone()).collect();
        let vectors = embed_blocking(Arc::clone(&self.embedder), snippets).await?;
        if vectors.len() != entities.len() {
            return Err(Error::Embedding(format!(
                "expected {} embeddings, got {}",
                entities.len(),
                vectors.len()
            )));
        }

        let repo_name = format!("{}/{}", owner, repo);
        let records: Vec<VectorRecord> = entities
            .into_iter()
            .zip(vectors)
            .map(|(entity, values)| VectorRecord {
                id: code_id(owner, repo, path, &entity.name),
                values,
                metadata: EntityMetadata {
                    name: entity.name,
                    kind: entity.kind,
                    methods: entity.methods,
                    repo: repo_name.clone(),
                    path: path.to_string(),
                    snippet: entity.snippet,
                },
            })
            .collect();

        let count = records.len();
        self.index.upsert(records).await?;
        tracing::debug!("Indexed {} entities from {}/{}", count, repo_name, path);
        Ok(count)
    }

    /// Nearest stored entities to a snippet, best first
    pub async fn query_similar(&self, snippet: &str, top_k: usize) -> Result<Vec<ScoredMatch>> {
        if snippet.trim().is_empty() {
            return Err(Error::BadRequest("code_snippet must not be empty".to_string()));
        }

        let query = embed_query_blocking(Arc::clone(&self.embedder), snippet.to_string()).await?;
        self.index.query(&query, top_k).await
    }
}

/// Source text of a contents response, `None` when it is not an inline file
pub fn decode_content(file_info: &Value) -> Result<Option<String>> {
    let Some(content) = file_info.get("content").and_then(Value::as_str) else {
        return Ok(None);
    };

    match file_info.get("encoding").and_then(Value::as_str) {
        Some("base64") => {
            let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            let bytes = STANDARD
                .decode(compact)
                .map_err(|e| Error::Parse(format!("invalid base64 content: {}", e)))?;
            String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| Error::Parse("file content is not UTF-8".to_string()))
        }
        Some("none") => Ok(None),
        _ => Ok(Some(content.to_string())),
    }
}
