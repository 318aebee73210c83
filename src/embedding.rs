use crate::config::EmbeddingConfig;
use crate::{Error, Result};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Arc;

/// Turns code snippets into fixed-length vectors
pub trait Embedder: Send + Sync {
    fn model_name(&self) -> &str;

    /// One vector per input, in input order
    fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    /// Generate a single embedding for a query
    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(vec![text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("empty embedding response".to_string()))
    }
}

/// Engine for generating embeddings using local transformer models
pub struct FastEmbedder {
    model: TextEmbedding,
    name: String,
}

impl FastEmbedder {
    /// Load the configured model, downloading it on first use
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let mut options = InitOptions::default();
        options.model_name = resolve_model(&config.model)?;
        options.max_length = config.max_length;
        options.show_download_progress = true;

        let model = TextEmbedding::try_new(options)
            .map_err(|e| Error::Embedding(format!("Failed to load embedding model: {}", e)))?;

        tracing::info!("Loaded embedding model {}", config.model);
        Ok(Self {
            model,
            name: config.model.clone(),
        })
    }
}

impl Embedder for FastEmbedder {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        self.model
            .embed(texts, None)
            .map_err(|e| Error::Embedding(format!("Embedding generation failed: {}", e)))
    }
}

/// Map a model name from the config to a fastembed model
pub fn resolve_model(name: &str) -> Result<EmbeddingModel> {
    match name.to_lowercase().as_str() {
        "all-minilm-l6-v2" | "sentence-transformers/all-minilm-l6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "bge-small-en-v1.5" | "baai/bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" | "baai/bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
        "nomic-embed-text-v1.5" | "nomic-ai/nomic-embed-text-v1.5" => Ok(EmbeddingModel::NomicEmbedTextV15),
        other => Err(Error::Config(format!("Unknown embedding model: {}", other))),
    }
}

/// Embed a single query off the async executor
pub async fn embed_query_blocking(embedder: Arc<dyn Embedder>, text: String) -> Result<Vec<f32>> {
    tokio::task::spawn_blocking(move || embedder.embed_query(&text))
        .await
        .map_err(|e| Error::Embedding(format!("Embedding task failed: {}", e)))?
}

/// Run inference off the async executor
pub async fn embed_blocking(embedder: Arc<dyn Embedder>, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
    tokio::task::spawn_blocking(move || embedder.embed(texts))
        .await
        .map_err(|e| Error::Embedding(format!("Embedding task failed: {}", e)))?
}
