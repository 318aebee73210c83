//! Pinecone REST backend

use super::{EntityMetadata, ScoredMatch, VectorIndex, VectorRecord};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Client for one Pinecone index, addressed by its data-plane host
#[derive(Debug, Clone)]
pub struct PineconeIndex {
    http: reqwest::Client,
    host: String,
    api_key: String,
    namespace: Option<String>,
}

#[derive(Serialize)]
struct UpsertVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a EntityMetadata,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
}

impl PineconeIndex {
    pub fn new(http: reqwest::Client, host: &str, api_key: &str, namespace: Option<String>) -> Self {
        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", host.trim_end_matches('/'))
        };
        Self {
            http,
            host,
            api_key: api_key.to_string(),
            namespace,
        }
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<reqwest::Response> {
        let response = self
            .http
            .post(format!("{}{}", self.host, path))
            .header("Api-Key", &self.api_key)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(Error::VectorIndex(format!("{} {} - {}", path, status, body)));
        }
        Ok(response)
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let vectors: Vec<UpsertVector<'_>> = records
            .iter()
            .map(|r| UpsertVector {
                id: &r.id,
                values: &r.values,
                metadata: &r.metadata,
            })
            .collect();

        let mut body = json!({ "vectors": vectors });
        if let Some(ns) = &self.namespace {
            body["namespace"] = json!(ns);
        }

        self.post("/vectors/upsert", body).await?;
        tracing::debug!("Upserted {} vectors into Pinecone", records.len());
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredMatch>> {
        let mut body = json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
        });
        if let Some(ns) = &self.namespace {
            body["namespace"] = json!(ns);
        }

        let response: QueryResponse = self.post("/query", body).await?.json().await?;

        Ok(response
            .matches
            .into_iter()
            .map(|m| ScoredMatch {
                id: m.id,
                score: m.score,
                metadata: m.metadata.and_then(|v| serde_json::from_value(v).ok()),
            })
            .collect())
    }
}
