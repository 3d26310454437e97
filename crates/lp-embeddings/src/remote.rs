//! HTTP embedding client for an OpenAI-compatible `/embeddings` endpoint.
//!
//! Every call is bounded by a timeout so a slow or dead endpoint degrades
//! into a typed error instead of hanging the caller. Retry policy lives with
//! the caller; this client makes exactly one attempt per call.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::vector::normalize;
use crate::{EmbedError, EmbedResult, EmbeddingProvider, EMBEDDING_DIM};

/// Per-call timeout applied when the caller does not configure one.
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Debug, Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

/// Embedding provider backed by a remote HTTP endpoint.
pub struct RemoteEmbedder {
    client: Client,
    endpoint: Url,
    model: String,
    query_prefix: Option<String>,
    timeout: Duration,
    dim: usize,
}

impl RemoteEmbedder {
    pub fn new(endpoint: Url, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            model: model.into(),
            query_prefix: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            dim: EMBEDDING_DIM,
        }
    }

    /// Bound every embedding call by this duration.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Instruction prefix applied to queries only (retrieval-tuned models
    /// such as the BGE family want one; plain models do not).
    pub fn with_query_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.query_prefix = Some(prefix.into());
        self
    }

    /// Declared output dimension of the remote model.
    pub fn with_embedding_dim(mut self, dim: usize) -> Self {
        self.dim = dim;
        self
    }

    async fn call(&self, text: &str) -> EmbedResult<Vec<f32>> {
        let request = EmbedRequest {
            model: &self.model,
            input: [text],
        };

        let send = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send();

        let response = tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| EmbedError::Timeout {
                elapsed_ms: self.timeout.as_millis() as u64,
            })??;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbedError::Endpoint {
                status: status.as_u16(),
                message,
            });
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbedError::MalformedResponse(e.to_string()))?;

        let data = body
            .data
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::MalformedResponse("empty data array".into()))?;

        debug!(model = %self.model, dim = data.embedding.len(), "embedding received");

        // Not every endpoint returns unit vectors; normalize here so cosine
        // similarity stays a dot product downstream.
        Ok(normalize(data.embedding))
    }
}

#[async_trait]
impl EmbeddingProvider for RemoteEmbedder {
    async fn embed_query(&self, text: &str) -> EmbedResult<Vec<f32>> {
        match &self.query_prefix {
            Some(prefix) => self.call(&format!("{prefix}{text}")).await,
            None => self.call(text).await,
        }
    }

    async fn embed_target(&self, text: &str) -> EmbedResult<Vec<f32>> {
        self.call(text).await
    }

    fn embedding_dim(&self) -> usize {
        self.dim
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
