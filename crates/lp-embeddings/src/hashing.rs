//! Deterministic feature-hashing embedder.
//!
//! Each lowercase alphanumeric token is hashed with SHA-256 to pick a bucket
//! and a sign, and the signed counts are L2-normalized. This is not a
//! semantic model: similarity comes entirely from shared vocabulary. That is
//! enough to route phrasings that share words with a capability description,
//! and it is byte-for-byte reproducible across processes, which is what the
//! test suite and offline operation need.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::vector::normalize;
use crate::{EmbedResult, EmbeddingProvider, EMBEDDING_DIM};

const MODEL_NAME: &str = "feature-hashing-sha256";

/// Deterministic embedding provider with no model or network dependency.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self { dim: EMBEDDING_DIM }
    }
}

impl HashingEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a non-default output width (tests exercising dimension handling).
    pub fn with_dim(dim: usize) -> Self {
        Self { dim }
    }

    /// Synchronous core: tokenize, bucket, normalize.
    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut acc = vec![0.0f32; self.dim];
        let lowered = text.to_lowercase();
        for token in lowered.split(|c: char| !c.is_alphanumeric()) {
            if token.is_empty() {
                continue;
            }
            let digest = Sha256::digest(token.as_bytes());
            let mut prefix = [0u8; 8];
            prefix.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(prefix) % self.dim as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            acc[bucket] += sign;
        }
        normalize(acc)
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed_query(&self, text: &str) -> EmbedResult<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    async fn embed_target(&self, text: &str) -> EmbedResult<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    fn embedding_dim(&self) -> usize {
        self.dim
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }
}
