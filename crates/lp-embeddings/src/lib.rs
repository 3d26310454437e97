//! Embedding providers and vector math for semantic query routing.
//!
//! Two providers ship with this crate:
//!
//! - [`RemoteEmbedder`] calls an OpenAI-compatible `/embeddings` endpoint
//!   over HTTP with a bounded per-call timeout.
//! - [`HashingEmbedder`] is a deterministic feature-hashing embedder with no
//!   network or model dependency, used for tests and offline operation.
//!
//! Both produce L2-normalized vectors, so cosine similarity reduces to a
//! dot product. Providers are split into query and target embedding (the
//! retrieval convention: user input on one side, stored descriptions on the
//! other) so that instruction prefixes can be applied to queries only.

pub mod hashing;
pub mod remote;
pub mod vector;

use async_trait::async_trait;
use thiserror::Error;

pub use hashing::HashingEmbedder;
pub use remote::RemoteEmbedder;
pub use vector::{cosine_similarity, l2_norm, normalize};

/// Default embedding dimension (the hashing provider's output width).
pub const EMBEDDING_DIM: usize = 384;

/// Errors from an embedding provider.
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedding call timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("embedding transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding endpoint returned {status}: {message}")]
    Endpoint { status: u16, message: String },

    #[error("malformed embedding response: {0}")]
    MalformedResponse(String),
}

pub type EmbedResult<T> = Result<T, EmbedError>;

/// A source of text embeddings.
///
/// Implementations must be deterministic for identical text within a process
/// lifetime and must return L2-normalized vectors of a fixed dimension.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a user query (instruction prefix applied where the model wants one).
    async fn embed_query(&self, text: &str) -> EmbedResult<Vec<f32>>;

    /// Embed a retrieval target such as a stored capability description (no prefix).
    async fn embed_target(&self, text: &str) -> EmbedResult<Vec<f32>>;

    /// Output dimension of this provider.
    fn embedding_dim(&self) -> usize;

    /// Model name for logs and diagnostics.
    fn model_name(&self) -> &str;
}
