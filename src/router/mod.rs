//! Embedding-based routing from free-form queries to capabilities.
//!
//! Capability descriptions are embedded once when the router is built; the
//! router is immutable afterwards, so routing is a pure function of the
//! query text. A query is embedded (with one retry on provider failure),
//! scored against every description by cosine similarity, and the best
//! score wins. Scores below the similarity floor become
//! [`EngineError::NoMatchingCapability`], which callers surface as a
//! help-style response rather than a failure.

mod templates;

pub use templates::{slots, template_for, CapabilityKind, CapabilityTemplate, BUILTIN_TEMPLATES};

use std::sync::Arc;

use lp_embeddings::{cosine_similarity, EmbeddingProvider};
use tracing::{debug, info, instrument, warn};

use crate::error::{EngineError, EngineResult};

/// Default similarity floor for accepting a capability match.
pub const DEFAULT_MIN_SIMILARITY: f32 = 0.35;

struct RouterEntry {
    template: &'static CapabilityTemplate,
    embedding: Vec<f32>,
}

/// The routing decision for one query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteMatch {
    pub template: &'static CapabilityTemplate,
    pub similarity: f32,
}

/// Routes queries to capabilities via a frozen set of description embeddings.
pub struct CapabilityRouter {
    provider: Arc<dyn EmbeddingProvider>,
    entries: Vec<RouterEntry>,
    min_similarity: f32,
}

impl CapabilityRouter {
    /// Embed every capability description up front. Embedding failures here
    /// are fatal: a router with a partial index would route inconsistently.
    pub async fn new(
        provider: Arc<dyn EmbeddingProvider>,
        min_similarity: f32,
    ) -> EngineResult<Self> {
        let mut entries = Vec::with_capacity(BUILTIN_TEMPLATES.len());
        for template in &BUILTIN_TEMPLATES {
            let embedding = provider.embed_target(template.description).await?;
            entries.push(RouterEntry {
                template,
                embedding,
            });
        }
        info!(
            "Capability router ready: {} templates, model {}, similarity floor {:.2}",
            entries.len(),
            provider.model_name(),
            min_similarity
        );
        Ok(CapabilityRouter {
            provider,
            entries,
            min_similarity,
        })
    }

    pub fn min_similarity(&self) -> f32 {
        self.min_similarity
    }

    /// Route one query. Ties keep the earliest-declared capability.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn route(&self, query: &str) -> EngineResult<RouteMatch> {
        let embedding = self.embed_query_with_retry(query).await?;

        let mut best: Option<RouteMatch> = None;
        for entry in &self.entries {
            let similarity = cosine_similarity(&embedding, &entry.embedding);
            debug!("{}: {:.3}", entry.template.kind, similarity);
            if best.map_or(true, |b| similarity > b.similarity) {
                best = Some(RouteMatch {
                    template: entry.template,
                    similarity,
                });
            }
        }

        let best = best.ok_or(EngineError::NoMatchingCapability { best_score: 0.0 })?;
        if best.similarity < self.min_similarity {
            warn!(
                "No capability above floor {:.2} for query (best: {} at {:.3})",
                self.min_similarity, best.template.kind, best.similarity
            );
            return Err(EngineError::NoMatchingCapability {
                best_score: best.similarity,
            });
        }

        debug!("Routed to {} ({:.3})", best.template.kind, best.similarity);
        Ok(best)
    }

    /// One retry on a failed query embedding, then fail closed.
    async fn embed_query_with_retry(&self, query: &str) -> EngineResult<Vec<f32>> {
        match self.provider.embed_query(query).await {
            Ok(embedding) => Ok(embedding),
            Err(first) => {
                warn!("Query embedding failed ({}), retrying once", first);
                self.provider
                    .embed_query(query)
                    .await
                    .map_err(EngineError::from)
            }
        }
    }
}
