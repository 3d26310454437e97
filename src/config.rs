//! Engine configuration from the environment.

use std::env;
use std::path::PathBuf;

use tracing::warn;
use url::Url;

use crate::router::DEFAULT_MIN_SIMILARITY;

pub const ENV_MATRIX: &str = "LOANPILOT_MATRIX";
pub const ENV_EMBEDDINGS_URL: &str = "LOANPILOT_EMBEDDINGS_URL";
pub const ENV_EMBED_MODEL: &str = "LOANPILOT_EMBED_MODEL";
pub const ENV_MIN_SIMILARITY: &str = "LOANPILOT_MIN_SIMILARITY";
pub const ENV_EMBED_TIMEOUT_MS: &str = "LOANPILOT_EMBED_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Path to the tab-separated program matrix export.
    pub matrix_path: PathBuf,
    /// OpenAI-compatible `/embeddings` endpoint. When unset, the engine
    /// runs on the offline hashing embedder.
    pub embeddings_url: Option<Url>,
    pub embed_model: String,
    pub min_similarity: f32,
    pub embed_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            matrix_path: PathBuf::from("data/programs.tsv"),
            embeddings_url: None,
            embed_model: "nomic-embed-text".to_string(),
            min_similarity: DEFAULT_MIN_SIMILARITY,
            embed_timeout_ms: 10_000,
        }
    }
}

impl EngineConfig {
    /// Read configuration from the environment, honoring a `.env` file.
    /// Unset variables keep their defaults; unparseable values are logged
    /// and ignored rather than failing startup.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let mut config = EngineConfig::default();

        if let Ok(path) = env::var(ENV_MATRIX) {
            config.matrix_path = PathBuf::from(path);
        }
        if let Ok(raw) = env::var(ENV_EMBEDDINGS_URL) {
            match raw.parse::<Url>() {
                Ok(url) => config.embeddings_url = Some(url),
                Err(err) => warn!("Ignoring {}={:?}: {}", ENV_EMBEDDINGS_URL, raw, err),
            }
        }
        if let Ok(model) = env::var(ENV_EMBED_MODEL) {
            config.embed_model = model;
        }
        if let Ok(raw) = env::var(ENV_MIN_SIMILARITY) {
            match parse_similarity(&raw) {
                Some(floor) => config.min_similarity = floor,
                None => warn!("Ignoring {}={:?}: expected a number in 0..=1", ENV_MIN_SIMILARITY, raw),
            }
        }
        if let Ok(raw) = env::var(ENV_EMBED_TIMEOUT_MS) {
            match parse_timeout(&raw) {
                Some(ms) => config.embed_timeout_ms = ms,
                None => warn!("Ignoring {}={:?}: expected milliseconds > 0", ENV_EMBED_TIMEOUT_MS, raw),
            }
        }
        config
    }
}

fn parse_similarity(raw: &str) -> Option<f32> {
    raw.trim()
        .parse::<f32>()
        .ok()
        .filter(|v| (0.0..=1.0).contains(v))
}

fn parse_timeout(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|ms| *ms > 0)
}
