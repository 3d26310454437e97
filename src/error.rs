//! Error taxonomy for the eligibility query core.
//!
//! Load-time problems (catalog integrity, vocabulary bundling) are fatal for
//! initialization and surface before any query is accepted. Request-time
//! problems never escape the entry point as errors: the engine folds them
//! into tagged query outcomes, so callers always receive a result.

use std::fmt;

use thiserror::Error;

pub use lp_embeddings::EmbedError;

use crate::catalog::Servicer;

/// Data-integrity and ingestion failures raised while loading the catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("program '{program}' is missing attribute key '{key}'")]
    MissingAttributeKey { program: String, key: String },

    #[error("duplicate program name '{name}' for servicer {servicer}")]
    DuplicateProgramName { servicer: Servicer, name: String },

    #[error("matrix row {row} has unrecognized attribute label '{label}'")]
    UnknownAttributeRow { row: usize, label: String },

    #[error("matrix defines {found} attribute rows, expected {expected}")]
    RowCountMismatch { expected: usize, found: usize },

    #[error("matrix has no program columns")]
    NoProgramColumns,

    #[error("matrix is missing the '{column}' column")]
    MissingColumn { column: String },

    #[error("catalog contains no programs")]
    Empty,

    #[error("vocabulary error: {0}")]
    Vocabulary(#[from] VocabError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("matrix parse error: {0}")]
    Csv(#[from] csv::Error),
}

/// Failures loading or validating the bundled attribute vocabulary.
#[derive(Error, Debug)]
pub enum VocabError {
    #[error("vocabulary YAML is invalid: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("vocabulary defines {found} attribute keys, expected {expected}")]
    WrongKeyCount { expected: usize, found: usize },

    #[error("vocabulary entry order diverges at '{key}'")]
    KeyOrderMismatch { key: String },

    #[error("alias '{alias}' targets unknown attribute key '{target}'")]
    UnknownAliasTarget { alias: String, target: String },
}

/// Request-path failures; every variant maps to a tagged query outcome.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("no capability matched the query (best similarity {best_score:.3})")]
    NoMatchingCapability { best_score: f32 },

    #[error("missing required parameter(s): {}", slots.join(", "))]
    MissingRequiredParameters { slots: Vec<String> },

    #[error("embedding capability unavailable: {0}")]
    EmbeddingUnavailable(#[from] EmbedError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

pub type CatalogResult<T> = Result<T, CatalogError>;
pub type VocabResult<T> = Result<T, VocabError>;
pub type EngineResult<T> = Result<T, EngineError>;

/// Non-fatal diagnostics accumulated during a query and surfaced on the
/// outcome's warnings list. Rendered to strings, deduplicated and sorted
/// before leaving the engine.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum QueryWarning {
    /// Pattern-shaped criteria text that failed to parse; evaluated as Unknown.
    UnparseableExpression { program: String, attribute: String },

    /// A parameter-shaped token that matched nothing in the attribute vocabulary.
    UnmatchedAttribute { token: String },
}

impl fmt::Display for QueryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryWarning::UnparseableExpression { program, attribute } => {
                write!(f, "unparseable criteria for '{attribute}' in {program}")
            }
            QueryWarning::UnmatchedAttribute { token } => {
                write!(f, "no attribute matched '{token}'")
            }
        }
    }
}
