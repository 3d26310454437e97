//! LoanPilot - Lending Program Eligibility Queries
//!
//! This crate answers natural-language questions about lending-program
//! eligibility from a frozen program matrix: listing programs, showing a
//! program's parameter table, finding one parameter across programs, and
//! matching programs against a borrower profile.
//!
//! ## Architecture
//! Every query takes the same path:
//! Query Text -> Capability Router (embeddings) -> Slot Extractor ->
//! Context Merge -> Typed Capability -> QueryResult
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use loanpilot::{global_engine, QueryContext};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = global_engine().await?;
//!     let outcome = engine
//!         .run_query("show programs for Prime", &QueryContext::new(), None)
//!         .await;
//!     println!("{outcome}");
//!     Ok(())
//! }
//! ```

// Core error handling
pub mod error;

// Program catalog: attribute keys, servicers, matrix loading
pub mod catalog;

// Attribute vocabulary and label normalization
pub mod vocab;

// Borrower profiles
pub mod profile;

// Criteria expression parsing and three-valued evaluation
pub mod criteria;

// Slot extraction from query text
pub mod extract;

// Embedding-based capability routing
pub mod router;

// Session context and scope merging
pub mod context;

// The query engine and result types
pub mod engine;

// Environment configuration
pub mod config;

// Catalog and matrix types
pub use catalog::{
    CatalogStats, MatrixStore, Program, ProgramBuilder, ProgramCatalog, ProgramStore, Servicer,
    StaticStore, ATTRIBUTE_KEYS,
};

// Engine entry points and result payloads
pub use engine::{
    global_engine, ErrorReport, MatchReport, ParameterReport, ParameterTable, ProgramList,
    ProgramMatch, QueryEngine, QueryOutcome, QueryResult,
};

// Context passed explicitly into every query
pub use context::{ContextBehavior, QueryContext};

// Criteria expressions
pub use criteria::{evaluate, parse_criteria, CriterionOutcome, Predicate};

// Borrower input
pub use profile::{BorrowerProfile, FieldValue};

// Routing surface
pub use router::{CapabilityKind, CapabilityTemplate, BUILTIN_TEMPLATES, DEFAULT_MIN_SIMILARITY};

// Vocabulary
pub use vocab::{AttributeMatch, AttributeVocabulary, MIN_ATTRIBUTE_SIMILARITY};

// Extraction
pub use extract::{ExtractedSlots, ParameterExtractor};

// Configuration
pub use config::EngineConfig;

// Essential error types
pub use error::{CatalogError, EngineError, QueryWarning, VocabError};

// Embedding providers, re-exported for engine construction
pub use lp_embeddings::{
    EmbedError, EmbedResult, EmbeddingProvider, HashingEmbedder, RemoteEmbedder, EMBEDDING_DIM,
};
