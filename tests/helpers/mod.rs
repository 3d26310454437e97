//! Shared fixtures for the integration suite.
//!
//! Real embedding scores are not reproducible offline, so the suite scripts
//! its own provider: capability descriptions embed to basis vectors and
//! queries to the basis vector a handful of keywords point at. Routing is
//! then exact, and every test can assert the capability it expects.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;

use loanpilot::{
    EmbedResult, EmbeddingProvider, Program, ProgramBuilder, QueryEngine, StaticStore,
    BUILTIN_TEMPLATES, DEFAULT_MIN_SIMILARITY,
};

// ===== SCRIPTED EMBEDDINGS =====

/// Deterministic stand-in for the remote embedder.
pub struct ScriptedProvider;

pub fn basis(i: usize) -> Vec<f32> {
    let mut v = vec![0.0; 8];
    v[i] = 1.0;
    v
}

fn route_vector(text: &str) -> Vec<f32> {
    let t = text.to_lowercase();
    let idx = if t.contains("all parameters") {
        1
    } else if t.contains("match") || t.contains("credit score") {
        3
    } else if t.contains("across") || t.contains("parameter") {
        2
    } else if t.contains("show") || t.contains("list") {
        0
    } else {
        7
    };
    basis(idx)
}

#[async_trait]
impl EmbeddingProvider for ScriptedProvider {
    async fn embed_query(&self, text: &str) -> EmbedResult<Vec<f32>> {
        Ok(route_vector(text))
    }

    async fn embed_target(&self, text: &str) -> EmbedResult<Vec<f32>> {
        let idx = BUILTIN_TEMPLATES
            .iter()
            .position(|t| t.description == text)
            .unwrap_or(7);
        Ok(basis(idx))
    }

    fn embedding_dim(&self) -> usize {
        8
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

// ===== FIXTURE CATALOG =====

/// Three programs exercising every criteria shape the matrix uses:
/// thresholds, ranges, a guarded rule, an enumerated set, free prose,
/// blanks, and one deliberately broken expression.
pub fn sample_programs() -> Vec<Program> {
    vec![
        ProgramBuilder::new("PRMG/Prime Connect")
            .with("borrower_credit_score", ">=620")
            .with("ltv", "<=85%")
            .with("loan_amount", ">=125,000 and <=3,500,000")
            .with("dti", "if ltv,cltv>85%, then <=45%")
            .with("citizenship", "U.S. Citizen, Permanent Resident")
            .with("income", "Full documentation. See matrix notes for alternatives.")
            .build(),
        ProgramBuilder::new("PRMG/Plus Connect")
            .with("borrower_credit_score", ">=680")
            .with("ltv", "<=80%")
            .with("citizenship", "U.S. Citizen")
            .build(),
        ProgramBuilder::new("LoanStream-Select NonQM")
            .with("borrower_credit_score", ">=580")
            .with("loan_amount", ">=150,000 and <=2,500,000")
            .with("reserves", ">=6")
            .with("dti", ">= banana")
            .with("citizenship", "U.S. Citizen, Permanent Resident, Non-Permanent Resident")
            .build(),
    ]
}

/// Engine over the fixture catalog and the scripted provider.
pub async fn engine() -> QueryEngine {
    let store = StaticStore::new(sample_programs());
    QueryEngine::new(&store, Arc::new(ScriptedProvider), DEFAULT_MIN_SIMILARITY)
        .await
        .expect("fixture engine builds")
}
