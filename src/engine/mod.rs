//! The query engine: one frozen catalog-plus-router handle and the
//! `run_query` entry point.
//!
//! `run_query` never returns `Err`. Routing and slot failures become
//! [`ErrorReport`] payloads inside the outcome, so a caller always gets a
//! renderable answer. Given the same catalog and provider, the `result`
//! field is a pure function of (query, context, borrower); only the
//! outcome's id and timestamp vary between calls.

mod matching;
mod result;

pub use result::{
    ErrorReport, FailedCriterion, MatchReport, ParameterCell, ParameterReport, ParameterRow,
    ParameterTable, ProgramEntry, ProgramList, ProgramMatch, QueryOutcome, QueryResult,
};

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use lp_embeddings::{EmbeddingProvider, HashingEmbedder, RemoteEmbedder};
use tokio::sync::OnceCell;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::catalog::{
    is_canonical_key, CatalogStats, MatrixStore, Program, ProgramCatalog, ProgramStore, Servicer,
    ATTRIBUTE_KEYS,
};
use crate::config::EngineConfig;
use crate::context::{resolve_scope, ContextBehavior, QueryContext};
use crate::error::{EngineError, EngineResult, QueryWarning};
use crate::extract::{ExtractedSlots, ParameterExtractor};
use crate::profile::BorrowerProfile;
use crate::router::{slots as slot_names, CapabilityKind, CapabilityRouter, RouteMatch};
use crate::vocab::AttributeVocabulary;

impl From<EngineError> for ErrorReport {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NoMatchingCapability { best_score } => {
                ErrorReport::NoMatchingCapability { best_score }
            }
            EngineError::MissingRequiredParameters { slots } => {
                ErrorReport::MissingRequiredParameters { slots }
            }
            EngineError::EmbeddingUnavailable(source) => ErrorReport::EmbeddingUnavailable {
                message: source.to_string(),
            },
            // Catalog errors are load-time failures and cannot reach a
            // served query; mapped here only to keep the conversion total.
            EngineError::Catalog(source) => ErrorReport::EmbeddingUnavailable {
                message: source.to_string(),
            },
        }
    }
}

/// Immutable query-serving handle: catalog, vocabulary, router, extractor.
pub struct QueryEngine {
    catalog: Arc<ProgramCatalog>,
    vocab: &'static AttributeVocabulary,
    router: CapabilityRouter,
    extractor: ParameterExtractor,
}

impl QueryEngine {
    /// Load the catalog and embed the capability descriptions. Both are
    /// frozen for the life of the engine.
    pub async fn new(
        store: &dyn ProgramStore,
        provider: Arc<dyn EmbeddingProvider>,
        min_similarity: f32,
    ) -> EngineResult<Self> {
        let catalog = Arc::new(ProgramCatalog::load(store)?);
        let router = CapabilityRouter::new(provider, min_similarity).await?;
        info!(
            "Query engine ready: {} programs, catalog {}",
            catalog.len(),
            catalog.short_fingerprint()
        );
        Ok(QueryEngine {
            catalog,
            vocab: AttributeVocabulary::bundled(),
            router,
            extractor: ParameterExtractor::new(),
        })
    }

    /// Build from configuration: the TSV matrix on disk, and the remote
    /// embedder when an endpoint is configured, the hashing embedder
    /// otherwise.
    pub async fn from_config(config: &EngineConfig) -> EngineResult<Self> {
        let store = MatrixStore::new(&config.matrix_path);
        let provider: Arc<dyn EmbeddingProvider> = match &config.embeddings_url {
            Some(endpoint) => Arc::new(
                RemoteEmbedder::new(endpoint.clone(), &config.embed_model)
                    .with_timeout(Duration::from_millis(config.embed_timeout_ms)),
            ),
            None => Arc::new(HashingEmbedder::new()),
        };
        Self::new(&store, provider, config.min_similarity).await
    }

    pub fn catalog(&self) -> &ProgramCatalog {
        &self.catalog
    }

    pub fn stats(&self) -> CatalogStats {
        self.catalog.stats()
    }

    /// Answer one query. Leading `^` markers (a RAG-bypass convention in
    /// upstream chat frontends) are stripped before routing.
    #[instrument(skip_all, fields(query = %query))]
    pub async fn run_query(
        &self,
        query: &str,
        context: &QueryContext,
        borrower: Option<&BorrowerProfile>,
    ) -> QueryOutcome {
        let cleaned = query.trim().trim_start_matches('^').trim_start();

        let route = match self.router.route(cleaned).await {
            Ok(route) => route,
            Err(err) => {
                return self.outcome(query, None, QueryResult::Error(err.into()), Vec::new(), None)
            }
        };

        let extracted = self.extractor.extract(cleaned, &self.catalog, self.vocab);
        let mut warnings = extracted.warnings.clone();

        if let Some(slots) = self.missing_slots(route, &extracted) {
            let result = QueryResult::Error(ErrorReport::MissingRequiredParameters { slots });
            return self.outcome(query, Some(route), result, warnings, None);
        }

        let behavior = route.template.context_behavior;
        let (result, auto_select) = match route.template.kind {
            CapabilityKind::ShowPrograms => (self.show_programs(&extracted, context), None),
            CapabilityKind::ShowProgramParameters => self.show_program_parameters(&extracted),
            CapabilityKind::FindParamAcrossPrograms => {
                (self.find_param(&extracted, context, behavior), None)
            }
            CapabilityKind::MatchPrograms => (
                self.match_programs(&extracted, context, borrower, behavior, &mut warnings),
                None,
            ),
        };
        self.outcome(query, Some(route), result, warnings, auto_select)
    }

    /// Required slots the extraction left unfilled. `loan_servicer` is
    /// never reported missing: an unstated servicer falls back to Prime.
    fn missing_slots(&self, route: RouteMatch, extracted: &ExtractedSlots) -> Option<Vec<String>> {
        let missing: Vec<String> = route
            .template
            .required_slots
            .iter()
            .filter(|slot| match **slot {
                slot_names::PROGRAM_NAME => extracted.program.is_none(),
                slot_names::PARAM_NAME => extracted.attribute.is_none(),
                _ => false,
            })
            .map(|slot| slot.to_string())
            .collect();
        if missing.is_empty() {
            None
        } else {
            Some(missing)
        }
    }

    fn show_programs(&self, extracted: &ExtractedSlots, context: &QueryContext) -> QueryResult {
        let servicer = extracted.servicer.or_else(|| context.sole_servicer());
        let programs: Vec<ProgramEntry> = match servicer {
            Some(servicer) => self
                .catalog
                .programs_for(servicer)
                .map(program_entry)
                .collect(),
            None => self.catalog.programs().iter().map(program_entry).collect(),
        };
        QueryResult::ProgramList(ProgramList {
            servicer,
            programs,
        })
    }

    fn show_program_parameters(
        &self,
        extracted: &ExtractedSlots,
    ) -> (QueryResult, Option<(Servicer, String)>) {
        let program = extracted
            .program
            .as_ref()
            .and_then(|(servicer, name)| self.catalog.find(*servicer, name));
        let Some(program) = program else {
            let result = QueryResult::Error(ErrorReport::MissingRequiredParameters {
                slots: vec![slot_names::PROGRAM_NAME.to_string()],
            });
            return (result, None);
        };

        let rows = ATTRIBUTE_KEYS
            .iter()
            .map(|key| ParameterRow {
                key: (*key).to_string(),
                name: self.vocab.display_name(key).unwrap_or(key).to_string(),
                value: program.attribute(key).unwrap_or("").to_string(),
            })
            .collect();
        let auto_select = Some((program.servicer(), program.name().to_string()));
        let result = QueryResult::ParameterTable(ParameterTable {
            servicer: program.servicer(),
            program: program.name().to_string(),
            rows,
        });
        (result, auto_select)
    }

    fn find_param(
        &self,
        extracted: &ExtractedSlots,
        context: &QueryContext,
        behavior: ContextBehavior,
    ) -> QueryResult {
        let Some(attribute) = extracted.attribute.clone() else {
            return QueryResult::Error(ErrorReport::MissingRequiredParameters {
                slots: vec![slot_names::PARAM_NAME.to_string()],
            });
        };

        let servicer = extracted
            .servicer
            .or_else(|| context.sole_servicer())
            .unwrap_or(Servicer::Prime);
        let candidates: Vec<&Program> = self.catalog.programs_for(servicer).collect();
        let scope = resolve_scope(behavior, context, candidates);

        let values = scope
            .programs
            .iter()
            .map(|program| ParameterCell {
                servicer: program.servicer(),
                program: program.name().to_string(),
                value: program.attribute(&attribute.key).unwrap_or("").to_string(),
            })
            .collect();
        QueryResult::ParameterValue(ParameterReport {
            display_name: self
                .vocab
                .display_name(&attribute.key)
                .unwrap_or(&attribute.key)
                .to_string(),
            key: attribute.key,
            confidence: attribute.confidence,
            filtered_by_selection: scope.filtered_by_selection,
            values,
        })
    }

    fn match_programs(
        &self,
        extracted: &ExtractedSlots,
        context: &QueryContext,
        borrower: Option<&BorrowerProfile>,
        behavior: ContextBehavior,
        warnings: &mut Vec<QueryWarning>,
    ) -> QueryResult {
        // Explicit borrower input wins; query-text extraction fills gaps.
        let mut merged = borrower.cloned().unwrap_or_default();
        merged.merge_missing(&extracted.borrower);

        let mut criteria = BorrowerProfile::new();
        for (key, value) in merged.iter() {
            if is_canonical_key(key) {
                criteria.set(key, value.clone());
            } else {
                warnings.push(QueryWarning::UnmatchedAttribute {
                    token: key.to_string(),
                });
            }
        }

        let servicer = extracted.servicer.or_else(|| context.sole_servicer());
        let candidates: Vec<&Program> = match servicer {
            Some(servicer) => self.catalog.programs_for(servicer).collect(),
            None => self.catalog.programs().iter().collect(),
        };
        let scope = resolve_scope(behavior, context, candidates);

        let matches = matching::evaluate_programs(&scope.programs, &criteria, self.vocab, warnings);
        QueryResult::MatchResults(MatchReport {
            criteria,
            filtered_by_selection: scope.filtered_by_selection,
            matches,
        })
    }

    fn outcome(
        &self,
        query: &str,
        route: Option<RouteMatch>,
        result: QueryResult,
        warnings: Vec<QueryWarning>,
        auto_select: Option<(Servicer, String)>,
    ) -> QueryOutcome {
        let mut rendered: Vec<String> = warnings.iter().map(ToString::to_string).collect();
        rendered.sort();
        rendered.dedup();
        QueryOutcome {
            id: Uuid::new_v4(),
            query: query.to_string(),
            capability: route.map(|r| r.template.kind),
            similarity: route.map(|r| r.similarity),
            result,
            warnings: rendered,
            auto_select,
            executed_at: Utc::now(),
        }
    }
}

fn program_entry(program: &Program) -> ProgramEntry {
    ProgramEntry {
        servicer: program.servicer(),
        name: program.name().to_string(),
    }
}

static ENGINE: OnceCell<QueryEngine> = OnceCell::const_new();

/// Process-wide engine, built from environment configuration on first use.
pub async fn global_engine() -> EngineResult<&'static QueryEngine> {
    ENGINE
        .get_or_try_init(|| async { QueryEngine::from_config(&EngineConfig::from_env()).await })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use lp_embeddings::EmbedResult;

    use crate::catalog::{ProgramBuilder, StaticStore};
    use crate::router::{BUILTIN_TEMPLATES, DEFAULT_MIN_SIMILARITY};

    /// Embeds descriptions to basis vectors and queries to the basis of
    /// the capability a few keywords point at, so routing is exact.
    struct ScriptedProvider;

    fn basis(i: usize) -> Vec<f32> {
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

    fn fixture_programs() -> Vec<Program> {
        vec![
            ProgramBuilder::new("PRMG/Prime Connect")
                .with("borrower_credit_score", ">=620")
                .with("ltv", "<=85%")
                .with("citizenship", "U.S. Citizen, Permanent Resident")
                .build(),
            ProgramBuilder::new("PRMG/Plus Connect")
                .with("borrower_credit_score", ">=700")
                .with("citizenship", "U.S. Citizen")
                .build(),
            ProgramBuilder::new("LoanStream-Select NonQM")
                .with("borrower_credit_score", ">=580")
                .build(),
        ]
    }

    async fn engine() -> QueryEngine {
        let store = StaticStore::new(fixture_programs());
        QueryEngine::new(&store, Arc::new(ScriptedProvider), DEFAULT_MIN_SIMILARITY)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn show_programs_scopes_to_the_mentioned_servicer() {
        let engine = engine().await;
        let outcome = engine
            .run_query("show programs for Prime", &QueryContext::new(), None)
            .await;

        assert_eq!(outcome.capability, Some(CapabilityKind::ShowPrograms));
        match outcome.result {
            QueryResult::ProgramList(list) => {
                assert_eq!(list.servicer, Some(Servicer::Prime));
                let names: Vec<&str> = list.programs.iter().map(|p| p.name.as_str()).collect();
                assert_eq!(names, vec!["PRMG/Prime Connect", "PRMG/Plus Connect"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn show_programs_lists_all_servicers_when_none_is_named() {
        let engine = engine().await;
        let outcome = engine
            .run_query("list available loan options", &QueryContext::new(), None)
            .await;

        match outcome.result {
            QueryResult::ProgramList(list) => {
                assert_eq!(list.servicer, None);
                assert_eq!(list.programs.len(), 3);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn program_parameters_return_the_full_table_and_auto_select() {
        let engine = engine().await;
        let outcome = engine
            .run_query(
                "show all parameters for PRMG/Prime Connect",
                &QueryContext::new(),
                None,
            )
            .await;

        assert_eq!(
            outcome.capability,
            Some(CapabilityKind::ShowProgramParameters)
        );
        assert_eq!(
            outcome.auto_select,
            Some((Servicer::Prime, "PRMG/Prime Connect".to_string()))
        );
        match outcome.result {
            QueryResult::ParameterTable(table) => {
                assert_eq!(table.rows.len(), ATTRIBUTE_KEYS.len());
                let ltv = table.rows.iter().find(|r| r.key == "ltv").unwrap();
                assert_eq!(ltv.value, "<=85%");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn parameters_query_without_a_program_is_missing_a_slot() {
        let engine = engine().await;
        let outcome = engine
            .run_query("show all parameters please", &QueryContext::new(), None)
            .await;

        match outcome.result {
            QueryResult::Error(ErrorReport::MissingRequiredParameters { slots }) => {
                assert_eq!(slots, vec!["program_name".to_string()]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(outcome.auto_select, None);
    }

    #[tokio::test]
    async fn find_param_respects_the_context_selection() {
        let engine = engine().await;
        let mut context = QueryContext::new();
        context.select_program(Servicer::Prime, "PRMG/Prime Connect");
        context.select_servicer(Servicer::Prime);

        let outcome = engine
            .run_query("find citizenship across programs", &context, None)
            .await;

        match outcome.result {
            QueryResult::ParameterValue(report) => {
                assert!(report.filtered_by_selection);
                assert_eq!(report.key, "citizenship");
                assert_eq!(report.values.len(), 1);
                assert_eq!(report.values[0].value, "U.S. Citizen, Permanent Resident");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn disjoint_selection_is_a_valid_empty_answer() {
        let engine = engine().await;
        let mut context = QueryContext::new();
        context.select_program(Servicer::LoanStream, "LoanStream-Other");

        let outcome = engine
            .run_query("find citizenship across programs", &context, None)
            .await;

        match outcome.result {
            QueryResult::ParameterValue(report) => {
                assert!(report.filtered_by_selection);
                assert!(report.values.is_empty());
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn match_programs_ranks_and_reports_failures() {
        let engine = engine().await;
        let outcome = engine
            .run_query("match programs for 680 credit score", &QueryContext::new(), None)
            .await;

        assert_eq!(outcome.capability, Some(CapabilityKind::MatchPrograms));
        match outcome.result {
            QueryResult::MatchResults(report) => {
                assert_eq!(report.criteria.number("borrower_credit_score"), Some(680.0));
                let names: Vec<&str> =
                    report.matches.iter().map(|m| m.program.as_str()).collect();
                assert_eq!(
                    names,
                    vec![
                        "LoanStream-Select NonQM",
                        "PRMG/Prime Connect",
                        "PRMG/Plus Connect"
                    ]
                );
                assert!(report.matches[0].eligible);
                assert!(report.matches[1].eligible);
                assert!(!report.matches[2].eligible);
                assert_eq!(report.matches[2].failed[0].key, "borrower_credit_score");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn explicit_borrower_profile_wins_over_query_text() {
        let engine = engine().await;
        let borrower = BorrowerProfile::new().with("borrower_credit_score", 710.0);
        let outcome = engine
            .run_query(
                "match programs for 680 credit score",
                &QueryContext::new(),
                Some(&borrower),
            )
            .await;

        match outcome.result {
            QueryResult::MatchResults(report) => {
                assert_eq!(report.criteria.number("borrower_credit_score"), Some(710.0));
                // 710 satisfies every fixture threshold.
                assert!(report.matches.iter().all(|m| m.eligible));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unroutable_query_reports_no_matching_capability() {
        let engine = engine().await;
        let outcome = engine
            .run_query("what is the weather in ohio", &QueryContext::new(), None)
            .await;

        assert_eq!(outcome.capability, None);
        match outcome.result {
            QueryResult::Error(ErrorReport::NoMatchingCapability { best_score }) => {
                assert!(best_score < DEFAULT_MIN_SIMILARITY);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unresolved_parameter_token_is_missing_slot_plus_warning() {
        let engine = engine().await;
        let outcome = engine
            .run_query(
                "show the zzzgarbage parameter across programs",
                &QueryContext::new(),
                None,
            )
            .await;

        match outcome.result {
            QueryResult::Error(ErrorReport::MissingRequiredParameters { slots }) => {
                assert_eq!(slots, vec!["param_name".to_string()]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("zzzgarbage"));
    }

    #[tokio::test]
    async fn caret_prefix_is_stripped_before_routing() {
        let engine = engine().await;
        let outcome = engine
            .run_query("^show programs for Prime", &QueryContext::new(), None)
            .await;
        assert_eq!(outcome.capability, Some(CapabilityKind::ShowPrograms));
        assert_eq!(outcome.query, "^show programs for Prime");
    }

    #[tokio::test]
    async fn identical_queries_produce_identical_results() {
        let engine = engine().await;
        let context = QueryContext::new();
        let first = engine
            .run_query("find citizenship across programs", &context, None)
            .await;
        let second = engine
            .run_query("find citizenship across programs", &context, None)
            .await;

        assert_eq!(first.result, second.result);
        assert_eq!(first.warnings, second.warnings);
        assert_ne!(first.id, second.id);
    }
}
