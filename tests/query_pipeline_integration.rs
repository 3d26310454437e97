//! Integration tests for the full query pipeline.
//!
//! Each test drives `run_query` end to end over a fixture catalog and a
//! scripted embedding provider, verifying:
//! - routing to the right capability with slot-gap reporting
//! - program listing, parameter tables, and cross-program parameter lookup
//! - borrower matching with eligibility, ranking, and failure detail
//! - warnings surfaced for broken matrix expressions
//! - the same query always producing the same result payload

mod helpers;

use loanpilot::{
    CapabilityKind, ErrorReport, QueryContext, QueryResult, Servicer,
};
use serde_json::json;

// ===== LISTING AND TABLES =====

#[tokio::test]
async fn program_list_scopes_to_the_named_servicer() {
    let engine = helpers::engine().await;
    let outcome = engine
        .run_query("show programs for Prime", &QueryContext::new(), None)
        .await;

    assert_eq!(outcome.capability, Some(CapabilityKind::ShowPrograms));
    assert!(outcome.similarity.unwrap() > 0.99);
    assert!(outcome.warnings.is_empty());

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
async fn program_list_covers_all_servicers_when_none_is_named() {
    let engine = helpers::engine().await;
    let outcome = engine
        .run_query("list available loan programs", &QueryContext::new(), None)
        .await;

    match outcome.result {
        QueryResult::ProgramList(list) => {
            assert_eq!(list.servicer, None);
            let names: Vec<&str> = list.programs.iter().map(|p| p.name.as_str()).collect();
            assert_eq!(
                names,
                vec![
                    "PRMG/Prime Connect",
                    "PRMG/Plus Connect",
                    "LoanStream-Select NonQM"
                ]
            );
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn parameter_table_carries_every_attribute_and_the_auto_select() {
    let engine = helpers::engine().await;
    let outcome = engine
        .run_query(
            "show all parameters for PRMG/Prime Connect",
            &QueryContext::new(),
            None,
        )
        .await;

    assert_eq!(outcome.capability, Some(CapabilityKind::ShowProgramParameters));
    assert_eq!(
        outcome.auto_select,
        Some((Servicer::Prime, "PRMG/Prime Connect".to_string()))
    );

    match outcome.result {
        QueryResult::ParameterTable(table) => {
            assert_eq!(table.program, "PRMG/Prime Connect");
            assert_eq!(table.rows.len(), 60);
            assert_eq!(table.populated(), 6);

            let ltv = table.rows.iter().find(|r| r.key == "ltv").unwrap();
            assert_eq!(ltv.value, "<=85%");

            let rendered = table.to_string();
            assert!(rendered.contains("(6 of 60 populated)"), "{rendered}");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn parameter_table_without_a_program_reports_the_missing_slot() {
    let engine = helpers::engine().await;
    let outcome = engine
        .run_query("show all parameters", &QueryContext::new(), None)
        .await;

    // Wire shape: internally tagged, slot names machine-readable.
    let value = serde_json::to_value(&outcome.result).unwrap();
    assert_eq!(value["type"], json!("error"));
    assert_eq!(value["code"], json!("missing_required_parameters"));
    assert_eq!(value["slots"], json!(["program_name"]));
}

// ===== PARAMETER LOOKUP ACROSS PROGRAMS =====

#[tokio::test]
async fn parameter_lookup_defaults_to_prime_programs() {
    let engine = helpers::engine().await;
    let outcome = engine
        .run_query("find citizenship across programs", &QueryContext::new(), None)
        .await;

    assert_eq!(
        outcome.capability,
        Some(CapabilityKind::FindParamAcrossPrograms)
    );
    match outcome.result {
        QueryResult::ParameterValue(report) => {
            assert_eq!(report.key, "citizenship");
            assert_eq!(report.confidence, 1.0);
            assert!(!report.filtered_by_selection);

            let cells: Vec<(&str, &str)> = report
                .values
                .iter()
                .map(|c| (c.program.as_str(), c.value.as_str()))
                .collect();
            assert_eq!(
                cells,
                vec![
                    ("PRMG/Prime Connect", "U.S. Citizen, Permanent Resident"),
                    ("PRMG/Plus Connect", "U.S. Citizen"),
                ]
            );
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn parameter_lookup_follows_a_servicer_mention() {
    let engine = helpers::engine().await;
    let outcome = engine
        .run_query(
            "find the citizenship parameter across loanstream programs",
            &QueryContext::new(),
            None,
        )
        .await;

    match outcome.result {
        QueryResult::ParameterValue(report) => {
            assert_eq!(report.values.len(), 1);
            assert_eq!(report.values[0].program, "LoanStream-Select NonQM");
            assert_eq!(report.values[0].servicer, Servicer::LoanStream);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

// ===== BORROWER MATCHING =====

#[tokio::test]
async fn matching_ranks_by_percentage_then_name_and_reports_failures() {
    let engine = helpers::engine().await;
    let outcome = engine
        .run_query(
            "match programs for a 680 credit score with $100,000 loan amount at 80% ltv",
            &QueryContext::new(),
            None,
        )
        .await;

    assert_eq!(outcome.capability, Some(CapabilityKind::MatchPrograms));
    assert!(outcome.warnings.is_empty());

    match outcome.result {
        QueryResult::MatchResults(report) => {
            assert_eq!(report.criteria.len(), 3);

            let order: Vec<&str> = report.matches.iter().map(|m| m.program.as_str()).collect();
            // Plus Connect decides all three in favor; the other two tie at
            // two of three and fall back to name order.
            assert_eq!(
                order,
                vec![
                    "PRMG/Plus Connect",
                    "LoanStream-Select NonQM",
                    "PRMG/Prime Connect"
                ]
            );

            let eligible: Vec<bool> = report.matches.iter().map(|m| m.eligible).collect();
            assert_eq!(eligible, vec![true, false, false]);

            assert_eq!(report.matches[0].match_pct, 100.0);
            assert!((report.matches[1].match_pct - 200.0 / 3.0).abs() < 1e-9);

            for m in &report.matches[1..] {
                assert_eq!(m.failed.len(), 1, "{}: {:?}", m.program, m.failed);
                assert_eq!(m.failed[0].key, "loan_amount");
                assert!(!m.failed[0].requirement.is_empty());
            }
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn broken_matrix_expression_warns_and_counts_as_unknown() {
    let engine = helpers::engine().await;
    let outcome = engine
        .run_query("match programs for 40 dti", &QueryContext::new(), None)
        .await;

    assert_eq!(
        outcome.warnings,
        vec!["unparseable criteria for 'dti' in LoanStream-Select NonQM".to_string()]
    );

    match outcome.result {
        QueryResult::MatchResults(report) => {
            let loanstream = report
                .matches
                .iter()
                .find(|m| m.program == "LoanStream-Select NonQM")
                .unwrap();
            assert_eq!(loanstream.unknown, 1);
            assert_eq!(loanstream.decided, 0);
            assert_eq!(loanstream.match_pct, 0.0);
            // Unknown never disqualifies.
            assert!(loanstream.eligible);

            let plus = report
                .matches
                .iter()
                .find(|m| m.program == "PRMG/Plus Connect")
                .unwrap();
            assert_eq!((plus.matched, plus.decided), (1, 1));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

// ===== FAILURE MODES AND STABILITY =====

#[tokio::test]
async fn off_topic_query_gets_help_not_a_failure() {
    let engine = helpers::engine().await;
    let outcome = engine
        .run_query("what is the capital of france", &QueryContext::new(), None)
        .await;

    assert_eq!(outcome.capability, None);
    assert!(outcome.result.is_error());
    match &outcome.result {
        QueryResult::Error(ErrorReport::NoMatchingCapability { best_score }) => {
            assert!(*best_score < 0.35);
        }
        other => panic!("unexpected result: {other:?}"),
    }

    let rendered = outcome.result.to_string();
    assert!(
        rendered.contains("This system can answer questions like"),
        "{rendered}"
    );
}

#[tokio::test]
async fn identical_queries_produce_identical_results() {
    let engine = helpers::engine().await;
    let query = "match programs for a 680 credit score with $100,000 loan amount at 80% ltv";

    let first = engine.run_query(query, &QueryContext::new(), None).await;
    let second = engine.run_query(query, &QueryContext::new(), None).await;

    assert_eq!(first.result, second.result);
    assert_eq!(first.warnings, second.warnings);
    assert_ne!(first.id, second.id);
}
