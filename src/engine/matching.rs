//! Scoring programs against a borrower profile.
//!
//! Only attributes the profile actually carries are evaluated; a program
//! is eligible when none of them came back not-satisfied, so missing data
//! and undecidable criteria never disqualify. The match percentage is
//! satisfied over decided outcomes; unknowns sit outside the ratio.

use std::cmp::Ordering;

use crate::catalog::Program;
use crate::criteria::{evaluate, parse_criteria, CriterionOutcome};
use crate::error::QueryWarning;
use crate::profile::BorrowerProfile;
use crate::vocab::AttributeVocabulary;

use super::result::{FailedCriterion, ProgramMatch};

/// Evaluate every candidate and sort by match percentage descending, name
/// ascending within ties.
pub(crate) fn evaluate_programs(
    programs: &[&Program],
    profile: &BorrowerProfile,
    vocab: &AttributeVocabulary,
    warnings: &mut Vec<QueryWarning>,
) -> Vec<ProgramMatch> {
    let mut matches: Vec<ProgramMatch> = programs
        .iter()
        .map(|program| evaluate_one(program, profile, vocab, warnings))
        .collect();
    matches.sort_by(|a, b| {
        b.match_pct
            .partial_cmp(&a.match_pct)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.program.cmp(&b.program))
    });
    matches
}

fn evaluate_one(
    program: &Program,
    profile: &BorrowerProfile,
    vocab: &AttributeVocabulary,
    warnings: &mut Vec<QueryWarning>,
) -> ProgramMatch {
    let mut matched = 0;
    let mut decided = 0;
    let mut unknown = 0;
    let mut failed = Vec::new();

    for (key, value) in profile.iter() {
        let Some(raw) = program.attribute(key) else {
            continue;
        };
        let predicate = parse_criteria(raw);
        if predicate.is_unparseable() {
            warnings.push(QueryWarning::UnparseableExpression {
                program: program.name().to_string(),
                attribute: key.to_string(),
            });
        }
        match evaluate(&predicate, Some(value), profile) {
            CriterionOutcome::Satisfied => {
                matched += 1;
                decided += 1;
            }
            CriterionOutcome::NotSatisfied => {
                decided += 1;
                failed.push(FailedCriterion {
                    key: key.to_string(),
                    name: vocab.display_name(key).unwrap_or(key).to_string(),
                    requirement: raw.to_string(),
                    actual: value.to_string(),
                });
            }
            CriterionOutcome::Unknown => unknown += 1,
        }
    }

    let match_pct = if decided > 0 {
        matched as f64 * 100.0 / decided as f64
    } else {
        0.0
    };
    ProgramMatch {
        servicer: program.servicer(),
        program: program.name().to_string(),
        eligible: failed.is_empty(),
        match_pct,
        matched,
        decided,
        unknown,
        failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProgramBuilder;

    fn vocab() -> &'static AttributeVocabulary {
        AttributeVocabulary::bundled()
    }

    fn run(programs: &[Program], profile: &BorrowerProfile) -> Vec<ProgramMatch> {
        let refs: Vec<&Program> = programs.iter().collect();
        let mut warnings = Vec::new();
        evaluate_programs(&refs, profile, vocab(), &mut warnings)
    }

    #[test]
    fn fully_satisfied_program_is_eligible_at_full_percentage() {
        let programs = vec![ProgramBuilder::new("PRMG/Prime Connect")
            .with("ltv", "<=85%")
            .with("borrower_credit_score", ">=620")
            .build()];
        let profile = BorrowerProfile::new()
            .with("ltv", 80.0)
            .with("borrower_credit_score", 700.0);

        let matches = run(&programs, &profile);
        assert!(matches[0].eligible);
        assert_eq!(matches[0].match_pct, 100.0);
        assert_eq!((matches[0].matched, matches[0].decided), (2, 2));
    }

    #[test]
    fn failed_criterion_disqualifies_and_is_reported() {
        let programs = vec![ProgramBuilder::new("PRMG/Prime Connect")
            .with("ltv", "<=75%")
            .with("borrower_credit_score", ">=620")
            .build()];
        let profile = BorrowerProfile::new()
            .with("ltv", 80.0)
            .with("borrower_credit_score", 700.0);

        let matches = run(&programs, &profile);
        assert!(!matches[0].eligible);
        assert_eq!(matches[0].match_pct, 50.0);
        assert_eq!(matches[0].failed.len(), 1);
        assert_eq!(matches[0].failed[0].key, "ltv");
        assert_eq!(matches[0].failed[0].requirement, "<=75%");
        assert_eq!(matches[0].failed[0].actual, "80");
    }

    #[test]
    fn blank_and_informational_criteria_count_as_satisfied() {
        let programs = vec![ProgramBuilder::new("PRMG/Prime Connect")
            .with("borrower_credit_score", "Reviewed with the full credit file. See underwriting guidance for detail.")
            .build()];
        // ltv left blank in the matrix.
        let profile = BorrowerProfile::new()
            .with("ltv", 90.0)
            .with("borrower_credit_score", 580.0);

        let matches = run(&programs, &profile);
        assert!(matches[0].eligible);
        assert_eq!(matches[0].match_pct, 100.0);
        assert_eq!(matches[0].decided, 2);
    }

    #[test]
    fn unknown_outcomes_never_disqualify_and_sit_outside_the_ratio() {
        let programs = vec![ProgramBuilder::new("PRMG/Prime Connect")
            .with("ltv", "<=85%")
            .with("citizenship", "U.S. Citizen, Permanent Resident")
            .build()];
        // Citizenship value the program's set cannot decide numerically is
        // a normal set miss; an undecidable one comes from a text value
        // against a numeric rule.
        let profile = BorrowerProfile::new()
            .with("ltv", "eighty")
            .with("citizenship", "U.S. Citizen");

        let matches = run(&programs, &profile);
        assert!(matches[0].eligible);
        assert_eq!(matches[0].unknown, 1);
        assert_eq!((matches[0].matched, matches[0].decided), (1, 1));
        assert_eq!(matches[0].match_pct, 100.0);
    }

    #[test]
    fn unparseable_criteria_warn_and_read_as_unknown() {
        let programs = vec![ProgramBuilder::new("PRMG/Prime Connect")
            .with("ltv", ">= banana")
            .build()];
        let profile = BorrowerProfile::new().with("ltv", 80.0);

        let refs: Vec<&Program> = programs.iter().collect();
        let mut warnings = Vec::new();
        let matches = evaluate_programs(&refs, &profile, vocab(), &mut warnings);
        assert!(matches[0].eligible);
        assert_eq!(matches[0].unknown, 1);
        assert_eq!(
            warnings,
            vec![QueryWarning::UnparseableExpression {
                program: "PRMG/Prime Connect".to_string(),
                attribute: "ltv".to_string(),
            }]
        );
    }

    #[test]
    fn results_sort_by_percentage_then_name() {
        let programs = vec![
            ProgramBuilder::new("PRMG/Zeta")
                .with("ltv", "<=85%")
                .with("dti", "<=45%")
                .build(),
            ProgramBuilder::new("PRMG/Alpha")
                .with("ltv", "<=85%")
                .with("dti", "<=45%")
                .build(),
            ProgramBuilder::new("PRMG/Midway")
                .with("ltv", "<=75%")
                .with("dti", "<=45%")
                .build(),
        ];
        let profile = BorrowerProfile::new().with("ltv", 80.0).with("dti", 40.0);

        let matches = run(&programs, &profile);
        let names: Vec<&str> = matches.iter().map(|m| m.program.as_str()).collect();
        assert_eq!(names, vec!["PRMG/Alpha", "PRMG/Zeta", "PRMG/Midway"]);
    }

    #[test]
    fn empty_profile_decides_nothing() {
        let programs = vec![ProgramBuilder::new("PRMG/Prime Connect")
            .with("ltv", "<=85%")
            .build()];
        let matches = run(&programs, &BorrowerProfile::new());
        assert!(matches[0].eligible);
        assert_eq!(matches[0].match_pct, 0.0);
        assert_eq!(matches[0].decided, 0);
    }
}
