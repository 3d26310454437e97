//! Property tests for the criteria grammar and its three-valued evaluation.
//!
//! The matrix cells are analyst-typed text, so the parser must be total
//! (no input panics or errors) and deterministic, and evaluation must obey
//! the matrix conventions: inclusive range bounds, cosmetic `%` and `$`
//! units, and `Unknown` whenever data is missing rather than a guess.

use loanpilot::{evaluate, parse_criteria, BorrowerProfile, CriterionOutcome, Predicate};
use proptest::prelude::*;

// -- Strategy helpers --

/// `1,234,567` style grouping for the separator-equivalence property.
fn with_thousands(n: i64) -> String {
    let digits = n.to_string();
    let mut out = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn op_cases() -> impl Strategy<Value = (&'static str, fn(f64, f64) -> bool)> {
    prop_oneof![
        Just((">=", (|v, b| v >= b) as fn(f64, f64) -> bool)),
        Just(("<=", (|v, b| v <= b) as fn(f64, f64) -> bool)),
        Just((">", (|v, b| v > b) as fn(f64, f64) -> bool)),
        Just(("<", (|v, b| v < b) as fn(f64, f64) -> bool)),
        Just(("=", (|v, b| v == b) as fn(f64, f64) -> bool)),
    ]
}

fn evaluate_against(text: &str, value: f64) -> CriterionOutcome {
    let profile = BorrowerProfile::new().with("field", value);
    evaluate(&parse_criteria(text), profile.get("field"), &profile)
}

proptest! {
    /// Parsing never fails and the same cell always compiles the same way.
    #[test]
    fn parse_is_total_and_deterministic(text in ".{0,60}") {
        prop_assert_eq!(parse_criteria(&text), parse_criteria(&text));
    }

    /// Blank cells constrain nothing, whatever the borrower supplied.
    #[test]
    fn whitespace_only_cells_are_satisfied(
        ws in "[ \t\r\n]{0,10}",
        value in 0.0..1e9f64,
    ) {
        prop_assert_eq!(parse_criteria(&ws), Predicate::Empty);
        prop_assert_eq!(evaluate_against(&ws, value), CriterionOutcome::Satisfied);
    }

    /// A threshold atom decides exactly as the arithmetic comparison does.
    #[test]
    fn thresholds_agree_with_direct_comparison(
        case in op_cases(),
        bound in 0i64..10_000_000,
        value in 0i64..10_000_000,
    ) {
        let (op, cmp) = case;
        let text = format!("{op}{bound}");
        let expected = CriterionOutcome::from_bool(cmp(value as f64, bound as f64));
        prop_assert_eq!(evaluate_against(&text, value as f64), expected);
    }

    /// `>=lo and <=hi` includes both endpoints and excludes both neighbours.
    #[test]
    fn range_bounds_are_inclusive(
        lo in 1i64..5_000_000,
        width in 0i64..5_000_000,
    ) {
        let hi = lo + width;
        let text = format!(">={lo} and <={hi}");

        prop_assert_eq!(evaluate_against(&text, lo as f64), CriterionOutcome::Satisfied);
        prop_assert_eq!(evaluate_against(&text, hi as f64), CriterionOutcome::Satisfied);
        prop_assert_eq!(
            evaluate_against(&text, (lo - 1) as f64),
            CriterionOutcome::NotSatisfied
        );
        prop_assert_eq!(
            evaluate_against(&text, (hi + 1) as f64),
            CriterionOutcome::NotSatisfied
        );
    }

    /// The `%` unit never rescales: `<=85%` is the same rule as `<=85`.
    #[test]
    fn percent_unit_is_cosmetic(bound in 0i64..=100, value in 0i64..200) {
        let with_unit = format!("<={bound}%");
        let without = format!("<={bound}");
        prop_assert_eq!(parse_criteria(&with_unit), parse_criteria(&without));
        prop_assert_eq!(
            evaluate_against(&with_unit, value as f64),
            evaluate_against(&without, value as f64)
        );
    }

    /// Thousands separators are display sugar on the same number.
    #[test]
    fn thousands_separators_are_cosmetic(n in 1_000i64..1_000_000_000) {
        let grouped = format!(">={}", with_thousands(n));
        let plain = format!(">={n}");
        prop_assert_eq!(parse_criteria(&grouped), parse_criteria(&plain));
    }

    /// No borrower value means no verdict, for atoms and ranges alike.
    #[test]
    fn missing_field_is_unknown_never_a_guess(
        case in op_cases(),
        bound in 0i64..10_000_000,
    ) {
        let (op, _) = case;
        let empty = BorrowerProfile::new();
        for text in [format!("{op}{bound}"), format!(">={bound} and <={bound}")] {
            prop_assert_eq!(
                evaluate(&parse_criteria(&text), None, &empty),
                CriterionOutcome::Unknown
            );
        }
    }

    /// Enumerated sets admit their members case-insensitively and nothing
    /// else.
    #[test]
    fn set_membership_is_case_insensitive_and_exact(
        tokens in prop::collection::vec("[a-z]{2,8}", 2..5),
        pick in any::<prop::sample::Index>(),
    ) {
        let text = tokens.join(", ");
        let member = tokens[pick.index(tokens.len())].to_uppercase();

        let hit = BorrowerProfile::new().with("field", member);
        prop_assert_eq!(
            evaluate(&parse_criteria(&text), hit.get("field"), &hit),
            CriterionOutcome::Satisfied
        );

        // Digits keep the needle out of any alphabetic token list.
        let miss = BorrowerProfile::new().with("field", "nope123");
        prop_assert_eq!(
            evaluate(&parse_criteria(&text), miss.get("field"), &miss),
            CriterionOutcome::NotSatisfied
        );
    }

    /// Prose guidance is informational: it can never disqualify.
    #[test]
    fn prose_cells_never_disqualify(
        body in "[a-zA-Z][a-zA-Z ]{0,40}",
        value in 0.0..1e9f64,
    ) {
        let text = format!("note {body}");
        prop_assert_eq!(parse_criteria(&text), Predicate::Informational);
        prop_assert_eq!(evaluate_against(&text, value), CriterionOutcome::Satisfied);
    }
}
