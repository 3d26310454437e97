//! Three-valued evaluation of compiled predicates against borrower data.

use crate::profile::{BorrowerProfile, FieldValue};

use super::ast::{Branch, CriterionOutcome, Predicate};

/// Test a predicate against the attribute's own value, with the full
/// profile available for cross-field guards.
///
/// `own_value` is the borrower's value for the attribute whose criteria
/// text compiled to `predicate`; `None` when the profile lacks the field.
/// The result is `Unknown` whenever deciding would need data that is
/// absent or of the wrong shape, never an error.
pub fn evaluate(
    predicate: &Predicate,
    own_value: Option<&FieldValue>,
    profile: &BorrowerProfile,
) -> CriterionOutcome {
    match predicate {
        Predicate::Empty | Predicate::Informational => CriterionOutcome::Satisfied,
        Predicate::Unparseable => CriterionOutcome::Unknown,
        Predicate::Comparison(atom) => match numeric(own_value) {
            Some(value) => CriterionOutcome::from_bool(atom.test(value)),
            None => CriterionOutcome::Unknown,
        },
        Predicate::Range(low, high) => match numeric(own_value) {
            Some(value) => CriterionOutcome::from_bool(low.test(value) && high.test(value)),
            None => CriterionOutcome::Unknown,
        },
        Predicate::OneOf(options) => match own_value {
            Some(value) => CriterionOutcome::from_bool(member_of(options, value)),
            None => CriterionOutcome::Unknown,
        },
        Predicate::Conditional(branches) => evaluate_conditional(branches, own_value, profile),
    }
}

fn numeric(value: Option<&FieldValue>) -> Option<f64> {
    value.and_then(FieldValue::as_number)
}

/// Case-insensitive, trimmed membership. A numeric borrower value matches
/// options that parse to the same number, so `9` is in `6, 9, 12`.
fn member_of(options: &[String], value: &FieldValue) -> bool {
    match value {
        FieldValue::Text(text) => {
            let needle = text.trim();
            options.iter().any(|o| o.trim().eq_ignore_ascii_case(needle))
        }
        FieldValue::Number(n) => options
            .iter()
            .any(|o| o.trim().parse::<f64>().is_ok_and(|x| (x - n).abs() < f64::EPSILON)),
    }
}

/// Branches are tried in textual order; the first whose guard holds on
/// the available fields supplies the consequent. Undecidable guards are
/// skipped, and if no guard fires the result is `Unknown` when any guard
/// was undecidable, else `Satisfied` (no rule constrains the value).
fn evaluate_conditional(
    branches: &[Branch],
    own_value: Option<&FieldValue>,
    profile: &BorrowerProfile,
) -> CriterionOutcome {
    let mut any_undecidable = false;
    for branch in branches {
        match guard_holds(branch, profile) {
            Some(true) => return evaluate(&branch.consequent, own_value, profile),
            Some(false) => continue,
            None => any_undecidable = true,
        }
    }
    if any_undecidable {
        CriterionOutcome::Unknown
    } else {
        CriterionOutcome::Satisfied
    }
}

/// A guard holds when any present field passes its comparison. `None`
/// when every referenced field is absent (or non-numeric), which makes
/// the guard undecidable.
fn guard_holds(branch: &Branch, profile: &BorrowerProfile) -> Option<bool> {
    let mut saw_present = false;
    for field in &branch.fields {
        if let Some(value) = profile.get(field).and_then(FieldValue::as_number) {
            saw_present = true;
            if branch.condition.test(value) {
                return Some(true);
            }
        }
    }
    if saw_present {
        Some(false)
    } else {
        None
    }
}
