//! Compiled form of one eligibility-criteria expression.

use std::fmt;

use smallvec::SmallVec;

/// Comparison operator inside a criteria atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
}

impl CompareOp {
    pub fn test(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            CompareOp::Gt => lhs > rhs,
            CompareOp::Gte => lhs >= rhs,
            CompareOp::Lt => lhs < rhs,
            CompareOp::Lte => lhs <= rhs,
            CompareOp::Eq => (lhs - rhs).abs() < f64::EPSILON,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Eq => "==",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One comparison atom, e.g. `<=45%` or `>=125000`.
///
/// Percent values keep the 0-100 scale the matrix and borrower profiles
/// both use; `85%` compiles to `85.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub op: CompareOp,
    pub value: f64,
}

impl Comparison {
    pub fn test(&self, value: f64) -> bool {
        self.op.test(value, self.value)
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op, self.value)
    }
}

/// One guarded branch of a conditional rule: `if ltv,cltv>85%, then <=45%`.
///
/// `fields` are the borrower fields the guard reads; the guard holds when
/// any present field passes the comparison. The consequent applies to the
/// attribute's own value, never to the guard fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub fields: SmallVec<[String; 2]>,
    pub condition: Comparison,
    pub consequent: Predicate,
}

/// The evaluable rule compiled from one attribute's criteria text.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Blank cell; unspecified criteria never disqualifies.
    Empty,
    /// A single comparison atom.
    Comparison(Comparison),
    /// Two atoms joined by `and`, both of which must hold.
    Range(Comparison, Comparison),
    /// Membership in an enumerated set, case-insensitive and trimmed.
    OneOf(Vec<String>),
    /// Guarded branches tried in textual order.
    Conditional(Vec<Branch>),
    /// Descriptive prose; non-binding, always satisfied.
    Informational,
    /// Pattern-shaped text that failed to parse; evaluates to `Unknown`
    /// and is surfaced on the warnings list.
    Unparseable,
}

impl Predicate {
    /// True when evaluating this predicate can never disqualify and reads
    /// no borrower data.
    pub fn is_non_binding(&self) -> bool {
        matches!(self, Predicate::Empty | Predicate::Informational)
    }

    pub fn is_unparseable(&self) -> bool {
        matches!(self, Predicate::Unparseable)
    }
}

/// Outcome of testing one criterion against a borrower value.
///
/// `Unknown` means the data needed to decide was missing; it never
/// disqualifies, but is reported apart from `Satisfied` so callers can
/// tell "passed" from "not tested".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriterionOutcome {
    Satisfied,
    NotSatisfied,
    Unknown,
}

impl CriterionOutcome {
    pub fn from_bool(pass: bool) -> Self {
        if pass {
            CriterionOutcome::Satisfied
        } else {
            CriterionOutcome::NotSatisfied
        }
    }

    /// True for `Satisfied` and `NotSatisfied`; false for `Unknown`.
    pub fn is_decided(&self) -> bool {
        !matches!(self, CriterionOutcome::Unknown)
    }

    pub fn is_disqualifying(&self) -> bool {
        matches!(self, CriterionOutcome::NotSatisfied)
    }
}

impl fmt::Display for CriterionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CriterionOutcome::Satisfied => "satisfied",
            CriterionOutcome::NotSatisfied => "not satisfied",
            CriterionOutcome::Unknown => "unknown",
        };
        f.write_str(label)
    }
}
