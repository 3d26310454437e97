//! The expression evaluator: criteria text in, three-valued outcome out.
//!
//! `parse_criteria` compiles one matrix cell into a [`Predicate`];
//! `evaluate` tests it against a borrower profile. Parsing is total:
//! malformed cells degrade to [`Predicate::Unparseable`] (reported as a
//! warning, evaluated as `Unknown`) instead of failing the query.

mod ast;
mod eval;
mod parser;

pub use ast::{Branch, CompareOp, Comparison, CriterionOutcome, Predicate};
pub use eval::evaluate;
pub use parser::parse_criteria;
