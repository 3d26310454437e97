//! Typed query results and their plain-text rendering.
//!
//! Every capability produces one [`QueryResult`] variant; failures that a
//! caller should see (no capability, missing slots, embedding outage)
//! travel as [`ErrorReport`] payloads inside the result rather than as
//! `Err` values, so `run_query` itself never fails.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::Servicer;
use crate::profile::BorrowerProfile;
use crate::router::CapabilityKind;

/// One program line in a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramEntry {
    pub servicer: Servicer,
    pub name: String,
}

/// Result of `show_programs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramList {
    /// The servicer the listing was scoped to, when the query named one.
    pub servicer: Option<Servicer>,
    pub programs: Vec<ProgramEntry>,
}

/// One attribute row of a program's parameter table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRow {
    pub key: String,
    pub name: String,
    pub value: String,
}

/// Result of `show_program_parameters`: the full attribute table for one
/// program, in canonical attribute order. Blank values are kept so the
/// table always has the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterTable {
    pub servicer: Servicer,
    pub program: String,
    pub rows: Vec<ParameterRow>,
}

impl ParameterTable {
    pub fn populated(&self) -> usize {
        self.rows.iter().filter(|r| !r.value.is_empty()).count()
    }
}

/// One program's value for a queried attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterCell {
    pub servicer: Servicer,
    pub program: String,
    pub value: String,
}

/// Result of `find_param_across_programs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterReport {
    pub key: String,
    pub display_name: String,
    /// Attribute-match confidence; 1.0 for exact vocabulary hits.
    pub confidence: f64,
    /// True when the session's program selection narrowed the scope. An
    /// empty `values` under this flag is a valid empty answer.
    pub filtered_by_selection: bool,
    pub values: Vec<ParameterCell>,
}

/// One criterion a borrower profile failed for a program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedCriterion {
    pub key: String,
    pub name: String,
    /// The program's criteria text, verbatim.
    pub requirement: String,
    /// The borrower's value, rendered.
    pub actual: String,
}

/// One program's standing against a borrower profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramMatch {
    pub servicer: Servicer,
    pub program: String,
    /// True when no evaluated criterion came back not-satisfied. Unknown
    /// outcomes never disqualify.
    pub eligible: bool,
    /// Satisfied criteria over decided criteria, as a 0-100 percentage.
    /// 0.0 when nothing could be decided.
    pub match_pct: f64,
    pub matched: usize,
    pub decided: usize,
    pub unknown: usize,
    pub failed: Vec<FailedCriterion>,
}

/// Result of `match_programs`, sorted by match percentage descending and
/// program name ascending within ties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    /// The criteria actually evaluated.
    pub criteria: BorrowerProfile,
    pub filtered_by_selection: bool,
    pub matches: Vec<ProgramMatch>,
}

/// Caller-visible query failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ErrorReport {
    /// No capability description scored above the similarity floor.
    NoMatchingCapability { best_score: f32 },
    /// The routed capability needs slots the query did not fill.
    MissingRequiredParameters { slots: Vec<String> },
    /// The embedding provider failed twice; nothing was routed.
    EmbeddingUnavailable { message: String },
}

/// The typed payload of one answered query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryResult {
    ProgramList(ProgramList),
    ParameterTable(ParameterTable),
    ParameterValue(ParameterReport),
    MatchResults(MatchReport),
    Error(ErrorReport),
}

impl QueryResult {
    pub fn is_error(&self) -> bool {
        matches!(self, QueryResult::Error(_))
    }
}

/// Everything `run_query` hands back for one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub id: Uuid,
    /// The query as received.
    pub query: String,
    pub capability: Option<CapabilityKind>,
    pub similarity: Option<f32>,
    pub result: QueryResult,
    /// Rendered warnings, deduplicated and sorted.
    pub warnings: Vec<String>,
    /// Set when the capability asks the session owner to select the queried
    /// program into its context.
    pub auto_select: Option<(Servicer, String)>,
    pub executed_at: DateTime<Utc>,
}

impl fmt::Display for ProgramList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.servicer {
            Some(servicer) => writeln!(f, "Programs for {} ({}):", servicer, self.programs.len())?,
            None => writeln!(f, "Programs ({}):", self.programs.len())?,
        }
        for (i, entry) in self.programs.iter().enumerate() {
            if self.servicer.is_some() {
                writeln!(f, "  {}. {}", i + 1, entry.name)?;
            } else {
                writeln!(f, "  {}. [{}] {}", i + 1, entry.servicer, entry.name)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for ParameterTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Parameters for {} [{}] ({} of {} populated):",
            self.program,
            self.servicer,
            self.populated(),
            self.rows.len()
        )?;
        for row in &self.rows {
            if !row.value.is_empty() {
                writeln!(f, "  {}: {}", row.name, row.value)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for ParameterReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} across {} program{}",
            self.display_name,
            self.values.len(),
            if self.values.len() == 1 { "" } else { "s" }
        )?;
        if self.filtered_by_selection {
            write!(f, " (filtered by selection)")?;
        }
        writeln!(f, ":")?;
        if self.values.is_empty() {
            if self.filtered_by_selection {
                writeln!(f, "  no selected programs in scope")?;
            } else {
                writeln!(f, "  no programs in scope")?;
            }
            return Ok(());
        }
        for cell in &self.values {
            if cell.value.is_empty() {
                writeln!(f, "  [{}] {}: (no value)", cell.servicer, cell.program)?;
            } else {
                writeln!(f, "  [{}] {}: {}", cell.servicer, cell.program, cell.value)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for MatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Matched {} program{} against {} borrower criteria",
            self.matches.len(),
            if self.matches.len() == 1 { "" } else { "s" },
            self.criteria.len()
        )?;
        if self.filtered_by_selection {
            write!(f, " (filtered by selection)")?;
        }
        writeln!(f, ":")?;
        for (i, m) in self.matches.iter().enumerate() {
            write!(
                f,
                "  {}. {}: {}, {:.0}% ({}/{} criteria",
                i + 1,
                m.program,
                if m.eligible { "eligible" } else { "not eligible" },
                m.match_pct,
                m.matched,
                m.decided
            )?;
            if m.unknown > 0 {
                write!(f, ", {} unknown", m.unknown)?;
            }
            writeln!(f, ")")?;
            for failed in &m.failed {
                writeln!(
                    f,
                    "       not met: {} requires {} (borrower: {})",
                    failed.name, failed.requirement, failed.actual
                )?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorReport::NoMatchingCapability { best_score } => {
                writeln!(
                    f,
                    "No capability matched this query (best similarity {best_score:.2})."
                )?;
                write_help(f)
            }
            ErrorReport::MissingRequiredParameters { slots } => {
                writeln!(f, "Missing required information: {}.", slots.join(", "))?;
                write!(f, "Rephrase the query to include it.")
            }
            ErrorReport::EmbeddingUnavailable { message } => {
                writeln!(f, "The semantic matcher is unavailable ({message}).")?;
                write_help(f)
            }
        }
    }
}

fn write_help(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "This system can answer questions like:")?;
    writeln!(f, "  - show programs for Prime")?;
    writeln!(f, "  - show all parameters for PRMG/Prime Connect")?;
    writeln!(f, "  - find citizenship across programs")?;
    write!(f, "  - match programs for a 680 credit score, $450,000 loan amount")
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::ProgramList(list) => list.fmt(f),
            QueryResult::ParameterTable(table) => table.fmt(f),
            QueryResult::ParameterValue(report) => report.fmt(f),
            QueryResult::MatchResults(report) => report.fmt(f),
            QueryResult::Error(report) => report.fmt(f),
        }
    }
}

impl fmt::Display for QueryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.result)?;
        if let Some((servicer, name)) = &self.auto_select {
            writeln!(f)?;
            write!(f, "note: selected {name} [{servicer}] into the session context")?;
        }
        if !self.warnings.is_empty() {
            writeln!(f)?;
            write!(f, "warnings:")?;
            for warning in &self.warnings {
                writeln!(f)?;
                write!(f, "  - {warning}")?;
            }
        }
        Ok(())
    }
}
