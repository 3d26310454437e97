//! The closed set of capabilities a query can route to.
//!
//! Each capability is a typed operation with a natural-language description
//! used for embedding-based routing. Declaration order is the tie-break
//! order when two descriptions score identically.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::ContextBehavior;

/// Slot names a capability can require before it will run.
pub mod slots {
    pub const PROGRAM_NAME: &str = "program_name";
    pub const LOAN_SERVICER: &str = "loan_servicer";
    pub const PARAM_NAME: &str = "param_name";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    ShowPrograms,
    ShowProgramParameters,
    FindParamAcrossPrograms,
    MatchPrograms,
}

impl CapabilityKind {
    pub fn name(self) -> &'static str {
        match self {
            CapabilityKind::ShowPrograms => "show_programs",
            CapabilityKind::ShowProgramParameters => "show_program_parameters",
            CapabilityKind::FindParamAcrossPrograms => "find_param_across_programs",
            CapabilityKind::MatchPrograms => "match_programs",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A routable capability and the contract it imposes on a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapabilityTemplate {
    pub kind: CapabilityKind,
    /// Description embedded at startup and matched against query embeddings.
    pub description: &'static str,
    /// Slots that must be filled (by the query or context) before dispatch.
    pub required_slots: &'static [&'static str],
    pub context_behavior: ContextBehavior,
}

/// Every capability, in declaration (tie-break) order.
pub static BUILTIN_TEMPLATES: [CapabilityTemplate; 4] = [
    CapabilityTemplate {
        kind: CapabilityKind::ShowPrograms,
        description: "Show programs for a loan servicer. List all available loan programs.",
        required_slots: &[],
        context_behavior: ContextBehavior::Ignore,
    },
    CapabilityTemplate {
        kind: CapabilityKind::ShowProgramParameters,
        description: "Show all parameters for a specific program. Use when asked about all \
                      parameters for one program.",
        required_slots: &[slots::PROGRAM_NAME, slots::LOAN_SERVICER],
        context_behavior: ContextBehavior::AutoSelect,
    },
    CapabilityTemplate {
        kind: CapabilityKind::FindParamAcrossPrograms,
        description: "Find a specific parameter value across multiple programs. Use when asked \
                      about a parameter (citizenship, appraisal, reserves, documentation) with \
                      selected programs.",
        required_slots: &[slots::PARAM_NAME, slots::LOAN_SERVICER],
        context_behavior: ContextBehavior::FilterBySelection,
    },
    CapabilityTemplate {
        kind: CapabilityKind::MatchPrograms,
        description: "Find matching programs based on borrower profile (credit score, loan \
                      amount, LTV, DTI, etc.).",
        required_slots: &[],
        context_behavior: ContextBehavior::FilterBySelection,
    },
];

/// Look a template up by kind.
pub fn template_for(kind: CapabilityKind) -> &'static CapabilityTemplate {
    match kind {
        CapabilityKind::ShowPrograms => &BUILTIN_TEMPLATES[0],
        CapabilityKind::ShowProgramParameters => &BUILTIN_TEMPLATES[1],
        CapabilityKind::FindParamAcrossPrograms => &BUILTIN_TEMPLATES[2],
        CapabilityKind::MatchPrograms => &BUILTIN_TEMPLATES[3],
    }
}
