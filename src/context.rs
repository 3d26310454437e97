//! Session context and the rules for merging it into a query's scope.
//!
//! Context is owned by the caller and passed explicitly into every query;
//! the engine never mutates it. A capability declares one of three merge
//! behaviors, and [`resolve_scope`] applies the declared behavior to the
//! candidate programs the query itself selected.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::catalog::{Program, Servicer};

/// How a capability treats the session context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextBehavior {
    /// Context plays no part; the query alone decides the scope.
    Ignore,
    /// The result carries a directive to select the queried program, so a
    /// session owner can fold it back into its context.
    AutoSelect,
    /// The scope is restricted to the intersection of the query's candidates
    /// and the context's selected programs.
    FilterBySelection,
}

/// Caller-owned selection state carried across queries in a session.
///
/// Program selections are (servicer, canonical name) pairs; ordering is
/// stable so serialized context round-trips byte-for-byte.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryContext {
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub selected_programs: BTreeSet<(Servicer, String)>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub selected_servicers: BTreeSet<Servicer>,
}

impl QueryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_program(&mut self, servicer: Servicer, name: impl Into<String>) {
        self.selected_programs.insert((servicer, name.into()));
    }

    pub fn select_servicer(&mut self, servicer: Servicer) {
        self.selected_servicers.insert(servicer);
    }

    /// True when at least one program is selected.
    pub fn has_program_selection(&self) -> bool {
        !self.selected_programs.is_empty()
    }

    /// The single selected servicer, when the selection is unambiguous.
    pub fn sole_servicer(&self) -> Option<Servicer> {
        if self.selected_servicers.len() == 1 {
            self.selected_servicers.iter().next().copied()
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        self.selected_programs.is_empty() && self.selected_servicers.is_empty()
    }

    fn contains_program(&self, program: &Program) -> bool {
        self.selected_programs
            .iter()
            .any(|(servicer, name)| {
                *servicer == program.servicer() && name.eq_ignore_ascii_case(program.name())
            })
    }
}

/// The programs an operation may touch after context is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedScope<'a> {
    pub programs: Vec<&'a Program>,
    /// True when the context's program selection narrowed the candidates.
    /// An empty `programs` with this flag set is a valid empty result, not
    /// a routing failure.
    pub filtered_by_selection: bool,
}

/// Apply a capability's context behavior to the query's candidate programs.
///
/// Filtering takes a strict intersection. An empty program selection never
/// filters (the capability behaves as if context were absent), and a
/// disjoint selection yields an empty scope rather than an error.
pub fn resolve_scope<'a>(
    behavior: ContextBehavior,
    context: &QueryContext,
    candidates: Vec<&'a Program>,
) -> ResolvedScope<'a> {
    match behavior {
        ContextBehavior::Ignore | ContextBehavior::AutoSelect => ResolvedScope {
            programs: candidates,
            filtered_by_selection: false,
        },
        ContextBehavior::FilterBySelection => {
            if !context.has_program_selection() {
                return ResolvedScope {
                    programs: candidates,
                    filtered_by_selection: false,
                };
            }
            let programs = candidates
                .into_iter()
                .filter(|program| context.contains_program(program))
                .collect();
            ResolvedScope {
                programs,
                filtered_by_selection: true,
            }
        }
    }
}
