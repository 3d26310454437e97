//! Program storage and the validated in-memory catalog.

use std::collections::HashSet;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::{CatalogError, CatalogResult};

use super::keys::ATTRIBUTE_COUNT;
use super::program::{Program, Servicer};

/// Source of raw programs for the catalog.
///
/// Implementations produce the full program set in one call; the catalog is
/// built once at startup and never refreshed in place.
pub trait ProgramStore: Send + Sync {
    fn load_all_programs(&self) -> CatalogResult<Vec<Program>>;
}

/// A store over a fixed program list, used by tests and demos.
#[derive(Debug, Clone, Default)]
pub struct StaticStore {
    programs: Vec<Program>,
}

impl StaticStore {
    pub fn new(programs: Vec<Program>) -> Self {
        StaticStore { programs }
    }
}

impl ProgramStore for StaticStore {
    fn load_all_programs(&self) -> CatalogResult<Vec<Program>> {
        Ok(self.programs.clone())
    }
}

/// Shape of the loaded catalog, for logging and health output.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub programs: usize,
    pub prime_programs: usize,
    pub loanstream_programs: usize,
    pub attribute_keys: usize,
    pub fingerprint: String,
}

/// The validated, immutable program catalog.
///
/// Built once from a [`ProgramStore`]; every query runs against this
/// snapshot. Program order is store order, which for the matrix loader is
/// column order, and all name lookups are case-insensitive.
#[derive(Debug, Clone)]
pub struct ProgramCatalog {
    programs: Vec<Program>,
    fingerprint: String,
}

impl ProgramCatalog {
    pub fn load(store: &dyn ProgramStore) -> CatalogResult<Self> {
        let catalog = Self::from_programs(store.load_all_programs()?)?;
        let stats = catalog.stats();
        info!(
            "Loaded program catalog: {} programs ({} Prime, {} LoanStream), fingerprint {}",
            stats.programs,
            stats.prime_programs,
            stats.loanstream_programs,
            catalog.short_fingerprint()
        );
        Ok(catalog)
    }

    pub fn from_programs(programs: Vec<Program>) -> CatalogResult<Self> {
        if programs.is_empty() {
            return Err(CatalogError::Empty);
        }

        // Case-insensitive uniqueness per servicer: program names are looked
        // up by substring match later, so case-twins would be ambiguous.
        let mut seen: HashSet<(Servicer, String)> = HashSet::new();
        for program in &programs {
            let tag = (program.servicer(), program.name().to_lowercase());
            if !seen.insert(tag) {
                return Err(CatalogError::DuplicateProgramName {
                    servicer: program.servicer(),
                    name: program.name().to_string(),
                });
            }
        }

        let fingerprint = fingerprint_of(&programs);
        Ok(ProgramCatalog {
            programs,
            fingerprint,
        })
    }

    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Programs for one servicer, in catalog order.
    pub fn programs_for(&self, servicer: Servicer) -> impl Iterator<Item = &Program> {
        self.programs
            .iter()
            .filter(move |p| p.servicer() == servicer)
    }

    /// Exact (case-insensitive) name lookup within a servicer.
    pub fn find(&self, servicer: Servicer, name: &str) -> Option<&Program> {
        self.programs_for(servicer)
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    /// Hex digest of every name and cell, identifying this snapshot.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Leading 12 hex chars of the fingerprint, for log lines.
    pub fn short_fingerprint(&self) -> &str {
        &self.fingerprint[..12]
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            programs: self.programs.len(),
            prime_programs: self.programs_for(Servicer::Prime).count(),
            loanstream_programs: self.programs_for(Servicer::LoanStream).count(),
            attribute_keys: ATTRIBUTE_COUNT,
            fingerprint: self.fingerprint.clone(),
        }
    }
}

fn fingerprint_of(programs: &[Program]) -> String {
    let mut hasher = Sha256::new();
    for program in programs {
        hasher.update(program.servicer().as_str().as_bytes());
        hasher.update(b"/");
        hasher.update(program.name().as_bytes());
        for (_, value) in program.attributes() {
            hasher.update(b"\x1f");
            hasher.update(value.as_bytes());
        }
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}
