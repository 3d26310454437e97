//! Loan servicers and the programs they offer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::keys::{key_index, ATTRIBUTE_COUNT, ATTRIBUTE_KEYS};

/// A loan servicer whose programs appear in the eligibility matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Servicer {
    Prime,
    LoanStream,
}

impl Servicer {
    /// Both servicers, in matrix order.
    pub const ALL: [Servicer; 2] = [Servicer::Prime, Servicer::LoanStream];

    /// Infer the servicer from a program's name.
    ///
    /// Prime program columns are prefixed `PRMG/` or `Prime/`; LoanStream
    /// columns are prefixed `LoanStream-` or `LoanStream/`. An unprefixed
    /// name belongs to Prime. Prefixes match case-insensitively so
    /// user-typed names resolve the same way as matrix headers.
    pub fn from_program_name(name: &str) -> Servicer {
        let lower = name.trim().to_ascii_lowercase();
        if lower.starts_with("loanstream-") || lower.starts_with("loanstream/") {
            Servicer::LoanStream
        } else {
            Servicer::Prime
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Servicer::Prime => "Prime",
            Servicer::LoanStream => "LoanStream",
        }
    }
}

impl fmt::Display for Servicer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Servicer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match folded.as_str() {
            "prime" | "prmg" => Ok(Servicer::Prime),
            "loanstream" => Ok(Servicer::LoanStream),
            _ => Err(format!("unknown servicer '{s}'")),
        }
    }
}

/// One loan program: a named column of the eligibility matrix.
///
/// Attribute values are stored positionally in canonical key order, so every
/// program always carries all keys. An empty string means the matrix left
/// that cell blank, which reads as "no criteria".
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    name: String,
    servicer: Servicer,
    values: Vec<String>,
}

impl Program {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn servicer(&self) -> Servicer {
        self.servicer
    }

    /// The raw criteria text for a canonical attribute key.
    ///
    /// Returns `None` only for a non-canonical key; a blank matrix cell
    /// returns `Some("")`.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        key_index(key).map(|i| self.values[i].as_str())
    }

    /// All `(key, value)` pairs in canonical matrix order.
    pub fn attributes(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        ATTRIBUTE_KEYS
            .iter()
            .zip(self.values.iter())
            .map(|(k, v)| (*k, v.as_str()))
    }

    /// Matrix cells that actually contain text.
    pub fn non_empty_attributes(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.attributes().filter(|(_, v)| !v.is_empty())
    }
}

/// Builds a [`Program`] one attribute at a time.
///
/// Slots start empty, so a finished program satisfies the all-keys-present
/// invariant by construction. Loaders that need missing rows to be an error
/// track which slots they filled.
#[derive(Debug, Clone)]
pub struct ProgramBuilder {
    name: String,
    servicer: Servicer,
    values: Vec<String>,
}

impl ProgramBuilder {
    /// Start a program, inferring the servicer from the name prefix.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let servicer = Servicer::from_program_name(&name);
        ProgramBuilder {
            name,
            servicer,
            values: vec![String::new(); ATTRIBUTE_COUNT],
        }
    }

    /// Override the inferred servicer.
    pub fn servicer(mut self, servicer: Servicer) -> Self {
        self.servicer = servicer;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set an attribute by canonical key.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not canonical. Loaders resolving untrusted labels
    /// should resolve to a key index first and use [`set_by_index`].
    ///
    /// [`set_by_index`]: ProgramBuilder::set_by_index
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        let idx = key_index(key).unwrap_or_else(|| panic!("unknown attribute key '{key}'"));
        self.values[idx] = value.into();
        self
    }

    /// Set an attribute by its position in canonical key order.
    pub fn set_by_index(&mut self, idx: usize, value: impl Into<String>) {
        self.values[idx] = value.into();
    }

    pub fn build(self) -> Program {
        Program {
            name: self.name,
            servicer: self.servicer,
            values: self.values,
        }
    }
}
