//! Deterministic slot extraction from query text.
//!
//! A query can carry up to four kinds of slots: a program name, a loan
//! servicer, an attribute of interest, and borrower criteria. Extraction
//! runs a fixed priority ladder:
//!
//! 1. Program: the longest catalog program name appearing in the query
//!    (case-insensitive substring; catalog order breaks length ties). The
//!    servicer is inferred from the matched program. A second pass accepts
//!    names with the servicer prefix dropped ("Prime Connect" for
//!    "PRMG/Prime Connect") when no full name matched.
//! 2. Servicer: an explicit "prime" / "loanstream" mention, consulted only
//!    when no program name resolved.
//! 3. Attribute: exact vocabulary hits over word n-grams of the query,
//!    longest phrase first; parameter-shaped tokens ("X parameter",
//!    "find X across") fall back to fuzzy matching, and a token that
//!    matches nothing becomes a warning rather than a guess.
//! 4. Borrower criteria: cue-word patterns for scores, amounts, ratios,
//!    and categorical fields.

mod borrower;

use regex::Regex;
use tracing::debug;

use crate::catalog::{Program, ProgramCatalog, Servicer};
use crate::error::QueryWarning;
use crate::profile::BorrowerProfile;
use crate::vocab::{AttributeMatch, AttributeVocabulary};

use borrower::BorrowerPatterns;

/// Everything the extractor could read out of one query.
#[derive(Debug, Clone, Default)]
pub struct ExtractedSlots {
    /// Matched program, as (servicer, canonical catalog name).
    pub program: Option<(Servicer, String)>,
    pub servicer: Option<Servicer>,
    pub attribute: Option<AttributeMatch>,
    pub borrower: BorrowerProfile,
    pub warnings: Vec<QueryWarning>,
}

impl ExtractedSlots {
    /// The resolved servicer, defaulting to Prime when the query named none.
    pub fn servicer_or_default(&self) -> Servicer {
        self.servicer.unwrap_or(Servicer::Prime)
    }
}

/// Query words ignored when single words are checked against the
/// vocabulary. Multi-word phrases are never filtered.
const SINGLE_WORD_STOPLIST: &[&str] = &[
    "a", "about", "across", "all", "an", "and", "are", "can", "do", "does", "find", "for", "get",
    "in", "is", "list", "me", "my", "of", "on", "or", "parameter", "parameters", "program",
    "programs", "show", "the", "to", "what", "which", "with",
];

/// Longest n-gram tried against the vocabulary.
const MAX_PHRASE_WORDS: usize = 3;

pub struct ParameterExtractor {
    patterns: BorrowerPatterns,
    param_suffix: Regex,
    param_find: Regex,
}

impl Default for ParameterExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterExtractor {
    pub fn new() -> Self {
        ParameterExtractor {
            patterns: BorrowerPatterns::new(),
            param_suffix: Regex::new(r"(?i)\b([\w-]+)\s+parameter\b")
                .expect("parameter-suffix pattern compiles"),
            param_find: Regex::new(r"(?i)\b(?:find|show)\s+([\w-]+)\s+(?:across|for)\b")
                .expect("find-parameter pattern compiles"),
        }
    }

    /// Run the full ladder over one query.
    pub fn extract(
        &self,
        query: &str,
        catalog: &ProgramCatalog,
        vocab: &AttributeVocabulary,
    ) -> ExtractedSlots {
        let lower = query.to_lowercase();
        let mut slots = ExtractedSlots::default();

        if let Some(program) = find_program(&lower, catalog) {
            slots.servicer = Some(program.servicer());
            slots.program = Some((program.servicer(), program.name().to_string()));
        } else if contains_phrase(&lower, "prime") || contains_phrase(&lower, "prmg") {
            slots.servicer = Some(Servicer::Prime);
        } else if contains_phrase(&lower, "loanstream") || contains_phrase(&lower, "loan stream")
        {
            slots.servicer = Some(Servicer::LoanStream);
        }

        slots.attribute = self.find_attribute(query, vocab, &mut slots.warnings);
        slots.borrower = self.patterns.extract(query);

        debug!(
            program = ?slots.program,
            servicer = ?slots.servicer,
            attribute = ?slots.attribute,
            borrower_fields = slots.borrower.len(),
            "extracted query slots"
        );
        slots
    }

    fn find_attribute(
        &self,
        query: &str,
        vocab: &AttributeVocabulary,
        warnings: &mut Vec<QueryWarning>,
    ) -> Option<AttributeMatch> {
        let words: Vec<String> = query
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect();

        // Longest exact phrase wins; leftmost on equal length.
        for size in (1..=MAX_PHRASE_WORDS).rev() {
            if size > words.len() {
                continue;
            }
            for window in words.windows(size) {
                if size == 1 && SINGLE_WORD_STOPLIST.contains(&window[0].as_str()) {
                    continue;
                }
                let phrase = window.join(" ");
                if let Some(key) = vocab.resolve_exact(&phrase) {
                    return Some(AttributeMatch {
                        key: key.to_string(),
                        confidence: 1.0,
                    });
                }
            }
        }

        // No exact hit anywhere: fuzzy-match only tokens the query itself
        // frames as a parameter, so typos resolve but ordinary words never
        // drag in a spurious attribute.
        for pattern in [&self.param_suffix, &self.param_find] {
            if let Some(caps) = pattern.captures(query) {
                let token = caps[1].to_string();
                match vocab.resolve(&token) {
                    Some(matched) => return Some(matched),
                    None => warnings.push(QueryWarning::UnmatchedAttribute { token }),
                }
            }
        }
        None
    }
}

/// Longest program name contained in the query, by full name first and by
/// servicer-prefix-stripped name second.
fn find_program<'a>(query_lower: &str, catalog: &'a ProgramCatalog) -> Option<&'a Program> {
    let mut best: Option<(usize, &Program)> = None;
    for program in catalog.programs() {
        let name_lower = program.name().to_lowercase();
        if contains_phrase(query_lower, &name_lower)
            && best.map_or(true, |(len, _)| name_lower.len() > len)
        {
            best = Some((name_lower.len(), program));
        }
    }
    if let Some((_, program)) = best {
        return Some(program);
    }

    for program in catalog.programs() {
        if let Some(stripped) = prefix_stripped(program.name()) {
            let stripped_lower = stripped.to_lowercase();
            if contains_phrase(query_lower, &stripped_lower)
                && best.map_or(true, |(len, _)| stripped_lower.len() > len)
            {
                best = Some((stripped_lower.len(), program));
            }
        }
    }
    best.map(|(_, program)| program)
}

/// Substring search that refuses matches glued to surrounding letters or
/// digits, so "selected" never hits a program named "Select".
fn contains_phrase(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    for (start, _) in haystack.match_indices(needle) {
        let end = start + needle.len();
        let left_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let right_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        if left_ok && right_ok {
            return true;
        }
    }
    false
}

/// The program name with its servicer prefix removed, when the remainder is
/// still distinctive enough to match on.
fn prefix_stripped(name: &str) -> Option<&str> {
    for prefix in ["PRMG/", "Prime/", "LoanStream-", "LoanStream/"] {
        if let Some(rest) = name.strip_prefix(prefix) {
            let rest = rest.trim();
            if rest.len() >= 4 {
                return Some(rest);
            }
            return None;
        }
    }
    None
}
