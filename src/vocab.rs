//! Attribute vocabulary: canonical keys, display names, and term matching.
//!
//! User wording ("fico", "debt to income", "appraisals") is resolved onto
//! canonical matrix keys in two layers: an exact lookup over keys, aliases,
//! display names and common terms, then a Jaro-Winkler pass with a fixed
//! floor. The vocabulary ships inside the binary and is validated against
//! the canonical key table at load.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;
use unicode_normalization::UnicodeNormalization;

use crate::catalog::{key_index, ATTRIBUTE_COUNT, ATTRIBUTE_KEYS};
use crate::error::{VocabError, VocabResult};

const BUNDLED_YAML: &str = include_str!("attributes.yaml");

/// Fuzzy-match floor; below this a token resolves to nothing.
pub const MIN_ATTRIBUTE_SIMILARITY: f64 = 0.6;

/// One vocabulary entry, as bundled in `attributes.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeEntry {
    pub key: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub terms: Vec<String>,
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct VocabFile {
    version: String,
    attributes: Vec<AttributeEntry>,
    #[serde(default)]
    aliases: HashMap<String, String>,
}

/// A resolved attribute and how confidently it matched.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeMatch {
    pub key: String,
    pub confidence: f64,
}

/// The loaded vocabulary with its lookup tables.
#[derive(Debug, Clone)]
pub struct AttributeVocabulary {
    version: String,
    entries: Vec<AttributeEntry>,
    // Normalized form -> entry index. First insertion wins, so keys
    // outrank aliases, which outrank names and terms.
    exact: HashMap<String, usize>,
    // Candidate forms for the fuzzy layer, in canonical entry order.
    fuzzy_forms: Vec<(String, usize)>,
}

impl AttributeVocabulary {
    /// The vocabulary bundled into the binary.
    ///
    /// # Panics
    ///
    /// Panics if the bundled YAML fails validation, which only a broken
    /// build can cause; `load_bundled` is the fallible form.
    pub fn bundled() -> &'static AttributeVocabulary {
        static VOCAB: OnceLock<AttributeVocabulary> = OnceLock::new();
        VOCAB.get_or_init(|| {
            AttributeVocabulary::load_bundled().expect("bundled attribute vocabulary is valid")
        })
    }

    pub fn load_bundled() -> VocabResult<AttributeVocabulary> {
        Self::load_from_str(BUNDLED_YAML)
    }

    pub fn load_from_str(yaml: &str) -> VocabResult<AttributeVocabulary> {
        let file: VocabFile = serde_yaml::from_str(yaml)?;

        if file.attributes.len() != ATTRIBUTE_COUNT {
            return Err(VocabError::WrongKeyCount {
                expected: ATTRIBUTE_COUNT,
                found: file.attributes.len(),
            });
        }
        for (entry, expected) in file.attributes.iter().zip(ATTRIBUTE_KEYS.iter()) {
            if entry.key != *expected {
                return Err(VocabError::KeyOrderMismatch {
                    key: entry.key.clone(),
                });
            }
        }

        let mut exact: HashMap<String, usize> = HashMap::new();
        for (idx, entry) in file.attributes.iter().enumerate() {
            exact.entry(normalize_label(&entry.key)).or_insert(idx);
        }
        for (alias, target) in &file.aliases {
            let idx = key_index(target).ok_or_else(|| VocabError::UnknownAliasTarget {
                alias: alias.clone(),
                target: target.clone(),
            })?;
            exact.entry(normalize_label(alias)).or_insert(idx);
        }
        for (idx, entry) in file.attributes.iter().enumerate() {
            exact.entry(normalize_label(&entry.name)).or_insert(idx);
            for term in &entry.terms {
                exact.entry(normalize_label(term)).or_insert(idx);
            }
        }

        let mut fuzzy_forms = Vec::new();
        for (idx, entry) in file.attributes.iter().enumerate() {
            fuzzy_forms.push((normalize_label(&entry.key), idx));
            fuzzy_forms.push((normalize_label(&entry.name), idx));
            for term in &entry.terms {
                fuzzy_forms.push((normalize_label(term), idx));
            }
        }

        Ok(AttributeVocabulary {
            version: file.version,
            entries: file.attributes,
            exact,
            fuzzy_forms,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn entries(&self) -> &[AttributeEntry] {
        &self.entries
    }

    /// The entry for a canonical key.
    pub fn entry(&self, key: &str) -> Option<&AttributeEntry> {
        key_index(key).map(|i| &self.entries[i])
    }

    /// Display name for a canonical key.
    pub fn display_name(&self, key: &str) -> Option<&str> {
        self.entry(key).map(|e| e.name.as_str())
    }

    /// Resolve user wording onto a canonical key.
    ///
    /// Exact hits (key, alias, display name, or common term, after
    /// normalization) return confidence 1.0. Otherwise the best
    /// Jaro-Winkler candidate wins if it clears the floor; earlier entries
    /// win ties, so resolution is deterministic.
    pub fn resolve(&self, raw: &str) -> Option<AttributeMatch> {
        let norm = normalize_label(raw);
        if norm.is_empty() {
            return None;
        }
        if let Some(&idx) = self.exact.get(&norm) {
            return Some(AttributeMatch {
                key: self.entries[idx].key.clone(),
                confidence: 1.0,
            });
        }

        let mut best: Option<(f64, usize)> = None;
        for (form, idx) in &self.fuzzy_forms {
            let score = jaro_winkler(&norm, form);
            if best.map_or(true, |(b, _)| score > b) {
                best = Some((score, *idx));
            }
        }
        match best {
            Some((score, idx)) if score >= MIN_ATTRIBUTE_SIMILARITY => Some(AttributeMatch {
                key: self.entries[idx].key.clone(),
                confidence: score,
            }),
            _ => None,
        }
    }

    /// Exact-layer resolution only; used by loaders where a fuzzy guess
    /// would mask a data problem.
    pub fn resolve_exact(&self, raw: &str) -> Option<&str> {
        self.exact
            .get(&normalize_label(raw))
            .map(|&idx| self.entries[idx].key.as_str())
    }
}

/// Normalize a label or phrase for matching: NFKC, lowercase, and every
/// run of non-alphanumerics becomes a single underscore.
pub fn normalize_label(raw: &str) -> String {
    let folded: String = raw.nfkc().collect::<String>().to_lowercase();
    let spaced: String = folded
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join("_")
}
