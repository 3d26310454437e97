//! Loader for the tab-separated eligibility matrix export.
//!
//! The matrix is transposed relative to the catalog: attributes are rows,
//! programs are columns. Besides program columns the sheet carries metadata
//! columns (`Attribute Name` et al) and free-text documentation columns;
//! only the program columns become catalog data. Excel exports arrive with
//! CRLF endings and the odd stray CR inside cells, so line endings are
//! normalized before parsing.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{CatalogError, CatalogResult};
use crate::vocab::AttributeVocabulary;

use super::keys::{key_index, ATTRIBUTE_COUNT, ATTRIBUTE_KEYS};
use super::program::{Program, ProgramBuilder};
use super::store::ProgramStore;

/// Columns describing the attribute itself rather than any program.
const METADATA_COLUMNS: [&str; 4] = [
    "Attribute Group",
    "Attribute Name",
    "Values",
    "Borrower Facing",
];

/// Free-text columns kept in the sheet for analysts; never program data.
const DOCUMENTATION_COLUMNS: [&str; 7] = [
    "Notes",
    "For discussion (variable not consistent with definition)",
    "Alternate Name",
    "Attribute Generic Name",
    "Description",
    "uom",
    "format status",
];

/// A [`ProgramStore`] reading the TSV matrix export from disk.
#[derive(Debug, Clone)]
pub struct MatrixStore {
    path: PathBuf,
}

impl MatrixStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        MatrixStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgramStore for MatrixStore {
    fn load_all_programs(&self) -> CatalogResult<Vec<Program>> {
        let raw = std::fs::read_to_string(&self.path)?;
        parse_matrix(&raw)
    }
}

/// Parse the raw TSV text into programs.
pub fn parse_matrix(raw: &str) -> CatalogResult<Vec<Program>> {
    let text = normalize_line_endings(raw);
    let vocab = AttributeVocabulary::bundled();

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let attr_col = headers
        .iter()
        .position(|h| h.trim() == "Attribute Name")
        .ok_or_else(|| CatalogError::MissingColumn {
            column: "Attribute Name".to_string(),
        })?;

    let mut builders: Vec<(usize, ProgramBuilder)> = Vec::new();
    for (col, header) in headers.iter().enumerate() {
        let header = header.trim();
        if header.is_empty()
            || METADATA_COLUMNS.contains(&header)
            || DOCUMENTATION_COLUMNS.contains(&header)
        {
            continue;
        }
        builders.push((col, ProgramBuilder::new(header)));
    }
    if builders.is_empty() {
        return Err(CatalogError::NoProgramColumns);
    }

    let mut seen = [false; ATTRIBUTE_COUNT];
    let mut row_count = 0usize;
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        row_count += 1;
        let row = i + 1;

        let label = record.get(attr_col).unwrap_or("").trim();
        let key_idx = vocab
            .resolve_exact(label)
            .and_then(key_index)
            .ok_or_else(|| CatalogError::UnknownAttributeRow {
                row,
                label: label.to_string(),
            })?;
        seen[key_idx] = true;

        for (col, builder) in builders.iter_mut() {
            let value = record.get(*col).unwrap_or("").trim();
            builder.set_by_index(key_idx, value);
        }
    }

    if row_count != ATTRIBUTE_COUNT {
        return Err(CatalogError::RowCountMismatch {
            expected: ATTRIBUTE_COUNT,
            found: row_count,
        });
    }
    if let Some(missing) = seen.iter().position(|s| !*s) {
        return Err(CatalogError::MissingAttributeKey {
            program: builders[0].1.name().to_string(),
            key: ATTRIBUTE_KEYS[missing].to_string(),
        });
    }

    let programs: Vec<Program> = builders.into_iter().map(|(_, b)| b.build()).collect();
    debug!(
        "Parsed {} matrix rows into {} programs",
        row_count,
        programs.len()
    );
    Ok(programs)
}

fn normalize_line_endings(raw: &str) -> String {
    raw.replace("\r\n", "\n").replace('\r', "")
}
