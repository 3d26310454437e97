//! The program catalog: canonical attribute keys, programs per servicer,
//! and the matrix loader that builds the startup snapshot.

mod keys;
mod matrix;
mod program;
mod store;

pub use keys::{is_canonical_key, key_index, ATTRIBUTE_COUNT, ATTRIBUTE_KEYS};
pub use matrix::{parse_matrix, MatrixStore};
pub use program::{Program, ProgramBuilder, Servicer};
pub use store::{CatalogStats, ProgramCatalog, ProgramStore, StaticStore};
