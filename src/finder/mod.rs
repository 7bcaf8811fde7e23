//! Classification of package-level declarations into sentinel errors and
//! structured error types.

pub mod classify;
pub mod collect;
pub mod decls;
pub mod models;

pub use classify::{extract_sentinels, extract_structured};
pub use collect::collect_definitions;
pub use decls::{top_level_decls, DeclContext};
pub use models::{Definition, ErrorKind, ExportKind};
