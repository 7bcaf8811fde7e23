pub mod error;
pub mod finder;
pub mod languages;
pub mod loader;
pub mod report;
pub mod syntax;
pub mod types;

use std::io::Write;

pub use error::{FinderError, LoadError, Result};
pub use finder::{collect_definitions, top_level_decls, Definition, ErrorKind, ExportKind};
pub use loader::{BuildContext, Loader, LoaderConfig, Package};
pub use report::ReportWriter;
pub use types::ErrorContract;

/// Pattern scanned when none is given.
pub const DEFAULT_PATTERN: &str = ".";

/// Loads the packages matched by `patterns`, finds their error declarations
/// and writes the sorted report to `out`. Returns the number of records.
pub fn run<W: Write>(patterns: &[String], config: LoaderConfig, out: W) -> Result<usize> {
    let definitions = find_definitions(patterns, config)?;

    let mut writer = ReportWriter::new(out);
    let written = writer.write_all(&definitions)?;
    writer.finish()?;
    Ok(written)
}

/// Loads the packages matched by `patterns` and returns their error
/// declarations in report order.
pub fn find_definitions(patterns: &[String], config: LoaderConfig) -> Result<Vec<Definition>> {
    let default_patterns = [DEFAULT_PATTERN.to_string()];
    let patterns = if patterns.is_empty() {
        &default_patterns[..]
    } else {
        patterns
    };

    let mut loader = Loader::new(config)?;
    let packages = loader.load(patterns)?;

    let contract = ErrorContract::universe();
    let definitions = collect_definitions(top_level_decls(&packages), &contract);
    tracing::info!(
        "Found {} error declarations in {} packages",
        definitions.len(),
        packages.len()
    );
    Ok(definitions)
}
