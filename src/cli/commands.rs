use std::io::{self, BufWriter, Write};

use anyhow::Context;
use clap::Parser;

use errorfinder::LoaderConfig;

#[derive(Parser)]
#[command(name = "errorfinder")]
#[command(about = "Inventory sentinel errors and error types declared in Go packages")]
#[command(version)]
#[command(after_long_help = r#"
OUTPUT:
    One CSV record per declaration, without a header:
    ErrorKind,ExportKind,ImportPath,PackageName,Name,BackingTypeName

EXAMPLES:
    # Scan the package in the current directory
    errorfinder

    # Scan every package of the module
    errorfinder ./...

    # Scan by import path
    errorfinder example.com/shop/internal/billing
"#)]
pub struct Cli {
    /// Package directories (./dir, ./dir/...) or import paths
    pub patterns: Vec<String>,
}

/// Scans `patterns` and writes the report to stdout.
pub fn scan(patterns: &[String]) -> anyhow::Result<()> {
    let config = LoaderConfig::from_env().context("Failed to read environment")?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let written = errorfinder::run(patterns, config, &mut out)
        .with_context(|| format!("Failed to scan {}", describe(patterns)))?;
    out.flush().context("Failed to write report")?;

    tracing::debug!("Wrote {} records", written);
    Ok(())
}

fn describe(patterns: &[String]) -> String {
    if patterns.is_empty() {
        errorfinder::DEFAULT_PATTERN.to_string()
    } else {
        patterns.join(" ")
    }
}
