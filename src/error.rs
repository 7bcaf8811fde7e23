use std::path::PathBuf;

use thiserror::Error;

/// Failures while resolving, parsing, or checking Go packages.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot resolve pattern {pattern:?}: {reason}")]
    UnresolvedPattern { pattern: String, reason: String },

    #[error("pattern {0:?} matched no packages")]
    NoMatches(String),

    #[error("no Go files in {0}")]
    NoGoFiles(PathBuf),

    #[error("found packages {first} and {second} in {dir}")]
    MixedPackages {
        dir: PathBuf,
        first: String,
        second: String,
    },

    #[error("{file}:{line}:{column}: syntax error")]
    Syntax {
        file: PathBuf,
        line: usize,
        column: usize,
    },

    #[error("{0}: missing package clause")]
    MissingPackageClause(PathBuf),

    #[error("import cycle not allowed: {0}")]
    ImportCycle(String),

    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Walk error: {0}")]
    Walk(#[from] ignore::Error),
}

impl LoadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LoadError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Error, Debug)]
pub enum FinderError {
    #[error("loading packages: {0}")]
    Load(#[from] LoadError),

    #[error("writing CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FinderError>;
