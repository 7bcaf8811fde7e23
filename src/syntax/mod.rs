//! Go source parsing: tree-sitter parsing and lowering into an owned AST.

pub mod ast;
pub mod lower;
pub mod parser;

pub use ast::{File, Ident, Pos};
pub use lower::lower_file;
pub use parser::{ParsedFile, Parser};
