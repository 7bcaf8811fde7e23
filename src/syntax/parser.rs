use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::LoadError;
use crate::languages::{GoGrammar, LanguageGrammar};

pub struct Parser {
    grammar: Arc<dyn LanguageGrammar>,
}

impl Parser {
    pub fn new() -> Self {
        Self::with_grammar(Arc::new(GoGrammar))
    }

    pub fn with_grammar(grammar: Arc<dyn LanguageGrammar>) -> Self {
        Self { grammar }
    }

    pub fn grammar(&self) -> &Arc<dyn LanguageGrammar> {
        &self.grammar
    }

    pub fn parse_file(&self, path: &Path) -> Result<ParsedFile, LoadError> {
        let source = std::fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
        self.parse_source(&source, path)
    }

    pub fn parse_source(&self, source: &str, path: &Path) -> Result<ParsedFile, LoadError> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&self.grammar.language())
            .map_err(|e| LoadError::Parse(e.to_string()))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| LoadError::Parse(format!("Failed to parse {}", path.display())))?;

        Ok(ParsedFile {
            tree,
            source: source.to_string(),
            path: path.to_path_buf(),
        })
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ParsedFile {
    pub tree: tree_sitter::Tree,
    pub source: String,
    pub path: PathBuf,
}

impl ParsedFile {
    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    pub fn source_bytes(&self) -> &[u8] {
        self.source.as_bytes()
    }

    pub fn node_text(&self, node: &tree_sitter::Node) -> &str {
        node.utf8_text(self.source_bytes()).unwrap_or("")
    }

    /// Fails with the position of the first `ERROR` or `MISSING` node.
    pub fn check_syntax(&self) -> Result<(), LoadError> {
        match first_error(self.root_node()) {
            Some(node) => {
                let point = node.start_position();
                Err(LoadError::Syntax {
                    file: self.path.clone(),
                    line: point.row + 1,
                    column: point.column + 1,
                })
            }
            None => Ok(()),
        }
    }
}

fn first_error(node: tree_sitter::Node<'_>) -> Option<tree_sitter::Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error(child) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> ParsedFile {
        Parser::new()
            .parse_source(source, Path::new("test.go"))
            .unwrap()
    }

    #[test]
    fn test_parse_source_go() {
        let parsed = parse("package demo\n\nfunc main() {}\n");
        assert_eq!(parsed.root_node().kind(), "source_file");
        assert!(parsed.root_node().child_count() > 0);
        assert!(parsed.check_syntax().is_ok());
    }

    #[test]
    fn test_parse_source_empty() {
        let parsed = parse("");
        assert_eq!(parsed.source, "");
    }

    #[test]
    fn test_parsed_file_node_text() {
        let source = "package demo\n";
        let parsed = parse(source);
        let root = parsed.root_node();
        assert_eq!(parsed.node_text(&root), source);
        assert_eq!(parsed.source_bytes(), source.as_bytes());
    }

    #[test]
    fn test_check_syntax_reports_position() {
        let parsed = parse("package demo\n\nvar x = \n\nfunc {\n");
        match parsed.check_syntax() {
            Err(LoadError::Syntax { file, line, .. }) => {
                assert_eq!(file, PathBuf::from("test.go"));
                assert!(line >= 3);
            }
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_file_missing() {
        let result = Parser::new().parse_file(Path::new("/definitely/not/here.go"));
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }
}
