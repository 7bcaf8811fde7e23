use super::LanguageGrammar;

pub struct GoGrammar;

impl LanguageGrammar for GoGrammar {
    fn name(&self) -> &'static str {
        "go"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["go"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_go::LANGUAGE.into()
    }

    fn excluded_suffixes(&self) -> &[&'static str] {
        &["_test.go"]
    }
}
