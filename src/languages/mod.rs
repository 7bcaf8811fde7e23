pub mod go;

pub use go::GoGrammar;

use std::path::Path;

pub trait LanguageGrammar: Send + Sync {
    fn name(&self) -> &'static str;
    fn file_extensions(&self) -> &[&'static str];
    fn language(&self) -> tree_sitter::Language;

    /// Suffixes of files that share the extension but are not part of a
    /// regular package build (test files, for instance).
    fn excluded_suffixes(&self) -> &[&'static str] {
        &[]
    }

    fn is_source_file(&self, path: &Path) -> bool {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        let has_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.file_extensions().contains(&ext));

        has_extension
            && !self
                .excluded_suffixes()
                .iter()
                .any(|suffix| file_name.ends_with(suffix))
    }
}
