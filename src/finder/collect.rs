use super::classify::{extract_sentinels, extract_structured};
use super::decls::DeclContext;
use super::models::{Definition, ErrorKind};
use crate::types::ErrorContract;

/// Runs both extractors over every context and returns the definitions in
/// report order. Duplicates are kept.
pub fn collect_definitions<'a, I>(contexts: I, contract: &ErrorContract) -> Vec<Definition>
where
    I: IntoIterator<Item = DeclContext<'a>>,
{
    let mut definitions = Vec::new();
    for ctx in contexts {
        definitions.extend(extract_sentinels(ctx, contract));
        definitions.extend(extract_structured(ctx, contract));
    }

    debug_assert!(definitions
        .iter()
        .all(|definition: &Definition| definition.error_kind != ErrorKind::Unknown));

    definitions.sort();
    tracing::debug!("Collected {} error definitions", definitions.len());
    definitions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finder::decls::top_level_decls;
    use crate::loader::Package;
    use crate::syntax::{lower_file, Parser};
    use crate::types::Checker;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Arc;

    fn package(import_path: &str, source: &str) -> Arc<Package> {
        let parsed = Parser::new()
            .parse_source(source, Path::new("x.go"))
            .unwrap();
        let files = vec![lower_file(&parsed, 0).unwrap()];
        let imports = HashMap::new();
        let info = Checker::new(import_path, &files, &imports).check();
        Arc::new(Package {
            import_path: import_path.to_string(),
            name: files[0].package.name.clone(),
            dir: Path::new("/src").to_path_buf(),
            files,
            info: Arc::new(info),
        })
    }

    const SOURCE: &str = "package z\n\ntype zErr struct{}\n\nfunc (zErr) Error() string { return \"\" }\n\ntype Loud struct{}\n\nfunc (Loud) Error() string { return \"\" }\n\nvar (\n\terrQuiet = zErr{}\n\tErrLoud  = Loud{}\n\tErrAlso  error = zErr{}\n)\n";

    #[test]
    fn test_sorted_order() {
        let contract = ErrorContract::universe();
        let packages = vec![package("example.com/z", SOURCE)];
        let defs = collect_definitions(top_level_decls(&packages), &contract);

        let rows: Vec<_> = defs
            .iter()
            .map(|d| format!("{} {} {}", d.error_kind, d.export_kind, d.name))
            .collect();
        assert_eq!(
            rows,
            vec![
                "Sentinel Exported ErrAlso",
                "Sentinel Exported ErrLoud",
                "Sentinel Unexported errQuiet",
                "Structured Exported Loud",
                "Structured Unexported zErr",
            ]
        );
        assert!(defs.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn test_duplicates_are_adjacent() {
        let contract = ErrorContract::universe();
        let shared = package("example.com/z", SOURCE);
        let packages = vec![Arc::clone(&shared), package("example.com/a", SOURCE), shared];
        let defs = collect_definitions(top_level_decls(&packages), &contract);

        assert_eq!(defs.len(), 15);
        let loud: Vec<usize> = defs
            .iter()
            .enumerate()
            .filter(|(_, d)| d.name == "ErrLoud" && d.import_path == "example.com/z")
            .map(|(i, _)| i)
            .collect();
        assert_eq!(loud.len(), 2);
        assert_eq!(loud[1], loud[0] + 1);
        assert_eq!(defs[loud[0]], defs[loud[1]]);
    }

    #[test]
    fn test_empty_input() {
        let contract = ErrorContract::universe();
        assert!(collect_definitions(top_level_decls(&[]), &contract).is_empty());
    }
}
