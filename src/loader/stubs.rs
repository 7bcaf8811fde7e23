//! Declaration-only Go sources for the standard-library packages most
//! commonly referenced by package-level error declarations.

const STUBS: &[(&str, &str)] = &[
    ("bufio", include_str!("stubs/bufio.go")),
    ("context", include_str!("stubs/context.go")),
    ("database/sql", include_str!("stubs/database_sql.go")),
    ("encoding/json", include_str!("stubs/encoding_json.go")),
    ("errors", include_str!("stubs/errors.go")),
    ("fmt", include_str!("stubs/fmt.go")),
    ("io", include_str!("stubs/io.go")),
    ("io/fs", include_str!("stubs/io_fs.go")),
    ("net", include_str!("stubs/net.go")),
    ("net/http", include_str!("stubs/net_http.go")),
    ("os", include_str!("stubs/os.go")),
    ("path", include_str!("stubs/path.go")),
    ("path/filepath", include_str!("stubs/path_filepath.go")),
    ("strconv", include_str!("stubs/strconv.go")),
];

pub fn source(import_path: &str) -> Option<&'static str> {
    STUBS
        .iter()
        .find(|(path, _)| *path == import_path)
        .map(|(_, source)| *source)
}

pub fn import_paths() -> impl Iterator<Item = &'static str> {
    STUBS.iter().map(|(path, _)| *path)
}
