use std::cmp::Ordering;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::loader::Package;
use crate::syntax::ast::is_exported;

/// How an error is declared. The order of the variants is the report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ErrorKind {
    #[default]
    Unknown,
    /// A package-level variable or constant whose type implements `error`.
    Sentinel,
    /// A named type whose method set implements `error`.
    Structured,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unknown => "Unknown",
            ErrorKind::Sentinel => "Sentinel",
            ErrorKind::Structured => "Structured",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Unknown" => Some(ErrorKind::Unknown),
            "Sentinel" => Some(ErrorKind::Sentinel),
            "Structured" => Some(ErrorKind::Structured),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ExportKind {
    #[default]
    Unknown,
    Exported,
    Unexported,
}

impl ExportKind {
    /// Visibility of a Go identifier, decided by the case of its first letter.
    pub fn of(name: &str) -> Self {
        if is_exported(name) {
            ExportKind::Exported
        } else {
            ExportKind::Unexported
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Unknown => "Unknown",
            ExportKind::Exported => "Exported",
            ExportKind::Unexported => "Unexported",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Unknown" => Some(ExportKind::Unknown),
            "Exported" => Some(ExportKind::Exported),
            "Unexported" => Some(ExportKind::Unexported),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl Serialize for ExportKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One report row. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Definition {
    pub error_kind: ErrorKind,
    pub export_kind: ExportKind,
    pub import_path: String,
    pub package_name: String,
    pub name: String,
    /// Canonical string of the declared identifier's type.
    pub backing_type_name: String,
}

impl Definition {
    pub fn new(
        error_kind: ErrorKind,
        name: &str,
        package: &Package,
        backing_type_name: String,
    ) -> Self {
        Self {
            error_kind,
            export_kind: ExportKind::of(name),
            import_path: package.import_path.clone(),
            package_name: package.name.clone(),
            name: name.to_string(),
            backing_type_name,
        }
    }
}

impl Ord for Definition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.error_kind
            .cmp(&other.error_kind)
            .then_with(|| self.export_kind.cmp(&other.export_kind))
            .then_with(|| self.import_path.cmp(&other.import_path))
            .then_with(|| self.package_name.cmp(&other.package_name))
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.backing_type_name.cmp(&other.backing_type_name))
    }
}

impl PartialOrd for Definition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(error_kind: ErrorKind, name: &str, import_path: &str) -> Definition {
        Definition {
            error_kind,
            export_kind: ExportKind::of(name),
            import_path: import_path.to_string(),
            package_name: import_path.rsplit('/').next().unwrap().to_string(),
            name: name.to_string(),
            backing_type_name: "error".to_string(),
        }
    }

    #[test]
    fn test_export_kind_of() {
        assert_eq!(ExportKind::of("ErrClosed"), ExportKind::Exported);
        assert_eq!(ExportKind::of("errClosed"), ExportKind::Unexported);
        assert_eq!(ExportKind::of("_"), ExportKind::Unexported);
    }

    #[test]
    fn test_display_strings() {
        assert_eq!(ErrorKind::Sentinel.to_string(), "Sentinel");
        assert_eq!(ErrorKind::Structured.to_string(), "Structured");
        assert_eq!(ExportKind::Exported.to_string(), "Exported");
        assert_eq!(ExportKind::Unexported.to_string(), "Unexported");
        assert_eq!(ErrorKind::from_str("Sentinel"), Some(ErrorKind::Sentinel));
        assert_eq!(ExportKind::from_str("sentinel"), None);
    }

    #[test]
    fn test_kind_ordinals() {
        assert!(ErrorKind::Unknown < ErrorKind::Sentinel);
        assert!(ErrorKind::Sentinel < ErrorKind::Structured);
        assert!(ExportKind::Exported < ExportKind::Unexported);
    }

    #[test]
    fn test_ordering_priority() {
        let structured = definition(ErrorKind::Structured, "AError", "a.com/a");
        let sentinel = definition(ErrorKind::Sentinel, "ZErr", "z.com/z");
        assert!(sentinel < structured);

        let exported = definition(ErrorKind::Sentinel, "ZErr", "z.com/z");
        let unexported = definition(ErrorKind::Sentinel, "aErr", "a.com/a");
        assert!(exported < unexported);

        let first = definition(ErrorKind::Sentinel, "ErrB", "a.com/a");
        let second = definition(ErrorKind::Sentinel, "ErrA", "b.com/b");
        assert!(first < second);

        let mut by_type = definition(ErrorKind::Sentinel, "ErrA", "a.com/a");
        let plain = by_type.clone();
        by_type.backing_type_name = "*a.com/a.wrapped".to_string();
        assert!(by_type < plain);
        assert_eq!(plain.cmp(&plain.clone()), Ordering::Equal);
    }
}
