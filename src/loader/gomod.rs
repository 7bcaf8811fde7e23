use std::path::{Component, Path, PathBuf};

use crate::error::LoadError;

/// A Go module: the `module` path declared in `go.mod`, the directory
/// holding that file and its `require` directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoModule {
    pub path: String,
    pub root: PathBuf,
    pub requires: Vec<Requirement>,
}

/// A `require` directive: module path and version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub path: String,
    pub version: String,
}

impl Requirement {
    /// Whether `import_path` is this module or a package inside it.
    pub fn provides(&self, import_path: &str) -> bool {
        import_path
            .strip_prefix(&self.path)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }

    /// `<modcache>/<escaped path>@<escaped version>`.
    pub fn cache_dir(&self, modcache: &Path) -> PathBuf {
        join_segments(
            modcache,
            &format!("{}@{}", escape_path(&self.path), escape_path(&self.version)),
        )
    }
}

/// Module-cache case encoding: every upper-case letter becomes `!` followed
/// by its lower-case form.
pub fn escape_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            escaped.push('!');
            escaped.push(c.to_ascii_lowercase());
        } else {
            escaped.push(c);
        }
    }
    escaped
}

impl GoModule {
    /// Nearest module enclosing `start`, walking up through its ancestors.
    pub fn find(start: &Path) -> Result<Option<Self>, LoadError> {
        for dir in start.ancestors() {
            let go_mod = dir.join("go.mod");
            if !go_mod.is_file() {
                continue;
            }
            let contents =
                std::fs::read_to_string(&go_mod).map_err(|e| LoadError::io(&go_mod, e))?;
            return match Self::parse_module_path(&contents) {
                Some(path) => Ok(Some(Self {
                    path,
                    root: dir.to_path_buf(),
                    requires: Self::parse_requires(&contents),
                })),
                None => Err(LoadError::Parse(format!(
                    "{}: no module directive",
                    go_mod.display()
                ))),
            };
        }
        Ok(None)
    }

    /// The path named by the `module` directive.
    pub fn parse_module_path(contents: &str) -> Option<String> {
        contents.lines().find_map(|line| {
            let line = line.split("//").next().unwrap_or("").trim();
            let rest = line.strip_prefix("module")?;
            if !rest.starts_with(char::is_whitespace) {
                return None;
            }
            let path = rest.trim().trim_matches('"').trim_matches('`');
            (!path.is_empty()).then(|| path.to_string())
        })
    }

    /// A required module unpacked at `root`, with its own requirements when
    /// it has a `go.mod`.
    pub fn dependency(path: &str, root: PathBuf) -> Self {
        let requires = std::fs::read_to_string(root.join("go.mod"))
            .map(|contents| Self::parse_requires(&contents))
            .unwrap_or_default();
        Self {
            path: path.to_string(),
            root,
            requires,
        }
    }

    /// Every `require` directive, single-line or in a `require (...)` block.
    pub fn parse_requires(contents: &str) -> Vec<Requirement> {
        let mut requires = Vec::new();
        let mut in_block = false;
        for line in contents.lines() {
            let line = line.split("//").next().unwrap_or("").trim();
            let spec = if in_block {
                if line.starts_with(')') {
                    in_block = false;
                    continue;
                }
                line
            } else if let Some(rest) = line.strip_prefix("require") {
                let rest = rest.trim();
                if rest.starts_with('(') {
                    in_block = true;
                    continue;
                }
                rest
            } else {
                continue;
            };

            let mut fields = spec.split_whitespace();
            if let (Some(path), Some(version)) = (fields.next(), fields.next()) {
                requires.push(Requirement {
                    path: path.trim_matches('"').to_string(),
                    version: version.to_string(),
                });
            }
        }
        requires
    }

    /// Import path of a directory inside the module.
    pub fn import_path_for(&self, dir: &Path) -> Option<String> {
        let relative = dir.strip_prefix(&self.root).ok()?;
        let segments: Vec<&str> = relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(segment) => segment.to_str(),
                _ => None,
            })
            .collect();
        if segments.is_empty() {
            Some(self.path.clone())
        } else {
            Some(format!("{}/{}", self.path, segments.join("/")))
        }
    }

    /// Directory for an import path that belongs to this module.
    pub fn dir_for(&self, import_path: &str) -> Option<PathBuf> {
        if import_path == self.path {
            return Some(self.root.clone());
        }
        let relative = import_path
            .strip_prefix(&self.path)?
            .strip_prefix('/')?;
        Some(join_segments(&self.root, relative))
    }

    /// Location of an import path under the module's `vendor` directory.
    pub fn vendor_dir_for(&self, import_path: &str) -> PathBuf {
        join_segments(&self.root.join("vendor"), import_path)
    }
}

pub(crate) fn join_segments(base: &Path, import_path: &str) -> PathBuf {
    import_path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(base.to_path_buf(), |dir, segment| dir.join(segment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn module(root: &Path) -> GoModule {
        GoModule {
            path: "example.com/shop".to_string(),
            root: root.to_path_buf(),
            requires: Vec::new(),
        }
    }

    #[test]
    fn test_parse_module_path() {
        assert_eq!(
            GoModule::parse_module_path("module example.com/shop\n\ngo 1.22\n"),
            Some("example.com/shop".to_string())
        );
        assert_eq!(
            GoModule::parse_module_path("// comment\nmodule \"example.com/quoted\" // trailing\n"),
            Some("example.com/quoted".to_string())
        );
        assert_eq!(GoModule::parse_module_path("go 1.22\n"), None);
        assert_eq!(GoModule::parse_module_path("modules example.com/x\n"), None);
    }

    #[test]
    fn test_parse_requires() {
        let requires = GoModule::parse_requires(
            "module example.com/shop\n\ngo 1.22\n\nrequire github.com/pkg/errors v0.9.1\n\nrequire (\n\tgithub.com/BurntSushi/toml v1.3.2 // indirect\n\tgolang.org/x/sys v0.15.0\n)\n",
        );
        let pairs: Vec<(&str, &str)> = requires
            .iter()
            .map(|r| (r.path.as_str(), r.version.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("github.com/pkg/errors", "v0.9.1"),
                ("github.com/BurntSushi/toml", "v1.3.2"),
                ("golang.org/x/sys", "v0.15.0"),
            ]
        );
    }

    #[test]
    fn test_requirement_cache_dir() {
        let requirement = Requirement {
            path: "github.com/BurntSushi/toml".to_string(),
            version: "v1.3.2".to_string(),
        };
        assert!(requirement.provides("github.com/BurntSushi/toml"));
        assert!(requirement.provides("github.com/BurntSushi/toml/internal"));
        assert!(!requirement.provides("github.com/BurntSushi/tomlx"));
        assert_eq!(
            requirement.cache_dir(Path::new("/cache")),
            Path::new("/cache/github.com/!burnt!sushi/toml@v1.3.2")
        );
    }

    #[test]
    fn test_find_walks_up() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("go.mod"), "module example.com/shop\n").unwrap();
        let nested = temp_dir.path().join("internal/billing");
        fs::create_dir_all(&nested).unwrap();

        let found = GoModule::find(&nested).unwrap().unwrap();
        assert_eq!(found.path, "example.com/shop");
        assert_eq!(found.root, temp_dir.path());
    }

    #[test]
    fn test_find_without_module() {
        let temp_dir = TempDir::new().unwrap();
        // A go.mod further up the real filesystem would be found too, so only
        // assert on the error-free path here.
        assert!(GoModule::find(temp_dir.path()).is_ok());
    }

    #[test]
    fn test_find_rejects_go_mod_without_directive() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("go.mod"), "go 1.22\n").unwrap();
        assert!(matches!(
            GoModule::find(temp_dir.path()),
            Err(LoadError::Parse(_))
        ));
    }

    #[test]
    fn test_import_path_for() {
        let temp_dir = TempDir::new().unwrap();
        let module = module(temp_dir.path());
        assert_eq!(
            module.import_path_for(temp_dir.path()),
            Some("example.com/shop".to_string())
        );
        assert_eq!(
            module.import_path_for(&temp_dir.path().join("internal/billing")),
            Some("example.com/shop/internal/billing".to_string())
        );
        assert_eq!(module.import_path_for(Path::new("/elsewhere")), None);
    }

    #[test]
    fn test_dir_for() {
        let temp_dir = TempDir::new().unwrap();
        let module = module(temp_dir.path());
        assert_eq!(
            module.dir_for("example.com/shop"),
            Some(temp_dir.path().to_path_buf())
        );
        assert_eq!(
            module.dir_for("example.com/shop/internal/billing"),
            Some(temp_dir.path().join("internal").join("billing"))
        );
        assert_eq!(module.dir_for("example.com/shopping"), None);
        assert_eq!(module.dir_for("errors"), None);
        assert_eq!(
            module.vendor_dir_for("github.com/acme/lib"),
            temp_dir.path().join("vendor/github.com/acme/lib")
        );
    }
}
