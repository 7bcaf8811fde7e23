use std::path::{Path, PathBuf};
use std::sync::Arc;

use ignore::{DirEntry, WalkBuilder};

use super::gomod::{join_segments, GoModule};
use super::LoaderConfig;
use crate::error::LoadError;
use crate::languages::LanguageGrammar;

/// Directory names never descended into by a `/...` pattern.
const SKIPPED_DIRS: &[&str] = &["testdata", "vendor"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Dir(PathBuf),
    Import(String),
}

/// A command-line package pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub raw: String,
    pub target: Target,
    /// Trailing `/...`.
    pub recursive: bool,
}

/// A package directory matched by a pattern.
#[derive(Debug, Clone)]
pub struct PackageRoot {
    pub dir: PathBuf,
    pub import_path: String,
    pub module: Option<GoModule>,
}

impl Pattern {
    pub fn parse(raw: &str) -> Self {
        let (base, recursive) = match raw.strip_suffix("/...") {
            Some("") => ("/", true),
            Some(base) => (base, true),
            None => (raw, false),
        };
        let target = if base.starts_with('.') || Path::new(base).is_absolute() {
            Target::Dir(PathBuf::from(base))
        } else {
            Target::Import(base.to_string())
        };
        Self {
            raw: raw.to_string(),
            target,
            recursive,
        }
    }

    /// Package directories this pattern denotes, in directory order.
    pub fn resolve(
        &self,
        config: &LoaderConfig,
        module: Option<&GoModule>,
        walker: &PackageWalker,
    ) -> Result<Vec<PackageRoot>, LoadError> {
        let roots = match &self.target {
            Target::Dir(path) => self.resolve_dir(&config.working_dir.join(path), walker)?,
            Target::Import(path) => self.resolve_import(path, config, module, walker)?,
        };
        if roots.is_empty() {
            return Err(LoadError::NoMatches(self.raw.clone()));
        }
        Ok(roots)
    }

    fn resolve_dir(&self, dir: &Path, walker: &PackageWalker) -> Result<Vec<PackageRoot>, LoadError> {
        let dir = dir.canonicalize().map_err(|e| self.unresolved(e.to_string()))?;
        if !dir.is_dir() {
            return Err(self.unresolved("not a directory"));
        }
        let module = GoModule::find(&dir)?;
        let dirs = if self.recursive {
            walker.package_dirs(&dir)?
        } else {
            vec![dir]
        };

        Ok(dirs
            .into_iter()
            .map(|dir| PackageRoot {
                import_path: dir_import_path(&dir, module.as_ref()),
                dir,
                module: module.clone(),
            })
            .collect())
    }

    fn resolve_import(
        &self,
        path: &str,
        config: &LoaderConfig,
        module: Option<&GoModule>,
        walker: &PackageWalker,
    ) -> Result<Vec<PackageRoot>, LoadError> {
        let located = module
            .and_then(|module| {
                module
                    .dir_for(path)
                    .filter(|dir| dir.is_dir())
                    .or_else(|| Some(module.vendor_dir_for(path)).filter(|dir| dir.is_dir()))
                    .map(|dir| (dir, Some(module.clone())))
            })
            .or_else(|| {
                let goroot = config.goroot.as_ref()?;
                let dir = join_segments(&goroot.join("src"), path);
                dir.is_dir().then_some((dir, None))
            });

        let Some((dir, module)) = located else {
            return Err(self.unresolved("not in the main module, its vendor directory, or GOROOT"));
        };

        if !self.recursive {
            return Ok(vec![PackageRoot {
                dir,
                import_path: path.to_string(),
                module,
            }]);
        }

        Ok(walker
            .package_dirs(&dir)?
            .into_iter()
            .map(|sub| {
                let import_path = match sub.strip_prefix(&dir) {
                    Ok(relative) if relative.as_os_str().is_empty() => path.to_string(),
                    Ok(relative) => {
                        let relative: Vec<String> = relative
                            .components()
                            .map(|c| c.as_os_str().to_string_lossy().into_owned())
                            .collect();
                        format!("{}/{}", path, relative.join("/"))
                    }
                    Err(_) => path.to_string(),
                };
                PackageRoot {
                    dir: sub,
                    import_path,
                    module: module.clone(),
                }
            })
            .collect())
    }

    fn unresolved(&self, reason: impl Into<String>) -> LoadError {
        LoadError::UnresolvedPattern {
            pattern: self.raw.clone(),
            reason: reason.into(),
        }
    }
}

/// Import path of a directory: module-relative when inside a module, the
/// `_`-prefixed absolute path otherwise.
pub fn dir_import_path(dir: &Path, module: Option<&GoModule>) -> String {
    module
        .and_then(|module| module.import_path_for(dir))
        .unwrap_or_else(|| format!("_{}", dir.display()))
}

/// Finds package directories and their source files.
pub struct PackageWalker {
    grammar: Arc<dyn LanguageGrammar>,
}

impl PackageWalker {
    pub fn new(grammar: Arc<dyn LanguageGrammar>) -> Self {
        Self { grammar }
    }

    /// `root` and every directory below it holding at least one source file,
    /// sorted. Nested modules are not entered.
    pub fn package_dirs(&self, root: &Path) -> Result<Vec<PathBuf>, LoadError> {
        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(|entry| entry.depth() == 0 || !is_skipped(entry))
            .build();

        let mut dirs = Vec::new();
        for entry in walker {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type().is_some_and(|t| t.is_file()) && self.is_source_file(path) {
                if let Some(parent) = path.parent() {
                    dirs.push(parent.to_path_buf());
                }
            }
        }

        dirs.sort();
        dirs.dedup();
        Ok(dirs)
    }

    /// Source files directly inside `dir`, sorted by file name.
    pub fn source_files(&self, dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
        let walker = WalkBuilder::new(dir)
            .standard_filters(false)
            .max_depth(Some(1))
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type().is_some_and(|t| t.is_file()) && self.is_source_file(path) {
                files.push(path.to_path_buf());
            }
        }
        Ok(files)
    }

    pub fn is_source_file(&self, path: &Path) -> bool {
        let ignored_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with('.') || name.starts_with('_'));
        !ignored_name && self.grammar.is_source_file(path)
    }
}

fn is_skipped(entry: &DirEntry) -> bool {
    let Some(name) = entry.file_name().to_str() else {
        return true;
    };
    if name.starts_with('.') || name.starts_with('_') {
        return true;
    }
    let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
    is_dir && (SKIPPED_DIRS.contains(&name) || entry.path().join("go.mod").is_file())
}
