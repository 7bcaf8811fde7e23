//! Resolves package patterns to directories, parses their Go files and
//! type-checks them together with their dependencies.

pub mod build;
pub mod gomod;
pub mod pattern;
pub mod stubs;

pub use build::BuildContext;
pub use gomod::{GoModule, Requirement};
pub use pattern::{PackageRoot, PackageWalker, Pattern};

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;

use crate::error::LoadError;
use crate::syntax::{lower_file, File, ParsedFile, Parser};
use gomod::join_segments;
use crate::types::{Checker, TypeInfo};

/// Imports that never name a loadable package.
const PSEUDO_PACKAGES: &[&str] = &["C", "unsafe"];

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Directory patterns are relative to this, and the enclosing module is
    /// looked up from it.
    pub working_dir: PathBuf,
    /// Standard-library sources, for import-path patterns and imports
    /// outside the module.
    pub goroot: Option<PathBuf>,
    /// Module cache (`GOMODCACHE`) holding the modules `go.mod` requires.
    pub gomodcache: Option<PathBuf>,
    /// Target platform and tags for build constraints.
    pub build: BuildContext,
    /// Load files constrained by `//go:build ignore`.
    pub include_build_ignored: bool,
}

impl LoaderConfig {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            goroot: None,
            gomodcache: None,
            build: BuildContext::host(),
            include_build_ignored: false,
        }
    }

    /// Current directory plus `GOROOT`, `GOMODCACHE` (or `GOPATH`), `GOOS`,
    /// `GOARCH` and `CGO_ENABLED` from the environment.
    pub fn from_env() -> Result<Self, LoadError> {
        let working_dir = std::env::current_dir().map_err(|e| LoadError::io(".", e))?;
        let var = |name: &str| std::env::var_os(name).filter(|value| !value.is_empty());

        let goroot = var("GOROOT").map(PathBuf::from);
        let gomodcache = var("GOMODCACHE").map(PathBuf::from).or_else(|| {
            let gopath = var("GOPATH")
                .and_then(|paths| std::env::split_paths(&paths).next())
                .or_else(|| var("HOME").map(|home| PathBuf::from(home).join("go")))?;
            Some(gopath.join("pkg").join("mod"))
        });

        Ok(Self {
            working_dir,
            goroot,
            gomodcache,
            build: BuildContext::from_env(),
            include_build_ignored: false,
        })
    }

    pub fn with_goroot(mut self, goroot: impl Into<PathBuf>) -> Self {
        self.goroot = Some(goroot.into());
        self
    }

    pub fn with_gomodcache(mut self, gomodcache: impl Into<PathBuf>) -> Self {
        self.gomodcache = Some(gomodcache.into());
        self
    }

    pub fn with_build(mut self, build: BuildContext) -> Self {
        self.build = build;
        self
    }

    pub fn with_build_ignored(mut self, include: bool) -> Self {
        self.include_build_ignored = include;
        self
    }
}

/// A loaded and type-checked package.
#[derive(Debug)]
pub struct Package {
    pub import_path: String,
    pub name: String,
    pub dir: PathBuf,
    pub files: Vec<File>,
    pub info: Arc<TypeInfo>,
}

pub struct Loader {
    config: LoaderConfig,
    /// `config.build`, plus the `ignore` tag when build-ignored files load.
    build: BuildContext,
    parser: Parser,
    walker: PackageWalker,
    module: Option<GoModule>,
    cache: HashMap<String, Arc<Package>>,
    stubs: HashMap<String, Arc<TypeInfo>>,
    /// Imports that could not be loaded, so they are reported once.
    unresolved: HashSet<String>,
    /// Import paths currently being loaded, outermost first.
    loading: Vec<String>,
}

impl Loader {
    pub fn new(mut config: LoaderConfig) -> Result<Self, LoadError> {
        config.working_dir = config
            .working_dir
            .canonicalize()
            .map_err(|e| LoadError::io(&config.working_dir, e))?;
        let module = GoModule::find(&config.working_dir)?;
        if let Some(module) = &module {
            tracing::debug!("Main module {} at {}", module.path, module.root.display());
        }

        let mut build = config.build.clone();
        if config.include_build_ignored {
            build.tags.push("ignore".to_string());
        }

        let parser = Parser::new();
        let walker = PackageWalker::new(Arc::clone(parser.grammar()));

        Ok(Self {
            config,
            build,
            parser,
            walker,
            module,
            cache: HashMap::new(),
            stubs: HashMap::new(),
            unresolved: HashSet::new(),
            loading: Vec::new(),
        })
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn module(&self) -> Option<&GoModule> {
        self.module.as_ref()
    }

    /// Loads every package matched by `patterns`, in pattern order. A package
    /// matched more than once is returned once per match. Directories under
    /// a `/...` pattern whose files are all excluded by build constraints are
    /// skipped.
    pub fn load(&mut self, patterns: &[String]) -> Result<Vec<Arc<Package>>, LoadError> {
        let mut packages = Vec::new();
        for raw in patterns {
            let pattern = Pattern::parse(raw);
            let roots = pattern.resolve(&self.config, self.module.as_ref(), &self.walker)?;
            let before = packages.len();
            for root in roots {
                match self.load_dir(&root.dir, &root.import_path, root.module.as_ref()) {
                    Ok(package) => packages.push(package),
                    Err(LoadError::NoGoFiles(dir)) if pattern.recursive => {
                        tracing::debug!("Build constraints exclude all Go files in {}", dir.display());
                    }
                    Err(e) => return Err(e),
                }
            }
            if packages.len() == before {
                return Err(LoadError::NoMatches(raw.clone()));
            }
        }

        tracing::info!(
            "Loaded {} packages ({} distinct, {} stdlib stubs)",
            packages.len(),
            self.cache.len(),
            self.stubs.len()
        );
        Ok(packages)
    }

    fn load_dir(
        &mut self,
        dir: &Path,
        import_path: &str,
        module: Option<&GoModule>,
    ) -> Result<Arc<Package>, LoadError> {
        if let Some(package) = self.cache.get(import_path) {
            return Ok(Arc::clone(package));
        }
        if let Some(start) = self.loading.iter().position(|p| p == import_path) {
            let mut chain = self.loading[start..].to_vec();
            chain.push(import_path.to_string());
            return Err(LoadError::ImportCycle(chain.join(" -> ")));
        }

        self.loading.push(import_path.to_string());
        let result = self.load_uncached(dir, import_path, module);
        self.loading.pop();

        let package = Arc::new(result?);
        self.cache
            .insert(import_path.to_string(), Arc::clone(&package));
        Ok(package)
    }

    fn load_uncached(
        &mut self,
        dir: &Path,
        import_path: &str,
        module: Option<&GoModule>,
    ) -> Result<Package, LoadError> {
        let build = &self.build;
        let paths: Vec<PathBuf> = self
            .walker
            .source_files(dir)?
            .into_iter()
            .filter(|path| {
                let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
                let keep = build.matches_file_name(name);
                if !keep {
                    tracing::debug!("Skipping {} for {}/{}", path.display(), build.goos, build.goarch);
                }
                keep
            })
            .collect();

        let parser = &self.parser;
        let parsed: Vec<ParsedFile> = paths
            .par_iter()
            .map(|path| parser.parse_file(path))
            .collect::<Result<Vec<_>, _>>()?;

        let mut kept = Vec::with_capacity(parsed.len());
        for file in parsed {
            if build.matches_source(&file.path, &file.source)? {
                kept.push(file);
            } else {
                tracing::debug!("Skipping {}: build constraints not satisfied", file.path.display());
            }
        }

        let mut files = Vec::with_capacity(kept.len());
        for file in &kept {
            file.check_syntax()?;
            let lowered = lower_file(file, files.len())?;
            if !build.cgo && lowered.imports().any(|import| import.path == "C") {
                tracing::debug!("Skipping cgo file {}", file.path.display());
                continue;
            }
            files.push(lowered);
        }

        let Some(first) = files.first() else {
            return Err(LoadError::NoGoFiles(dir.to_path_buf()));
        };
        let name = first.package.name.clone();
        if let Some(other) = files.iter().find(|file| file.package.name != name) {
            return Err(LoadError::MixedPackages {
                dir: dir.to_path_buf(),
                first: name,
                second: other.package.name.clone(),
            });
        }

        let import_paths: BTreeSet<String> = files
            .iter()
            .flat_map(|file| file.imports().map(|import| import.path.clone()))
            .collect();

        let mut imports = HashMap::new();
        for path in import_paths {
            if let Some(info) = self.resolve_import(&path, module)? {
                imports.insert(path, info);
            }
        }

        let info = Checker::new(import_path, &files, &imports).check();
        tracing::debug!(
            "Loaded package {} ({} files, {} imports)",
            import_path,
            files.len(),
            imports.len()
        );

        Ok(Package {
            import_path: import_path.to_string(),
            name,
            dir: dir.to_path_buf(),
            files,
            info: Arc::new(info),
        })
    }

    /// Type information for an imported package, tried in order: the
    /// importing module and its `vendor` tree, modules required by
    /// `go.mod` in the module cache, `$GOROOT/src`, then the built-in
    /// standard-library stubs. Anything else stays opaque.
    ///
    /// Failures inside the module are fatal. A module-cache or GOROOT
    /// package that fails to load falls back to the stubs, except for
    /// import cycles.
    fn resolve_import(
        &mut self,
        path: &str,
        module: Option<&GoModule>,
    ) -> Result<Option<Arc<TypeInfo>>, LoadError> {
        if PSEUDO_PACKAGES.contains(&path) {
            return Ok(None);
        }
        if let Some(package) = self.cache.get(path) {
            return Ok(Some(Arc::clone(&package.info)));
        }

        if let Some(module) = module {
            let local = module.dir_for(path).filter(|dir| dir.is_dir());
            let vendored = Some(module.vendor_dir_for(path)).filter(|dir| dir.is_dir());
            if let Some(dir) = local.or(vendored) {
                let package = self.load_dir(&dir, path, Some(module))?;
                return Ok(Some(Arc::clone(&package.info)));
            }
        }

        if !self.unresolved.contains(path) {
            if let Some((dependency, dir)) = self.required_module_dir(path, module) {
                if let Some(info) = self.load_dependency(&dir, path, Some(&dependency))? {
                    return Ok(Some(info));
                }
            } else if let Some(dir) = self.goroot_dir(path) {
                if let Some(info) = self.load_dependency(&dir, path, None)? {
                    return Ok(Some(info));
                }
            }
        }

        if let Some(info) = self.load_stub(path)? {
            return Ok(Some(info));
        }

        if self.unresolved.insert(path.to_string()) {
            tracing::warn!("Import {} is not loaded; its declarations stay opaque", path);
        }
        Ok(None)
    }

    fn load_dependency(
        &mut self,
        dir: &Path,
        path: &str,
        module: Option<&GoModule>,
    ) -> Result<Option<Arc<TypeInfo>>, LoadError> {
        match self.load_dir(dir, path, module) {
            Ok(package) => Ok(Some(Arc::clone(&package.info))),
            Err(e @ LoadError::ImportCycle(_)) => Err(e),
            Err(e) => {
                tracing::warn!("Failed to load dependency {}: {}", path, e);
                self.unresolved.insert(path.to_string());
                Ok(None)
            }
        }
    }

    /// Directory of `path` inside a module required by the importing
    /// module or the main module, located in the module cache.
    fn required_module_dir(
        &self,
        path: &str,
        module: Option<&GoModule>,
    ) -> Option<(GoModule, PathBuf)> {
        let modcache = self.config.gomodcache.as_ref()?;
        let requirement = module
            .into_iter()
            .chain(self.module.as_ref())
            .flat_map(|m| m.requires.iter())
            .filter(|r| r.provides(path))
            .max_by_key(|r| r.path.len())?;

        let root = requirement.cache_dir(modcache);
        let relative = path[requirement.path.len()..].trim_start_matches('/');
        let dir = join_segments(&root, relative);
        if !dir.is_dir() {
            return None;
        }
        Some((GoModule::dependency(&requirement.path, root), dir))
    }

    /// `$GOROOT/src/<path>`, or `$GOROOT/src/vendor/<path>` for the
    /// non-standard packages the standard library vendors.
    fn goroot_dir(&self, path: &str) -> Option<PathBuf> {
        let src = self.config.goroot.as_ref()?.join("src");
        let first = path.split('/').next().unwrap_or(path);
        let dir = if first.contains('.') {
            join_segments(&src.join("vendor"), path)
        } else {
            join_segments(&src, path)
        };
        dir.is_dir().then_some(dir)
    }

    fn load_stub(&mut self, path: &str) -> Result<Option<Arc<TypeInfo>>, LoadError> {
        if let Some(info) = self.stubs.get(path) {
            return Ok(Some(Arc::clone(info)));
        }
        let Some(source) = stubs::source(path) else {
            return Ok(None);
        };

        let file_path = PathBuf::from(format!("<stdlib>/{}.go", path));
        let parsed = self.parser.parse_source(source, &file_path)?;
        parsed.check_syntax()?;
        let file = lower_file(&parsed, 0)?;

        let mut imports = HashMap::new();
        for import in file.imports() {
            if let Some(info) = self.load_stub(&import.path)? {
                imports.insert(import.path.clone(), info);
            }
        }

        let info = Arc::new(Checker::new(path, std::slice::from_ref(&file), &imports).check());
        self.stubs.insert(path.to_string(), Arc::clone(&info));
        Ok(Some(info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ErrorContract, Type};
    use std::fs;
    use tempfile::TempDir;

    fn create_file(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn module_dir() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "go.mod", "module example.com/shop\n\ngo 1.22\n");
        temp_dir
    }

    fn loader(dir: &Path) -> Loader {
        Loader::new(LoaderConfig::new(dir)).unwrap()
    }

    fn patterns(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|p| p.to_string()).collect()
    }

    fn value_type(package: &Package, name: &str) -> String {
        package
            .info
            .lookup_value(name)
            .map(Type::to_string)
            .unwrap_or_default()
    }

    #[test]
    fn test_load_package_in_module() {
        let temp_dir = module_dir();
        create_file(
            temp_dir.path(),
            "cart/cart.go",
            "package cart\n\nimport \"errors\"\n\nvar ErrEmpty = errors.New(\"empty cart\")\n",
        );
        create_file(
            temp_dir.path(),
            "cart/cart_test.go",
            "package cart\n\nvar ErrOnlyInTests = 1\n",
        );

        let packages = loader(temp_dir.path()).load(&patterns(&["./cart"])).unwrap();
        assert_eq!(packages.len(), 1);
        let cart = &packages[0];
        assert_eq!(cart.import_path, "example.com/shop/cart");
        assert_eq!(cart.name, "cart");
        assert_eq!(cart.files.len(), 1);
        assert_eq!(value_type(cart, "ErrEmpty"), "error");
        assert!(cart.info.lookup_value("ErrOnlyInTests").is_none());
    }

    #[test]
    fn test_duplicate_roots_share_package() {
        let temp_dir = module_dir();
        create_file(temp_dir.path(), "cart/cart.go", "package cart\n");

        let packages = loader(temp_dir.path())
            .load(&patterns(&["./cart", "example.com/shop/cart"]))
            .unwrap();
        assert_eq!(packages.len(), 2);
        assert!(Arc::ptr_eq(&packages[0], &packages[1]));
    }

    #[test]
    fn test_module_dependency_is_checked() {
        let temp_dir = module_dir();
        create_file(
            temp_dir.path(),
            "apierr/apierr.go",
            "package apierr\n\ntype Status struct{ Code int }\n\nfunc (s *Status) Error() string { return \"\" }\n",
        );
        create_file(
            temp_dir.path(),
            "api/api.go",
            "package api\n\nimport \"example.com/shop/apierr\"\n\nvar ErrTeapot = &apierr.Status{Code: 418}\n",
        );

        let packages = loader(temp_dir.path()).load(&patterns(&["./api"])).unwrap();
        let api = &packages[0];
        let ty = api.info.lookup_value("ErrTeapot").unwrap();
        assert_eq!(ty.to_string(), "*example.com/shop/apierr.Status");
        assert!(api.info.implements(ty, &ErrorContract::universe()));
    }

    #[test]
    fn test_vendored_dependency() {
        let temp_dir = module_dir();
        create_file(
            temp_dir.path(),
            "vendor/github.com/acme/oops/oops.go",
            "package oops\n\nimport \"errors\"\n\nvar ErrOops = errors.New(\"oops\")\n",
        );
        create_file(
            temp_dir.path(),
            "shop.go",
            "package shop\n\nimport \"github.com/acme/oops\"\n\nvar ErrAgain = oops.ErrOops\n",
        );

        let packages = loader(temp_dir.path()).load(&patterns(&["."])).unwrap();
        assert_eq!(value_type(&packages[0], "ErrAgain"), "error");
    }

    #[test]
    fn test_stdlib_stubs_and_opaque_imports() {
        let temp_dir = module_dir();
        create_file(
            temp_dir.path(),
            "shop.go",
            "package shop\n\nimport (\n\t\"io\"\n\t\"os\"\n\t\"github.com/unknown/dep\"\n)\n\nvar ErrEOF = io.EOF\nvar ErrPath = &os.PathError{}\nvar ErrRemote = dep.ErrRemote\n",
        );

        let packages = loader(temp_dir.path()).load(&patterns(&["."])).unwrap();
        let shop = &packages[0];
        assert_eq!(value_type(shop, "ErrEOF"), "error");
        assert_eq!(value_type(shop, "ErrPath"), "*io/fs.PathError");
        assert_eq!(value_type(shop, "ErrRemote"), "invalid type");
    }

    #[test]
    fn test_every_stub_checks_cleanly() {
        let temp_dir = module_dir();
        let mut loader = loader(temp_dir.path());
        for path in stubs::import_paths() {
            let info = loader.load_stub(path).unwrap().unwrap();
            assert_eq!(info.path(), path);
        }
        let os = loader.load_stub("os").unwrap().unwrap();
        assert_eq!(os.lookup_value("ErrNotExist").unwrap().to_string(), "error");
    }

    #[test]
    fn test_build_ignored_files() {
        let temp_dir = module_dir();
        create_file(temp_dir.path(), "gen/gen.go", "package gen\n\nvar Kept = 1\n");
        create_file(
            temp_dir.path(),
            "gen/tool.go",
            "//go:build ignore\n\npackage main\n\nvar Dropped = 1\n",
        );

        let packages = loader(temp_dir.path()).load(&patterns(&["./gen"])).unwrap();
        assert_eq!(packages[0].files.len(), 1);

        let config = LoaderConfig::new(temp_dir.path()).with_build_ignored(true);
        let result = Loader::new(config).unwrap().load(&patterns(&["./gen"]));
        assert!(matches!(result, Err(LoadError::MixedPackages { .. })));
    }

    #[test]
    fn test_syntax_error_is_fatal() {
        let temp_dir = module_dir();
        create_file(temp_dir.path(), "bad/bad.go", "package bad\n\nvar = \n");

        let result = loader(temp_dir.path()).load(&patterns(&["./bad"]));
        match result {
            Err(LoadError::Syntax { file, line, .. }) => {
                assert!(file.ends_with("bad.go"));
                assert_eq!(line, 3);
            }
            other => panic!("expected syntax error, got {:?}", other.map(|p| p.len())),
        }
    }

    #[test]
    fn test_no_go_files() {
        let temp_dir = module_dir();
        create_file(temp_dir.path(), "docs/README.md", "# docs\n");

        let result = loader(temp_dir.path()).load(&patterns(&["./docs"]));
        assert!(matches!(result, Err(LoadError::NoGoFiles(_))));
    }

    #[test]
    fn test_import_cycle() {
        let temp_dir = module_dir();
        create_file(
            temp_dir.path(),
            "a/a.go",
            "package a\n\nimport \"example.com/shop/b\"\n\nvar X = b.Y\n",
        );
        create_file(
            temp_dir.path(),
            "b/b.go",
            "package b\n\nimport \"example.com/shop/a\"\n\nvar Y = a.X\n",
        );

        let result = loader(temp_dir.path()).load(&patterns(&["./a"]));
        match result {
            Err(LoadError::ImportCycle(chain)) => {
                assert_eq!(
                    chain,
                    "example.com/shop/a -> example.com/shop/b -> example.com/shop/a"
                );
            }
            other => panic!("expected import cycle, got {:?}", other.map(|p| p.len())),
        }
    }

    #[test]
    fn test_recursive_pattern_orders_packages() {
        let temp_dir = module_dir();
        create_file(temp_dir.path(), "shop.go", "package shop\n");
        create_file(temp_dir.path(), "zoo/zoo.go", "package zoo\n");
        create_file(temp_dir.path(), "cart/cart.go", "package cart\n");
        create_file(temp_dir.path(), "testdata/fixture.go", "package fixture\n");

        let packages = loader(temp_dir.path()).load(&patterns(&["./..."])).unwrap();
        let paths: Vec<_> = packages.iter().map(|p| p.import_path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["example.com/shop", "example.com/shop/cart", "example.com/shop/zoo"]
        );
    }

    #[test]
    fn test_package_outside_module() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "loose/loose.go", "package loose\n");
        let mut loader = loader(temp_dir.path());
        if loader.module().is_some() {
            // The temporary directory sits inside some enclosing module.
            return;
        }
        let packages = loader.load(&patterns(&["./loose"])).unwrap();
        let expected = format!(
            "_{}",
            temp_dir.path().canonicalize().unwrap().join("loose").display()
        );
        assert_eq!(packages[0].import_path, expected);
    }

    fn linux_loader(dir: &Path) -> Loader {
        let config = LoaderConfig::new(dir).with_build(BuildContext::new("linux", "amd64"));
        Loader::new(config).unwrap()
    }

    #[test]
    fn test_platform_files_are_filtered() {
        let temp_dir = module_dir();
        create_file(
            temp_dir.path(),
            "p/errs_linux.go",
            "package p\n\nimport \"errors\"\n\nvar errPlatform = errors.New(\"linux\")\n",
        );
        create_file(
            temp_dir.path(),
            "p/errs_windows.go",
            "package p\n\nimport \"errors\"\n\nvar errPlatform = errors.New(\"windows\")\n",
        );
        create_file(
            temp_dir.path(),
            "p/tagged_unix.go",
            "//go:build unix && !arm64\n\npackage p\n\nvar unixOnly = 1\n",
        );
        create_file(
            temp_dir.path(),
            "p/tagged_other.go",
            "// +build windows plan9\n\npackage p\n\nvar unixOnly = 2\n",
        );

        let packages = linux_loader(temp_dir.path()).load(&patterns(&["./p"])).unwrap();
        let names: Vec<_> = packages[0]
            .files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["errs_linux.go", "tagged_unix.go"]);

        let config = LoaderConfig::new(temp_dir.path())
            .with_build(BuildContext::new("windows", "amd64"));
        let packages = Loader::new(config).unwrap().load(&patterns(&["./p"])).unwrap();
        let names: Vec<_> = packages[0]
            .files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["errs_windows.go", "tagged_other.go"]);
    }

    #[test]
    fn test_cgo_files_need_cgo() {
        let temp_dir = module_dir();
        create_file(temp_dir.path(), "c/pure.go", "package c\n\nvar Pure = 1\n");
        create_file(
            temp_dir.path(),
            "c/native.go",
            "package c\n\nimport \"C\"\n\nvar Native = 1\n",
        );

        let packages = linux_loader(temp_dir.path()).load(&patterns(&["./c"])).unwrap();
        assert_eq!(packages[0].files.len(), 1);
        assert!(packages[0].info.lookup_value("Native").is_none());

        let config = LoaderConfig::new(temp_dir.path())
            .with_build(BuildContext::new("linux", "amd64").with_cgo(true));
        let packages = Loader::new(config).unwrap().load(&patterns(&["./c"])).unwrap();
        assert_eq!(packages[0].files.len(), 2);
    }

    #[test]
    fn test_recursive_pattern_skips_excluded_dirs() {
        let temp_dir = module_dir();
        create_file(temp_dir.path(), "cart/cart.go", "package cart\n");
        create_file(temp_dir.path(), "win/win_windows.go", "package win\n");

        let packages = linux_loader(temp_dir.path()).load(&patterns(&["./..."])).unwrap();
        let paths: Vec<_> = packages.iter().map(|p| p.import_path.as_str()).collect();
        assert_eq!(paths, vec!["example.com/shop/cart"]);

        let result = linux_loader(temp_dir.path()).load(&patterns(&["./win"]));
        assert!(matches!(result, Err(LoadError::NoGoFiles(_))));
    }

    #[test]
    fn test_goroot_imports_load_from_source() {
        let temp_dir = module_dir();
        let goroot = TempDir::new().unwrap();
        create_file(
            goroot.path(),
            "src/path/filepath/match.go",
            "package filepath\n\nimport \"errors\"\n\nvar ErrBadPattern = errors.New(\"syntax error in pattern\")\n",
        );
        create_file(
            goroot.path(),
            "src/path/filepath/path_windows.go",
            "package filepath\n\nvar ErrWindowsOnly = 1\n",
        );
        create_file(
            goroot.path(),
            "src/vendor/golang.org/x/text/text.go",
            "package text\n\ntype Err struct{}\n\nfunc (Err) Error() string { return \"\" }\n",
        );
        create_file(
            temp_dir.path(),
            "shop.go",
            "package shop\n\nimport (\n\t\"path/filepath\"\n\t\"golang.org/x/text\"\n)\n\nvar ErrBadPattern = filepath.ErrBadPattern\nvar ErrText = text.Err{}\n",
        );

        let config = LoaderConfig::new(temp_dir.path())
            .with_goroot(goroot.path())
            .with_build(BuildContext::new("linux", "amd64"));
        let packages = Loader::new(config).unwrap().load(&patterns(&["."])).unwrap();
        let shop = &packages[0];
        assert_eq!(value_type(shop, "ErrBadPattern"), "error");
        assert_eq!(value_type(shop, "ErrText"), "golang.org/x/text.Err");

        let filepath = shop.info.import("path/filepath").unwrap();
        assert!(filepath.lookup_value("ErrWindowsOnly").is_none());
    }

    #[test]
    fn test_broken_goroot_package_falls_back_to_stub() {
        let temp_dir = module_dir();
        let goroot = TempDir::new().unwrap();
        create_file(goroot.path(), "src/io/io.go", "package io\n\nvar EOF = \n");
        create_file(
            temp_dir.path(),
            "shop.go",
            "package shop\n\nimport \"io\"\n\nvar ErrEOF = io.EOF\n",
        );

        let config = LoaderConfig::new(temp_dir.path()).with_goroot(goroot.path());
        let packages = Loader::new(config).unwrap().load(&patterns(&["."])).unwrap();
        assert_eq!(value_type(&packages[0], "ErrEOF"), "error");
    }

    #[test]
    fn test_required_modules_load_from_module_cache() {
        let temp_dir = TempDir::new().unwrap();
        create_file(
            temp_dir.path(),
            "go.mod",
            "module example.com/shop\n\ngo 1.22\n\nrequire github.com/Acme/errs v1.2.0\n",
        );
        let modcache = TempDir::new().unwrap();
        create_file(
            modcache.path(),
            "github.com/!acme/errs@v1.2.0/go.mod",
            "module github.com/Acme/errs\n",
        );
        create_file(
            modcache.path(),
            "github.com/!acme/errs@v1.2.0/errs.go",
            "package errs\n\nimport \"github.com/Acme/errs/codes\"\n\nfunc New(message string) error\n\ntype Coded struct{ Code codes.Code }\n\nfunc (Coded) Error() string { return \"\" }\n",
        );
        create_file(
            modcache.path(),
            "github.com/!acme/errs@v1.2.0/codes/codes.go",
            "package codes\n\ntype Code int\n",
        );
        create_file(
            temp_dir.path(),
            "shop.go",
            "package shop\n\nimport \"github.com/Acme/errs\"\n\nvar ErrShop = errs.New(\"shop\")\nvar ErrCoded = errs.Coded{}\n",
        );

        let config = LoaderConfig::new(temp_dir.path()).with_gomodcache(modcache.path());
        let packages = Loader::new(config).unwrap().load(&patterns(&["."])).unwrap();
        let shop = &packages[0];
        assert_eq!(value_type(shop, "ErrShop"), "error");
        assert_eq!(value_type(shop, "ErrCoded"), "github.com/Acme/errs.Coded");
        let ty = shop.info.lookup_value("ErrCoded").unwrap();
        assert!(shop.info.implements(ty, &ErrorContract::universe()));
    }
}
