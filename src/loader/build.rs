//! Build constraints: `GOOS`/`GOARCH` file-name suffixes and `//go:build`
//! lines, with the legacy `// +build` form as a fallback.

use std::path::Path;

use crate::error::LoadError;

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips", "mipsle",
    "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le", "riscv",
    "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

/// Target platform and tags that decide which files belong to a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    pub goos: String,
    pub goarch: String,
    pub cgo: bool,
    /// Extra tags, as passed to `go build -tags`.
    pub tags: Vec<String>,
}

impl BuildContext {
    pub fn new(goos: impl Into<String>, goarch: impl Into<String>) -> Self {
        Self {
            goos: goos.into(),
            goarch: goarch.into(),
            cgo: false,
            tags: Vec::new(),
        }
    }

    /// The platform this binary runs on.
    pub fn host() -> Self {
        Self::new(host_os(), host_arch())
    }

    /// Host platform overridden by `GOOS`, `GOARCH` and `CGO_ENABLED`.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|value| !value.is_empty());
        let mut context = Self::host();
        if let Some(goos) = var("GOOS") {
            context.goos = goos;
        }
        if let Some(goarch) = var("GOARCH") {
            context.goarch = goarch;
        }
        context.cgo = var("CGO_ENABLED").is_some_and(|value| value == "1");
        context
    }

    pub fn with_cgo(mut self, cgo: bool) -> Self {
        self.cgo = cgo;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Whether a single build tag is satisfied. Every `go1.N` release tag is.
    pub fn matches_tag(&self, tag: &str) -> bool {
        let goos = self.goos.as_str();
        tag == goos
            || tag == self.goarch
            || tag == "gc"
            || (tag == "cgo" && self.cgo)
            || (tag == "unix" && UNIX_OS.contains(&goos))
            || (tag == "linux" && goos == "android")
            || (tag == "solaris" && goos == "illumos")
            || (tag == "darwin" && goos == "ios")
            || is_release_tag(tag)
            || self.tags.iter().any(|t| t == tag)
    }

    /// Applies the `_GOOS`, `_GOARCH` and `_GOOS_GOARCH` file-name suffixes
    /// (before an optional `_test`).
    pub fn matches_file_name(&self, name: &str) -> bool {
        let stem = name.split('.').next().unwrap_or(name);
        let Some(start) = stem.find('_') else {
            return true;
        };
        let mut parts: Vec<&str> = stem[start..].split('_').collect();
        if parts.last() == Some(&"test") {
            parts.pop();
        }

        let n = parts.len();
        if n >= 2 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
            return self.matches_tag(parts[n - 2]) && self.matches_tag(parts[n - 1]);
        }
        match parts.last() {
            Some(last) if KNOWN_OS.contains(last) || KNOWN_ARCH.contains(last) => {
                self.matches_tag(last)
            }
            _ => true,
        }
    }

    /// Evaluates the constraint lines in the file header. A `//go:build`
    /// line wins over `// +build` lines; without either the file matches.
    pub fn matches_source(&self, path: &Path, source: &str) -> Result<bool, LoadError> {
        let header = Header::scan(source);
        if let Some(expr) = header.go_build {
            return ExprParser::new(expr, self)
                .evaluate()
                .ok_or_else(|| {
                    LoadError::Parse(format!("{}: invalid //go:build line", path.display()))
                });
        }
        Ok(header
            .plus_build
            .iter()
            .all(|line| self.matches_plus_build(line)))
    }

    /// `// +build a,b c` means `(a && b) || c`.
    fn matches_plus_build(&self, line: &str) -> bool {
        line.split_whitespace().any(|option| {
            option.split(',').all(|term| match term.strip_prefix('!') {
                Some(tag) => !self.matches_tag(tag),
                None => self.matches_tag(term),
            })
        })
    }
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::host()
    }
}

fn is_release_tag(tag: &str) -> bool {
    tag.strip_prefix("go1.")
        .is_some_and(|minor| !minor.is_empty() && minor.chars().all(|c| c.is_ascii_digit()))
}

fn host_os() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

fn host_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "loongarch64" => "loong64",
        "powerpc64" if cfg!(target_endian = "little") => "ppc64le",
        "powerpc64" => "ppc64",
        "powerpc" => "ppc",
        "wasm32" => "wasm",
        other => other,
    }
}

/// Constraint lines found before the package clause.
#[derive(Debug, Default)]
struct Header<'s> {
    go_build: Option<&'s str>,
    plus_build: Vec<&'s str>,
}

impl<'s> Header<'s> {
    fn scan(source: &'s str) -> Self {
        let mut header = Self::default();
        let mut in_block = false;
        for line in source.lines() {
            let line = line.trim();
            if in_block {
                in_block = !line.contains("*/");
                continue;
            }
            if line.is_empty() {
                continue;
            }
            if line.starts_with("/*") {
                in_block = !line.contains("*/");
                continue;
            }
            let Some(comment) = line.strip_prefix("//") else {
                break;
            };
            if let Some(expr) = comment.strip_prefix("go:build") {
                if header.go_build.is_none() {
                    header.go_build = Some(expr.trim());
                }
            } else if let Some(expr) = comment.trim_start().strip_prefix("+build") {
                if expr.is_empty() || expr.starts_with(char::is_whitespace) {
                    header.plus_build.push(expr.trim());
                }
            }
        }
        header
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'s> {
    Tag(&'s str),
    Not,
    And,
    Or,
    Open,
    Close,
}

fn tokenize(expr: &str) -> Option<Vec<Token<'_>>> {
    let mut tokens = Vec::new();
    let mut rest = expr.trim_start();
    while !rest.is_empty() {
        let (token, len) = if rest.starts_with("&&") {
            (Token::And, 2)
        } else if rest.starts_with("||") {
            (Token::Or, 2)
        } else if rest.starts_with('!') {
            (Token::Not, 1)
        } else if rest.starts_with('(') {
            (Token::Open, 1)
        } else if rest.starts_with(')') {
            (Token::Close, 1)
        } else {
            let len = rest
                .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
                .unwrap_or(rest.len());
            if len == 0 {
                return None;
            }
            (Token::Tag(&rest[..len]), len)
        };
        tokens.push(token);
        rest = rest[len..].trim_start();
    }
    Some(tokens)
}

/// Recursive-descent evaluator for `//go:build` expressions:
/// `||` binds loosest, then `&&`, then `!`.
struct ExprParser<'s, 'c> {
    tokens: Option<Vec<Token<'s>>>,
    pos: usize,
    context: &'c BuildContext,
}

impl<'s, 'c> ExprParser<'s, 'c> {
    fn new(expr: &'s str, context: &'c BuildContext) -> Self {
        Self {
            tokens: tokenize(expr),
            pos: 0,
            context,
        }
    }

    fn evaluate(mut self) -> Option<bool> {
        let len = self.tokens.as_ref()?.len();
        if len == 0 {
            return None;
        }
        let value = self.or()?;
        (self.pos == len).then_some(value)
    }

    fn peek(&self) -> Option<Token<'s>> {
        self.tokens.as_ref()?.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token<'s>> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    fn or(&mut self) -> Option<bool> {
        let mut value = self.and()?;
        while self.peek() == Some(Token::Or) {
            self.pos += 1;
            let rhs = self.and()?;
            value = value || rhs;
        }
        Some(value)
    }

    fn and(&mut self) -> Option<bool> {
        let mut value = self.not()?;
        while self.peek() == Some(Token::And) {
            self.pos += 1;
            let rhs = self.not()?;
            value = value && rhs;
        }
        Some(value)
    }

    fn not(&mut self) -> Option<bool> {
        match self.next()? {
            Token::Not => self.not().map(|value| !value),
            Token::Open => {
                let value = self.or()?;
                (self.next()? == Token::Close).then_some(value)
            }
            Token::Tag(tag) => Some(self.context.matches_tag(tag)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linux() -> BuildContext {
        BuildContext::new("linux", "amd64")
    }

    fn matches(context: &BuildContext, source: &str) -> bool {
        context
            .matches_source(Path::new("x.go"), source)
            .unwrap()
    }

    #[test]
    fn test_file_name_suffixes() {
        let context = linux();
        assert!(context.matches_file_name("errors.go"));
        assert!(context.matches_file_name("errs_linux.go"));
        assert!(!context.matches_file_name("errs_windows.go"));
        assert!(context.matches_file_name("errs_amd64.go"));
        assert!(!context.matches_file_name("errs_arm64.go"));
        assert!(context.matches_file_name("errs_linux_amd64.go"));
        assert!(!context.matches_file_name("errs_linux_arm64.go"));
        assert!(!context.matches_file_name("errs_windows_test.go"));
        assert!(context.matches_file_name("linux.go"));
        assert!(context.matches_file_name("errs_unix.go"));
        assert!(context.matches_file_name("syscall_other.go"));
    }

    #[test]
    fn test_platform_aliases() {
        let android = BuildContext::new("android", "arm64");
        assert!(android.matches_file_name("errs_linux.go"));
        assert!(android.matches_tag("unix"));
        assert!(!BuildContext::new("windows", "amd64").matches_tag("unix"));
        assert!(BuildContext::new("ios", "arm64").matches_tag("darwin"));
    }

    #[test]
    fn test_go_build_expressions() {
        let context = linux();
        assert!(matches(&context, "//go:build linux\n\npackage p\n"));
        assert!(!matches(&context, "//go:build windows\n\npackage p\n"));
        assert!(matches(&context, "//go:build !windows && (amd64 || arm64)\n\npackage p\n"));
        assert!(!matches(&context, "//go:build linux && !amd64\n\npackage p\n"));
        assert!(matches(&context, "//go:build go1.21 && unix\n\npackage p\n"));
        assert!(!matches(&context, "//go:build ignore\n\npackage main\n"));
        assert!(!matches(&context, "//go:build cgo\n\npackage p\n"));
        assert!(matches(&context.clone().with_cgo(true), "//go:build cgo\n\npackage p\n"));
        assert!(matches(&context.with_tags(["integration"]), "//go:build integration\n\npackage p\n"));
    }

    #[test]
    fn test_header_only() {
        let context = linux();
        assert!(matches(&context, "package p\n\n//go:build windows\n"));
        assert!(!matches(
            &context,
            "// Copyright notice.\n\n/* block\ncomment */\n\n//go:build windows\n\npackage p\n"
        ));
    }

    #[test]
    fn test_legacy_plus_build_lines() {
        let context = linux();
        assert!(!matches(&context, "// +build ignore\n\npackage main\n"));
        assert!(matches(&context, "// +build windows linux\n\npackage p\n"));
        assert!(!matches(&context, "// +build linux,arm64\n\npackage p\n"));
        assert!(!matches(&context, "// +build linux\n// +build !amd64\n\npackage p\n"));
        assert!(matches(&context, "// +build !windows\n\npackage p\n"));
        assert!(matches(
            &context,
            "//go:build linux\n// +build windows\n\npackage p\n"
        ));
    }

    #[test]
    fn test_invalid_expression() {
        let result = linux().matches_source(Path::new("bad.go"), "//go:build linux &&\n\npackage p\n");
        assert!(matches!(result, Err(LoadError::Parse(_))));
        let result = linux().matches_source(Path::new("bad.go"), "//go:build (linux\n\npackage p\n");
        assert!(matches!(result, Err(LoadError::Parse(_))));
    }
}
