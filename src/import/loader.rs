//! Reads the Go files of one package directory the way `go build` selects
//! them.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use go_surface_syntax::{parse_source, ParseFailure, ParseOptions, ParsedFile};

use crate::config::Config;

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux", "nacl", "netbsd",
    "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux", "netbsd", "openbsd",
    "solaris",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips", "mipsle", "mips64",
    "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le", "riscv", "riscv64", "s390", "s390x",
    "sparc", "sparc64", "wasm",
];

/// Target platform and file selection for package loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    pub goos: String,
    pub goarch: String,
    pub include_tests: bool,
}

impl BuildContext {
    pub fn new(goos: impl Into<String>, goarch: impl Into<String>) -> Self {
        Self {
            goos: goos.into(),
            goarch: goarch.into(),
            include_tests: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            include_tests: config.include_tests,
            ..Self::new(config.goos.clone(), config.goarch.clone())
        }
    }

    pub fn without_tests(mut self) -> Self {
        self.include_tests = false;
        self
    }

    fn os_matches(&self, os: &str) -> bool {
        os == self.goos
            || (os == "linux" && self.goos == "android")
            || (os == "solaris" && self.goos == "illumos")
            || (os == "darwin" && self.goos == "ios")
    }

    fn tag(&self, name: &str) -> bool {
        match name {
            "gc" => true,
            "unix" => UNIX_OS.contains(&self.goos.as_str()),
            _ if name == self.goarch => true,
            _ if KNOWN_OS.contains(&name) => self.os_matches(name),
            _ => name
                .strip_prefix("go1.")
                .is_some_and(|minor| minor.parse::<u32>().is_ok()),
        }
    }

    /// Whether a file name passes the `_test`, `_GOOS` and `_GOARCH` rules.
    pub fn matches_file_name(&self, name: &str) -> bool {
        let Some(stem) = name.strip_suffix(".go") else {
            return false;
        };
        if name.starts_with('_') || name.starts_with('.') {
            return false;
        }
        let stem = match stem.strip_suffix("_test") {
            Some(stem) if self.include_tests => stem,
            Some(_) => return false,
            None => stem,
        };

        // everything before the first underscore is free-form
        let Some(i) = stem.find('_') else {
            return true;
        };
        let parts: Vec<&str> = stem[i..].split('_').collect();
        let n = parts.len();
        if n >= 2 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
            return self.os_matches(parts[n - 2]) && parts[n - 1] == self.goarch;
        }
        let last = parts[n - 1];
        if KNOWN_OS.contains(&last) {
            return self.os_matches(last);
        }
        if KNOWN_ARCH.contains(&last) {
            return last == self.goarch;
        }
        true
    }

    /// Evaluates the `//go:build` line of a file header, if any.
    pub fn matches_constraint(&self, source: &str) -> bool {
        match build_expression(source) {
            Some(expr) => match Constraint::parse(expr) {
                Some(constraint) => constraint.eval(&|tag| self.tag(tag)),
                None => {
                    tracing::debug!(expr, "unparsable build constraint");
                    false
                }
            },
            None => true,
        }
    }
}

/// The files of one package, parsed.
#[derive(Debug)]
pub struct LoadedPackage {
    pub dir: PathBuf,
    pub name: String,
    pub files: Vec<ParsedFile>,
    pub errors: Vec<ParseFailure>,
}

impl LoadedPackage {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.errors.is_empty()
    }

    pub fn file_refs(&self) -> Vec<&ParsedFile> {
        self.files.iter().collect()
    }
}

/// Go files of `dir` selected for `ctx`, in lexical order.
pub fn go_files(dir: &Path, ctx: &BuildContext) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if ctx.matches_file_name(name) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Parses the package in `dir`.
///
/// External test packages (`package foo_test`) and files declaring a
/// different package than the first one are left out. Parse failures are
/// collected, not returned.
pub fn load_package(dir: &Path, ctx: &BuildContext) -> io::Result<LoadedPackage> {
    let mut package = LoadedPackage {
        dir: dir.to_owned(),
        name: String::new(),
        files: Vec::new(),
        errors: Vec::new(),
    };

    for path in go_files(dir, ctx)? {
        let source = fs::read_to_string(&path)?;
        if !ctx.matches_constraint(&source) {
            tracing::trace!(path = %path.display(), "excluded by build constraint");
            continue;
        }
        let parsed = match parse_source(path.to_string_lossy(), source, ParseOptions { comments: false }) {
            Ok(parsed) => parsed,
            Err(failure) => {
                package.errors.push(failure);
                continue;
            }
        };

        let name = parsed.package_name();
        if name.ends_with("_test") {
            continue;
        }
        if package.name.is_empty() {
            package.name = name.to_owned();
        } else if package.name != name {
            tracing::debug!(path = %path.display(), found = name, expected = %package.name, "package name mismatch");
            continue;
        }
        package.files.push(parsed);
    }
    Ok(package)
}

/// Expression of the `//go:build` line in the header comments of a file.
fn build_expression(source: &str) -> Option<&str> {
    let mut in_block = false;
    for line in source.lines() {
        let line = line.trim();
        if in_block {
            if let Some(i) = line.find("*/") {
                in_block = false;
                if !line[i + 2..].trim().is_empty() {
                    return None;
                }
            }
            continue;
        }
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix("//") {
            if let Some(expr) = rest.strip_prefix("go:build") {
                if expr.starts_with(char::is_whitespace) {
                    return Some(expr.trim());
                }
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix("/*") {
            in_block = !rest.contains("*/");
            continue;
        }
        return None;
    }
    None
}

/// A parsed `//go:build` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    Tag(String),
    Not(Box<Constraint>),
    And(Box<Constraint>, Box<Constraint>),
    Or(Box<Constraint>, Box<Constraint>),
}

impl Constraint {
    pub fn parse(text: &str) -> Option<Self> {
        let mut parser = ConstraintParser { text, pos: 0 };
        let expr = parser.or()?;
        parser.skip_space();
        (parser.pos == text.len()).then_some(expr)
    }

    pub fn eval(&self, tag: &dyn Fn(&str) -> bool) -> bool {
        match self {
            Self::Tag(name) => tag(name),
            Self::Not(x) => !x.eval(tag),
            Self::And(x, y) => x.eval(tag) && y.eval(tag),
            Self::Or(x, y) => x.eval(tag) || y.eval(tag),
        }
    }
}

struct ConstraintParser<'a> {
    text: &'a str,
    pos: usize,
}

impl ConstraintParser<'_> {
    fn skip_space(&mut self) {
        let rest = &self.text[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_space();
        if self.text[self.pos..].starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn or(&mut self) -> Option<Constraint> {
        let mut x = self.and()?;
        while self.eat("||") {
            x = Constraint::Or(Box::new(x), Box::new(self.and()?));
        }
        Some(x)
    }

    fn and(&mut self) -> Option<Constraint> {
        let mut x = self.not()?;
        while self.eat("&&") {
            x = Constraint::And(Box::new(x), Box::new(self.not()?));
        }
        Some(x)
    }

    fn not(&mut self) -> Option<Constraint> {
        if self.eat("!") {
            return Some(Constraint::Not(Box::new(self.not()?)));
        }
        if self.eat("(") {
            let x = self.or()?;
            return self.eat(")").then_some(x);
        }
        self.skip_space();
        let rest = &self.text[self.pos..];
        let len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
            .unwrap_or(rest.len());
        if len == 0 {
            return None;
        }
        self.pos += len;
        Some(Constraint::Tag(rest[..len].to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linux() -> BuildContext {
        BuildContext::new("linux", "amd64")
    }

    #[test]
    fn file_name_rules() {
        let ctx = linux();
        assert!(ctx.matches_file_name("a.go"));
        assert!(ctx.matches_file_name("file_linux.go"));
        assert!(ctx.matches_file_name("file_linux_amd64.go"));
        assert!(ctx.matches_file_name("file_amd64.go"));
        assert!(ctx.matches_file_name("linux.go"));
        assert!(!ctx.matches_file_name("file_windows.go"));
        assert!(!ctx.matches_file_name("file_linux_arm64.go"));
        assert!(!ctx.matches_file_name("file_test.go"));
        assert!(!ctx.matches_file_name("_hidden.go"));
        assert!(!ctx.matches_file_name(".x.go"));
        assert!(!ctx.matches_file_name("notes.txt"));

        let ctx = BuildContext {
            include_tests: true,
            ..linux()
        };
        assert!(ctx.matches_file_name("file_test.go"));
        assert!(!ctx.matches_file_name("file_windows_test.go"));

        assert!(BuildContext::new("android", "arm64").matches_file_name("x_linux.go"));
    }

    #[test]
    fn constraint_expressions() {
        let ctx = linux();
        let ok = |src: &str| ctx.matches_constraint(src);
        assert!(ok("package a\n"));
        assert!(ok("//go:build linux\n\npackage a\n"));
        assert!(ok("// Copyright\n\n//go:build unix && !windows\n\npackage a\n"));
        assert!(ok("//go:build (darwin || linux) && amd64\npackage a\n"));
        assert!(ok("//go:build go1.21\npackage a\n"));
        assert!(!ok("//go:build ignore\npackage a\n"));
        assert!(!ok("//go:build cgo\npackage a\n"));
        assert!(!ok("//go:build windows\npackage a\n"));
        assert!(!ok("/* header */\n//go:build js && wasm\npackage a\n"));
        // after the package clause it is an ordinary comment
        assert!(ok("package a\n//go:build ignore\n"));
    }

    #[test]
    fn constraint_parser_rejects_garbage() {
        assert!(Constraint::parse("linux &&").is_none());
        assert!(Constraint::parse("(linux").is_none());
        assert!(Constraint::parse("").is_none());
        assert_eq!(
            Constraint::parse("!a || b"),
            Some(Constraint::Or(
                Box::new(Constraint::Not(Box::new(Constraint::Tag("a".into())))),
                Box::new(Constraint::Tag("b".into())),
            ))
        );
    }
}
