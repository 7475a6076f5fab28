use std::path::{Path, PathBuf};

/// How type signatures are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolveMode {
    /// Verbatim source text, no semantic checking, no imports resolved
    Syntax,
    /// Checker-qualified type strings with underlying normalization
    #[default]
    Resolved,
}

/// Extraction settings.
///
/// Everything environment-dependent is carried here explicitly; the crate only
/// touches process environment in [`Config::from_env`].
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: ResolveMode,
    pub with_comments: bool,
    /// GOPATH. Files under it are treated as external packages by import-path
    /// inference, and `src/` below it is searched for dependencies.
    pub dependency_root: Option<PathBuf>,
    pub goroot: Option<PathBuf>,
    /// Module download cache; defaults to `<dependency_root>/pkg/mod`
    pub module_cache: Option<PathBuf>,
    /// Directory of prebuilt package descriptions (`<path>.json`)
    pub artifact_cache: Option<PathBuf>,
    /// Persist packages loaded from source into `artifact_cache`
    pub write_artifacts: bool,
    /// Where `go.mod` is searched for and where the fetcher runs
    pub workspace_root: PathBuf,
    pub include_tests: bool,
    /// Probe fixed installation roots before source resolution
    pub legacy_probe: bool,
    /// Fetch missing dependencies and retry
    pub acquire: bool,
    pub go_command: String,
    pub goos: String,
    pub goarch: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: ResolveMode::default(),
            with_comments: true,
            dependency_root: None,
            goroot: None,
            module_cache: None,
            artifact_cache: None,
            write_artifacts: false,
            workspace_root: PathBuf::from("."),
            include_tests: true,
            legacy_probe: false,
            acquire: true,
            go_command: "go".to_owned(),
            goos: host_goos().to_owned(),
            goarch: host_goarch().to_owned(),
        }
    }
}

impl Config {
    /// Defaults plus `GOPATH`, `GOROOT` and `GOMODCACHE` from the environment.
    ///
    /// Only the first entry of a list-valued `GOPATH` is used; an unset
    /// `GOPATH` falls back to `$HOME/go`.
    pub fn from_env() -> Self {
        let var = |key: &str| std::env::var_os(key).filter(|v| !v.is_empty());

        let dependency_root = var("GOPATH")
            .and_then(|v| std::env::split_paths(&v).next())
            .or_else(|| var("HOME").map(|home| PathBuf::from(home).join("go")));

        Self {
            dependency_root,
            goroot: var("GOROOT").map(PathBuf::from),
            module_cache: var("GOMODCACHE").map(PathBuf::from),
            ..Self::default()
        }
    }

    pub fn syntax_only() -> Self {
        Self::default().with_mode(ResolveMode::Syntax)
    }

    pub fn with_mode(mut self, mode: ResolveMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_comments(mut self, on: bool) -> Self {
        self.with_comments = on;
        self
    }

    pub fn with_dependency_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.dependency_root = Some(root.into());
        self
    }

    pub fn with_goroot(mut self, root: impl Into<PathBuf>) -> Self {
        self.goroot = Some(root.into());
        self
    }

    pub fn with_module_cache(mut self, dir: impl Into<PathBuf>) -> Self {
        self.module_cache = Some(dir.into());
        self
    }

    pub fn with_artifact_cache(mut self, dir: impl Into<PathBuf>, write_through: bool) -> Self {
        self.artifact_cache = Some(dir.into());
        self.write_artifacts = write_through;
        self
    }

    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = root.into();
        self
    }

    pub fn with_tests(mut self, on: bool) -> Self {
        self.include_tests = on;
        self
    }

    pub fn with_legacy_probe(mut self, on: bool) -> Self {
        self.legacy_probe = on;
        self
    }

    pub fn with_acquire(mut self, on: bool) -> Self {
        self.acquire = on;
        self
    }

    pub fn with_go_command(mut self, cmd: impl Into<String>) -> Self {
        self.go_command = cmd.into();
        self
    }

    pub fn with_target(mut self, goos: impl Into<String>, goarch: impl Into<String>) -> Self {
        self.goos = goos.into();
        self.goarch = goarch.into();
        self
    }

    /// Effective module cache location.
    pub fn module_cache_dir(&self) -> Option<PathBuf> {
        self.module_cache
            .clone()
            .or_else(|| self.dependency_root.as_deref().map(|r| r.join("pkg").join("mod")))
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace_root
    }
}

fn host_goos() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

fn host_goarch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_cache_defaults_below_gopath() {
        let cfg = Config::default().with_dependency_root("/home/u/go");
        assert_eq!(cfg.module_cache_dir(), Some(PathBuf::from("/home/u/go/pkg/mod")));

        let cfg = cfg.with_module_cache("/cache");
        assert_eq!(cfg.module_cache_dir(), Some(PathBuf::from("/cache")));
    }

    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.mode, ResolveMode::Resolved);
        assert!(cfg.with_comments && cfg.include_tests && cfg.acquire);
        assert!(!cfg.legacy_probe);
        assert_eq!(cfg.go_command, "go");
    }
}
