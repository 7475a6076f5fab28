use std::fs;
use std::path::{Path, PathBuf};

use super::gomod::{compare_versions, GoMod};
use super::loader::BuildContext;
use super::{check_dir, ImportError, ImportStage, Importer};
use crate::check::{Package, SourceChecker};
use crate::config::Config;
use crate::model::import_path::escape;

/// Dependencies checked from their own source.
///
/// Looks in `GOROOT/src`, `GOROOT/src/vendor`, the module cache and
/// `GOPATH/src`, in that order. Checking is lenient: names that cannot be
/// resolved degrade instead of failing the package.
#[derive(Debug, Clone)]
pub struct SourceResolver {
    goroot: Option<PathBuf>,
    module_cache: Option<PathBuf>,
    gopath: Option<PathBuf>,
    workspace_root: PathBuf,
    build: BuildContext,
    checker: SourceChecker,
}

impl SourceResolver {
    pub fn new(build: BuildContext) -> Self {
        Self {
            goroot: None,
            module_cache: None,
            gopath: None,
            workspace_root: PathBuf::from("."),
            build,
            checker: SourceChecker::lenient(),
        }
    }

    pub fn from_config(config: &Config, build: BuildContext) -> Self {
        Self {
            goroot: config.goroot.clone(),
            module_cache: config.module_cache_dir(),
            gopath: config.dependency_root.clone(),
            workspace_root: config.workspace_root.clone(),
            ..Self::new(build)
        }
    }

    pub fn with_goroot(mut self, dir: impl Into<PathBuf>) -> Self {
        self.goroot = Some(dir.into());
        self
    }

    pub fn with_module_cache(mut self, dir: impl Into<PathBuf>) -> Self {
        self.module_cache = Some(dir.into());
        self
    }

    pub fn with_gopath(mut self, dir: impl Into<PathBuf>) -> Self {
        self.gopath = Some(dir.into());
        self
    }

    pub fn with_workspace_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workspace_root = dir.into();
        self
    }

    /// First existing directory that can hold `path`.
    pub fn find_dir(&self, path: &str) -> Option<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(goroot) = &self.goroot {
            candidates.push(goroot.join("src").join(path));
            candidates.push(goroot.join("src").join("vendor").join(path));
        }
        candidates.extend(self.module_cache_dir(path));
        if let Some(gopath) = &self.gopath {
            candidates.push(gopath.join("src").join(path));
        }
        candidates.into_iter().find(|dir| dir.is_dir())
    }

    /// `<cache>/<escaped module>@<version>/<rest>` for the longest module
    /// prefix of `path` present in the cache.
    fn module_cache_dir(&self, path: &str) -> Option<PathBuf> {
        let cache = self.module_cache.as_ref()?;
        let gomod = match GoMod::find(&self.workspace_root) {
            Ok(found) => found,
            Err(err) => {
                tracing::debug!(error = %err, "could not read go.mod");
                None
            }
        };

        let mut end = path.len();
        loop {
            let prefix = &path[..end];
            let rest = path[end..].trim_start_matches('/');
            let (module, version) = match &gomod {
                Some(gomod) => gomod.module_for(prefix),
                None => (prefix.to_owned(), None),
            };
            let version = version.or_else(|| highest_cached_version(cache, &module));
            if let Some(version) = version {
                let root = cache.join(format!("{}@{}", escape(&module), version));
                let dir = if rest.is_empty() { root } else { root.join(rest) };
                if dir.is_dir() {
                    return Some(dir);
                }
            }
            end = prefix.rfind('/')?;
        }
    }
}

/// Highest version of `module` with a directory in the cache.
fn highest_cached_version(cache: &Path, module: &str) -> Option<String> {
    let escaped = escape(module);
    let (parent, last) = match escaped.rfind('/') {
        Some(i) => (cache.join(&escaped[..i]), &escaped[i + 1..]),
        None => (cache.to_owned(), escaped.as_str()),
    };
    let wanted = format!("{last}@");
    fs::read_dir(parent)
        .ok()?
        .filter_map(Result::ok)
        .filter_map(|entry| entry.file_name().to_str().map(str::to_owned))
        .filter_map(|name| name.strip_prefix(&wanted).map(str::to_owned))
        .max_by(|a, b| compare_versions(a, b))
}

impl ImportStage for SourceResolver {
    fn name(&self) -> &'static str {
        "source"
    }

    fn lenient(&self) -> bool {
        true
    }

    fn resolve(&self, path: &str, deps: &dyn Importer) -> Result<Option<Package>, ImportError> {
        let Some(dir) = self.find_dir(path) else {
            return Ok(None);
        };
        check_dir(path, &dir, &self.build, &self.checker, deps)
    }
}
