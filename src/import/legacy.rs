use std::fs;
use std::path::PathBuf;

use super::loader::BuildContext;
use super::{check_dir, ImportError, ImportStage, Importer};
use crate::check::{Package, SourceChecker};

const DEFAULT_ROOTS: &[&str] = &["/usr/local/go/src", "/usr/lib/go/src", "/opt/go/src", "C:\\Go\\src"];

/// Probes fixed installation roots for `<root>/<path>`.
///
/// When the hit is a directory whose first entry (by name) is itself a
/// directory, that entry is loaded instead. Only enabled for compatibility
/// with installations laid out that way.
#[derive(Debug, Clone)]
pub struct LegacyProbe {
    roots: Vec<PathBuf>,
    build: BuildContext,
    checker: SourceChecker,
}

impl LegacyProbe {
    pub fn new(build: BuildContext) -> Self {
        Self::with_roots(DEFAULT_ROOTS.iter().map(PathBuf::from), build)
    }

    pub fn with_roots(roots: impl IntoIterator<Item = PathBuf>, build: BuildContext) -> Self {
        Self {
            roots: roots.into_iter().collect(),
            build,
            checker: SourceChecker::lenient(),
        }
    }

    pub fn probe(&self, path: &str) -> Option<PathBuf> {
        let hit = self.roots.iter().map(|root| root.join(path)).find(|p| p.is_dir())?;
        let mut entries: Vec<_> = fs::read_dir(&hit).ok()?.filter_map(Result::ok).collect();
        entries.sort_by_key(|e| e.file_name());
        match entries.first() {
            Some(first) if first.path().is_dir() => Some(first.path()),
            _ => Some(hit),
        }
    }
}

impl ImportStage for LegacyProbe {
    fn name(&self) -> &'static str {
        "legacy-probe"
    }

    fn lenient(&self) -> bool {
        true
    }

    fn resolve(&self, path: &str, deps: &dyn Importer) -> Result<Option<Package>, ImportError> {
        match self.probe(path) {
            Some(dir) => {
                tracing::debug!(path, dir = %dir.display(), "legacy probe hit");
                check_dir(path, &dir, &self.build, &self.checker, deps)
            }
            None => Ok(None),
        }
    }
}
