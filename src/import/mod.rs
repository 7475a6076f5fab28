//! Import resolution.
//!
//! An [`ImportChain`] asks its stages in order; the first one that produces a
//! package wins. A stage answers `Ok(None)` when the path is not its business,
//! which lets the next stage try. An `Err` stops the chain unless the stage
//! is lenient, in which case the failure is logged and treated like `None`.

pub mod cache;
pub mod gomod;
pub mod legacy;
pub mod loader;
pub mod source;
pub mod workspace;

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;

use crate::check::{CheckMode, Package, SemanticChecker, SourceChecker};
use crate::config::Config;

pub use cache::ArtifactCache;
pub use legacy::LegacyProbe;
pub use loader::BuildContext;
pub use source::SourceResolver;
pub use workspace::WorkspaceResolver;

#[derive(Debug, Error)]
pub enum ImportError {
    /// No stage knows the package
    #[error("package {path} not found")]
    NotFound { path: String },
    #[error("import cycle not allowed: {path}")]
    Cycle { path: String },
    /// Every problem found while loading a package from source
    #[error("package {path} has errors:\n\t{}", .errors.join("\n\t"))]
    Composite { path: String, errors: Vec<String> },
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid package artifact {}: {source}", .path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ImportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Resolves an import path to a checked package.
pub trait Importer {
    fn import(&self, path: &str) -> Result<Rc<Package>, ImportError>;
}

/// One strategy in an [`ImportChain`].
pub trait ImportStage {
    fn name(&self) -> &'static str;

    /// Lenient stages never stop the chain.
    fn lenient(&self) -> bool {
        false
    }

    /// `deps` resolves the imports of a package this stage loads from source.
    fn resolve(&self, path: &str, deps: &dyn Importer) -> Result<Option<Package>, ImportError>;

    /// Called with a package a later stage produced.
    fn remember(&self, _package: &Package) {}
}

pub struct ImportChain {
    stages: Vec<Box<dyn ImportStage>>,
    resolved: RefCell<HashMap<String, Rc<Package>>>,
    in_progress: RefCell<Vec<String>>,
}

impl Default for ImportChain {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportChain {
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            resolved: RefCell::new(HashMap::new()),
            in_progress: RefCell::new(Vec::new()),
        }
    }

    pub fn with_stage(mut self, stage: impl ImportStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Artifact cache, workspace, the legacy probe when enabled, then
    /// dependency sources.
    pub fn from_config(config: &Config) -> Self {
        let build = BuildContext::from_config(config);
        let mut chain = Self::new()
            .with_stage(ArtifactCache::new(config.artifact_cache.clone(), config.write_artifacts))
            .with_stage(WorkspaceResolver::new(config.workspace(), build.clone()));
        if config.legacy_probe {
            chain = chain.with_stage(LegacyProbe::new(build.clone().without_tests()));
        }
        chain.with_stage(SourceResolver::from_config(config, build.without_tests()))
    }

    pub fn stage_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.stages.iter().map(|s| s.name())
    }

    fn run_stages(&self, path: &str) -> Result<Package, ImportError> {
        for (i, stage) in self.stages.iter().enumerate() {
            let _span = tracing::debug_span!("import_stage", stage = stage.name(), path).entered();
            match stage.resolve(path, self) {
                Ok(Some(package)) => {
                    tracing::debug!("resolved");
                    for earlier in &self.stages[..i] {
                        earlier.remember(&package);
                    }
                    return Ok(package);
                }
                Ok(None) => {}
                Err(err) if stage.lenient() => {
                    tracing::warn!(error = %err, "import stage failed, continuing");
                }
                Err(err) => return Err(err),
            }
        }
        Err(ImportError::NotFound { path: path.to_owned() })
    }
}

impl Importer for ImportChain {
    fn import(&self, path: &str) -> Result<Rc<Package>, ImportError> {
        let cached = self.resolved.borrow().get(path).cloned();
        if let Some(package) = cached {
            return Ok(package);
        }
        if self.in_progress.borrow().iter().any(|p| p == path) {
            return Err(ImportError::Cycle { path: path.to_owned() });
        }

        self.in_progress.borrow_mut().push(path.to_owned());
        let result = self.run_stages(path);
        self.in_progress.borrow_mut().pop();

        let package = Rc::new(result?);
        self.resolved.borrow_mut().insert(path.to_owned(), package.clone());
        Ok(package)
    }
}

/// Loads the package in `dir` and checks it as `path`.
///
/// In strict mode any parse or check problem fails the whole package with a
/// [`ImportError::Composite`]; lenient checking drops files that do not parse.
/// A package that itself misses a dependency reports that dependency as not
/// found, so the missing path is the one that gets fetched.
pub(crate) fn check_dir(
    path: &str,
    dir: &Path,
    build: &BuildContext,
    checker: &SourceChecker,
    deps: &dyn Importer,
) -> Result<Option<Package>, ImportError> {
    let loaded = loader::load_package(dir, build).map_err(|err| ImportError::io(dir, err))?;
    if loaded.is_empty() {
        return Ok(None);
    }

    let mut errors: Vec<String> = loaded.errors.iter().map(ToString::to_string).collect();
    let strict = checker.mode() == CheckMode::Strict;
    if !errors.is_empty() && (strict || loaded.files.is_empty()) {
        return Err(ImportError::Composite {
            path: path.to_owned(),
            errors,
        });
    }
    for failure in &loaded.errors {
        tracing::warn!(%failure, "skipping unparsable dependency file");
    }

    tracing::debug!(path, dir = %dir.display(), files = loaded.files.len(), "checking package from source");
    match checker.check(path, &loaded.file_refs(), deps) {
        Ok(info) => Ok(Some((*info.package).clone())),
        Err(failure) => {
            if let Some(missing) = failure.unresolved_import() {
                return Err(ImportError::NotFound {
                    path: missing.to_owned(),
                });
            }
            errors.extend(failure.diagnostics.iter().map(ToString::to_string));
            Err(ImportError::Composite {
                path: path.to_owned(),
                errors,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    struct Fixed {
        name: &'static str,
        path: &'static str,
        calls: Rc<Cell<usize>>,
        remembered: Rc<RefCell<Vec<String>>>,
    }

    impl ImportStage for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        fn resolve(&self, path: &str, _deps: &dyn Importer) -> Result<Option<Package>, ImportError> {
            self.calls.set(self.calls.get() + 1);
            Ok((path == self.path).then(|| Package::new(path, self.name)))
        }

        fn remember(&self, package: &Package) {
            self.remembered.borrow_mut().push(package.path.clone());
        }
    }

    struct Failing {
        lenient: bool,
    }

    impl ImportStage for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn lenient(&self) -> bool {
            self.lenient
        }

        fn resolve(&self, path: &str, _deps: &dyn Importer) -> Result<Option<Package>, ImportError> {
            Err(ImportError::Composite {
                path: path.to_owned(),
                errors: vec!["x.go:1:1: broken".into()],
            })
        }
    }

    struct SelfImport;

    impl ImportStage for SelfImport {
        fn name(&self) -> &'static str {
            "self"
        }

        fn resolve(&self, path: &str, deps: &dyn Importer) -> Result<Option<Package>, ImportError> {
            deps.import(path).map(|p| Some((*p).clone()))
        }
    }

    fn fixed(name: &'static str, path: &'static str) -> (Fixed, Rc<Cell<usize>>, Rc<RefCell<Vec<String>>>) {
        let calls = Rc::new(Cell::new(0));
        let remembered = Rc::new(RefCell::new(Vec::new()));
        let stage = Fixed {
            name,
            path,
            calls: calls.clone(),
            remembered: remembered.clone(),
        };
        (stage, calls, remembered)
    }

    #[test]
    fn first_stage_that_knows_the_path_wins() {
        let (first, _, remembered) = fixed("first", "a");
        let (second, _, _) = fixed("second", "b");
        let chain = ImportChain::new().with_stage(first).with_stage(second);

        assert_eq!(chain.import("a").unwrap().name, "first");
        assert_eq!(chain.import("b").unwrap().name, "second");
        assert_eq!(*remembered.borrow(), vec!["b".to_owned()]);
        assert!(matches!(chain.import("c"), Err(ImportError::NotFound { path }) if path == "c"));
    }

    #[test]
    fn successes_are_memoized_but_misses_are_not() {
        let (stage, calls, _) = fixed("only", "a");
        let chain = ImportChain::new().with_stage(stage);

        chain.import("a").unwrap();
        chain.import("a").unwrap();
        assert_eq!(calls.get(), 1);

        assert!(chain.import("b").is_err());
        assert!(chain.import("b").is_err());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn strict_failure_stops_the_chain() {
        let (later, calls, _) = fixed("later", "a");
        let chain = ImportChain::new()
            .with_stage(Failing { lenient: false })
            .with_stage(later);
        assert!(matches!(chain.import("a"), Err(ImportError::Composite { .. })));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn lenient_failure_falls_through() {
        let (later, _, _) = fixed("later", "a");
        let chain = ImportChain::new().with_stage(Failing { lenient: true }).with_stage(later);
        assert_eq!(chain.import("a").unwrap().name, "later");

        let chain = ImportChain::new().with_stage(Failing { lenient: true });
        assert!(matches!(chain.import("a"), Err(ImportError::NotFound { .. })));
    }

    #[test]
    fn cycles_are_reported() {
        let chain = ImportChain::new().with_stage(SelfImport);
        assert!(matches!(chain.import("loop"), Err(ImportError::Cycle { path }) if path == "loop"));
    }

    #[test]
    fn composite_error_lists_every_problem() {
        let err = ImportError::Composite {
            path: "example.com/m/p".into(),
            errors: vec!["a.go:1:1: one".into(), "b.go:2:2: two".into()],
        };
        assert_eq!(
            err.to_string(),
            "package example.com/m/p has errors:\n\ta.go:1:1: one\n\tb.go:2:2: two"
        );
    }
}
