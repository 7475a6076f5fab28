//! Retrying a check after fetching the dependency it could not find.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::check::CheckFailure;
use crate::error::{Error, Result};
use crate::fetch::{DependencyFetcher, FetchError};

/// Check attempts allowed per extraction unit.
pub const RETRY_BUDGET: u32 = 2;

const MANIFEST: &str = "go.mod";
const CHECKSUMS: &str = "go.sum";

/// Removes a `go.mod`/`go.sum` pair on drop if it was created here.
#[derive(Debug)]
pub struct ManifestGuard {
    dir: PathBuf,
    created: bool,
}

impl ManifestGuard {
    /// Makes sure `dir` has a module manifest, creating one through `fetcher`
    /// if needed.
    pub fn ensure(dir: &Path, fetcher: &mut dyn DependencyFetcher) -> Result<Self, FetchError> {
        if dir.join(MANIFEST).exists() {
            return Ok(Self {
                dir: dir.to_owned(),
                created: false,
            });
        }
        tracing::info!(dir = %dir.display(), "creating temporary module manifest");
        fetcher.init_manifest(dir)?;
        Ok(Self {
            dir: dir.to_owned(),
            created: true,
        })
    }

    pub fn created(&self) -> bool {
        self.created
    }
}

impl Drop for ManifestGuard {
    fn drop(&mut self) {
        if !self.created {
            return;
        }
        for name in [MANIFEST, CHECKSUMS] {
            let path = self.dir.join(name);
            match fs::remove_file(&path) {
                Ok(()) => tracing::debug!(path = %path.display(), "removed"),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => tracing::warn!(path = %path.display(), error = %err, "could not remove"),
            }
        }
    }
}

/// Drives check attempts, fetching the missing dependency between them.
pub struct Acquirer<'a> {
    fetcher: Box<dyn DependencyFetcher + 'a>,
    dir: PathBuf,
    enabled: bool,
    guards: Vec<ManifestGuard>,
}

impl<'a> Acquirer<'a> {
    /// `dir` is where the manifest lives and the fetcher runs.
    pub fn new(fetcher: impl DependencyFetcher + 'a, dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher: Box::new(fetcher),
            dir: dir.into(),
            enabled: true,
            guards: Vec::new(),
        }
    }

    pub fn enabled(mut self, on: bool) -> Self {
        self.enabled = on;
        self
    }

    /// Runs `attempt` until it succeeds or fails in a way fetching cannot fix.
    ///
    /// Every failed attempt spends one unit of [`RETRY_BUDGET`]. A failure
    /// whose first diagnostic is an unresolved import fetches that import
    /// and tries again while budget remains. Any other failure, or any
    /// failure while fetching is disabled, is returned as [`Error::Check`].
    pub fn run<T>(&mut self, mut attempt: impl FnMut() -> Result<T, CheckFailure>) -> Result<T> {
        let mut tries = RETRY_BUDGET;
        loop {
            let failure = match attempt() {
                Ok(value) => return Ok(value),
                Err(failure) => failure,
            };
            let Some(missing) = failure.unresolved_import().map(str::to_owned) else {
                return Err(Error::Check(failure));
            };
            if !self.enabled {
                tracing::debug!(%missing, "dependency fetching disabled");
                return Err(Error::Check(failure));
            }
            tries = tries.saturating_sub(1);
            if tries == 0 {
                return Err(Error::RetryBudgetExhausted(failure));
            }

            let _span = tracing::info_span!("acquire", path = %missing, remaining = tries).entered();
            self.acquire(&missing)?;
        }
    }

    fn acquire(&mut self, path: &str) -> Result<(), FetchError> {
        let guard = ManifestGuard::ensure(&self.dir, &mut *self.fetcher)?;
        if guard.created() {
            self.guards.push(guard);
        }
        self.fetcher.fetch(&self.dir, path)
    }

    /// Ends an extraction unit, cleaning up manifests created during it.
    pub fn release(&mut self) {
        self.guards.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::check::{Diagnostic, DiagnosticKind};

    #[derive(Default)]
    struct Log {
        inits: usize,
        fetched: Vec<String>,
    }

    struct FakeFetcher {
        log: Rc<RefCell<Log>>,
        fail: bool,
    }

    impl DependencyFetcher for FakeFetcher {
        fn init_manifest(&mut self, dir: &Path) -> Result<(), FetchError> {
            self.log.borrow_mut().inits += 1;
            fs::write(dir.join(MANIFEST), "module tempmod\n").unwrap();
            Ok(())
        }

        fn fetch(&mut self, dir: &Path, path: &str) -> Result<(), FetchError> {
            self.log.borrow_mut().fetched.push(path.to_owned());
            fs::write(dir.join(CHECKSUMS), "").unwrap();
            if self.fail {
                return Err(FetchError::Exit {
                    command: format!("go get -v {path}"),
                    exit_code: Some(1),
                    output: "not found".into(),
                });
            }
            Ok(())
        }
    }

    fn fetcher(fail: bool) -> (FakeFetcher, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        (FakeFetcher { log: log.clone(), fail }, log)
    }

    fn failure(kind: DiagnosticKind) -> CheckFailure {
        CheckFailure {
            diagnostics: vec![Diagnostic {
                file: "main.go".into(),
                line: 3,
                column: 8,
                kind,
            }],
        }
    }

    fn missing(path: &str) -> CheckFailure {
        failure(DiagnosticKind::UnresolvedImport { path: path.into() })
    }

    #[test]
    fn fetches_once_then_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let (fake, log) = fetcher(false);
        let mut acquirer = Acquirer::new(fake, dir.path());

        let mut checks = 0;
        let result = acquirer.run(|| {
            checks += 1;
            if checks == 1 {
                Err(missing("somepkg"))
            } else {
                Ok("checked")
            }
        });

        assert_eq!(result.unwrap(), "checked");
        assert_eq!(checks, 2);
        assert_eq!(log.borrow().fetched, vec!["somepkg".to_owned()]);
        assert_eq!(log.borrow().inits, 1);

        assert!(dir.path().join(MANIFEST).exists());
        acquirer.release();
        assert!(!dir.path().join(MANIFEST).exists());
        assert!(!dir.path().join(CHECKSUMS).exists());
    }

    #[test]
    fn budget_runs_out() {
        let dir = tempfile::tempdir().unwrap();
        let (fake, log) = fetcher(false);
        let mut acquirer = Acquirer::new(fake, dir.path());

        let mut checks = 0;
        let result: Result<()> = acquirer.run(|| {
            checks += 1;
            Err(missing("example.com/gone"))
        });

        assert!(matches!(result, Err(Error::RetryBudgetExhausted(_))));
        assert_eq!(checks, 2);
        assert_eq!(log.borrow().fetched, vec!["example.com/gone".to_owned()]);
        assert_eq!(log.borrow().inits, 1);
    }

    #[test]
    fn other_failures_are_fatal_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let (fake, log) = fetcher(false);
        let mut acquirer = Acquirer::new(fake, dir.path());

        let result: Result<()> = acquirer.run(|| Err(failure(DiagnosticKind::Undefined { name: "x".into() })));
        assert!(matches!(result, Err(Error::Check(_))));
        assert!(log.borrow().fetched.is_empty());
    }

    #[test]
    fn only_the_first_diagnostic_decides() {
        let dir = tempfile::tempdir().unwrap();
        let (fake, log) = fetcher(false);
        let mut acquirer = Acquirer::new(fake, dir.path());

        let mut mixed = failure(DiagnosticKind::Undefined { name: "Undefined".into() });
        mixed.diagnostics.extend(missing("example.com/gone").diagnostics);
        assert_eq!(mixed.unresolved_import(), None);

        let result: Result<()> = acquirer.run(|| Err(mixed.clone()));
        assert!(matches!(result, Err(Error::Check(_))));
        assert!(log.borrow().fetched.is_empty());
        assert_eq!(log.borrow().inits, 0);
    }

    #[test]
    fn disabled_fetching_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let (fake, log) = fetcher(false);
        let mut acquirer = Acquirer::new(fake, dir.path()).enabled(false);

        let result: Result<()> = acquirer.run(|| Err(missing("somepkg")));
        assert!(matches!(result, Err(Error::Check(_))));
        assert!(log.borrow().fetched.is_empty());
    }

    #[test]
    fn fetch_failure_is_reported_and_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let (fake, _) = fetcher(true);
        let mut acquirer = Acquirer::new(fake, dir.path());

        let result: Result<()> = acquirer.run(|| Err(missing("somepkg")));
        assert!(matches!(result, Err(Error::Fetch(FetchError::Exit { .. }))));
        drop(acquirer);
        assert!(!dir.path().join(MANIFEST).exists());
    }

    #[test]
    fn existing_manifest_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(MANIFEST), "module mine\n").unwrap();
        let (mut fake, log) = fetcher(false);

        let guard = ManifestGuard::ensure(dir.path(), &mut fake).unwrap();
        assert!(!guard.created());
        drop(guard);
        assert!(dir.path().join(MANIFEST).exists());
        assert_eq!(log.borrow().inits, 0);
    }
}
