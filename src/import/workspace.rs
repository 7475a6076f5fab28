use std::path::{Path, PathBuf};

use super::gomod::GoMod;
use super::loader::BuildContext;
use super::{check_dir, ImportError, ImportStage, Importer};
use crate::check::{Package, SourceChecker};

/// Packages of the module the workspace belongs to.
///
/// `go.mod` is looked up from the workspace root on every call, so a manifest
/// created by the fetcher is picked up. Module-local paths, `vendor/` copies
/// and local `replace` targets are loaded from source and checked strictly.
#[derive(Debug, Clone)]
pub struct WorkspaceResolver {
    root: PathBuf,
    build: BuildContext,
    checker: SourceChecker,
}

impl WorkspaceResolver {
    pub fn new(root: impl Into<PathBuf>, build: BuildContext) -> Self {
        Self {
            root: root.into(),
            build,
            checker: SourceChecker::strict(),
        }
    }

    /// Directory `path` lives in, if this workspace provides it.
    pub fn package_dir(&self, path: &str) -> Result<Option<PathBuf>, ImportError> {
        let Some(gomod) = GoMod::find(&self.root).map_err(|err| ImportError::io(&self.root, err))? else {
            return Ok(None);
        };
        if let Some(dir) = gomod.local_dir(path) {
            return Ok(Some(dir));
        }
        let vendored = gomod.dir.join("vendor").join(path);
        if vendored.is_dir() {
            return Ok(Some(vendored));
        }
        Ok(gomod.replaced_dir(path))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ImportStage for WorkspaceResolver {
    fn name(&self) -> &'static str {
        "workspace"
    }

    fn resolve(&self, path: &str, deps: &dyn Importer) -> Result<Option<Package>, ImportError> {
        match self.package_dir(path)? {
            Some(dir) if dir.is_dir() => check_dir(path, &dir, &self.build, &self.checker, deps),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::check::Object;
    use crate::import::ImportChain;

    fn workspace(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, text) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, text).unwrap();
        }
        dir
    }

    fn chain(root: &Path, tests: bool) -> ImportChain {
        let build = BuildContext {
            include_tests: tests,
            ..BuildContext::new("linux", "amd64")
        };
        ImportChain::new().with_stage(WorkspaceResolver::new(root, build))
    }

    #[test]
    fn resolves_module_local_packages() {
        let dir = workspace(&[
            ("go.mod", "module example.com/m\n\ngo 1.22\n"),
            ("geo/geo.go", "package geo\n\ntype Point struct{ X, Y int }\n"),
            ("geo/geo_windows.go", "package geo\n\ntype WindowsOnly int\n"),
            ("geo/helper_test.go", "package geo\n\ntype Helper struct{}\n"),
            ("geo/external_test.go", "package geo_test\n\ntype Outside struct{}\n"),
        ]);

        let pkg = chain(dir.path(), true).import("example.com/m/geo").unwrap();
        assert_eq!(pkg.name, "geo");
        assert_eq!(pkg.path, "example.com/m/geo");
        assert!(matches!(pkg.lookup("Point"), Some(Object::TypeName(_))));
        assert!(pkg.lookup("Helper").is_some());
        assert!(pkg.lookup("WindowsOnly").is_none());
        assert!(pkg.lookup("Outside").is_none());

        let pkg = chain(dir.path(), false).import("example.com/m/geo").unwrap();
        assert!(pkg.lookup("Helper").is_none());
    }

    #[test]
    fn packages_import_each_other() {
        let dir = workspace(&[
            ("go.mod", "module example.com/m\n"),
            ("a/a.go", "package a\n\nimport \"example.com/m/b\"\n\nvar V b.T\n"),
            ("b/b.go", "package b\n\ntype T struct{}\n"),
        ]);
        let chain = chain(dir.path(), false);
        let pkg = chain.import("example.com/m/a").unwrap();
        match pkg.lookup("V") {
            Some(Object::Var { typ }) => assert_eq!(typ.to_string(), "example.com/m/b.T"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(pkg.imports, vec!["example.com/m/b".to_owned()]);
    }

    #[test]
    fn vendored_and_replaced_paths() {
        let dir = workspace(&[
            ("app/go.mod", "module example.com/app\n\nreplace example.com/lib => ../lib\n"),
            ("app/vendor/github.com/x/y/y.go", "package y\n\nconst N = 3\n"),
            ("lib/util/util.go", "package util\n\nfunc Do() error { return nil }\n"),
        ]);
        let chain = chain(&dir.path().join("app"), false);
        assert_eq!(chain.import("github.com/x/y").unwrap().name, "y");
        assert!(matches!(
            chain.import("example.com/lib/util").unwrap().lookup("Do"),
            Some(Object::Func { .. })
        ));
    }

    #[test]
    fn problems_are_aggregated() {
        let dir = workspace(&[
            ("go.mod", "module example.com/m\n"),
            ("bad/a.go", "package bad\n\nvar A Missing\nvar B AlsoMissing\n"),
        ]);
        match chain(dir.path(), false).import("example.com/m/bad") {
            Err(ImportError::Composite { path, errors }) => {
                assert_eq!(path, "example.com/m/bad");
                assert_eq!(errors.len(), 2);
                assert!(errors[0].ends_with("undefined: Missing"), "{errors:?}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_dependency_of_a_workspace_package_is_not_found() {
        let dir = workspace(&[
            ("go.mod", "module example.com/m\n"),
            ("a/a.go", "package a\n\nimport \"github.com/gone/away\"\n\nvar X away.T\n"),
        ]);
        match chain(dir.path(), false).import("example.com/m/a") {
            Err(ImportError::NotFound { path }) => assert_eq!(path, "github.com/gone/away"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn paths_outside_the_module_fall_through() {
        let dir = workspace(&[("go.mod", "module example.com/m\n")]);
        assert!(matches!(
            chain(dir.path(), false).import("github.com/other/pkg"),
            Err(ImportError::NotFound { .. })
        ));
    }
}
