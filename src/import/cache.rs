use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{ImportError, ImportStage, Importer};
use crate::check::Package;

/// Prebuilt package descriptions.
///
/// Always knows `unsafe`. With a directory configured, `a/b/c` is read from
/// `<dir>/a/b/c.json`.
#[derive(Debug, Clone, Default)]
pub struct ArtifactCache {
    dir: Option<PathBuf>,
    write_through: bool,
}

impl ArtifactCache {
    pub fn new(dir: Option<PathBuf>, write_through: bool) -> Self {
        Self { dir, write_through }
    }

    /// Location of the artifact for `path`; `None` for paths that would
    /// escape the cache directory.
    pub fn artifact_path(&self, path: &str) -> Option<PathBuf> {
        let dir = self.dir.as_ref()?;
        if path.is_empty() || path.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
            return None;
        }
        Some(dir.join(format!("{path}.json")))
    }

    fn read(&self, file: &Path) -> Result<Option<Package>, ImportError> {
        let text = match fs::read_to_string(file) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(ImportError::io(file, err)),
        };
        serde_json::from_str(&text).map(Some).map_err(|source| ImportError::Artifact {
            path: file.to_owned(),
            source,
        })
    }

    fn write(&self, file: &Path, package: &Package) -> Result<(), ImportError> {
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).map_err(|err| ImportError::io(parent, err))?;
        }
        let json = serde_json::to_string_pretty(package).map_err(|source| ImportError::Artifact {
            path: file.to_owned(),
            source,
        })?;
        fs::write(file, json).map_err(|err| ImportError::io(file, err))
    }
}

impl ImportStage for ArtifactCache {
    fn name(&self) -> &'static str {
        "artifact-cache"
    }

    fn resolve(&self, path: &str, _deps: &dyn Importer) -> Result<Option<Package>, ImportError> {
        if path == "unsafe" {
            return Ok(Some(Package::unsafe_package()));
        }
        match self.artifact_path(path) {
            Some(file) => self.read(&file),
            None => Ok(None),
        }
    }

    fn remember(&self, package: &Package) {
        if !self.write_through {
            return;
        }
        let Some(file) = self.artifact_path(&package.path) else {
            return;
        };
        match self.write(&file, package) {
            Ok(()) => tracing::debug!(path = %package.path, file = %file.display(), "artifact written"),
            Err(err) => tracing::warn!(error = %err, "could not write package artifact"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::{Object, Type, TypeDecl};
    use crate::import::ImportChain;

    #[test]
    fn unsafe_is_built_in() {
        let cache = ArtifactCache::default();
        let chain = ImportChain::new();
        let pkg = cache.resolve("unsafe", &chain).unwrap().unwrap();
        assert!(matches!(pkg.lookup("Pointer"), Some(Object::TypeName(decl)) if decl.alias));
        assert!(cache.resolve("fmt", &chain).unwrap().is_none());
    }

    #[test]
    fn reads_and_writes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::new(Some(dir.path().to_owned()), true);
        let chain = ImportChain::new();

        let mut pkg = Package::new("example.com/geo", "geo");
        pkg.scope.insert(
            "Point".into(),
            Object::TypeName(TypeDecl::new(Type::Struct(Vec::new()))),
        );
        cache.remember(&pkg);

        assert!(dir.path().join("example.com/geo.json").is_file());
        let back = cache.resolve("example.com/geo", &chain).unwrap().unwrap();
        assert_eq!(back, pkg);
    }

    #[test]
    fn corrupt_artifacts_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        let cache = ArtifactCache::new(Some(dir.path().to_owned()), false);
        let err = cache.resolve("bad", &ImportChain::new()).unwrap_err();
        assert!(matches!(err, ImportError::Artifact { .. }));
    }

    #[test]
    fn refuses_escaping_paths() {
        let cache = ArtifactCache::new(Some(PathBuf::from("/cache")), false);
        assert!(cache.artifact_path("../etc/passwd").is_none());
        assert!(cache.artifact_path("a//b").is_none());
        assert_eq!(cache.artifact_path("a/b"), Some(PathBuf::from("/cache/a/b.json")));
    }
}
