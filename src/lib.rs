//! Metadata extraction for Go packages.
//!
//! - Files are parsed by [`go_surface_syntax`], optionally checked by a
//!   [`SemanticChecker`], then walked once to build a [`SourceFile`].
//! - Imports are resolved through an [`ImportChain`]; a dependency nobody can
//!   find is fetched with the Go toolchain and the check is retried.
//!
//! The free functions cover the common cases; [`Session`] exposes the
//! collaborators for callers that need to replace them.

pub mod acquire;
pub mod check;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod import;
pub mod model;
pub mod resolve;

use std::fs;
use std::path::Path;

use go_surface_syntax::{ParseOptions, ParsedFile};
use indexmap::IndexMap;

pub use go_surface_syntax as syntax;

pub use crate::acquire::{Acquirer, ManifestGuard, RETRY_BUDGET};
pub use crate::check::{CheckFailure, CheckMode, Diagnostic, DiagnosticKind, SemanticChecker, SourceChecker};
pub use crate::config::{Config, ResolveMode};
pub use crate::error::{Error, Result};
pub use crate::extract::{Extractor, TypeShape};
pub use crate::fetch::{DependencyFetcher, FetchError, GoToolchain};
pub use crate::import::{ImportChain, ImportError, ImportStage, Importer};
pub use crate::model::{
    BoundMethod, FieldDefinition, GlobalConstant, GlobalVariable, ImportDeclaration, ImportPath, ImportPathError,
    InterfaceDefinition, MethodSignature, SourceFile, StructDefinition, TagLiteral, TypeNode,
};
pub use crate::resolve::TypeResolver;

use crate::check::FileTypes;

/// Extracts one file on disk.
pub fn parse_single_file(path: impl AsRef<Path>, config: &Config) -> Result<SourceFile> {
    Session::new(config.clone()).parse_file(path.as_ref())
}

/// Extracts every `.go` file directly in `dir` that passes `filter`.
///
/// Results are in lexical file-name order.
pub fn parse_dir(
    dir: impl AsRef<Path>,
    filter: Option<&dyn Fn(&Path) -> bool>,
    config: &Config,
) -> Result<Vec<SourceFile>> {
    Session::new(config.clone()).parse_dir(dir.as_ref(), filter)
}

/// Extracts in-memory source; `path` is only used for naming.
pub fn parse_source(source: &str, path: &str, config: &Config) -> Result<SourceFile> {
    Session::new(config.clone()).parse_source(source, path)
}

/// Configuration plus the collaborators of an extraction.
///
/// Import resolutions are memoized for the lifetime of the session.
pub struct Session<'a> {
    config: Config,
    checker: Box<dyn SemanticChecker + 'a>,
    importer: Box<dyn Importer + 'a>,
    acquirer: Acquirer<'a>,
}

impl<'a> Session<'a> {
    /// Strict source checking, the configured import chain and the `go`
    /// command as fetcher.
    pub fn new(config: Config) -> Self {
        let importer = ImportChain::from_config(&config);
        let acquirer = Acquirer::new(GoToolchain::new(config.go_command.clone()), config.workspace_root.clone())
            .enabled(config.acquire);
        Self {
            config,
            checker: Box::new(SourceChecker::strict()),
            importer: Box::new(importer),
            acquirer,
        }
    }

    pub fn with_checker(mut self, checker: impl SemanticChecker + 'a) -> Self {
        self.checker = Box::new(checker);
        self
    }

    pub fn with_importer(mut self, importer: impl Importer + 'a) -> Self {
        self.importer = Box::new(importer);
        self
    }

    pub fn with_fetcher(mut self, fetcher: impl DependencyFetcher + 'a) -> Self {
        self.acquirer = Acquirer::new(fetcher, self.config.workspace_root.clone()).enabled(self.config.acquire);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn parse_file(&mut self, path: &Path) -> Result<SourceFile> {
        let source = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
        self.parse_source(&source, &path.to_string_lossy())
    }

    pub fn parse_source(&mut self, source: &str, path: &str) -> Result<SourceFile> {
        let file = self.parse(source, path)?;
        let mut out = self.extract_package(std::slice::from_ref(&file))?;
        Ok(out.swap_remove(0))
    }

    /// Files are grouped by package clause and each package is checked once
    /// with all of its files.
    pub fn parse_dir(&mut self, dir: &Path, filter: Option<&dyn Fn(&Path) -> bool>) -> Result<Vec<SourceFile>> {
        let _span = tracing::info_span!("parse_dir", dir = %dir.display()).entered();

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(|err| Error::io(dir, err))? {
            let entry = entry.map_err(|err| Error::io(dir, err))?;
            let path = entry.path();
            let is_go = path.extension().is_some_and(|ext| ext == "go");
            if !is_go || !entry.file_type().is_ok_and(|t| t.is_file()) {
                continue;
            }
            if filter.is_some_and(|keep| !keep(&path)) {
                continue;
            }
            paths.push(path);
        }
        paths.sort();

        let mut files = Vec::with_capacity(paths.len());
        for path in &paths {
            let source = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
            files.push(self.parse(&source, &path.to_string_lossy())?);
        }

        let mut packages: IndexMap<String, Vec<ParsedFile>> = IndexMap::new();
        let mut order = Vec::with_capacity(files.len());
        for file in files {
            let group = packages.entry(file.package_name().to_owned()).or_default();
            order.push(file.path.clone());
            group.push(file);
        }

        let mut out = Vec::with_capacity(order.len());
        for (_, group) in packages {
            out.extend(self.extract_package(&group)?);
        }
        out.sort_by_key(|f| order.iter().position(|p| *p == f.path));
        Ok(out)
    }

    fn parse(&self, source: &str, path: &str) -> Result<ParsedFile> {
        let options = ParseOptions {
            comments: self.config.with_comments,
        };
        Ok(go_surface_syntax::parse_source(path, source, options)?)
    }

    /// Extracts the files of one package, in the given order.
    fn extract_package(&mut self, files: &[ParsedFile]) -> Result<Vec<SourceFile>> {
        if self.config.mode == ResolveMode::Syntax {
            return Ok(files
                .iter()
                .map(|file| Extractor::new(TypeResolver::syntax(file)).extract())
                .collect());
        }

        let Some(first) = files.first() else {
            return Ok(Vec::new());
        };
        let package = first.package_name().to_owned();
        let _span = tracing::info_span!("check", %package, files = files.len()).entered();

        let refs: Vec<&ParsedFile> = files.iter().collect();
        let checker = &self.checker;
        let importer = &self.importer;
        let checked = self.acquirer.run(|| checker.check(&package, &refs, &**importer));
        self.acquirer.release();
        let info = checked?;

        let empty = FileTypes::default();
        Ok(files
            .iter()
            .enumerate()
            .map(|(i, file)| {
                let types = info.file(i).unwrap_or(&empty);
                Extractor::new(TypeResolver::resolved(file, &info, types)).extract()
            })
            .collect())
    }
}
