//! Semantic checking of package-level declarations.
//!
//! [`SemanticChecker`] is the seam between extraction and type checking.
//! [`SourceChecker`] is the built-in implementation: it resolves every type
//! expression and initializer reachable from top-level declarations and
//! records the result per syntax node. Function bodies are never looked at.

mod checker;
pub mod package;
pub mod types;

use std::fmt;
use std::rc::Rc;

use go_surface_syntax::{ExprId, ParsedFile, TypeId};
use indexmap::IndexMap;
use thiserror::Error;

use crate::import::Importer;

pub use checker::{CheckMode, SourceChecker};
pub use package::{Object, Package, TypeDecl};
pub use types::{BasicKind, Interface, Method, Named, Signature, Type, Var};

const MAX_UNDERLYING_DEPTH: usize = 32;

pub trait SemanticChecker {
    /// Checks the files of one package. `path` becomes the package path that
    /// qualifies the package's own named types.
    fn check(
        &self,
        path: &str,
        files: &[&ParsedFile],
        importer: &dyn Importer,
    ) -> Result<TypeInfo, CheckFailure>;
}

/// Types recorded for the syntax nodes of one file.
#[derive(Debug, Clone, Default)]
pub struct FileTypes {
    types: Vec<Option<Type>>,
    exprs: Vec<Option<Type>>,
}

impl FileTypes {
    pub(crate) fn with_capacity(types: usize, exprs: usize) -> Self {
        Self {
            types: vec![None; types],
            exprs: vec![None; exprs],
        }
    }

    pub(crate) fn record_type(&mut self, id: TypeId, typ: &Type) {
        if let Some(slot) = self.types.get_mut(id.to_usize()) {
            *slot = Some(typ.clone());
        }
    }

    pub(crate) fn record_expr(&mut self, id: ExprId, typ: &Type) {
        if let Some(slot) = self.exprs.get_mut(id.to_usize()) {
            *slot = Some(typ.clone());
        }
    }

    pub fn type_of(&self, id: TypeId) -> Option<&Type> {
        self.types.get(id.to_usize()).and_then(Option::as_ref)
    }

    pub fn expr_type(&self, id: ExprId) -> Option<&Type> {
        self.exprs.get(id.to_usize()).and_then(Option::as_ref)
    }
}

/// Result of a successful check.
#[derive(Debug, Clone)]
pub struct TypeInfo {
    pub package: Rc<Package>,
    /// Every package reachable from this one, keyed by path, itself included
    pub packages: IndexMap<String, Rc<Package>>,
    /// Parallel to the checked files
    pub files: Vec<FileTypes>,
}

impl TypeInfo {
    pub fn file(&self, index: usize) -> Option<&FileTypes> {
        self.files.get(index)
    }

    /// Underlying type of `typ`; `None` when a named type cannot be found.
    pub fn underlying(&self, typ: &Type) -> Option<Type> {
        let mut current = typ.clone();
        for _ in 0..MAX_UNDERLYING_DEPTH {
            current = match current {
                Type::Named(named) => self.named_underlying(&named)?,
                Type::Invalid => return None,
                other => return Some(other),
            };
        }
        None
    }

    fn named_underlying(&self, named: &Named) -> Option<Type> {
        let Some(path) = &named.pkg else {
            return universe_underlying(&named.name);
        };
        match self.packages.get(path)?.lookup(&named.name)? {
            Object::TypeName(decl) => Some(decl.underlying.substitute(&decl.type_params, &named.args)),
            _ => None,
        }
    }
}

pub(crate) fn universe_underlying(name: &str) -> Option<Type> {
    match name {
        "error" => Some(Type::Interface(Interface {
            methods: vec![Method {
                name: "Error".into(),
                sig: Signature {
                    params: Vec::new(),
                    results: vec![Var::new("", Type::basic(BasicKind::String))],
                    variadic: false,
                },
            }],
            embeds: Vec::new(),
        })),
        "any" | "comparable" => Some(Type::Interface(Interface::default())),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagnosticKind {
    /// No resolver stage knows the package
    #[error("could not import {path} (package not found)")]
    UnresolvedImport { path: String },
    #[error("could not import {path} ({reason})")]
    ImportFailed { path: String, reason: String },
    #[error("undefined: {name}")]
    Undefined { name: String },
    #[error("{name} redeclared in this block")]
    Duplicate { name: String },
    #[error("{name} is not a type")]
    NotAType { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}: {}", self.file, self.line, self.column, self.kind)
    }
}

/// Every diagnostic of a failed check, in source order per file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckFailure {
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckFailure {
    /// Path of the missing package, when the first diagnostic is a failed
    /// import. Later diagnostics never make a failure recoverable.
    pub fn unresolved_import(&self) -> Option<&str> {
        match &self.diagnostics.first()?.kind {
            DiagnosticKind::UnresolvedImport { path } => Some(path),
            _ => None,
        }
    }
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.diagnostics.first() {
            Some(first) => {
                write!(f, "{first}")?;
                if self.diagnostics.len() > 1 {
                    write!(f, " (and {} more errors)", self.diagnostics.len() - 1)?;
                }
                Ok(())
            }
            None => f.write_str("type checking failed"),
        }
    }
}

impl std::error::Error for CheckFailure {}
