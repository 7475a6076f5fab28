//! Building a [`SourceFile`] from a parsed file.

use go_surface_syntax::ast::{
    self, FuncDecl, GenDecl, GenDeclKind, ImportName, ImportSpec, InterfaceElem, Spec, TopLevelDecl, TypeSpec,
    ValueSpec,
};
use go_surface_syntax::{CommentGroupId, FieldId, ParsedFile};

use crate::check::BasicKind;
use crate::model::{
    BoundMethod, FieldSeed, ImportDeclaration, InterfaceDefinition, MethodSignature, SourceFile, TypeNode,
};
use crate::resolve::{normalize, TypeResolver};

/// What a type declaration contributes to the model.
#[derive(Debug, Clone, Copy)]
pub enum TypeShape<'f> {
    Struct(&'f [FieldId]),
    Interface(&'f [InterfaceElem]),
    /// Aliases of other types, named basics, function types and so on
    Ignored,
}

impl<'f> TypeShape<'f> {
    pub fn of(file: &'f ParsedFile, spec: &TypeSpec) -> Self {
        match &file.arena.types[spec.typ] {
            ast::Type::Struct { fields } => Self::Struct(fields),
            ast::Type::Interface { elems } => Self::Interface(elems),
            _ => Self::Ignored,
        }
    }
}

/// Whether `name` is visible outside its package.
pub fn is_exported(name: &str) -> bool {
    name.chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() && c.is_uppercase())
}

/// Doc comment as one line of text, comment markers removed.
pub fn flatten_comment(file: &ParsedFile, group: Option<CommentGroupId>) -> String {
    let Some(group) = group else {
        return String::new();
    };
    let joined: String = file.comment_texts(group).collect();
    joined
        .replace("//", "")
        .replace("/*", "")
        .replace("*/", "")
        .trim()
        .to_owned()
}

pub struct Extractor<'a> {
    resolver: TypeResolver<'a>,
    file: &'a ParsedFile,
}

impl<'a> Extractor<'a> {
    pub fn new(resolver: TypeResolver<'a>) -> Self {
        Self {
            file: resolver.file(),
            resolver,
        }
    }

    pub fn extract(&self) -> SourceFile {
        let _span = tracing::debug_span!("extract", file = %self.file.path).entered();
        let mut out = SourceFile::new(self.file.path.clone(), self.file.package_name());

        for decl in &self.file.root.decls {
            match decl {
                TopLevelDecl::Gen(gen) => self.gen_decl(gen, &mut out),
                TopLevelDecl::Func(func) => {
                    if let Some(method) = self.func_decl(func) {
                        out.methods.push(method);
                    }
                }
            }
        }
        out
    }

    fn gen_decl(&self, gen: &GenDecl, out: &mut SourceFile) {
        for spec in &gen.specs {
            match (gen.kind, spec) {
                (GenDeclKind::Import, Spec::Import(import)) => out.imports.push(self.import(import)),
                (GenDeclKind::Const, Spec::Value(value)) => {
                    if let Some(node) = self.value(value, true) {
                        out.constants.push(node);
                    }
                }
                (GenDeclKind::Var, Spec::Value(value)) => {
                    if let Some(node) = self.value(value, false) {
                        out.variables.push(node);
                    }
                }
                (GenDeclKind::Type, Spec::Type(spec)) => self.type_decl(gen, spec, out),
                _ => {}
            }
        }
    }

    fn import(&self, spec: &ImportSpec) -> ImportDeclaration {
        let alias = match spec.name {
            None => String::new(),
            Some(ImportName::Dot(_)) => ".".to_owned(),
            Some(ImportName::Blank(_)) => "_".to_owned(),
            Some(ImportName::Name(name)) => self.file.name(name).to_owned(),
        };
        ImportDeclaration {
            alias,
            path: self.file.text(spec.path.raw).to_owned(),
        }
    }

    /// Entry for the first name of a value spec, if it is exported.
    fn value(&self, spec: &ValueSpec, konst: bool) -> Option<TypeNode> {
        let name = self.file.name(*spec.names.first()?);
        if !is_exported(name) {
            return None;
        }
        let node = match (spec.typ, spec.values.first()) {
            (Some(typ), _) => self.resolver.resolve_type(typ),
            (None, Some(&expr)) => self.resolver.resolve_expr(expr),
            (None, None) => self.implicit_value(name, konst),
        };
        Some(node.named(name))
    }

    /// Type of a value spec that repeats the previous one in its group.
    ///
    /// The only object available is the constant's `iota` integer, so
    /// constants come out as `int` in both modes. Variables have no such
    /// object and stay empty.
    fn implicit_value(&self, name: &str, konst: bool) -> TypeNode {
        if !konst {
            tracing::warn!(
                file = %self.file.path,
                decl = name,
                "variable has neither a type nor an initializer"
            );
            return TypeNode::default();
        }
        tracing::debug!(file = %self.file.path, decl = name, "implicit constant typed as int");
        let underlying = if self.resolver.is_resolved() {
            normalize::basic_name(BasicKind::Int).to_owned()
        } else {
            String::new()
        };
        TypeNode {
            signature: "int".to_owned(),
            underlying,
            ..TypeNode::default()
        }
    }

    fn type_decl(&self, gen: &GenDecl, spec: &TypeSpec, out: &mut SourceFile) {
        let name = self.file.name(spec.name);
        if !is_exported(name) {
            return;
        }
        let doc = flatten_comment(self.file, spec.doc.or(gen.doc));
        match TypeShape::of(self.file, spec) {
            TypeShape::Struct(fields) => {
                out.add_struct(name, doc, self.struct_fields(fields));
            }
            TypeShape::Interface(elems) => out.interfaces.push(InterfaceDefinition {
                name: name.to_owned(),
                doc,
                methods: self.interface_methods(elems),
            }),
            TypeShape::Ignored => tracing::trace!(decl = name, "skipping non-struct, non-interface type"),
        }
    }

    /// Named fields in order; embedded fields have no name and are skipped.
    fn struct_fields(&self, fields: &[FieldId]) -> Vec<FieldSeed> {
        let mut seeds = Vec::new();
        for &id in fields {
            let field = &self.file.arena.fields[id];
            let signature = self.resolver.type_string(field.typ);
            let tag = field.tag.map(|lit| self.file.text(lit.raw).to_owned());
            for name in &field.names {
                seeds.push(FieldSeed {
                    name: self.file.name(*name).to_owned(),
                    signature: signature.clone(),
                    tag: tag.clone(),
                });
            }
        }
        seeds
    }

    fn interface_methods(&self, elems: &[InterfaceElem]) -> Vec<MethodSignature> {
        elems
            .iter()
            .filter_map(|elem| match elem {
                InterfaceElem::Method { doc, name, sig } => {
                    let (params, results) = self.resolver.resolve_signature(sig);
                    Some(MethodSignature {
                        name: self.file.name(*name).to_owned(),
                        params,
                        results,
                        doc: flatten_comment(self.file, *doc),
                    })
                }
                InterfaceElem::Embed(_) => None,
            })
            .collect()
    }

    fn func_decl(&self, func: &FuncDecl) -> Option<BoundMethod> {
        let name = self.file.name(func.name);
        if !is_exported(name) {
            return None;
        }
        let (params, results) = self.resolver.resolve_signature(&func.sig);
        let receivers = func
            .recv
            .iter()
            .flat_map(|recv| &recv.fields)
            .map(|&id| self.resolver.type_string(self.file.arena.fields[id].typ))
            .collect();
        Some(BoundMethod {
            signature: MethodSignature {
                name: name.to_owned(),
                params,
                results,
                doc: flatten_comment(self.file, func.doc),
            },
            receivers,
        })
    }
}
