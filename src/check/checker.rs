use std::collections::HashMap;
use std::rc::Rc;

use go_surface_syntax::ast::{
    self, BasicLitKind, BinaryOp, Expr, GenDeclKind, IdentName, InterfaceElem, Spec, TopLevelDecl, UnaryOp,
};
use go_surface_syntax::{literal, ExprId, FieldId, ParsedFile, Span, TypeId};
use indexmap::IndexMap;

use super::package::{Object, Package, TypeDecl};
use super::types::{BasicKind, ChanDir, Interface, Method, Named, Signature, StructField, Term, Type, Var};
use super::{
    universe_underlying, CheckFailure, Diagnostic, DiagnosticKind, FileTypes, SemanticChecker, TypeInfo,
};
use crate::import::{ImportError, Importer};

const MAX_PROMOTION_DEPTH: usize = 4;
const MAX_PACKAGE_CLOSURE: usize = 4096;

/// How unresolvable names are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckMode {
    /// Unknown names and failed imports are diagnostics; imports are resolved
    /// up front
    #[default]
    Strict,
    /// Unknown names become the invalid type and imports are resolved only
    /// when a declaration refers to them
    Lenient,
}

/// Checks package-level declarations from source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceChecker {
    mode: CheckMode,
}

impl SourceChecker {
    pub fn new(mode: CheckMode) -> Self {
        Self { mode }
    }

    pub fn strict() -> Self {
        Self::new(CheckMode::Strict)
    }

    pub fn lenient() -> Self {
        Self::new(CheckMode::Lenient)
    }

    pub fn mode(&self) -> CheckMode {
        self.mode
    }
}

impl SemanticChecker for SourceChecker {
    fn check(
        &self,
        path: &str,
        files: &[&ParsedFile],
        importer: &dyn Importer,
    ) -> Result<TypeInfo, CheckFailure> {
        let _span = tracing::debug_span!("check", path, files = files.len(), mode = ?self.mode).entered();
        let mut check = Check::new(self.mode, path, files, importer);
        check.collect();
        check.bind_imports();
        check.check_decls();
        check.finish()
    }
}

#[derive(Clone, Copy)]
enum DeclSite<'a> {
    Type {
        file: usize,
        spec: &'a ast::TypeSpec,
    },
    Value {
        file: usize,
        konst: bool,
        index: usize,
        names: usize,
        typ: Option<TypeId>,
        values: &'a [ExprId],
        iota: u32,
        /// Type and values repeated from an earlier spec of the const group
        inherited: bool,
    },
    Func {
        file: usize,
        decl: &'a ast::FuncDecl,
    },
}

enum ImportSlot {
    Ready(Rc<Package>),
    Lazy(String),
    Broken,
}

enum PackageRef {
    Found(Rc<Package>),
    Broken,
    NotPackage,
}

enum Memo<T> {
    InProgress,
    Done(T),
}

#[derive(Clone)]
enum Operand {
    Value { typ: Type, konst: Option<i64> },
    TypeExpr(Type),
    Builtin(&'static str),
    Invalid,
}

impl Operand {
    fn value(typ: Type) -> Self {
        Self::Value { typ, konst: None }
    }

    fn konst(&self) -> Option<i64> {
        match self {
            Self::Value { konst, .. } => *konst,
            _ => None,
        }
    }

    fn value_type(&self) -> Type {
        match self {
            Self::Value { typ, .. } => typ.clone(),
            _ => Type::Invalid,
        }
    }
}

const BUILTINS: &[&str] = &[
    "append", "cap", "clear", "close", "complex", "copy", "delete", "imag", "len", "make", "max", "min", "new",
    "panic", "print", "println", "real", "recover",
];

struct Check<'a> {
    mode: CheckMode,
    path: &'a str,
    files: &'a [&'a ParsedFile],
    importer: &'a dyn Importer,

    decls: IndexMap<String, DeclSite<'a>>,
    method_sites: IndexMap<(String, String), (usize, &'a ast::FuncDecl)>,
    imports: Vec<HashMap<String, ImportSlot>>,
    dot_imports: Vec<Vec<Rc<Package>>>,
    imported: IndexMap<String, Rc<Package>>,

    local_types: HashMap<String, Memo<TypeDecl>>,
    values: HashMap<String, Memo<(Type, Option<i64>)>>,
    funcs: HashMap<String, Signature>,
    methods: HashMap<(String, String), Signature>,

    out: Vec<FileTypes>,
    diags: Vec<(usize, Diagnostic)>,
}

impl<'a> Check<'a> {
    fn new(mode: CheckMode, path: &'a str, files: &'a [&'a ParsedFile], importer: &'a dyn Importer) -> Self {
        Self {
            mode,
            path,
            files,
            importer,
            decls: IndexMap::new(),
            method_sites: IndexMap::new(),
            imports: files.iter().map(|_| HashMap::new()).collect(),
            dot_imports: files.iter().map(|_| Vec::new()).collect(),
            imported: IndexMap::new(),
            local_types: HashMap::new(),
            values: HashMap::new(),
            funcs: HashMap::new(),
            methods: HashMap::new(),
            out: files
                .iter()
                .map(|f| FileTypes::with_capacity(f.arena.types.len(), f.arena.exprs.len()))
                .collect(),
            diags: Vec::new(),
        }
    }

    fn report(&mut self, file: usize, span: Span, kind: DiagnosticKind) {
        if self.mode == CheckMode::Lenient {
            tracing::trace!(path = self.path, %kind, "ignored in lenient check");
            return;
        }
        let parsed = self.files[file];
        let (line, column) = parsed.line_col(span.start);
        let diag = Diagnostic {
            file: parsed.path.clone(),
            line,
            column,
            kind,
        };
        if !self.diags.iter().any(|(_, d)| *d == diag) {
            self.diags.push((file, diag));
        }
    }

    // ---------------------------------------------------------------------
    // Package scope
    // ---------------------------------------------------------------------

    fn collect(&mut self) {
        let files = self.files;
        for (fi, file) in files.iter().enumerate() {
            for decl in &file.root.decls {
                match decl {
                    TopLevelDecl::Gen(gen) => self.collect_gen(fi, gen),
                    TopLevelDecl::Func(func) => match &func.recv {
                        Some(recv) => {
                            let Some(base) = recv
                                .fields
                                .first()
                                .and_then(|&f| receiver_base(file, file.arena.fields[f].typ))
                            else {
                                continue;
                            };
                            let key = (base.to_owned(), file.name(func.name).to_owned());
                            if self.method_sites.contains_key(&key) {
                                let name = format!("{}.{}", key.0, key.1);
                                self.report(fi, func.name.pos, DiagnosticKind::Duplicate { name });
                            } else {
                                self.method_sites.insert(key, (fi, func));
                            }
                        }
                        None if file.name(func.name) == "init" => {}
                        None => self.declare(fi, func.name, DeclSite::Func { file: fi, decl: func }),
                    },
                }
            }
        }
    }

    fn collect_gen(&mut self, fi: usize, gen: &'a ast::GenDecl) {
        let konst = gen.kind == GenDeclKind::Const;
        let mut last: Option<(Option<TypeId>, &'a [ExprId])> = None;

        for spec in &gen.specs {
            match spec {
                Spec::Import(_) => {}
                Spec::Type(ts) => self.declare(fi, ts.name, DeclSite::Type { file: fi, spec: ts }),
                Spec::Value(vs) => {
                    let (typ, values, inherited) = if konst && vs.typ.is_none() && vs.values.is_empty() {
                        match last {
                            Some((typ, values)) => (typ, values, true),
                            None => (None, &[][..], false),
                        }
                    } else {
                        if konst {
                            last = Some((vs.typ, &vs.values));
                        }
                        (vs.typ, &vs.values[..], false)
                    };
                    for (index, &name) in vs.names.iter().enumerate() {
                        let site = DeclSite::Value {
                            file: fi,
                            konst,
                            index,
                            names: vs.names.len(),
                            typ,
                            values,
                            iota: vs.iota,
                            inherited,
                        };
                        self.declare(fi, name, site);
                    }
                }
            }
        }
    }

    fn declare(&mut self, fi: usize, ident: IdentName, site: DeclSite<'a>) {
        let name = self.files[fi].name(ident);
        if name == "_" {
            return;
        }
        if self.decls.contains_key(name) {
            self.report(
                fi,
                ident.pos,
                DiagnosticKind::Duplicate {
                    name: name.to_owned(),
                },
            );
            return;
        }
        self.decls.insert(name.to_owned(), site);
    }

    fn bind_imports(&mut self) {
        let files = self.files;
        for (fi, file) in files.iter().enumerate() {
            for decl in &file.root.decls {
                let TopLevelDecl::Gen(gen) = decl else { continue };
                for spec in &gen.specs {
                    let Spec::Import(import) = spec else { continue };
                    self.bind_import(fi, file, import);
                }
            }
        }
    }

    fn bind_import(&mut self, fi: usize, file: &'a ParsedFile, import: &ast::ImportSpec) {
        let path = file.string_value(import.path).into_owned();
        let local = match import.name {
            Some(ast::ImportName::Blank(_)) => None,
            Some(ast::ImportName::Dot(_)) => Some("."),
            Some(ast::ImportName::Name(n)) => Some(file.name(n)),
            None => Some(""),
        };

        // cgo pseudo-package
        if path == "C" {
            self.imports[fi].insert("C".to_owned(), ImportSlot::Broken);
            return;
        }

        let eager = self.mode == CheckMode::Strict || local == Some(".");
        if !eager {
            if let Some(local) = local {
                let name = if local.is_empty() { guess_package_name(&path) } else { local.to_owned() };
                self.imports[fi].insert(name, ImportSlot::Lazy(path));
            }
            return;
        }

        match self.importer.import(&path) {
            Ok(pkg) => {
                self.imported.insert(path, pkg.clone());
                match local {
                    Some(".") => self.dot_imports[fi].push(pkg),
                    Some("") => {
                        self.imports[fi].insert(pkg.name.clone(), ImportSlot::Ready(pkg));
                    }
                    Some(name) => {
                        self.imports[fi].insert(name.to_owned(), ImportSlot::Ready(pkg));
                    }
                    None => {}
                }
            }
            Err(err) => {
                tracing::debug!(%path, error = %err, "import failed");
                let kind = match err {
                    ImportError::NotFound { path } => DiagnosticKind::UnresolvedImport { path },
                    other => DiagnosticKind::ImportFailed {
                        path: path.clone(),
                        reason: other.to_string(),
                    },
                };
                self.report(fi, import.path.raw, kind);
                if let Some(local) = local.filter(|l| *l != ".") {
                    let name = if local.is_empty() { guess_package_name(&path) } else { local.to_owned() };
                    self.imports[fi].insert(name, ImportSlot::Broken);
                }
            }
        }
    }

    fn package_ref(&mut self, fi: usize, name: &str) -> PackageRef {
        let Some(slot) = self.imports[fi].get_mut(name) else {
            return PackageRef::NotPackage;
        };
        let path = match slot {
            ImportSlot::Ready(pkg) => return PackageRef::Found(pkg.clone()),
            ImportSlot::Broken => return PackageRef::Broken,
            ImportSlot::Lazy(path) => path.clone(),
        };
        match self.importer.import(&path) {
            Ok(pkg) => {
                *slot = ImportSlot::Ready(pkg.clone());
                self.imported.insert(path, pkg.clone());
                PackageRef::Found(pkg)
            }
            Err(err) => {
                tracing::debug!(%path, error = %err, "dependency import degraded");
                *slot = ImportSlot::Broken;
                PackageRef::Broken
            }
        }
    }

    // ---------------------------------------------------------------------
    // Declarations
    // ---------------------------------------------------------------------

    fn check_decls(&mut self) {
        let files = self.files;
        for (fi, file) in files.iter().enumerate() {
            for decl in &file.root.decls {
                match decl {
                    TopLevelDecl::Gen(gen) => {
                        for spec in &gen.specs {
                            match spec {
                                Spec::Import(_) => {}
                                Spec::Type(ts) => {
                                    let name = file.name(ts.name);
                                    if name == "_" {
                                        continue;
                                    }
                                    self.local_type(name);
                                }
                                Spec::Value(vs) => {
                                    for &ident in &vs.names {
                                        let name = file.name(ident);
                                        if name != "_" {
                                            self.value_type(name);
                                        }
                                    }
                                    if vs.names.iter().all(|&n| file.name(n) == "_") {
                                        for &value in &vs.values {
                                            let iota = (gen.kind == GenDeclKind::Const).then_some(vs.iota as i64);
                                            self.eval(fi, value, iota, &[]);
                                        }
                                    }
                                }
                            }
                        }
                    }
                    TopLevelDecl::Func(func) => self.check_func(fi, file, func),
                }
            }
        }
    }

    fn check_func(&mut self, fi: usize, file: &'a ParsedFile, func: &'a ast::FuncDecl) {
        let name = file.name(func.name);
        match &func.recv {
            Some(recv) => {
                let base = recv
                    .fields
                    .first()
                    .and_then(|&f| receiver_base(file, file.arena.fields[f].typ));
                match base {
                    Some(base) => {
                        self.method_sig(base, name);
                    }
                    None => {
                        let tp = receiver_type_params(file, recv);
                        self.field_vars(fi, &recv.fields, &tp);
                        self.signature(fi, &func.sig, &tp);
                    }
                }
            }
            None if name == "init" || name == "_" => {
                self.signature(fi, &func.sig, &[]);
            }
            None => {
                self.func_sig(name);
            }
        }
    }

    /// Declaration of a package-level type, resolved once.
    fn local_type(&mut self, name: &str) -> Option<TypeDecl> {
        match self.local_types.get(name) {
            Some(Memo::Done(decl)) => return Some(decl.clone()),
            Some(Memo::InProgress) => return None,
            None => {}
        }
        let Some(DeclSite::Type { file, spec }) = self.decls.get(name).copied() else {
            return None;
        };
        self.local_types.insert(name.to_owned(), Memo::InProgress);

        let tp = self.type_params(file, &spec.type_params);
        let underlying = self.resolve_type(file, spec.typ, &tp);
        let decl = TypeDecl {
            underlying,
            alias: spec.alias,
            type_params: tp,
            methods: IndexMap::new(),
        };
        self.local_types.insert(name.to_owned(), Memo::Done(decl.clone()));
        Some(decl)
    }

    fn type_params(&mut self, fi: usize, params: &'a [ast::TypeParamDecl]) -> Vec<String> {
        let file = self.files[fi];
        let names: Vec<String> = params
            .iter()
            .flat_map(|p| p.names.iter().map(|&n| file.name(n).to_owned()))
            .collect();
        for param in params {
            self.resolve_type(fi, param.constraint, &names);
        }
        names
    }

    fn value_type(&mut self, name: &str) -> (Type, Option<i64>) {
        match self.values.get(name) {
            Some(Memo::Done(done)) => return done.clone(),
            Some(Memo::InProgress) => return (Type::Invalid, None),
            None => {}
        }
        let Some(DeclSite::Value {
            file,
            konst,
            index,
            names,
            typ,
            values,
            iota,
            inherited,
        }) = self.decls.get(name).copied()
        else {
            return (Type::Invalid, None);
        };
        self.values.insert(name.to_owned(), Memo::InProgress);

        let iota = konst.then_some(iota as i64);
        let declared = typ.map(|t| self.resolve_type(file, t, &[]));

        let (expr, operand) = if values.len() == names {
            let expr = values[index];
            (Some(expr), self.eval(file, expr, iota, &[]))
        } else if let [only] = values {
            let whole = self.eval(file, *only, iota, &[]);
            let element = match whole.value_type() {
                Type::Tuple(vars) => vars.get(index).map(|v| v.typ.clone()).unwrap_or(Type::Invalid),
                // comma-ok forms
                typ if index == 0 => typ,
                _ if index == 1 => Type::basic(BasicKind::UntypedBool),
                _ => Type::Invalid,
            };
            (None, Operand::value(element))
        } else {
            (None, Operand::Invalid)
        };

        let result = match (declared, &operand) {
            (Some(declared), _) => (declared, operand.konst()),
            (None, Operand::Value { typ, konst: value }) if konst => (typ.clone(), *value),
            (None, Operand::Value { typ, .. }) => (typ.clone().defaulted(), None),
            (None, _) => (Type::Invalid, None),
        };

        if let (Some(expr), false) = (expr, inherited) {
            if !result.0.is_invalid() && !(konst && typ.is_none()) {
                self.out[file].record_expr(expr, &result.0);
            }
        }

        self.values.insert(name.to_owned(), Memo::Done(result.clone()));
        result
    }

    fn func_sig(&mut self, name: &str) -> Signature {
        if let Some(sig) = self.funcs.get(name) {
            return sig.clone();
        }
        let Some(DeclSite::Func { file, decl }) = self.decls.get(name).copied() else {
            return Signature::default();
        };
        let tp = self.type_params(file, &decl.type_params);
        let sig = self.signature(file, &decl.sig, &tp);
        self.funcs.insert(name.to_owned(), sig.clone());
        sig
    }

    fn method_sig(&mut self, base: &str, name: &str) -> Option<Signature> {
        let key = (base.to_owned(), name.to_owned());
        if let Some(sig) = self.methods.get(&key) {
            return Some(sig.clone());
        }
        let &(file, decl) = self.method_sites.get(&key)?;
        let parsed = self.files[file];
        let recv = decl.recv.as_ref()?;
        let tp = receiver_type_params(parsed, recv);
        self.field_vars(file, &recv.fields, &tp);
        let sig = self.signature(file, &decl.sig, &tp);
        self.methods.insert(key, sig.clone());
        Some(sig)
    }

    // ---------------------------------------------------------------------
    // Type expressions
    // ---------------------------------------------------------------------

    fn resolve_type(&mut self, fi: usize, id: TypeId, tp: &[String]) -> Type {
        let file = self.files[fi];
        let typ = match &file.arena.types[id] {
            ast::Type::Named { pkg: None, name, args } => {
                let args = self.resolve_types(fi, args, tp);
                self.named_type(fi, *name, args, tp)
            }
            ast::Type::Named {
                pkg: Some(pkg),
                name,
                args,
            } => {
                let args = self.resolve_types(fi, args, tp);
                self.qualified_type(fi, *pkg, *name, args)
            }
            ast::Type::Pointer { elem } => Type::pointer(self.resolve_type(fi, *elem, tp)),
            ast::Type::Array { len, elem } => {
                let len = match len {
                    Some(expr) => self.eval(fi, *expr, None, tp).konst().and_then(|n| u64::try_from(n).ok()),
                    None => None,
                };
                Type::Array {
                    len,
                    elem: Box::new(self.resolve_type(fi, *elem, tp)),
                }
            }
            ast::Type::Slice { elem } => Type::slice(self.resolve_type(fi, *elem, tp)),
            ast::Type::Map { key, value } => Type::Map {
                key: Box::new(self.resolve_type(fi, *key, tp)),
                value: Box::new(self.resolve_type(fi, *value, tp)),
            },
            ast::Type::Chan { dir, elem } => Type::Chan {
                dir: match dir {
                    ast::ChanDir::Both => ChanDir::Both,
                    ast::ChanDir::Send => ChanDir::Send,
                    ast::ChanDir::Recv => ChanDir::Recv,
                },
                elem: Box::new(self.resolve_type(fi, *elem, tp)),
            },
            ast::Type::Struct { fields } => Type::Struct(self.struct_fields(fi, fields, tp)),
            ast::Type::Interface { elems } => Type::Interface(self.interface(fi, elems, tp)),
            ast::Type::Func { sig } => Type::Signature(self.signature(fi, sig, tp)),
            ast::Type::Paren { inner } => self.resolve_type(fi, *inner, tp),
            ast::Type::Ellipsis { elem } => Type::slice(self.resolve_type(fi, *elem, tp)),
            ast::Type::Union { terms } => Type::Union(
                terms
                    .iter()
                    .map(|term| Term {
                        tilde: term.tilde,
                        typ: self.resolve_type(fi, term.typ, tp),
                    })
                    .collect(),
            ),
        };
        self.out[fi].record_type(id, &typ);
        typ
    }

    fn resolve_types(&mut self, fi: usize, ids: &[TypeId], tp: &[String]) -> Vec<Type> {
        ids.iter().map(|&id| self.resolve_type(fi, id, tp)).collect()
    }

    fn named_type(&mut self, fi: usize, ident: IdentName, args: Vec<Type>, tp: &[String]) -> Type {
        let name = self.files[fi].name(ident);
        if tp.iter().any(|p| p == name) {
            return Type::TypeParam(name.to_owned());
        }
        if self.imports[fi].contains_key(name) {
            self.report(fi, ident.pos, DiagnosticKind::NotAType { name: name.to_owned() });
            return Type::Invalid;
        }
        if let Some(site) = self.decls.get(name).copied() {
            return match site {
                DeclSite::Type { spec, .. } if spec.alias => match self.local_type(name) {
                    Some(decl) => decl.underlying,
                    None => Type::Invalid,
                },
                DeclSite::Type { .. } => Type::Named(Named {
                    pkg: Some(self.path.to_owned()),
                    name: name.to_owned(),
                    args,
                }),
                _ => {
                    self.report(fi, ident.pos, DiagnosticKind::NotAType { name: name.to_owned() });
                    Type::Invalid
                }
            };
        }
        let dotted = self.dot_imports[fi]
            .iter()
            .find_map(|pkg| pkg.lookup(name).map(|obj| object_type(pkg, name, obj, args.clone())));
        if let Some(found) = dotted {
            return found.unwrap_or(Type::Invalid);
        }
        if let Some(basic) = BasicKind::from_universe(name) {
            return basic;
        }
        if universe_underlying(name).is_some() {
            return Type::named(None, name);
        }
        self.report(fi, ident.pos, DiagnosticKind::Undefined { name: name.to_owned() });
        Type::Invalid
    }

    fn qualified_type(&mut self, fi: usize, pkg: IdentName, ident: IdentName, args: Vec<Type>) -> Type {
        let file = self.files[fi];
        let (pkg_name, name) = (file.name(pkg), file.name(ident));
        match self.package_ref(fi, pkg_name) {
            PackageRef::Found(package) => match package.lookup(name) {
                Some(obj) => object_type(&package, name, obj, args).unwrap_or_else(|| {
                    let name = format!("{pkg_name}.{name}");
                    self.report(fi, ident.pos, DiagnosticKind::NotAType { name });
                    Type::Invalid
                }),
                None => {
                    let name = format!("{pkg_name}.{name}");
                    self.report(fi, ident.pos, DiagnosticKind::Undefined { name });
                    Type::Invalid
                }
            },
            PackageRef::Broken => Type::Invalid,
            PackageRef::NotPackage => {
                self.report(fi, pkg.pos, DiagnosticKind::Undefined { name: pkg_name.to_owned() });
                Type::Invalid
            }
        }
    }

    fn struct_fields(&mut self, fi: usize, fields: &[FieldId], tp: &[String]) -> Vec<StructField> {
        let file = self.files[fi];
        let mut out = Vec::with_capacity(fields.len());
        for &fid in fields {
            let field = &file.arena.fields[fid];
            let typ = self.resolve_type(fi, field.typ, tp);
            let tag = field.tag.map(|t| file.string_value(t).into_owned()).unwrap_or_default();
            if field.embedded {
                let name = embedded_name(file, field.typ).unwrap_or_default().to_owned();
                out.push(StructField {
                    name,
                    typ,
                    embedded: true,
                    tag,
                });
                continue;
            }
            for &name in &field.names {
                out.push(StructField {
                    name: file.name(name).to_owned(),
                    typ: typ.clone(),
                    embedded: false,
                    tag: tag.clone(),
                });
            }
        }
        out
    }

    fn interface(&mut self, fi: usize, elems: &[InterfaceElem], tp: &[String]) -> Interface {
        let file = self.files[fi];
        let mut iface = Interface::default();
        for elem in elems {
            match elem {
                InterfaceElem::Method { name, sig, .. } => {
                    let sig = self.signature(fi, sig, tp);
                    iface.methods.push(Method {
                        name: file.name(*name).to_owned(),
                        sig,
                    });
                }
                InterfaceElem::Embed(t) => {
                    let typ = self.resolve_type(fi, *t, tp);
                    iface.embeds.push(typ);
                }
            }
        }
        iface.methods.sort_by(|a, b| a.name.cmp(&b.name));
        iface
    }

    fn signature(&mut self, fi: usize, sig: &ast::Signature, tp: &[String]) -> Signature {
        let (params, variadic) = self.field_vars(fi, &sig.params.fields, tp);
        let results = match &sig.results {
            Some(list) => self.field_vars(fi, &list.fields, tp).0,
            None => Vec::new(),
        };
        Signature {
            params,
            results,
            variadic,
        }
    }

    /// One variable per declared name (or one unnamed), and whether the last
    /// entry is variadic.
    fn field_vars(&mut self, fi: usize, fields: &[FieldId], tp: &[String]) -> (Vec<Var>, bool) {
        let file = self.files[fi];
        let mut vars = Vec::with_capacity(fields.len());
        let mut variadic = false;
        for &fid in fields {
            let field = &file.arena.fields[fid];
            let typ = self.resolve_type(fi, field.typ, tp);
            variadic = matches!(file.arena.types[field.typ], ast::Type::Ellipsis { .. });
            if field.names.is_empty() {
                vars.push(Var::new("", typ));
            } else {
                for &name in &field.names {
                    vars.push(Var::new(file.name(name), typ.clone()));
                }
            }
        }
        (vars, variadic)
    }

    // ---------------------------------------------------------------------
    // Expressions
    // ---------------------------------------------------------------------

    fn eval(&mut self, fi: usize, id: ExprId, iota: Option<i64>, tp: &[String]) -> Operand {
        let file = self.files[fi];
        let operand = match &file.arena.exprs[id] {
            Expr::Ident(ident) => self.ident(fi, *ident, iota, tp),
            Expr::BasicLit(lit) => {
                let raw = file.text(lit.raw);
                match lit.kind {
                    BasicLitKind::Int => Operand::Value {
                        typ: Type::basic(BasicKind::UntypedInt),
                        konst: parse_int(raw),
                    },
                    BasicLitKind::Float => Operand::value(Type::basic(BasicKind::UntypedFloat)),
                    BasicLitKind::Imag => Operand::value(Type::basic(BasicKind::UntypedComplex)),
                    BasicLitKind::Rune => Operand::Value {
                        typ: Type::basic(BasicKind::UntypedRune),
                        konst: literal::unquote_char(raw).ok().map(|c| c as i64),
                    },
                    BasicLitKind::String => Operand::value(Type::basic(BasicKind::UntypedString)),
                }
            }
            Expr::CompositeLit { typ: Some(typ), .. } => Operand::value(self.type_of_expr(fi, *typ, tp)),
            Expr::CompositeLit { typ: None, .. } => Operand::Invalid,
            Expr::FuncLit { sig, .. } => Operand::value(Type::Signature(self.signature(fi, sig, tp))),
            Expr::Paren { inner } => self.eval(fi, *inner, iota, tp),
            Expr::Selector { x, sel } => self.selector(fi, *x, *sel, iota, tp),
            Expr::Index { x, indices } => self.index(fi, *x, indices, iota, tp),
            Expr::Slice { x, lo, hi, max } => {
                let base = self.eval(fi, *x, iota, tp).value_type();
                for bound in [lo, hi, max].into_iter().flatten() {
                    self.eval(fi, *bound, iota, tp);
                }
                match self.underlying(&base) {
                    Some(Type::Basic { kind, .. }) if kind.is_string() => {
                        Operand::value(if base.is_untyped() { base.defaulted() } else { base })
                    }
                    Some(Type::Array { elem, .. }) => Operand::value(Type::Slice(elem)),
                    Some(Type::Pointer(inner)) => match self.underlying(&inner) {
                        Some(Type::Array { elem, .. }) => Operand::value(Type::Slice(elem)),
                        _ => Operand::Invalid,
                    },
                    Some(Type::Slice(_)) => Operand::value(base),
                    _ => Operand::Invalid,
                }
            }
            Expr::TypeAssert { x, typ } => {
                self.eval(fi, *x, iota, tp);
                match typ {
                    Some(t) => Operand::value(self.resolve_type(fi, *t, tp)),
                    None => Operand::Invalid,
                }
            }
            Expr::Call { fun, args, .. } => self.call(fi, *fun, args, iota, tp),
            Expr::Unary { op, x } => self.unary(fi, *op, *x, iota, tp),
            Expr::Binary { op, x, y } => {
                let x = self.eval(fi, *x, iota, tp);
                let y = self.eval(fi, *y, iota, tp);
                binary(*op, &x, &y)
            }
            Expr::Type(t) => Operand::TypeExpr(self.resolve_type(fi, *t, tp)),
        };

        match &operand {
            Operand::Value { typ, .. } | Operand::TypeExpr(typ) if !typ.is_invalid() => {
                self.out[fi].record_expr(id, typ);
            }
            _ => {}
        }
        operand
    }

    fn ident(&mut self, fi: usize, ident: IdentName, iota: Option<i64>, tp: &[String]) -> Operand {
        let name = self.files[fi].name(ident);
        if tp.iter().any(|p| p == name) {
            return Operand::TypeExpr(Type::TypeParam(name.to_owned()));
        }
        if self.imports[fi].contains_key(name) {
            // a package name is only meaningful as a selector base
            return Operand::Invalid;
        }
        if let Some(site) = self.decls.get(name).copied() {
            return match site {
                DeclSite::Type { .. } => Operand::TypeExpr(self.named_type(fi, ident, Vec::new(), tp)),
                DeclSite::Value { .. } => {
                    let (typ, konst) = self.value_type(name);
                    Operand::Value { typ, konst }
                }
                DeclSite::Func { .. } => Operand::value(Type::Signature(self.func_sig(name))),
            };
        }
        let dotted = self.dot_imports[fi]
            .iter()
            .find_map(|pkg| pkg.lookup(name).map(|obj| object_operand(pkg, name, obj)));
        if let Some(found) = dotted {
            return found;
        }
        match name {
            "true" | "false" => Operand::Value {
                typ: Type::basic(BasicKind::UntypedBool),
                konst: None,
            },
            "nil" => Operand::value(Type::basic(BasicKind::UntypedNil)),
            "iota" if iota.is_some() => Operand::Value {
                typ: Type::basic(BasicKind::UntypedInt),
                konst: iota,
            },
            _ => {
                if let Some(&builtin) = BUILTINS.iter().find(|&&b| b == name) {
                    return Operand::Builtin(builtin);
                }
                if let Some(basic) = BasicKind::from_universe(name) {
                    return Operand::TypeExpr(basic);
                }
                if universe_underlying(name).is_some() {
                    return Operand::TypeExpr(Type::named(None, name));
                }
                self.report(fi, ident.pos, DiagnosticKind::Undefined { name: name.to_owned() });
                Operand::Invalid
            }
        }
    }

    fn selector(&mut self, fi: usize, x: ExprId, sel: IdentName, iota: Option<i64>, tp: &[String]) -> Operand {
        let file = self.files[fi];
        let name = file.name(sel);

        if let Expr::Ident(base) = &file.arena.exprs[x] {
            let base_name = file.name(*base);
            match self.package_ref(fi, base_name) {
                PackageRef::Found(pkg) => {
                    return match pkg.lookup(name) {
                        Some(obj) => object_operand(&pkg, name, obj),
                        None => {
                            let name = format!("{base_name}.{name}");
                            self.report(fi, sel.pos, DiagnosticKind::Undefined { name });
                            Operand::Invalid
                        }
                    };
                }
                PackageRef::Broken => return Operand::Invalid,
                PackageRef::NotPackage => {}
            }
        }

        match self.eval(fi, x, iota, tp) {
            Operand::Value { typ, .. } => match self.select_member(&typ, name, 0) {
                Some(member) => Operand::value(member),
                None => Operand::Invalid,
            },
            _ => Operand::Invalid,
        }
    }

    /// Field or method `name` of a value of type `typ`, including members
    /// promoted through embedded fields.
    fn select_member(&mut self, typ: &Type, name: &str, depth: usize) -> Option<Type> {
        if depth > MAX_PROMOTION_DEPTH {
            return None;
        }
        let base = match typ {
            Type::Pointer(inner) => inner.as_ref(),
            other => other,
        };

        if let Type::Named(named) = base {
            if let Some(sig) = self.method_of(named, name) {
                return Some(Type::Signature(sig));
            }
        }

        match self.underlying(base)? {
            Type::Struct(fields) => {
                if let Some(field) = fields.iter().find(|f| f.name == name) {
                    return Some(field.typ.clone());
                }
                fields
                    .iter()
                    .filter(|f| f.embedded)
                    .find_map(|f| self.select_member(&f.typ, name, depth + 1))
            }
            Type::Interface(iface) => iface
                .methods
                .iter()
                .find(|m| m.name == name)
                .map(|m| Type::Signature(m.sig.clone())),
            _ => None,
        }
    }

    fn method_of(&mut self, named: &Named, name: &str) -> Option<Signature> {
        match named.pkg.as_deref() {
            Some(path) if path == self.path => self.method_sig(&named.name, name),
            Some(path) => {
                let pkg = self.package_by_path(path)?;
                match pkg.lookup(&named.name)? {
                    Object::TypeName(decl) => decl.methods.get(name).cloned(),
                    _ => None,
                }
            }
            None => None,
        }
    }

    fn index(&mut self, fi: usize, x: ExprId, indices: &[ExprId], iota: Option<i64>, tp: &[String]) -> Operand {
        match self.eval(fi, x, iota, tp) {
            Operand::TypeExpr(Type::Named(mut named)) => {
                named.args = indices.iter().map(|&i| self.type_of_expr(fi, i, tp)).collect();
                Operand::TypeExpr(Type::Named(named))
            }
            Operand::Value { typ, .. } => {
                for &i in indices {
                    self.eval(fi, i, iota, tp);
                }
                let elem = match self.underlying(&typ) {
                    Some(Type::Slice(elem)) | Some(Type::Array { elem, .. }) => Some(*elem),
                    Some(Type::Map { value, .. }) => Some(*value),
                    Some(Type::Basic { kind, .. }) if kind.is_string() => Some(Type::byte()),
                    Some(Type::Pointer(inner)) => match self.underlying(&inner) {
                        Some(Type::Array { elem, .. }) => Some(*elem),
                        _ => None,
                    },
                    // explicit instantiation of a generic function
                    Some(Type::Signature(_)) => Some(typ),
                    _ => None,
                };
                elem.map_or(Operand::Invalid, Operand::value)
            }
            _ => Operand::Invalid,
        }
    }

    fn call(&mut self, fi: usize, fun: ExprId, args: &[ExprId], iota: Option<i64>, tp: &[String]) -> Operand {
        match self.eval(fi, fun, iota, tp) {
            Operand::TypeExpr(typ) => {
                let konst = args.first().and_then(|&a| self.eval(fi, a, iota, tp).konst());
                let integer = self.underlying(&typ).and_then(|t| t.basic_kind()).is_some_and(BasicKind::is_integer);
                Operand::Value {
                    typ,
                    konst: konst.filter(|_| integer),
                }
            }
            Operand::Builtin(name) => self.builtin(fi, name, args, iota, tp),
            Operand::Value { typ, .. } => {
                for &a in args {
                    self.eval(fi, a, iota, tp);
                }
                match self.underlying(&typ) {
                    Some(Type::Signature(sig)) => {
                        let result = sig.call_result();
                        // uninstantiated generic result
                        if mentions_type_param(&result) {
                            Operand::Invalid
                        } else {
                            Operand::value(result)
                        }
                    }
                    _ => Operand::Invalid,
                }
            }
            Operand::Invalid => {
                for &a in args {
                    self.eval(fi, a, iota, tp);
                }
                Operand::Invalid
            }
        }
    }

    fn builtin(&mut self, fi: usize, name: &str, args: &[ExprId], iota: Option<i64>, tp: &[String]) -> Operand {
        let first_type = |this: &mut Self| match args.first() {
            Some(&a) => this.type_of_expr(fi, a, tp),
            None => Type::Invalid,
        };
        match name {
            "new" => Operand::value(Type::pointer(first_type(self))),
            "make" => {
                let typ = first_type(self);
                for &a in args.iter().skip(1) {
                    self.eval(fi, a, iota, tp);
                }
                Operand::value(typ)
            }
            _ => {
                let operands: Vec<Operand> = args.iter().map(|&a| self.eval(fi, a, iota, tp)).collect();
                let first = operands.first().map(Operand::value_type).unwrap_or(Type::Invalid);
                match name {
                    "len" | "cap" | "copy" => Operand::value(Type::basic(BasicKind::Int)),
                    "append" => Operand::value(first),
                    "recover" => Operand::value(Type::named(None, "any")),
                    "complex" => Operand::value(match first.basic_kind() {
                        Some(kind) if kind.is_untyped() => Type::basic(BasicKind::UntypedComplex),
                        Some(BasicKind::Float32) => Type::basic(BasicKind::Complex64),
                        _ => Type::basic(BasicKind::Complex128),
                    }),
                    "real" | "imag" => Operand::value(match first.basic_kind() {
                        Some(kind) if kind.is_untyped() => Type::basic(BasicKind::UntypedFloat),
                        Some(BasicKind::Complex64) => Type::basic(BasicKind::Float32),
                        _ => Type::basic(BasicKind::Float64),
                    }),
                    "min" | "max" => {
                        let typ = operands
                            .iter()
                            .map(Operand::value_type)
                            .reduce(|a, b| merge_operand_types(&a, &b))
                            .unwrap_or(Type::Invalid);
                        let values: Option<Vec<i64>> = operands.iter().map(Operand::konst).collect();
                        let konst = values.and_then(|v| {
                            if name == "min" {
                                v.into_iter().min()
                            } else {
                                v.into_iter().max()
                            }
                        });
                        Operand::Value { typ, konst }
                    }
                    _ => Operand::Invalid,
                }
            }
        }
    }

    fn unary(&mut self, fi: usize, op: UnaryOp, x: ExprId, iota: Option<i64>, tp: &[String]) -> Operand {
        let operand = self.eval(fi, x, iota, tp);
        match (op, operand) {
            (UnaryOp::Deref, Operand::TypeExpr(t)) => Operand::TypeExpr(Type::pointer(t)),
            (UnaryOp::Deref, Operand::Value { typ, .. }) => match self.underlying(&typ) {
                Some(Type::Pointer(elem)) => Operand::value(*elem),
                _ => Operand::Invalid,
            },
            (UnaryOp::Addr, Operand::Value { typ, .. }) => Operand::value(Type::pointer(typ)),
            (UnaryOp::Recv, Operand::Value { typ, .. }) => match self.underlying(&typ) {
                Some(Type::Chan { elem, .. }) => Operand::value(*elem),
                _ => Operand::Invalid,
            },
            (UnaryOp::Sub, Operand::Value { typ, konst }) => Operand::Value {
                typ,
                konst: konst.and_then(i64::checked_neg),
            },
            (UnaryOp::Xor, Operand::Value { typ, konst }) => Operand::Value {
                typ,
                konst: konst.map(|v| !v),
            },
            (UnaryOp::Add | UnaryOp::Not, operand @ Operand::Value { .. }) => operand,
            _ => Operand::Invalid,
        }
    }

    fn type_of_expr(&mut self, fi: usize, id: ExprId, tp: &[String]) -> Type {
        match self.eval(fi, id, None, tp) {
            Operand::TypeExpr(t) => t,
            _ => Type::Invalid,
        }
    }

    // ---------------------------------------------------------------------
    // Type queries
    // ---------------------------------------------------------------------

    fn underlying(&mut self, typ: &Type) -> Option<Type> {
        let mut current = typ.clone();
        for _ in 0..super::MAX_UNDERLYING_DEPTH {
            current = match current {
                Type::Named(named) => self.named_underlying(&named)?,
                Type::Invalid => return None,
                other => return Some(other),
            };
        }
        None
    }

    fn named_underlying(&mut self, named: &Named) -> Option<Type> {
        let decl = match named.pkg.as_deref() {
            None => return universe_underlying(&named.name),
            Some(path) if path == self.path => self.local_type(&named.name)?,
            Some(path) => match self.package_by_path(path)?.lookup(&named.name)? {
                Object::TypeName(decl) => decl.clone(),
                _ => return None,
            },
        };
        Some(decl.underlying.substitute(&decl.type_params, &named.args))
    }

    fn package_by_path(&mut self, path: &str) -> Option<Rc<Package>> {
        if let Some(pkg) = self.imported.get(path) {
            return Some(pkg.clone());
        }
        let pkg = self.importer.import(path).ok()?;
        self.imported.insert(path.to_owned(), pkg.clone());
        Some(pkg)
    }

    // ---------------------------------------------------------------------
    // Result
    // ---------------------------------------------------------------------

    fn finish(mut self) -> Result<TypeInfo, CheckFailure> {
        if !self.diags.is_empty() {
            self.diags
                .sort_by(|(fa, a), (fb, b)| (fa, a.line, a.column).cmp(&(fb, b.line, b.column)));
            return Err(CheckFailure {
                diagnostics: self.diags.into_iter().map(|(_, d)| d).collect(),
            });
        }

        let name = self.files.first().map(|f| f.package_name()).unwrap_or_default();
        let mut package = Package::new(self.path, name);

        let names: Vec<(String, DeclSite<'a>)> = self.decls.iter().map(|(n, s)| (n.clone(), *s)).collect();
        for (name, site) in names {
            let object = match site {
                DeclSite::Type { .. } => {
                    let Some(mut decl) = self.local_type(&name) else { continue };
                    for ((base, method), sig) in &self.methods {
                        if *base == name {
                            decl.methods.insert(method.clone(), sig.clone());
                        }
                    }
                    decl.methods.sort_keys();
                    Object::TypeName(decl)
                }
                DeclSite::Value { konst: true, .. } => {
                    let (typ, value) = self.value_type(&name);
                    Object::Const { typ, value }
                }
                DeclSite::Value { .. } => Object::Var {
                    typ: self.value_type(&name).0,
                },
                DeclSite::Func { .. } => Object::Func {
                    sig: self.func_sig(&name),
                },
            };
            package.scope.insert(name, object);
        }
        package.imports = self.imported.keys().cloned().collect();

        let package = Rc::new(package);
        let mut packages = IndexMap::new();
        packages.insert(self.path.to_owned(), package.clone());
        let mut queue: Vec<Rc<Package>> = self.imported.values().cloned().collect();
        while let Some(pkg) = queue.pop() {
            if packages.len() >= MAX_PACKAGE_CLOSURE || packages.contains_key(&pkg.path) {
                continue;
            }
            for dep in &pkg.imports {
                if !packages.contains_key(dep) {
                    if let Ok(found) = self.importer.import(dep) {
                        queue.push(found);
                    }
                }
            }
            packages.insert(pkg.path.clone(), pkg);
        }

        Ok(TypeInfo {
            package,
            packages,
            files: self.out,
        })
    }
}

fn object_type(pkg: &Package, name: &str, obj: &Object, args: Vec<Type>) -> Option<Type> {
    match obj {
        Object::TypeName(decl) if decl.alias => Some(decl.underlying.clone()),
        Object::TypeName(_) => Some(Type::Named(Named {
            pkg: Some(pkg.path.clone()),
            name: name.to_owned(),
            args,
        })),
        _ => None,
    }
}

fn object_operand(pkg: &Package, name: &str, obj: &Object) -> Operand {
    match obj {
        Object::TypeName(_) => object_type(pkg, name, obj, Vec::new()).map_or(Operand::Invalid, Operand::TypeExpr),
        Object::Const { typ, value } => Operand::Value {
            typ: typ.clone(),
            konst: *value,
        },
        Object::Var { typ } => Operand::value(typ.clone()),
        Object::Func { sig } => Operand::value(Type::Signature(sig.clone())),
    }
}

fn binary(op: BinaryOp, x: &Operand, y: &Operand) -> Operand {
    let (Operand::Value { typ: xt, konst: xv }, Operand::Value { typ: yt, konst: yv }) = (x, y) else {
        return Operand::Invalid;
    };
    if op.is_comparison() {
        return Operand::value(Type::basic(BasicKind::UntypedBool));
    }
    if op.is_shift() {
        let konst = match (op, xv, yv) {
            (BinaryOp::Shl, Some(a), Some(b)) => u32::try_from(*b).ok().and_then(|b| a.checked_shl(b)),
            (BinaryOp::Shr, Some(a), Some(b)) => u32::try_from(*b).ok().and_then(|b| a.checked_shr(b)),
            _ => None,
        };
        return Operand::Value { typ: xt.clone(), konst };
    }

    let typ = merge_operand_types(xt, yt);
    let integer = typ.basic_kind().is_some_and(BasicKind::is_integer);
    let konst = match (xv, yv) {
        (Some(a), Some(b)) if integer || typ.basic_kind().is_none() => match op {
            BinaryOp::Add => a.checked_add(*b),
            BinaryOp::Sub => a.checked_sub(*b),
            BinaryOp::Mul => a.checked_mul(*b),
            BinaryOp::Div => a.checked_div(*b),
            BinaryOp::Mod => a.checked_rem(*b),
            BinaryOp::And => Some(a & b),
            BinaryOp::Or => Some(a | b),
            BinaryOp::Xor => Some(a ^ b),
            BinaryOp::AndNot => Some(a & !b),
            _ => None,
        },
        _ => None,
    };
    Operand::Value { typ, konst }
}

/// Result type of a binary operation: untyped operands take the kind of the
/// more general one, a typed operand wins over an untyped one.
fn merge_operand_types(x: &Type, y: &Type) -> Type {
    match (x.basic_kind(), y.basic_kind()) {
        (Some(a), Some(b)) if a.is_untyped() && b.is_untyped() => {
            let rank = |k: BasicKind| match k {
                BasicKind::UntypedInt => 1,
                BasicKind::UntypedRune => 2,
                BasicKind::UntypedFloat => 3,
                BasicKind::UntypedComplex => 4,
                _ => 0,
            };
            Type::basic(if rank(b) > rank(a) { b } else { a })
        }
        _ if x.is_untyped() => y.clone(),
        _ => x.clone(),
    }
}

fn mentions_type_param(typ: &Type) -> bool {
    match typ {
        Type::TypeParam(_) => true,
        Type::Named(n) => n.args.iter().any(mentions_type_param),
        Type::Pointer(e) | Type::Slice(e) | Type::Array { elem: e, .. } | Type::Chan { elem: e, .. } => {
            mentions_type_param(e)
        }
        Type::Map { key, value } => mentions_type_param(key) || mentions_type_param(value),
        Type::Tuple(vars) => vars.iter().any(|v| mentions_type_param(&v.typ)),
        Type::Signature(sig) => sig.params.iter().chain(&sig.results).any(|v| mentions_type_param(&v.typ)),
        _ => false,
    }
}

/// Go integer literal value; `None` on overflow.
fn parse_int(raw: &str) -> Option<i64> {
    let digits: String = raw.chars().filter(|&c| c != '_').collect();
    let lower = digits.to_ascii_lowercase();
    let (radix, body) = if let Some(rest) = lower.strip_prefix("0x") {
        (16, rest)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (2, rest)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (8, rest)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (8, &lower[1..])
    } else {
        (10, lower.as_str())
    };
    i64::from_str_radix(body, radix).ok()
}

/// Name a package is most likely declared with, judging by its path.
fn guess_package_name(path: &str) -> String {
    let mut segments = path.rsplit('/');
    let mut last = segments.next().unwrap_or(path);
    let is_major = |s: &str| s.len() > 1 && s.starts_with('v') && s[1..].bytes().all(|b| b.is_ascii_digit());
    if is_major(last) {
        if let Some(prev) = segments.next() {
            last = prev;
        }
    }
    // gopkg.in/yaml.v3
    if let Some(i) = last.rfind(".v") {
        if is_major(&last[i + 1..]) {
            last = &last[..i];
        }
    }
    let last = last.strip_prefix("go-").unwrap_or(last);
    last.replace(['-', '.'], "_")
}

/// Base type name of a method receiver (`T` in `*T` or `T[K, V]`).
pub(crate) fn receiver_base(file: &ParsedFile, typ: TypeId) -> Option<&str> {
    match &file.arena.types[typ] {
        ast::Type::Pointer { elem } => receiver_base(file, *elem),
        ast::Type::Paren { inner } => receiver_base(file, *inner),
        ast::Type::Named { pkg: None, name, .. } => Some(file.name(*name)),
        _ => None,
    }
}

/// Type parameter names a generic receiver introduces.
fn receiver_type_params(file: &ParsedFile, recv: &ast::FieldList) -> Vec<String> {
    let mut typ = match recv.fields.first() {
        Some(&f) => file.arena.fields[f].typ,
        None => return Vec::new(),
    };
    loop {
        match &file.arena.types[typ] {
            ast::Type::Pointer { elem } => typ = *elem,
            ast::Type::Paren { inner } => typ = *inner,
            ast::Type::Named { args, .. } => {
                return args
                    .iter()
                    .filter_map(|&a| match &file.arena.types[a] {
                        ast::Type::Named {
                            pkg: None,
                            name,
                            args,
                        } if args.is_empty() => Some(file.name(*name).to_owned()),
                        _ => None,
                    })
                    .collect();
            }
            _ => return Vec::new(),
        }
    }
}

/// Implicit field name of an embedded field.
fn embedded_name(file: &ParsedFile, typ: TypeId) -> Option<&str> {
    match &file.arena.types[typ] {
        ast::Type::Pointer { elem } => embedded_name(file, *elem),
        ast::Type::Paren { inner } => embedded_name(file, *inner),
        ast::Type::Named { name, .. } => Some(file.name(*name)),
        _ => None,
    }
}
