//! Rendering syntax-tree types as [`TypeNode`] trees.
//!
//! Children always come from the syntax: the resolver walks the type
//! expression and recurses into its element, key, value, parameter, result
//! and field types. What changes with the mode is the text of each node.
//! Without semantic information a node's signature is the source text it
//! spans; with it the signature is the checked type and `underlying` is
//! filled from [`normalize`].

pub mod normalize;

use go_surface_syntax::ast::{self, Expr, FieldList, InterfaceElem};
use go_surface_syntax::{ExprId, FieldId, ParsedFile, TypeId};

use crate::check::{FileTypes, Type, TypeInfo};
use crate::model::TypeNode;

#[derive(Debug, Clone, Copy)]
struct Semantics<'a> {
    info: &'a TypeInfo,
    types: &'a FileTypes,
}

#[derive(Debug, Clone, Copy)]
pub struct TypeResolver<'a> {
    file: &'a ParsedFile,
    semantics: Option<Semantics<'a>>,
}

impl<'a> TypeResolver<'a> {
    /// Resolver working from source text alone.
    pub fn syntax(file: &'a ParsedFile) -> Self {
        Self { file, semantics: None }
    }

    /// Resolver backed by a successful check; `types` must belong to `file`.
    pub fn resolved(file: &'a ParsedFile, info: &'a TypeInfo, types: &'a FileTypes) -> Self {
        Self {
            file,
            semantics: Some(Semantics { info, types }),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.semantics.is_some()
    }

    pub fn file(&self) -> &'a ParsedFile {
        self.file
    }

    pub fn info(&self) -> Option<&'a TypeInfo> {
        self.semantics.map(|s| s.info)
    }

    /// Signature of a type expression.
    pub fn type_string(&self, id: TypeId) -> String {
        match self.semantics {
            None => self.file.text(self.file.arena.types.span(id)).to_owned(),
            Some(sem) => render(self.file, sem.types.type_of(id), self.file.arena.types.span(id).start),
        }
    }

    /// Signature of an expression's type.
    pub fn expr_string(&self, id: ExprId) -> String {
        match self.semantics {
            None => self.file.text(self.file.arena.exprs.span(id)).to_owned(),
            Some(sem) => render(self.file, sem.types.expr_type(id), self.file.arena.exprs.span(id).start),
        }
    }

    pub fn resolve_type(&self, id: TypeId) -> TypeNode {
        TypeNode {
            name: String::new(),
            signature: self.type_string(id),
            underlying: self.underlying(self.semantics.and_then(|s| s.types.type_of(id))),
            children: self.type_children(id),
        }
    }

    /// Node for the type of an initializer expression.
    pub fn resolve_expr(&self, id: ExprId) -> TypeNode {
        let children = match &self.file.arena.exprs[id] {
            Expr::Type(typ) => self.type_children(*typ),
            Expr::Ident(_) | Expr::Selector { .. } | Expr::BasicLit(_) | Expr::Binary { .. } => Vec::new(),
            other => {
                tracing::debug!(
                    file = %self.file.path,
                    expr = self.file.text(self.file.arena.exprs.span(id)),
                    kind = expr_kind(other),
                    "expression type has no structure to descend into"
                );
                Vec::new()
            }
        };
        TypeNode {
            name: String::new(),
            signature: self.expr_string(id),
            underlying: self.underlying(self.semantics.and_then(|s| s.types.expr_type(id))),
            children,
        }
    }

    /// One node per declared name; an unnamed field or parameter yields a
    /// single node with an empty name.
    pub fn resolve_fields(&self, list: Option<&FieldList>) -> Vec<TypeNode> {
        list.map_or_else(Vec::new, |list| self.resolve_field_ids(&list.fields))
    }

    /// Parameters and results of a function signature.
    pub fn resolve_signature(&self, sig: &ast::Signature) -> (Vec<TypeNode>, Vec<TypeNode>) {
        (self.resolve_fields(Some(&sig.params)), self.resolve_fields(sig.results.as_ref()))
    }

    fn resolve_field_ids(&self, ids: &[FieldId]) -> Vec<TypeNode> {
        let mut out = Vec::with_capacity(ids.len());
        for &id in ids {
            let field = &self.file.arena.fields[id];
            let node = self.resolve_type(field.typ);
            if field.names.is_empty() {
                out.push(node);
                continue;
            }
            for name in &field.names {
                out.push(node.clone().named(self.file.name(*name)));
            }
        }
        out
    }

    fn type_children(&self, id: TypeId) -> Vec<TypeNode> {
        match &self.file.arena.types[id] {
            ast::Type::Func { sig } => {
                let (mut params, results) = self.resolve_signature(sig);
                params.extend(results);
                params
            }
            ast::Type::Array { elem, .. }
            | ast::Type::Slice { elem }
            | ast::Type::Chan { elem, .. }
            | ast::Type::Pointer { elem }
            | ast::Type::Ellipsis { elem } => vec![self.resolve_type(*elem)],
            ast::Type::Map { key, value } => vec![self.resolve_type(*key), self.resolve_type(*value)],
            ast::Type::Struct { fields } => self.resolve_field_ids(fields),
            ast::Type::Interface { elems } => elems
                .iter()
                .flat_map(|elem| match elem {
                    InterfaceElem::Method { sig, .. } => {
                        let (mut params, results) = self.resolve_signature(sig);
                        params.extend(results);
                        params
                    }
                    InterfaceElem::Embed(_) => Vec::new(),
                })
                .collect(),
            ast::Type::Named { args, .. } if args.is_empty() => Vec::new(),
            other => {
                tracing::debug!(
                    file = %self.file.path,
                    typ = self.file.text(self.file.arena.types.span(id)),
                    kind = type_kind(other),
                    "leaving type without children"
                );
                Vec::new()
            }
        }
    }

    fn underlying(&self, typ: Option<&Type>) -> String {
        match (self.semantics, typ) {
            (Some(sem), Some(typ)) => normalize::underlying_signature(sem.info, typ),
            _ => String::new(),
        }
    }
}

fn render(file: &ParsedFile, typ: Option<&Type>, offset: u32) -> String {
    match typ {
        Some(typ) => typ.to_string(),
        None => {
            let (line, column) = file.line_col(offset);
            tracing::debug!(file = %file.path, line, column, "no type recorded");
            String::new()
        }
    }
}

fn type_kind(typ: &ast::Type) -> &'static str {
    match typ {
        ast::Type::Named { .. } => "instantiation",
        ast::Type::Paren { .. } => "parenthesized",
        ast::Type::Union { .. } => "union",
        _ => "other",
    }
}

fn expr_kind(expr: &Expr) -> &'static str {
    match expr {
        Expr::CompositeLit { .. } => "composite literal",
        Expr::FuncLit { .. } => "function literal",
        Expr::Paren { .. } => "parenthesized",
        Expr::Index { .. } => "index",
        Expr::Slice { .. } => "slice",
        Expr::TypeAssert { .. } => "type assertion",
        Expr::Call { .. } => "call",
        Expr::Unary { .. } => "unary",
        _ => "other",
    }
}

#[cfg(test)]
mod tests {
    use go_surface_syntax::ast::{GenDeclKind, Spec, TopLevelDecl, ValueSpec};
    use go_surface_syntax::{parse_source, ParseOptions};

    use super::*;
    use crate::check::{SemanticChecker, SourceChecker};
    use crate::import::ImportChain;

    fn parse(src: &str) -> ParsedFile {
        parse_source("sample.go", src, ParseOptions::default()).unwrap()
    }

    fn value<'f>(file: &'f ParsedFile, name: &str) -> &'f ValueSpec {
        file.root
            .decls
            .iter()
            .filter_map(|d| match d {
                TopLevelDecl::Gen(g) if matches!(g.kind, GenDeclKind::Const | GenDeclKind::Var) => Some(g),
                _ => None,
            })
            .flat_map(|g| &g.specs)
            .find_map(|s| match s {
                Spec::Value(v) if v.names.iter().any(|n| file.name(*n) == name) => Some(v),
                _ => None,
            })
            .unwrap()
    }

    fn sigs(nodes: &[TypeNode]) -> Vec<(&str, &str)> {
        nodes.iter().map(|n| (n.name.as_str(), n.signature.as_str())).collect()
    }

    #[test]
    fn function_children_are_params_then_results() {
        let file = parse("package sample\n\nvar F func(a, b int, s ...string) (n int, err error)\n");
        let node = TypeResolver::syntax(&file).resolve_type(value(&file, "F").typ.unwrap());

        assert_eq!(node.signature, "func(a, b int, s ...string) (n int, err error)");
        assert_eq!(node.underlying, "");
        assert_eq!(
            sigs(&node.children),
            [("a", "int"), ("b", "int"), ("s", "...string"), ("n", "int"), ("err", "error")]
        );
        assert_eq!(sigs(&node.children[2].children), [("", "string")]);
    }

    #[test]
    fn composite_shapes() {
        let file = parse(
            "package sample\n\n\
             var M map[string][]int\n\
             var C chan<- *Point\n\
             var I interface {\n\tRead(p []byte) (int, error)\n\tfmt.Stringer\n}\n\
             var S struct {\n\tX, Y int\n\tio.Reader\n}\n",
        );
        let r = TypeResolver::syntax(&file);

        let m = r.resolve_type(value(&file, "M").typ.unwrap());
        assert_eq!(sigs(&m.children), [("", "string"), ("", "[]int")]);
        assert_eq!(sigs(&m.children[1].children), [("", "int")]);

        let c = r.resolve_type(value(&file, "C").typ.unwrap());
        assert_eq!(c.signature, "chan<- *Point");
        assert_eq!(sigs(&c.children), [("", "*Point")]);
        assert_eq!(sigs(&c.children[0].children), [("", "Point")]);

        let i = r.resolve_type(value(&file, "I").typ.unwrap());
        assert_eq!(sigs(&i.children), [("p", "[]byte"), ("", "int"), ("", "error")]);

        let s = r.resolve_type(value(&file, "S").typ.unwrap());
        assert_eq!(sigs(&s.children), [("X", "int"), ("Y", "int"), ("", "io.Reader")]);
    }

    #[test]
    fn leaves_and_expressions() {
        let file = parse("package sample\n\nvar G List[int]\nvar N = 1 + 2\nvar L = []int{1, 2}\n");
        let r = TypeResolver::syntax(&file);

        let g = r.resolve_type(value(&file, "G").typ.unwrap());
        assert_eq!(g.signature, "List[int]");
        assert!(g.children.is_empty());

        let n = r.resolve_expr(value(&file, "N").values[0]);
        assert_eq!(n.signature, "1 + 2");
        assert!(n.children.is_empty());

        let l = r.resolve_expr(value(&file, "L").values[0]);
        assert_eq!(l.signature, "[]int{1, 2}");
        assert!(l.children.is_empty());
    }

    #[test]
    fn resolved_signatures_and_underlying() {
        let file = parse(
            "package sample\n\n\
             type ID uintptr\n\
             type Names []string\n\
             type Point struct{ X int }\n\
             var A ID\n\
             var B Names\n\
             var P *Point\n\
             var E error\n\
             var F func(int) string\n\
             var V = 3\n\
             const K = 'x'\n",
        );
        let info = SourceChecker::strict()
            .check("sample", &[&file], &ImportChain::new())
            .unwrap();
        let r = TypeResolver::resolved(&file, &info, info.file(0).unwrap());
        let typed = |name: &str| r.resolve_type(value(&file, name).typ.unwrap());
        let init = |name: &str| r.resolve_expr(value(&file, name).values[0]);

        let a = typed("A");
        assert_eq!((a.signature.as_str(), a.underlying.as_str()), ("sample.ID", "uint64"));
        let b = typed("B");
        assert_eq!((b.signature.as_str(), b.underlying.as_str()), ("sample.Names", "[]string"));
        let p = typed("P");
        assert_eq!((p.signature.as_str(), p.underlying.as_str()), ("*sample.Point", "*sample.Point"));
        assert_eq!(sigs(&p.children), [("", "sample.Point")]);
        assert_eq!(p.children[0].underlying, "struct{X int}");
        let e = typed("E");
        assert_eq!((e.signature.as_str(), e.underlying.as_str()), ("error", "error"));

        let f = typed("F");
        assert_eq!(f.signature, "func(int) string");
        assert_eq!(sigs(&f.children), [("", "int"), ("", "string")]);

        let v = init("V");
        assert_eq!((v.signature.as_str(), v.underlying.as_str()), ("int", "int"));
        let k = init("K");
        assert_eq!((k.signature.as_str(), k.underlying.as_str()), ("untyped rune", "int32"));
    }
}
