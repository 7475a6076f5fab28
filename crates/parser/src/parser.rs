//! Recursive-descent parser for Go declarations.
//!
//! Everything a package exposes is parsed: package clause, imports, const,
//! var and type declarations, function signatures and package-level
//! initializer expressions. Function bodies and composite literal elements are
//! skipped by brace matching.

use smallvec::{smallvec, SmallVec};

use crate::ast::*;
use crate::error::Diag;
use crate::lexer::{Lexed, Tok, Token};
use crate::line_index::LineIndex;
use crate::parser_support::{self, ParamDecl};

type PResult<T> = Result<T, Diag>;

pub(crate) struct ParseOutput {
    pub root: SourceFile,
    pub arena: AstArena,
    pub interner: Interner,
    pub diags: Vec<Diag>,
}

pub(crate) struct Parser<'src, 'a> {
    tokens: Vec<Token<'src>>,
    pos: usize,
    last_end: u32,
    lines: &'a LineIndex,
    arena: AstArena,
    interner: Interner,
    diags: Vec<Diag>,
    /// Doc comment group ending on the line just above each token
    lead: Vec<Option<CommentGroupId>>,
    groups: Vec<CommentGroupId>,
}

#[inline]
fn starts_type(tok: Tok<'_>) -> bool {
    matches!(
        tok,
        Tok::Ident(_)
            | Tok::Star
            | Tok::LBrack
            | Tok::LParen
            | Tok::KwFunc
            | Tok::KwMap
            | Tok::KwChan
            | Tok::KwStruct
            | Tok::KwInterface
            | Tok::Arrow
    )
}

#[inline]
fn binary_op(tok: Tok<'_>) -> Option<BinaryOp> {
    Some(match tok {
        Tok::Plus => BinaryOp::Add,
        Tok::Minus => BinaryOp::Sub,
        Tok::Star => BinaryOp::Mul,
        Tok::Slash => BinaryOp::Div,
        Tok::Percent => BinaryOp::Mod,
        Tok::Amp => BinaryOp::And,
        Tok::Pipe => BinaryOp::Or,
        Tok::Caret => BinaryOp::Xor,
        Tok::Shl => BinaryOp::Shl,
        Tok::Shr => BinaryOp::Shr,
        Tok::AndNot => BinaryOp::AndNot,
        Tok::LAnd => BinaryOp::LAnd,
        Tok::LOr => BinaryOp::LOr,
        Tok::EqEq => BinaryOp::Eq,
        Tok::NotEq => BinaryOp::Ne,
        Tok::Lt => BinaryOp::Lt,
        Tok::Le => BinaryOp::Le,
        Tok::Gt => BinaryOp::Gt,
        Tok::Ge => BinaryOp::Ge,
        _ => return None,
    })
}

impl<'src, 'a> Parser<'src, 'a> {
    pub fn new(lexed: Lexed<'src>, lines: &'a LineIndex, with_comments: bool) -> Self {
        let Lexed {
            tokens,
            comments,
            diags,
        } = lexed;
        let mut p = Self {
            lead: vec![None; tokens.len()],
            tokens,
            pos: 0,
            last_end: 0,
            lines,
            arena: AstArena::new(),
            interner: Interner::new(),
            diags,
            groups: Vec::new(),
        };
        if with_comments {
            p.group_comments(&comments);
        }
        p
    }

    // =========================================================================
    // Comment grouping
    // =========================================================================

    #[inline]
    fn line(&self, offset: u32) -> u32 {
        self.lines.line(offset)
    }

    fn comment_end_line(&self, c: Comment) -> u32 {
        self.line(c.span.end.saturating_sub(1).max(c.span.start))
    }

    /// Splits the comments between each pair of tokens into groups.
    ///
    /// A comment starting on the previous token's line opens a trailing group
    /// restricted to that line. Remaining comments group while each starts at
    /// most one line below the previous one. The last group is the token's
    /// lead comment when it ends on the line right above the token.
    fn group_comments(&mut self, comments: &[Comment]) {
        let mut ci = 0;
        for ti in 0..self.tokens.len() {
            let tok_start = self.tokens[ti].span.start;
            let begin = ci;
            while ci < comments.len() && comments[ci].span.start < tok_start {
                ci += 1;
            }
            if begin == ci {
                continue;
            }
            let run = &comments[begin..ci];

            let mut k = 0;
            if ti > 0 {
                let prev_line = self.line(self.tokens[ti - 1].span.start);
                if self.line(run[0].span.start) == prev_line {
                    k = self.take_group(run, 0, 0).2;
                }
            }

            let mut last = None;
            while k < run.len() {
                let (group, end_line, next) = self.take_group(run, k, 1);
                last = Some((group, end_line));
                k = next;
            }
            if let Some((group, end_line)) = last {
                if end_line + 1 == self.line(tok_start) {
                    self.lead[ti] = Some(group);
                }
            }
        }
    }

    fn take_group(&mut self, run: &[Comment], start: usize, n: u32) -> (CommentGroupId, u32, usize) {
        let mut end_line = self.line(run[start].span.start);
        let mut comments: SmallVec<[Comment; 2]> = SmallVec::new();
        let mut k = start;
        while k < run.len() && self.line(run[k].span.start) <= end_line + n {
            comments.push(run[k]);
            end_line = self.comment_end_line(run[k]);
            k += 1;
        }
        let span = run[start].span.to(run[k - 1].span);
        let id = self
            .arena
            .comment_groups
            .alloc(CommentGroup { comments }, span);
        self.groups.push(id);
        (id, end_line, k)
    }

    #[inline]
    fn lead_here(&self) -> Option<CommentGroupId> {
        self.lead.get(self.pos).copied().flatten()
    }

    // =========================================================================
    // Token cursor
    // =========================================================================

    #[inline]
    fn tok(&self) -> Tok<'src> {
        self.tokens[self.pos].tok
    }

    #[inline]
    fn peek(&self, n: usize) -> Tok<'src> {
        self.tokens.get(self.pos + n).map_or(Tok::Eof, |t| t.tok)
    }

    #[inline]
    fn span(&self) -> Span {
        self.tokens[self.pos].span
    }

    #[inline]
    fn at(&self, tok: Tok<'_>) -> bool {
        self.tok() == tok
    }

    #[inline]
    fn at_eof(&self) -> bool {
        self.at(Tok::Eof)
    }

    fn bump(&mut self) -> Token<'src> {
        let t = self.tokens[self.pos];
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        self.last_end = self.last_end.max(t.span.end);
        t
    }

    fn eat(&mut self, tok: Tok<'_>) -> Option<Span> {
        if self.at(tok) {
            Some(self.bump().span)
        } else {
            None
        }
    }

    fn error(&self, expected: &str) -> Diag {
        Diag::parse(self.span(), format!("expected {expected}, found {}", self.tok()))
    }

    fn expect(&mut self, tok: Tok<'_>, what: &str) -> PResult<Span> {
        self.eat(tok).ok_or_else(|| self.error(what))
    }

    /// `;` may be omitted before a closing `)` or `}`.
    fn expect_semi(&mut self) -> PResult<()> {
        match self.tok() {
            Tok::Semi => {
                self.bump();
                Ok(())
            }
            Tok::RParen | Tok::RBrace | Tok::Eof => Ok(()),
            _ => Err(self.error("';'")),
        }
    }

    fn ident(&mut self) -> PResult<IdentName> {
        match self.tok() {
            Tok::Ident(s) => {
                let pos = self.bump().span;
                Ok(IdentName {
                    sym: self.interner.intern(s),
                    pos,
                })
            }
            _ => Err(self.error("identifier")),
        }
    }

    fn ident_list(&mut self) -> PResult<Names> {
        let mut names: Names = smallvec![self.ident()?];
        while self.eat(Tok::Comma).is_some() {
            names.push(self.ident()?);
        }
        Ok(names)
    }

    /// True when the `[ ... ]` group at `offset` is followed by a type,
    /// i.e. it is an array or slice type rather than type arguments.
    fn bracket_then_type(&self, offset: usize) -> bool {
        let mut depth = 0usize;
        for (i, t) in self.tokens.iter().enumerate().skip(self.pos + offset) {
            match t.tok {
                Tok::LBrack => depth += 1,
                Tok::RBrack => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return self.tokens.get(i + 1).is_some_and(|n| starts_type(n.tok));
                    }
                }
                Tok::Eof => return false,
                _ => {}
            }
        }
        false
    }

    /// Skips a `{ ... }` block, returning its span.
    fn skip_braces(&mut self) -> PResult<Span> {
        let open = self.expect(Tok::LBrace, "'{'")?;
        let mut depth = 1usize;
        loop {
            match self.tok() {
                Tok::LBrace => depth += 1,
                Tok::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        let close = self.bump().span;
                        return Ok(open.to(close));
                    }
                }
                Tok::Eof => {
                    return Err(Diag::parse(open, "unbalanced braces"));
                }
                _ => {}
            }
            self.bump();
        }
    }

    fn alloc_type(&mut self, ty: Type, start: u32) -> TypeId {
        let span = Span {
            start,
            end: self.last_end.max(start),
        };
        self.arena.types.alloc(ty, span)
    }

    fn alloc_expr(&mut self, expr: Expr, start: u32) -> ExprId {
        let span = Span {
            start,
            end: self.last_end.max(start),
        };
        self.arena.exprs.alloc(expr, span)
    }

    // =========================================================================
    // File and declarations
    // =========================================================================

    pub fn parse_file(mut self) -> ParseOutput {
        let doc = self.lead_here();
        let package_pos = self.span();
        let name = match self.package_clause() {
            Ok(name) => name,
            Err(diag) => {
                self.diags.push(diag);
                let sym = self.interner.intern("_");
                let root = SourceFile {
                    package_pos,
                    name: IdentName {
                        sym,
                        pos: package_pos,
                    },
                    doc,
                    decls: Vec::new(),
                    comments: std::mem::take(&mut self.groups),
                };
                return self.finish(root);
            }
        };

        let mut decls = Vec::new();
        let mut past_imports = false;
        while !self.at_eof() {
            match self.top_level_decl(past_imports) {
                Ok(Some(decl)) => {
                    past_imports |= !matches!(
                        &decl,
                        TopLevelDecl::Gen(GenDecl {
                            kind: GenDeclKind::Import,
                            ..
                        })
                    );
                    decls.push(decl);
                }
                Ok(None) => {}
                Err(diag) => {
                    self.diags.push(diag);
                    self.sync_top_level();
                }
            }
        }

        let root = SourceFile {
            package_pos,
            name,
            doc,
            decls,
            comments: std::mem::take(&mut self.groups),
        };
        self.finish(root)
    }

    fn package_clause(&mut self) -> PResult<IdentName> {
        self.expect(Tok::KwPackage, "'package'")?;
        let name = self.ident()?;
        self.expect_semi()?;
        Ok(name)
    }

    fn finish(mut self, root: SourceFile) -> ParseOutput {
        self.diags.sort_by_key(|d| d.span.start);
        ParseOutput {
            root,
            arena: self.arena,
            interner: self.interner,
            diags: self.diags,
        }
    }

    fn sync_top_level(&mut self) {
        self.bump();
        while !matches!(
            self.tok(),
            Tok::KwConst | Tok::KwVar | Tok::KwType | Tok::KwFunc | Tok::KwImport | Tok::Eof
        ) {
            self.bump();
        }
    }

    fn top_level_decl(&mut self, past_imports: bool) -> PResult<Option<TopLevelDecl>> {
        let decl = match self.tok() {
            Tok::Semi => {
                self.bump();
                return Ok(None);
            }
            Tok::KwImport => {
                if past_imports {
                    self.diags.push(Diag::parse(
                        self.span(),
                        "imports must appear before other declarations",
                    ));
                }
                TopLevelDecl::Gen(self.gen_decl(GenDeclKind::Import)?)
            }
            Tok::KwConst => TopLevelDecl::Gen(self.gen_decl(GenDeclKind::Const)?),
            Tok::KwVar => TopLevelDecl::Gen(self.gen_decl(GenDeclKind::Var)?),
            Tok::KwType => TopLevelDecl::Gen(self.gen_decl(GenDeclKind::Type)?),
            Tok::KwFunc => TopLevelDecl::Func(self.func_decl()?),
            _ => return Err(self.error("declaration")),
        };
        Ok(Some(decl))
    }

    fn gen_decl(&mut self, kind: GenDeclKind) -> PResult<GenDecl> {
        let doc = self.lead_here();
        let kw_pos = self.bump().span;
        let mut specs = Vec::new();

        let grouped = self.eat(Tok::LParen).is_some();
        if grouped {
            let mut iota = 0;
            while !self.at(Tok::RParen) && !self.at_eof() {
                let spec_doc = self.lead_here();
                specs.push(self.spec(kind, spec_doc, iota)?);
                iota += 1;
                self.expect_semi()?;
            }
            self.expect(Tok::RParen, "')'")?;
        } else {
            specs.push(self.spec(kind, None, 0)?);
        }
        self.expect_semi()?;

        Ok(GenDecl {
            doc,
            kw_pos,
            kind,
            grouped,
            specs,
        })
    }

    fn spec(&mut self, kind: GenDeclKind, doc: Option<CommentGroupId>, iota: u32) -> PResult<Spec> {
        match kind {
            GenDeclKind::Import => self.import_spec(doc).map(Spec::Import),
            GenDeclKind::Const | GenDeclKind::Var => self.value_spec(kind, doc, iota).map(Spec::Value),
            GenDeclKind::Type => self.type_spec(doc).map(Spec::Type),
        }
    }

    fn import_spec(&mut self, doc: Option<CommentGroupId>) -> PResult<ImportSpec> {
        let name = match self.tok() {
            Tok::Dot => Some(ImportName::Dot(self.bump().span)),
            Tok::Ident("_") => Some(ImportName::Blank(self.bump().span)),
            Tok::Ident(_) => Some(ImportName::Name(self.ident()?)),
            _ => None,
        };
        let path = match self.tok() {
            Tok::StringLit(_) | Tok::RawStringLit(_) => StringLit {
                raw: self.bump().span,
            },
            _ => return Err(self.error("import path")),
        };
        Ok(ImportSpec { doc, name, path })
    }

    fn value_spec(
        &mut self,
        kind: GenDeclKind,
        doc: Option<CommentGroupId>,
        iota: u32,
    ) -> PResult<ValueSpec> {
        let start = self.span();
        let names = self.ident_list()?;
        let typ = if matches!(self.tok(), Tok::Assign | Tok::Semi | Tok::RParen | Tok::Eof) {
            None
        } else {
            Some(self.parse_type()?)
        };
        let values = if self.eat(Tok::Assign).is_some() {
            self.expr_list()?
        } else {
            Vec::new()
        };

        match kind {
            GenDeclKind::Var if typ.is_none() && values.is_empty() => {
                return Err(Diag::parse(start, "missing variable type or initialization"));
            }
            GenDeclKind::Const if values.is_empty() && (iota == 0 || typ.is_some()) => {
                return Err(Diag::parse(start, "missing init expr for const declaration"));
            }
            _ => {}
        }

        Ok(ValueSpec {
            doc,
            names,
            typ,
            values,
            iota,
        })
    }

    fn type_spec(&mut self, doc: Option<CommentGroupId>) -> PResult<TypeSpec> {
        let name = self.ident()?;
        let type_params = if self.at(Tok::LBrack) && self.looks_like_type_params() {
            self.type_params()?
        } else {
            Vec::new()
        };
        let alias = self.eat(Tok::Assign).is_some();
        let typ = self.parse_type()?;
        Ok(TypeSpec {
            doc,
            name,
            type_params,
            alias,
            typ,
        })
    }

    /// `type T[P any]` versus `type T [N]int`.
    fn looks_like_type_params(&self) -> bool {
        matches!(self.peek(1), Tok::Ident(_))
            && matches!(
                self.peek(2),
                Tok::Ident(_)
                    | Tok::Comma
                    | Tok::LBrack
                    | Tok::Tilde
                    | Tok::KwInterface
                    | Tok::KwFunc
                    | Tok::KwMap
                    | Tok::KwChan
                    | Tok::KwStruct
                    | Tok::Arrow
            )
    }

    fn type_params(&mut self) -> PResult<Vec<TypeParamDecl>> {
        self.expect(Tok::LBrack, "'['")?;
        let mut out = Vec::new();
        while !self.at(Tok::RBrack) && !self.at_eof() {
            let names = self.ident_list()?;
            let constraint = self.type_elem()?;
            out.push(TypeParamDecl { names, constraint });
            if self.eat(Tok::Comma).is_none() {
                break;
            }
        }
        self.expect(Tok::RBrack, "']'")?;
        Ok(out)
    }

    fn func_decl(&mut self) -> PResult<FuncDecl> {
        let doc = self.lead_here();
        let func_pos = self.bump().span;
        let recv = if self.at(Tok::LParen) {
            Some(self.params()?)
        } else {
            None
        };
        let name = self.ident()?;
        let type_params = if recv.is_none() && self.at(Tok::LBrack) {
            self.type_params()?
        } else {
            Vec::new()
        };
        let sig = self.signature()?;
        let body = if self.at(Tok::LBrace) {
            Some(self.skip_braces()?)
        } else {
            None
        };
        self.expect_semi()?;

        Ok(FuncDecl {
            doc,
            func_pos,
            recv,
            name,
            type_params,
            sig,
            body,
        })
    }

    // =========================================================================
    // Signatures
    // =========================================================================

    fn signature(&mut self) -> PResult<Signature> {
        let params = self.params()?;
        let results = self.results()?;
        Ok(Signature { params, results })
    }

    fn results(&mut self) -> PResult<Option<FieldList>> {
        if self.at(Tok::LParen) {
            return self.params().map(Some);
        }
        if !starts_type(self.tok()) {
            return Ok(None);
        }
        let typ = self.parse_type()?;
        let span = self.arena.types.span(typ);
        let field = self.arena.fields.alloc(
            Field {
                doc: None,
                names: Names::new(),
                typ,
                tag: None,
                embedded: false,
            },
            span,
        );
        Ok(Some(FieldList {
            span,
            fields: vec![field],
        }))
    }

    fn params(&mut self) -> PResult<FieldList> {
        let open = self.expect(Tok::LParen, "'('")?;
        let mut entries = Vec::new();
        while !self.at(Tok::RParen) && !self.at_eof() {
            entries.push(self.param_entry()?);
            if self.eat(Tok::Comma).is_none() {
                break;
            }
        }
        let close = self.expect(Tok::RParen, "')'")?;
        let fields = parser_support::resolve_param_list(&mut self.arena, entries);
        Ok(FieldList {
            span: open.to(close),
            fields,
        })
    }

    fn param_entry(&mut self) -> PResult<ParamDecl> {
        let start = self.span().start;
        let (names, typ) = match self.tok() {
            Tok::Ident(_) => match self.peek(1) {
                Tok::Comma | Tok::RParen => {
                    let name = self.ident()?;
                    return Ok(ParamDecl {
                        names: smallvec![name],
                        typ: None,
                        span: name.pos,
                    });
                }
                Tok::Dot => (Names::new(), self.param_type()?),
                Tok::LBrack if !self.bracket_then_type(1) => (Names::new(), self.param_type()?),
                _ => {
                    let name = self.ident()?;
                    (smallvec![name], self.param_type()?)
                }
            },
            _ => (Names::new(), self.param_type()?),
        };
        Ok(ParamDecl {
            names,
            typ: Some(typ),
            span: Span {
                start,
                end: self.last_end,
            },
        })
    }

    fn param_type(&mut self) -> PResult<TypeId> {
        let start = self.span().start;
        if self.eat(Tok::Ellipsis).is_some() {
            let elem = self.parse_type()?;
            return Ok(self.alloc_type(Type::Ellipsis { elem }, start));
        }
        self.parse_type()
    }

    // =========================================================================
    // Types
    // =========================================================================

    pub(crate) fn parse_type(&mut self) -> PResult<TypeId> {
        let start = self.span().start;
        let ty = match self.tok() {
            Tok::Ident(_) => return self.type_name(),
            Tok::Star => {
                self.bump();
                Type::Pointer {
                    elem: self.parse_type()?,
                }
            }
            Tok::LBrack => {
                self.bump();
                if self.eat(Tok::RBrack).is_some() {
                    Type::Slice {
                        elem: self.parse_type()?,
                    }
                } else if self.at(Tok::Ellipsis) && self.peek(1) == Tok::RBrack {
                    self.bump();
                    self.bump();
                    Type::Array {
                        len: None,
                        elem: self.parse_type()?,
                    }
                } else {
                    let len = self.expr()?;
                    self.expect(Tok::RBrack, "']'")?;
                    Type::Array {
                        len: Some(len),
                        elem: self.parse_type()?,
                    }
                }
            }
            Tok::KwMap => {
                self.bump();
                self.expect(Tok::LBrack, "'['")?;
                let key = self.parse_type()?;
                self.expect(Tok::RBrack, "']'")?;
                let value = self.parse_type()?;
                Type::Map { key, value }
            }
            Tok::KwChan => {
                self.bump();
                let dir = if self.eat(Tok::Arrow).is_some() {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                Type::Chan {
                    dir,
                    elem: self.parse_type()?,
                }
            }
            Tok::Arrow => {
                self.bump();
                self.expect(Tok::KwChan, "'chan'")?;
                Type::Chan {
                    dir: ChanDir::Recv,
                    elem: self.parse_type()?,
                }
            }
            Tok::KwFunc => {
                self.bump();
                Type::Func {
                    sig: self.signature()?,
                }
            }
            Tok::KwStruct => self.struct_type()?,
            Tok::KwInterface => self.interface_type()?,
            Tok::LParen => {
                self.bump();
                let inner = self.parse_type()?;
                self.expect(Tok::RParen, "')'")?;
                Type::Paren { inner }
            }
            _ => return Err(self.error("type")),
        };
        Ok(self.alloc_type(ty, start))
    }

    /// `Name`, `pkg.Name`, optionally followed by type arguments.
    fn type_name(&mut self) -> PResult<TypeId> {
        let start = self.span().start;
        let first = self.ident()?;
        let (pkg, name) = if self.eat(Tok::Dot).is_some() {
            (Some(first), self.ident()?)
        } else {
            (None, first)
        };
        let mut args = Vec::new();
        if self.eat(Tok::LBrack).is_some() {
            while !self.at(Tok::RBrack) && !self.at_eof() {
                args.push(self.parse_type()?);
                if self.eat(Tok::Comma).is_none() {
                    break;
                }
            }
            self.expect(Tok::RBrack, "']'")?;
        }
        Ok(self.alloc_type(Type::Named { pkg, name, args }, start))
    }

    fn struct_type(&mut self) -> PResult<Type> {
        self.bump();
        self.expect(Tok::LBrace, "'{'")?;
        let mut fields = Vec::new();
        while !self.at(Tok::RBrace) && !self.at_eof() {
            fields.push(self.field_decl()?);
            self.expect_semi()?;
        }
        self.expect(Tok::RBrace, "'}'")?;
        Ok(Type::Struct { fields })
    }

    fn field_decl(&mut self) -> PResult<FieldId> {
        let start = self.span().start;
        let doc = self.lead_here();

        let (names, typ, embedded) = match self.tok() {
            Tok::Star => (Names::new(), self.parse_type()?, true),
            Tok::Ident(_) => match self.peek(1) {
                Tok::Dot | Tok::Semi | Tok::RBrace | Tok::StringLit(_) | Tok::RawStringLit(_) => {
                    (Names::new(), self.type_name()?, true)
                }
                Tok::LBrack if !self.bracket_then_type(1) => (Names::new(), self.type_name()?, true),
                _ => {
                    let names = self.ident_list()?;
                    (names, self.parse_type()?, false)
                }
            },
            _ => return Err(self.error("field name or embedded type")),
        };

        let tag = match self.tok() {
            Tok::StringLit(_) | Tok::RawStringLit(_) => Some(StringLit {
                raw: self.bump().span,
            }),
            _ => None,
        };

        let span = Span {
            start,
            end: self.last_end,
        };
        Ok(self.arena.fields.alloc(
            Field {
                doc,
                names,
                typ,
                tag,
                embedded,
            },
            span,
        ))
    }

    fn interface_type(&mut self) -> PResult<Type> {
        self.bump();
        self.expect(Tok::LBrace, "'{'")?;
        let mut elems = Vec::new();
        while !self.at(Tok::RBrace) && !self.at_eof() {
            let elem = if matches!(self.tok(), Tok::Ident(_)) && self.peek(1) == Tok::LParen {
                let doc = self.lead_here();
                let name = self.ident()?;
                let sig = self.signature()?;
                InterfaceElem::Method { doc, name, sig }
            } else {
                InterfaceElem::Embed(self.type_elem()?)
            };
            elems.push(elem);
            self.expect_semi()?;
        }
        self.expect(Tok::RBrace, "'}'")?;
        Ok(Type::Interface { elems })
    }

    /// Constraint element: a type or a union of `~`-able terms.
    fn type_elem(&mut self) -> PResult<TypeId> {
        let start = self.span().start;
        let first = self.type_term()?;
        if !first.tilde && !self.at(Tok::Pipe) {
            return Ok(first.typ);
        }
        let mut terms = vec![first];
        while self.eat(Tok::Pipe).is_some() {
            terms.push(self.type_term()?);
        }
        Ok(self.alloc_type(Type::Union { terms }, start))
    }

    fn type_term(&mut self) -> PResult<TypeTerm> {
        let tilde = self.eat(Tok::Tilde).is_some();
        let typ = self.parse_type()?;
        Ok(TypeTerm { tilde, typ })
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn expr_list(&mut self) -> PResult<Vec<ExprId>> {
        let mut out = vec![self.expr()?];
        while self.eat(Tok::Comma).is_some() {
            out.push(self.expr()?);
        }
        Ok(out)
    }

    pub(crate) fn expr(&mut self) -> PResult<ExprId> {
        self.binary_expr(1)
    }

    fn binary_expr(&mut self, min_prec: u8) -> PResult<ExprId> {
        let start = self.span().start;
        let mut x = self.unary_expr()?;
        while let Some(op) = binary_op(self.tok()) {
            if op.precedence() < min_prec {
                break;
            }
            self.bump();
            let y = self.binary_expr(op.precedence() + 1)?;
            x = self.alloc_expr(Expr::Binary { op, x, y }, start);
        }
        Ok(x)
    }

    fn unary_expr(&mut self) -> PResult<ExprId> {
        let start = self.span().start;
        let op = match self.tok() {
            Tok::Plus => UnaryOp::Add,
            Tok::Minus => UnaryOp::Sub,
            Tok::Bang => UnaryOp::Not,
            Tok::Caret => UnaryOp::Xor,
            Tok::Star => UnaryOp::Deref,
            Tok::Amp => UnaryOp::Addr,
            Tok::Arrow if self.peek(1) != Tok::KwChan => UnaryOp::Recv,
            _ => return self.primary_expr(),
        };
        self.bump();
        let x = self.unary_expr()?;
        Ok(self.alloc_expr(Expr::Unary { op, x }, start))
    }

    fn primary_expr(&mut self) -> PResult<ExprId> {
        let start = self.span().start;
        let mut x = self.operand()?;
        loop {
            let expr = match self.tok() {
                Tok::Dot => {
                    self.bump();
                    match self.tok() {
                        Tok::Ident(_) => Expr::Selector {
                            x,
                            sel: self.ident()?,
                        },
                        Tok::LParen => {
                            self.bump();
                            let typ = if self.eat(Tok::KwType).is_some() {
                                None
                            } else {
                                Some(self.parse_type()?)
                            };
                            self.expect(Tok::RParen, "')'")?;
                            Expr::TypeAssert { x, typ }
                        }
                        _ => return Err(self.error("selector or type assertion")),
                    }
                }
                Tok::LBrack => {
                    self.bump();
                    self.index_or_slice(x)?
                }
                Tok::LParen => {
                    self.bump();
                    let mut args = Vec::new();
                    let mut ellipsis = false;
                    while !self.at(Tok::RParen) && !self.at_eof() {
                        args.push(self.expr()?);
                        if self.eat(Tok::Ellipsis).is_some() {
                            ellipsis = true;
                        }
                        if self.eat(Tok::Comma).is_none() {
                            break;
                        }
                    }
                    self.expect(Tok::RParen, "')'")?;
                    Expr::Call {
                        fun: x,
                        args,
                        ellipsis,
                    }
                }
                Tok::LBrace if self.is_literal_type(x) => {
                    let body = self.skip_braces()?;
                    Expr::CompositeLit { typ: Some(x), body }
                }
                _ => break,
            };
            x = self.alloc_expr(expr, start);
        }
        Ok(x)
    }

    fn index_or_slice(&mut self, x: ExprId) -> PResult<Expr> {
        let first = if self.at(Tok::Colon) {
            None
        } else {
            Some(self.expr()?)
        };

        if self.at(Tok::Colon) {
            let mut parts = [first, None, None];
            let mut colons = 0;
            while colons < 2 && self.eat(Tok::Colon).is_some() {
                colons += 1;
                if !self.at(Tok::Colon) && !self.at(Tok::RBrack) {
                    parts[colons] = Some(self.expr()?);
                }
            }
            self.expect(Tok::RBrack, "']'")?;
            let [lo, hi, max] = parts;
            return Ok(Expr::Slice { x, lo, hi, max });
        }

        let mut indices: Vec<ExprId> = first.into_iter().collect();
        while self.eat(Tok::Comma).is_some() {
            if self.at(Tok::RBrack) {
                break;
            }
            indices.push(self.expr()?);
        }
        self.expect(Tok::RBrack, "']'")?;
        Ok(Expr::Index { x, indices })
    }

    fn is_literal_type(&self, x: ExprId) -> bool {
        match &self.arena.exprs[x] {
            Expr::Ident(_) => true,
            Expr::Selector { x, .. } => matches!(self.arena.exprs[*x], Expr::Ident(_)),
            Expr::Index { x, .. } => matches!(
                self.arena.exprs[*x],
                Expr::Ident(_) | Expr::Selector { .. }
            ),
            Expr::Type(t) => matches!(
                self.arena.types[*t],
                Type::Array { .. } | Type::Slice { .. } | Type::Map { .. } | Type::Struct { .. } | Type::Named { .. }
            ),
            _ => false,
        }
    }

    fn operand(&mut self) -> PResult<ExprId> {
        let start = self.span().start;
        let lit_kind = match self.tok() {
            Tok::IntLit(_) => Some(BasicLitKind::Int),
            Tok::FloatLit(_) => Some(BasicLitKind::Float),
            Tok::ImagLit(_) => Some(BasicLitKind::Imag),
            Tok::RuneLit(_) => Some(BasicLitKind::Rune),
            Tok::StringLit(_) | Tok::RawStringLit(_) => Some(BasicLitKind::String),
            _ => None,
        };
        if let Some(kind) = lit_kind {
            let raw = self.bump().span;
            return Ok(self.alloc_expr(Expr::BasicLit(BasicLit { kind, raw }), start));
        }

        let expr = match self.tok() {
            Tok::Ident(_) => Expr::Ident(self.ident()?),
            Tok::LParen => {
                self.bump();
                let inner = self.expr()?;
                self.expect(Tok::RParen, "')'")?;
                Expr::Paren { inner }
            }
            Tok::KwFunc => {
                self.bump();
                let sig = self.signature()?;
                if self.at(Tok::LBrace) {
                    let body = self.skip_braces()?;
                    Expr::FuncLit { sig, body }
                } else {
                    Expr::Type(self.alloc_type(Type::Func { sig }, start))
                }
            }
            Tok::LBrack | Tok::KwMap | Tok::KwChan | Tok::KwStruct | Tok::KwInterface | Tok::Arrow => {
                Expr::Type(self.parse_type()?)
            }
            _ => return Err(self.error("expression")),
        };
        Ok(self.alloc_expr(expr, start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse(src: &str) -> ParseOutput {
        let lines = LineIndex::new(src);
        Parser::new(tokenize(src), &lines, true).parse_file()
    }

    #[test]
    fn parses_package_clause() {
        let out = parse("package foo\n");
        assert!(out.diags.is_empty());
        assert_eq!(out.interner.resolve(out.root.name.sym), "foo");
        assert!(out.root.decls.is_empty());
    }

    #[test]
    fn missing_package_is_an_error() {
        let out = parse("func f() {}\n");
        assert_eq!(out.diags.len(), 1);
        assert!(out.diags[0].message.contains("'package'"));
    }

    #[test]
    fn groups_parameters_by_name() {
        let out = parse("package p\nfunc f(a, b int, c ...string) (x int, err error)\n");
        assert!(out.diags.is_empty(), "{:?}", out.diags);
        let TopLevelDecl::Func(f) = &out.root.decls[0] else {
            panic!("expected func");
        };
        assert_eq!(f.sig.params.fields.len(), 2);
        let first = &out.arena.fields[f.sig.params.fields[0]];
        assert_eq!(first.names.len(), 2);
        let last = &out.arena.fields[f.sig.params.fields[1]];
        assert!(matches!(out.arena.types[last.typ], Type::Ellipsis { .. }));
        assert_eq!(f.sig.results.as_ref().map(|r| r.fields.len()), Some(2));
    }

    #[test]
    fn anonymous_parameters_stay_types() {
        let out = parse("package p\nfunc f(int, []string, io.Reader)\n");
        let TopLevelDecl::Func(f) = &out.root.decls[0] else {
            panic!("expected func");
        };
        assert_eq!(f.sig.params.fields.len(), 3);
        for &field in &f.sig.params.fields {
            assert!(out.arena.fields[field].names.is_empty());
        }
        assert!(f.body.is_none());
    }

    #[test]
    fn distinguishes_type_params_from_arrays() {
        let out = parse("package p\ntype A [N]int\ntype L[T any] []T\ntype M[K comparable, V any] map[K]V\n");
        assert!(out.diags.is_empty(), "{:?}", out.diags);
        let specs: Vec<&TypeSpec> = out
            .root
            .decls
            .iter()
            .filter_map(|d| match d {
                TopLevelDecl::Gen(g) => match &g.specs[0] {
                    Spec::Type(t) => Some(t),
                    _ => None,
                },
                _ => None,
            })
            .collect();
        assert!(specs[0].type_params.is_empty());
        assert!(matches!(out.arena.types[specs[0].typ], Type::Array { .. }));
        assert_eq!(specs[1].type_params.len(), 1);
        assert_eq!(specs[2].type_params.len(), 2);
    }

    #[test]
    fn skips_bodies_and_composite_literals() {
        let src = "package p\nvar m = map[string]int{\"a\": 1, \"b\": func() int { return 2 }()}\nfunc F() { if x { y() } }\n";
        let out = parse(src);
        assert!(out.diags.is_empty(), "{:?}", out.diags);
        assert_eq!(out.root.decls.len(), 2);
    }

    #[test]
    fn embedded_fields_and_tags() {
        let src = "package p\ntype S struct {\n\tio.Reader\n\t*Base\n\tList[int]\n\tA, B int `json:\"a\"`\n\tC [2]int\n}\n";
        let out = parse(src);
        assert!(out.diags.is_empty(), "{:?}", out.diags);
        let TopLevelDecl::Gen(g) = &out.root.decls[0] else {
            panic!("expected gen decl");
        };
        let Spec::Type(ts) = &g.specs[0] else {
            panic!("expected type spec");
        };
        let Type::Struct { fields } = &out.arena.types[ts.typ] else {
            panic!("expected struct");
        };
        let embedded: Vec<bool> = fields.iter().map(|&f| out.arena.fields[f].embedded).collect();
        assert_eq!(embedded, vec![true, true, true, false, false]);
        assert!(out.arena.fields[fields[3]].tag.is_some());
    }

    #[test]
    fn doc_comment_needs_adjacent_line() {
        let src = "package p\n\n// Attached to F.\nfunc F() {}\n\n// Detached.\n\nfunc G() {}\n\nvar x = 1 // trailing\nfunc H() {}\n";
        let out = parse(src);
        let docs: Vec<bool> = out
            .root
            .decls
            .iter()
            .filter_map(|d| match d {
                TopLevelDecl::Func(f) => Some(f.doc.is_some()),
                _ => None,
            })
            .collect();
        assert_eq!(docs, vec![true, false, false]);
        assert_eq!(out.root.comments.len(), 3);
    }

    #[test]
    fn operator_precedence() {
        let out = parse("package p\nconst c = 1 + 2*3 == 7 || false\n");
        let TopLevelDecl::Gen(g) = &out.root.decls[0] else {
            panic!("expected gen decl");
        };
        let Spec::Value(v) = &g.specs[0] else {
            panic!("expected value spec");
        };
        assert!(matches!(
            out.arena.exprs[v.values[0]],
            Expr::Binary {
                op: BinaryOp::LOr,
                ..
            }
        ));
    }
}
