//! Go declaration parser (Logos lexer + recursive descent).
//!
//! - Lexer uses Logos and implements Go semicolon insertion; comments are
//!   collected on the side.
//! - Parser covers package-level declarations and skips function bodies.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod line_index;
pub mod literal;
mod parser;
mod parser_support;

use std::borrow::Cow;

pub use ast::{AstArena, CommentGroupId, ExprId, FieldId, IdentName, Interner, SourceFile, Span, Symbol, TypeId};
pub use error::{Diag, DiagKind, LexErrorKind, ParseFailure};
pub use lexer::{tokenize, Lexer, Tok};
pub use line_index::LineIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Group comments and attach doc comments to declarations
    pub comments: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { comments: true }
    }
}

/// A successfully parsed file together with everything needed to read it.
#[derive(Debug)]
pub struct ParsedFile {
    pub path: String,
    pub source: String,
    pub arena: AstArena,
    pub interner: Interner,
    pub root: SourceFile,
    pub lines: LineIndex,
}

impl ParsedFile {
    /// Source text covered by `span`.
    #[inline]
    pub fn text(&self, span: Span) -> &str {
        self.source.get(span.range()).unwrap_or("")
    }

    #[inline]
    pub fn name(&self, ident: IdentName) -> &str {
        self.interner.resolve(ident.sym)
    }

    #[inline]
    pub fn sym(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }

    pub fn package_name(&self) -> &str {
        self.name(self.root.name)
    }

    /// 1-based line and column of a byte offset.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        self.lines.line_col(offset)
    }

    /// Decoded value of a string literal; undecodable literals fall back to
    /// their raw text without quotes.
    pub fn string_value(&self, lit: ast::StringLit) -> Cow<'_, str> {
        let raw = self.text(lit.raw);
        match literal::unquote(raw) {
            Ok(v) => v,
            Err(_) => Cow::Borrowed(raw.trim_matches(|c| c == '"' || c == '`')),
        }
    }

    /// Raw text of every comment in `group`, in order.
    pub fn comment_texts(&self, group: CommentGroupId) -> impl Iterator<Item = &str> + '_ {
        self.arena.comment_groups[group]
            .comments
            .iter()
            .map(move |c| self.text(c.span))
    }
}

/// Parses one Go file.
///
/// Lexical and syntax errors are collected; if any occurred the whole file is
/// rejected with every diagnostic attached.
pub fn parse_source(
    path: impl Into<String>,
    source: impl Into<String>,
    options: ParseOptions,
) -> Result<ParsedFile, ParseFailure> {
    let path = path.into();
    let source = source.into();
    let lines = LineIndex::new(&source);

    let out = parser::Parser::new(lexer::tokenize(&source), &lines, options.comments).parse_file();

    if let Some(first) = out.diags.first() {
        let (line, column) = lines.line_col(first.span.start);
        return Err(ParseFailure {
            path,
            line,
            column,
            message: first.message.clone(),
            diags: out.diags,
        });
    }

    Ok(ParsedFile {
        path,
        source,
        arena: out.arena,
        interner: out.interner,
        root: out.root,
        lines,
    })
}
