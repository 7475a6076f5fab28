use crate::ast::{Comment, CommentKind, Span};
use crate::error::{Diag, LexError, LexErrorKind};
use crate::literal::{self, is_dec_digit, is_hex_digit};
use logos::{Lexer as LogosLexer, Logos};
use memchr::{memchr, memchr2};

// =============================================================================
// 1. Comment scanners
// =============================================================================

#[inline]
fn lex_line_comment(lex: &mut LogosLexer<'_, RawTok>) {
    let rem = lex.remainder().as_bytes();
    let len = memchr2(b'\n', b'\r', rem).unwrap_or(rem.len());
    lex.bump(len);
}

#[inline]
fn lex_block_comment(lex: &mut LogosLexer<'_, RawTok>) -> Result<(), LexErrorKind> {
    let rem = lex.remainder().as_bytes();
    let mut search_start = 0;

    while let Some(star_pos) = memchr(b'*', &rem[search_start..]) {
        let abs_pos = search_start + star_pos;
        if rem.get(abs_pos + 1) == Some(&b'/') {
            lex.bump(abs_pos + 2);
            return Ok(());
        }
        search_start = abs_pos + 1;
    }

    lex.bump(rem.len());
    Err(LexErrorKind::UnterminatedComment)
}

// =============================================================================
// 2. Literal validation callbacks
// =============================================================================

#[inline]
fn validate_string(lex: &mut LogosLexer<'_, RawTok>) -> Result<(), LexErrorKind> {
    literal::unquote(lex.slice()).map(drop)
}

#[inline]
fn validate_rune(lex: &mut LogosLexer<'_, RawTok>) -> Result<(), LexErrorKind> {
    literal::unquote_char(lex.slice()).map(drop)
}

// =============================================================================
// 3. Numbers: maximal munch, then classification
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    Int,
    Float,
    Imag,
}

#[inline]
fn consume_digits(src: &[u8], mut i: usize, hex: bool) -> usize {
    while i < src.len() {
        let b = src[i];
        let ok = if hex { is_hex_digit(b) } else { is_dec_digit(b) };
        if !(ok || b == b'_') {
            break;
        }
        i += 1;
    }
    i
}

/// Logos callback: extends a number token to its maximal munch.
///
/// Boundaries are permissive (`0b2`, `09x` stay one token) and
/// [`classify_number`] rejects malformed literals afterwards.
fn lex_number(lex: &mut LogosLexer<'_, RawTok>) {
    let src = lex.source().as_bytes();
    let n = src.len();
    let mut i = lex.span().start;
    let mut hex = false;

    if src[i] == b'.' {
        i = consume_digits(src, i + 1, false);
    } else {
        if src[i] == b'0' && i + 1 < n && matches!(src[i + 1] | 0x20, b'x' | b'o' | b'b') {
            hex = src[i + 1] | 0x20 == b'x';
            i += 2;
        }
        i = consume_digits(src, i, hex);

        // don't steal `...`
        if i < n && src[i] == b'.' && src.get(i + 1) != Some(&b'.') {
            i = consume_digits(src, i + 1, hex);
        }
    }

    if i < n {
        let e = src[i] | 0x20;
        if (hex && e == b'p') || (!hex && e == b'e') {
            i += 1;
            if i < n && matches!(src[i], b'+' | b'-') {
                i += 1;
            }
            i = consume_digits(src, i, false);
        }
    }

    if i < n && src[i] == b'i' {
        i += 1;
    }

    let already = lex.span().end;
    if i > already {
        lex.bump(i - already);
    }
}

/// Validates a numeric literal and reports whether it is an integer,
/// floating-point or imaginary constant.
pub fn classify_number(lit: &[u8]) -> Result<NumberKind, LexErrorKind> {
    let (body, imag) = match lit.split_last() {
        Some((b'i', rest)) => (rest, true),
        _ => (lit, false),
    };
    if body.is_empty() {
        return Err(LexErrorKind::InvalidNumber);
    }

    let mut base = 10u8;
    let mut i = 0;
    if body.len() >= 2 && body[0] == b'0' {
        base = match body[1] | 0x20 {
            b'x' => 16,
            b'o' => 8,
            b'b' => 2,
            _ => 10,
        };
        if base != 10 {
            i = 2;
        }
    }
    let prefixed = base != 10;
    let hex = base == 16;

    let mantissa_start = i;
    i = consume_digits(body, i, hex);
    let int_part = &body[mantissa_start..i];
    let mut digits = int_part.iter().filter(|&&b| b != b'_').count();

    let mut float = false;
    if i < body.len() && body[i] == b'.' {
        if prefixed && !hex {
            return Err(LexErrorKind::InvalidNumber);
        }
        float = true;
        let frac_start = i + 1;
        i = consume_digits(body, frac_start, hex);
        digits += body[frac_start..i].iter().filter(|&&b| b != b'_').count();
    }
    if digits == 0 {
        return Err(LexErrorKind::InvalidNumber);
    }

    let mantissa_end = i;
    if i < body.len() && matches!(body[i] | 0x20, b'e' | b'p') {
        let p = body[i] | 0x20 == b'p';
        if p != hex {
            return Err(LexErrorKind::InvalidNumber);
        }
        float = true;
        i += 1;
        if i < body.len() && matches!(body[i], b'+' | b'-') {
            i += 1;
        }
        let exp_start = i;
        i = consume_digits(body, i, false);
        let exp = &body[exp_start..i];
        if !exp.iter().any(|&b| is_dec_digit(b)) || !separators_ok(exp, false, false) {
            return Err(LexErrorKind::InvalidNumber);
        }
    } else if hex && float {
        // hex mantissa requires a 'p' exponent
        return Err(LexErrorKind::InvalidNumber);
    }

    if i != body.len() {
        return Err(LexErrorKind::InvalidNumber);
    }

    let mantissa = &body[..mantissa_end];
    if !separators_ok(mantissa, prefixed, hex) {
        return Err(LexErrorKind::InvalidNumber);
    }

    let max_digit = match base {
        2 => b'1',
        8 => b'7',
        // legacy octal: leading zero integer, never for imaginary literals
        10 if !float && !imag && body.len() > 1 && body[0] == b'0' => b'7',
        _ => b'9',
    };
    if !hex
        && mantissa
            .iter()
            .skip(if prefixed { 2 } else { 0 })
            .any(|&b| is_dec_digit(b) && b > max_digit)
    {
        return Err(LexErrorKind::InvalidNumber);
    }

    Ok(match (imag, float) {
        (true, _) => NumberKind::Imag,
        (false, true) => NumberKind::Float,
        (false, false) => NumberKind::Int,
    })
}

/// `_` must sit between two digits; a base prefix counts as a digit.
fn separators_ok(s: &[u8], prefixed: bool, hex: bool) -> bool {
    let is_digit = |b: u8| if hex { is_hex_digit(b) } else { is_dec_digit(b) };
    let mut prev_digit = false;
    let mut prev_us = false;

    for (idx, &b) in s.iter().enumerate() {
        if b == b'_' {
            if !prev_digit {
                return false;
            }
            prev_us = true;
            prev_digit = false;
            continue;
        }
        let digit = is_digit(b) || (prefixed && idx == 1);
        if prev_us && !digit {
            return false;
        }
        prev_us = false;
        prev_digit = digit;
    }
    !prev_us
}

// =============================================================================
// 4. Token Definition (RawTok)
// =============================================================================

#[repr(u8)]
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(error = LexErrorKind)]
#[logos(skip r"[ \t\f]+")]
#[rustfmt::skip]
enum RawTok {
    #[token("\u{FEFF}")] Bom,

    // Trivia
    #[regex(r"\r\n|\n|\r")] Newline,
    #[token("//", lex_line_comment)] LineComment,
    #[token("/*", lex_block_comment)] BlockComment,

    // Keywords (before Ident)
    #[token("break")] KwBreak,
    #[token("case")] KwCase,
    #[token("chan")] KwChan,
    #[token("const")] KwConst,
    #[token("continue")] KwContinue,
    #[token("default")] KwDefault,
    #[token("defer")] KwDefer,
    #[token("else")] KwElse,
    #[token("fallthrough")] KwFallthrough,
    #[token("for")] KwFor,
    #[token("func")] KwFunc,
    #[token("go")] KwGo,
    #[token("goto")] KwGoto,
    #[token("if")] KwIf,
    #[token("import")] KwImport,
    #[token("interface")] KwInterface,
    #[token("map")] KwMap,
    #[token("package")] KwPackage,
    #[token("range")] KwRange,
    #[token("return")] KwReturn,
    #[token("select")] KwSelect,
    #[token("struct")] KwStruct,
    #[token("switch")] KwSwitch,
    #[token("type")] KwType,
    #[token("var")] KwVar,

    #[regex(r"[_\p{L}][_\p{L}\p{Nd}]*")] Ident,

    #[regex(r"[0-9]|\.[0-9]", lex_number)] Number,

    #[regex(r"`[^`]*`")] RawString,
    #[regex(r#""([^"\\\n\r]|\\.)*""#, validate_string)] String,
    #[regex(r"'([^'\\\n\r]|\\.)+'", validate_rune)] Rune,

    // Operators
    #[token("...")] Ellipsis,
    #[token("<<=")] ShlAssign,
    #[token(">>=")] ShrAssign,
    #[token("&^=")] AndNotAssign,
    #[token("+=")] AddAssign,
    #[token("-=")] SubAssign,
    #[token("*=")] MulAssign,
    #[token("/=")] DivAssign,
    #[token("%=")] ModAssign,
    #[token("&=")] AndAssign,
    #[token("|=")] OrAssign,
    #[token("^=")] XorAssign,
    #[token("<<")] Shl,
    #[token(">>")] Shr,
    #[token("&^")] AndNot,
    #[token("&&")] LAnd,
    #[token("||")] LOr,
    #[token("==")] EqEq,
    #[token("!=")] NotEq,
    #[token("<=")] Le,
    #[token(">=")] Ge,
    #[token("++")] Inc,
    #[token("--")] Dec,
    #[token(":=")] Define,
    #[token("<-")] Arrow,
    #[token("=")] Assign,
    #[token("+")] Plus,
    #[token("-")] Minus,
    #[token("*")] Star,
    #[token("/")] Slash,
    #[token("%")] Percent,
    #[token("&")] Amp,
    #[token("|")] Pipe,
    #[token("^")] Caret,
    #[token("~")] Tilde,
    #[token("!")] Bang,
    #[token("<")] Lt,
    #[token(">")] Gt,

    // Delimiters
    #[token("(")] LParen,
    #[token(")")] RParen,
    #[token("[")] LBrack,
    #[token("]")] RBrack,
    #[token("{")] LBrace,
    #[token("}")] RBrace,
    #[token(",")] Comma,
    #[token(";")] Semi,
    #[token(":")] Colon,
    #[token(".")] Dot,
}

// =============================================================================
// 5. Lookup tables
// =============================================================================

macro_rules! gen_lookup_table {
    ($size:expr, $($variant:ident),* $(,)?) => {{
        let mut table = [false; $size];
        $(table[RawTok::$variant as usize] = true;)*
        table
    }};
}

/// Tokens after which a newline becomes a `;`.
const SEMI_INSERT_TABLE: [bool; 256] = gen_lookup_table!(
    256,
    Ident,
    Number,
    Rune,
    String,
    RawString,
    KwBreak,
    KwContinue,
    KwFallthrough,
    KwReturn,
    Inc,
    Dec,
    RParen,
    RBrack,
    RBrace,
);

impl RawTok {
    #[inline(always)]
    const fn can_insert_semicolon(self) -> bool {
        SEMI_INSERT_TABLE[self as usize]
    }

    /// Maps everything except trivia, numbers and BOM.
    #[inline]
    fn to_token(self, slice: &str) -> Option<Tok<'_>> {
        macro_rules! simple_tok {
            ($($raw:ident),* $(,)?) => {
                match self {
                    Self::Ident => Tok::Ident(slice),
                    Self::Rune => Tok::RuneLit(slice),
                    Self::String => Tok::StringLit(slice),
                    Self::RawString => Tok::RawStringLit(slice),
                    $(Self::$raw => Tok::$raw,)*
                    Self::Bom | Self::Newline | Self::LineComment | Self::BlockComment
                    | Self::Number => return None,
                }
            };
        }

        Some(simple_tok! {
            KwBreak, KwCase, KwChan, KwConst, KwContinue, KwDefault, KwDefer, KwElse,
            KwFallthrough, KwFor, KwFunc, KwGo, KwGoto, KwIf, KwImport, KwInterface,
            KwMap, KwPackage, KwRange, KwReturn, KwSelect, KwStruct, KwSwitch, KwType, KwVar,

            Ellipsis, ShlAssign, ShrAssign, AndNotAssign, AddAssign, SubAssign, MulAssign,
            DivAssign, ModAssign, AndAssign, OrAssign, XorAssign, Shl, Shr, AndNot, LAnd, LOr,
            EqEq, NotEq, Le, Ge, Inc, Dec, Define, Arrow, Assign, Plus, Minus, Star, Slash,
            Percent, Amp, Pipe, Caret, Tilde, Bang, Lt, Gt,

            LParen, RParen, LBrack, RBrack, LBrace, RBrace, Comma, Semi, Colon, Dot,
        })
    }
}

// =============================================================================
// 6. Public Token Definition (zero-copy)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tok<'input> {
    Ident(&'input str),
    IntLit(&'input str),
    FloatLit(&'input str),
    ImagLit(&'input str),
    RuneLit(&'input str),
    StringLit(&'input str),
    RawStringLit(&'input str),

    // Keywords
    KwBreak,
    KwCase,
    KwChan,
    KwConst,
    KwContinue,
    KwDefault,
    KwDefer,
    KwElse,
    KwFallthrough,
    KwFor,
    KwFunc,
    KwGo,
    KwGoto,
    KwIf,
    KwImport,
    KwInterface,
    KwMap,
    KwPackage,
    KwRange,
    KwReturn,
    KwSelect,
    KwStruct,
    KwSwitch,
    KwType,
    KwVar,

    // Operators / Delimiters
    Ellipsis,
    ShlAssign,
    ShrAssign,
    AndNotAssign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    Shl,
    Shr,
    AndNot,
    LAnd,
    LOr,
    EqEq,
    NotEq,
    Le,
    Ge,
    Inc,
    Dec,
    Define,
    Arrow,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Bang,
    Lt,
    Gt,
    LParen,
    RParen,
    LBrack,
    RBrack,
    LBrace,
    RBrace,
    Comma,
    Semi,
    Colon,
    Dot,

    Error,
    Eof,
}

impl<'input> std::fmt::Display for Tok<'input> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tok::Ident(s)
            | Tok::IntLit(s)
            | Tok::FloatLit(s)
            | Tok::ImagLit(s)
            | Tok::RuneLit(s)
            | Tok::StringLit(s)
            | Tok::RawStringLit(s) => f.write_str(s),
            Tok::Eof => f.write_str("EOF"),
            other => write!(f, "{other:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub tok: Tok<'src>,
    pub span: Span,
}

// =============================================================================
// 7. Lexer wrapper: semicolon insertion + comment capture + diags
// =============================================================================

pub struct Lexer<'src> {
    logos: LogosLexer<'src, RawTok>,
    pending: Option<Token<'src>>,
    comments: Vec<Comment>,
    diags: Vec<Diag>,
    last_can_insert_semi: bool,
    src_len: usize,
    eof_done: bool,
}

/// Output of [`tokenize`].
#[derive(Debug, Default)]
pub struct Lexed<'src> {
    /// Token stream, always terminated by `Tok::Eof`
    pub tokens: Vec<Token<'src>>,
    pub comments: Vec<Comment>,
    pub diags: Vec<Diag>,
}

/// Lexes a whole file eagerly.
pub fn tokenize(input: &str) -> Lexed<'_> {
    let mut lexer = Lexer::new(input);
    let mut tokens: Vec<Token<'_>> = lexer.by_ref().collect();
    let end = input.len();
    tokens.push(Token {
        tok: Tok::Eof,
        span: Span::new(end, end),
    });
    let (comments, diags) = lexer.into_parts();
    Lexed {
        tokens,
        comments,
        diags,
    }
}

impl<'src> Lexer<'src> {
    pub fn new(input: &'src str) -> Self {
        Self {
            logos: RawTok::lexer(input),
            pending: None,
            comments: Vec::new(),
            diags: Vec::with_capacity(4),
            last_can_insert_semi: false,
            src_len: input.len(),
            eof_done: false,
        }
    }

    pub fn take_diags(&mut self) -> Vec<Diag> {
        std::mem::take(&mut self.diags)
    }

    /// Comments seen so far, in source order.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn into_parts(self) -> (Vec<Comment>, Vec<Diag>) {
        (self.comments, self.diags)
    }

    #[inline]
    fn push_lex_diag(&mut self, kind: LexErrorKind, span: Span) {
        self.diags.push(LexError { kind, span }.diag());
    }

    #[inline]
    fn semi_at(&mut self, pos: usize) {
        self.last_can_insert_semi = false;
        self.pending = Some(Token {
            tok: Tok::Semi,
            span: Span::new(pos, pos),
        });
    }

    /// Returns true when `raw` was trivia and produced no token.
    #[inline]
    fn handle_trivia(&mut self, raw: RawTok, span: Span, slice: &str) -> bool {
        match raw {
            RawTok::Newline => {
                if self.last_can_insert_semi {
                    self.semi_at(span.start as usize);
                }
                true
            }
            RawTok::LineComment => {
                if self.last_can_insert_semi {
                    self.semi_at(span.start as usize);
                }
                self.comments.push(Comment {
                    kind: CommentKind::Line,
                    span,
                });
                true
            }
            RawTok::BlockComment => {
                if self.last_can_insert_semi && memchr2(b'\n', b'\r', slice.as_bytes()).is_some() {
                    self.semi_at(span.start as usize);
                }
                self.comments.push(Comment {
                    kind: CommentKind::Block,
                    span,
                });
                true
            }
            _ => false,
        }
    }

    fn handle_eof(&mut self) {
        self.eof_done = true;
        if self.last_can_insert_semi {
            self.semi_at(self.src_len);
        }
    }

    fn handle_lex_error(&mut self, kind: LexErrorKind) -> Token<'src> {
        let span = self.span();
        if kind == LexErrorKind::UnterminatedComment {
            self.comments.push(Comment {
                kind: CommentKind::Block,
                span,
            });
        }
        self.push_lex_diag(kind, span);
        self.last_can_insert_semi = false;
        Token {
            tok: Tok::Error,
            span,
        }
    }

    #[inline]
    fn span(&self) -> Span {
        let r = self.logos.span();
        Span::new(r.start, r.end)
    }

    fn handle_raw_token(&mut self, raw: RawTok) -> Option<Token<'src>> {
        let span = self.span();
        let slice = self.logos.slice();

        if raw == RawTok::Bom {
            if span.start == 0 {
                return None;
            }
            self.push_lex_diag(LexErrorKind::InvalidToken, span);
            self.last_can_insert_semi = false;
            return Some(Token {
                tok: Tok::Error,
                span,
            });
        }

        if self.handle_trivia(raw, span, slice) {
            return None;
        }

        if raw == RawTok::Number {
            return Some(self.handle_number_token(span, slice));
        }

        self.last_can_insert_semi = raw.can_insert_semicolon();
        raw.to_token(slice).map(|tok| Token { tok, span })
    }

    fn handle_number_token(&mut self, span: Span, slice: &'src str) -> Token<'src> {
        match classify_number(slice.as_bytes()) {
            Ok(kind) => {
                self.last_can_insert_semi = true;
                let tok = match kind {
                    NumberKind::Int => Tok::IntLit(slice),
                    NumberKind::Float => Tok::FloatLit(slice),
                    NumberKind::Imag => Tok::ImagLit(slice),
                };
                Token { tok, span }
            }
            Err(kind) => {
                self.push_lex_diag(kind, span);
                self.last_can_insert_semi = false;
                Token {
                    tok: Tok::Error,
                    span,
                }
            }
        }
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(tok) = self.pending.take() {
                return Some(tok);
            }
            if self.eof_done {
                return None;
            }

            match self.logos.next() {
                // don't return: a pending ';' may still need to go out
                None => self.handle_eof(),
                Some(Err(kind)) => return Some(self.handle_lex_error(kind)),
                Some(Ok(raw)) => {
                    if let Some(tok) = self.handle_raw_token(raw) {
                        return Some(tok);
                    }
                }
            }
        }
    }
}
