//! Semantic types and their canonical rendering.
//!
//! Named types are references (`package path` + name), never expanded
//! inline, so recursive declarations need no special casing and every type
//! serializes as a plain tree.

use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasicKind {
    Invalid,
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    UnsafePointer,
    UntypedBool,
    UntypedInt,
    UntypedRune,
    UntypedFloat,
    UntypedComplex,
    UntypedString,
    UntypedNil,
}

impl BasicKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Invalid => "invalid type",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint => "uint",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Uintptr => "uintptr",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Complex64 => "complex64",
            Self::Complex128 => "complex128",
            Self::String => "string",
            Self::UnsafePointer => "unsafe.Pointer",
            Self::UntypedBool => "untyped bool",
            Self::UntypedInt => "untyped int",
            Self::UntypedRune => "untyped rune",
            Self::UntypedFloat => "untyped float",
            Self::UntypedComplex => "untyped complex",
            Self::UntypedString => "untyped string",
            Self::UntypedNil => "untyped nil",
        }
    }

    pub const fn is_untyped(self) -> bool {
        matches!(
            self,
            Self::UntypedBool
                | Self::UntypedInt
                | Self::UntypedRune
                | Self::UntypedFloat
                | Self::UntypedComplex
                | Self::UntypedString
                | Self::UntypedNil
        )
    }

    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Int
                | Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::Uint
                | Self::Uint8
                | Self::Uint16
                | Self::Uint32
                | Self::Uint64
                | Self::Uintptr
                | Self::UntypedInt
                | Self::UntypedRune
        )
    }

    pub const fn is_string(self) -> bool {
        matches!(self, Self::String | Self::UntypedString)
    }

    /// Universe type names, `byte` and `rune` included.
    pub fn from_universe(name: &str) -> Option<Type> {
        let kind = match name {
            "bool" => Self::Bool,
            "int" => Self::Int,
            "int8" => Self::Int8,
            "int16" => Self::Int16,
            "int32" => Self::Int32,
            "int64" => Self::Int64,
            "uint" => Self::Uint,
            "uint8" => Self::Uint8,
            "uint16" => Self::Uint16,
            "uint32" => Self::Uint32,
            "uint64" => Self::Uint64,
            "uintptr" => Self::Uintptr,
            "float32" => Self::Float32,
            "float64" => Self::Float64,
            "complex64" => Self::Complex64,
            "complex128" => Self::Complex128,
            "string" => Self::String,
            "byte" => return Some(Type::byte()),
            "rune" => return Some(Type::rune()),
            _ => return None,
        };
        Some(Type::basic(kind))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Named {
    /// `None` for universe types (`error`, `any`, `comparable`)
    pub pkg: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Var {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub typ: Type,
}

impl Var {
    pub fn new(name: impl Into<String>, typ: Type) -> Self {
        Self {
            name: name.into(),
            typ,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub params: Vec<Var>,
    pub results: Vec<Var>,
    /// The last parameter is `...T`; its type is stored as `[]T`
    #[serde(default)]
    pub variadic: bool,
}

impl Signature {
    /// Type of a call: the single result, a tuple, or invalid for none.
    pub fn call_result(&self) -> Type {
        match self.results.as_slice() {
            [] => Type::Invalid,
            [one] => one.typ.clone(),
            many => Type::Tuple(many.to_vec()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructField {
    pub name: String,
    pub typ: Type,
    #[serde(default)]
    pub embedded: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub sig: Signature,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    /// Explicit methods, sorted by name
    pub methods: Vec<Method>,
    pub embeds: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub tilde: bool,
    pub typ: Type,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
    Invalid,
    Basic {
        kind: BasicKind,
        /// Spelled `byte` or `rune`
        #[serde(default)]
        alias: bool,
    },
    Named(Named),
    TypeParam(String),
    Pointer(Box<Type>),
    Slice(Box<Type>),
    Array {
        /// `None` when the length is not a known constant
        len: Option<u64>,
        elem: Box<Type>,
    },
    Map {
        key: Box<Type>,
        value: Box<Type>,
    },
    Chan {
        dir: ChanDir,
        elem: Box<Type>,
    },
    Signature(Signature),
    Struct(Vec<StructField>),
    Interface(Interface),
    Tuple(Vec<Var>),
    Union(Vec<Term>),
}

impl Type {
    pub const fn basic(kind: BasicKind) -> Self {
        Self::Basic { kind, alias: false }
    }

    pub const fn byte() -> Self {
        Self::Basic {
            kind: BasicKind::Uint8,
            alias: true,
        }
    }

    pub const fn rune() -> Self {
        Self::Basic {
            kind: BasicKind::Int32,
            alias: true,
        }
    }

    pub fn named(pkg: Option<&str>, name: &str) -> Self {
        Self::Named(Named {
            pkg: pkg.map(str::to_owned),
            name: name.to_owned(),
            args: Vec::new(),
        })
    }

    pub fn pointer(elem: Type) -> Self {
        Self::Pointer(Box::new(elem))
    }

    pub fn slice(elem: Type) -> Self {
        Self::Slice(Box::new(elem))
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid | Self::Basic { kind: BasicKind::Invalid, .. })
    }

    pub fn basic_kind(&self) -> Option<BasicKind> {
        match self {
            Self::Basic { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_untyped(&self) -> bool {
        self.basic_kind().is_some_and(BasicKind::is_untyped)
    }

    /// The type an untyped value takes when nothing else constrains it.
    pub fn defaulted(self) -> Self {
        match self.basic_kind() {
            Some(BasicKind::UntypedBool) => Self::basic(BasicKind::Bool),
            Some(BasicKind::UntypedInt) => Self::basic(BasicKind::Int),
            Some(BasicKind::UntypedRune) => Self::rune(),
            Some(BasicKind::UntypedFloat) => Self::basic(BasicKind::Float64),
            Some(BasicKind::UntypedComplex) => Self::basic(BasicKind::Complex128),
            Some(BasicKind::UntypedString) => Self::basic(BasicKind::String),
            _ => self,
        }
    }

    /// Replaces type parameters named in `params` by the matching `args`.
    pub fn substitute(&self, params: &[String], args: &[Type]) -> Type {
        if params.is_empty() || args.is_empty() {
            return self.clone();
        }
        let sub = |t: &Type| t.substitute(params, args);
        let sub_vars = |vars: &[Var]| -> Vec<Var> {
            vars.iter().map(|v| Var::new(v.name.clone(), sub(&v.typ))).collect()
        };
        let sub_sig = |sig: &Signature| Signature {
            params: sub_vars(&sig.params),
            results: sub_vars(&sig.results),
            variadic: sig.variadic,
        };
        match self {
            Self::TypeParam(name) => match params.iter().position(|p| p == name) {
                Some(i) => args.get(i).cloned().unwrap_or(Self::Invalid),
                None => self.clone(),
            },
            Self::Named(named) => Self::Named(Named {
                pkg: named.pkg.clone(),
                name: named.name.clone(),
                args: named.args.iter().map(sub).collect(),
            }),
            Self::Pointer(elem) => Self::Pointer(Box::new(sub(elem))),
            Self::Slice(elem) => Self::Slice(Box::new(sub(elem))),
            Self::Array { len, elem } => Self::Array {
                len: *len,
                elem: Box::new(sub(elem)),
            },
            Self::Map { key, value } => Self::Map {
                key: Box::new(sub(key)),
                value: Box::new(sub(value)),
            },
            Self::Chan { dir, elem } => Self::Chan {
                dir: *dir,
                elem: Box::new(sub(elem)),
            },
            Self::Signature(sig) => Self::Signature(sub_sig(sig)),
            Self::Struct(fields) => Self::Struct(
                fields
                    .iter()
                    .map(|f| StructField {
                        typ: sub(&f.typ),
                        ..f.clone()
                    })
                    .collect(),
            ),
            Self::Interface(iface) => Self::Interface(Interface {
                methods: iface
                    .methods
                    .iter()
                    .map(|m| Method {
                        name: m.name.clone(),
                        sig: sub_sig(&m.sig),
                    })
                    .collect(),
                embeds: iface.embeds.iter().map(sub).collect(),
            }),
            Self::Tuple(vars) => Self::Tuple(sub_vars(vars)),
            Self::Union(terms) => Self::Union(
                terms
                    .iter()
                    .map(|t| Term {
                        tilde: t.tilde,
                        typ: sub(&t.typ),
                    })
                    .collect(),
            ),
            Self::Invalid | Self::Basic { .. } => self.clone(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid => f.write_str("invalid type"),
            Self::Basic { kind, alias } => f.write_str(match (kind, alias) {
                (BasicKind::Uint8, true) => "byte",
                (BasicKind::Int32, true) => "rune",
                _ => kind.name(),
            }),
            Self::Named(named) => {
                if let Some(pkg) = &named.pkg {
                    write!(f, "{pkg}.")?;
                }
                f.write_str(&named.name)?;
                if !named.args.is_empty() {
                    f.write_char('[')?;
                    write_list(f, &named.args, ", ")?;
                    f.write_char(']')?;
                }
                Ok(())
            }
            Self::TypeParam(name) => f.write_str(name),
            Self::Pointer(elem) => write!(f, "*{elem}"),
            Self::Slice(elem) => write!(f, "[]{elem}"),
            Self::Array { len: Some(n), elem } => write!(f, "[{n}]{elem}"),
            Self::Array { len: None, elem } => write!(f, "[...]{elem}"),
            Self::Map { key, value } => write!(f, "map[{key}]{value}"),
            Self::Chan { dir, elem } => {
                let prefix = match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                };
                // `chan (<-chan T)` needs parentheses to stay unambiguous
                let paren = *dir == ChanDir::Both
                    && matches!(**elem, Self::Chan { dir: ChanDir::Recv, .. });
                if paren {
                    write!(f, "{prefix}({elem})")
                } else {
                    write!(f, "{prefix}{elem}")
                }
            }
            Self::Signature(sig) => {
                f.write_str("func")?;
                write_signature(f, sig)
            }
            Self::Struct(fields) => {
                f.write_str("struct{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    if !field.embedded {
                        write!(f, "{} ", field.name)?;
                    }
                    write!(f, "{}", field.typ)?;
                    if !field.tag.is_empty() {
                        write!(f, " {}", quote(&field.tag))?;
                    }
                }
                f.write_char('}')
            }
            Self::Interface(iface) => {
                f.write_str("interface{")?;
                let mut first = true;
                for m in &iface.methods {
                    if !first {
                        f.write_str("; ")?;
                    }
                    first = false;
                    f.write_str(&m.name)?;
                    write_signature(f, &m.sig)?;
                }
                for embed in &iface.embeds {
                    if !first {
                        f.write_str("; ")?;
                    }
                    first = false;
                    write!(f, "{embed}")?;
                }
                f.write_char('}')
            }
            Self::Tuple(vars) => write_tuple(f, vars, false),
            Self::Union(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    if term.tilde {
                        f.write_char('~')?;
                    }
                    write!(f, "{}", term.typ)?;
                }
                Ok(())
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, types: &[Type], sep: &str) -> fmt::Result {
    for (i, t) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{t}")?;
    }
    Ok(())
}

fn write_tuple(f: &mut fmt::Formatter<'_>, vars: &[Var], variadic: bool) -> fmt::Result {
    f.write_char('(')?;
    for (i, var) in vars.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        if !var.name.is_empty() {
            write!(f, "{} ", var.name)?;
        }
        match &var.typ {
            Type::Slice(elem) if variadic && i + 1 == vars.len() => write!(f, "...{elem}")?,
            typ => write!(f, "{typ}")?,
        }
    }
    f.write_char(')')
}

fn write_signature(f: &mut fmt::Formatter<'_>, sig: &Signature) -> fmt::Result {
    write_tuple(f, &sig.params, sig.variadic)?;
    match sig.results.as_slice() {
        [] => Ok(()),
        [only] if only.name.is_empty() => write!(f, " {}", only.typ),
        results => {
            f.write_char(' ')?;
            write_tuple(f, results, false)
        }
    }
}

/// Double-quoted Go string literal for `s`.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\x0c' => out.push_str("\\f"),
            '\x0b' => out.push_str("\\v"),
            c if c.is_control() => {
                let _ = match c as u32 {
                    n @ 0..=0xff => write!(out, "\\x{n:02x}"),
                    n @ 0x100..=0xffff => write!(out, "\\u{n:04x}"),
                    n => write!(out, "\\U{n:08x}"),
                };
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
