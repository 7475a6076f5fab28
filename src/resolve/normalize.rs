//! Primitive normalization of underlying types.

use crate::check::{BasicKind, Type, TypeInfo};

/// Canonical primitive name of a basic kind.
///
/// Pointer-sized kinds collapse to `uint64` and untyped kinds map to their
/// default type. Untyped nil, `invalid` and anything else map to the empty
/// string.
pub fn basic_name(kind: BasicKind) -> &'static str {
    match kind {
        BasicKind::Bool => "bool",
        BasicKind::Int => "int",
        BasicKind::Int8 => "int8",
        BasicKind::Int16 => "int16",
        BasicKind::Int32 => "int32",
        BasicKind::Int64 => "int64",
        BasicKind::Uint => "uint",
        BasicKind::Uint8 => "uint8",
        BasicKind::Uint16 => "uint16",
        BasicKind::Uint32 => "uint32",
        BasicKind::Uint64 => "uint64",
        BasicKind::Uintptr => "uint64",
        BasicKind::Float32 => "float32",
        BasicKind::Float64 => "float64",
        BasicKind::Complex64 => "complex64",
        BasicKind::Complex128 => "complex128",
        BasicKind::String => "string",
        BasicKind::UnsafePointer => "uint64",

        BasicKind::UntypedBool => "bool",
        BasicKind::UntypedInt => "int",
        BasicKind::UntypedRune => "int32",
        BasicKind::UntypedFloat => "float64",
        BasicKind::UntypedComplex => "complex128",
        BasicKind::UntypedString => "string",
        BasicKind::UntypedNil => "",

        _ => "",
    }
}

/// Normalized underlying type of `typ`.
///
/// Interfaces keep the type's own name, slices of primitives and primitives
/// are spelled through [`basic_name`], everything else is the underlying
/// type's string. Empty when the underlying type is unknown.
pub fn underlying_signature(info: &TypeInfo, typ: &Type) -> String {
    let Some(underlying) = info.underlying(typ) else {
        return String::new();
    };
    match &underlying {
        Type::Interface(_) => return typ.to_string(),
        Type::Slice(elem) => {
            if let Some(kind) = elem.basic_kind() {
                let name = basic_name(kind);
                if !name.is_empty() {
                    return format!("[]{name}");
                }
            }
        }
        Type::Basic { kind, .. } => {
            let name = basic_name(*kind);
            if !name.is_empty() {
                return name.to_owned();
            }
        }
        _ => {}
    }
    underlying.to_string()
}
