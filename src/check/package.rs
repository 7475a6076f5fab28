use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::types::{BasicKind, Signature, Type, Var};

/// Package-level declarations of one checked package.
///
/// This is also the on-disk artifact format read by the cache stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub scope: IndexMap<String, Object>,
    /// Paths of the packages this one's declarations refer to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Object {
    TypeName(TypeDecl),
    Const {
        typ: Type,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<i64>,
    },
    Var {
        typ: Type,
    },
    Func {
        sig: Signature,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
    /// For an alias, the aliased type itself
    pub underlying: Type,
    #[serde(default)]
    pub alias: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_params: Vec<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub methods: IndexMap<String, Signature>,
}

impl TypeDecl {
    pub fn new(underlying: Type) -> Self {
        Self {
            underlying,
            alias: false,
            type_params: Vec::new(),
            methods: IndexMap::new(),
        }
    }
}

impl Package {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Object> {
        self.scope.get(name)
    }

    /// The built-in `unsafe` package.
    pub fn unsafe_package() -> Self {
        let uintptr = || Type::basic(BasicKind::Uintptr);
        let pointer = || Type::basic(BasicKind::UnsafePointer);
        let func = |params: Vec<Type>, result: Type| Object::Func {
            sig: Signature {
                params: params.into_iter().map(|t| Var::new("", t)).collect(),
                results: vec![Var::new("", result)],
                variadic: false,
            },
        };

        let mut pkg = Self::new("unsafe", "unsafe");
        pkg.scope.insert(
            "Pointer".into(),
            Object::TypeName(TypeDecl {
                alias: true,
                ..TypeDecl::new(pointer())
            }),
        );
        for name in ["Sizeof", "Alignof", "Offsetof"] {
            pkg.scope.insert(name.into(), func(vec![Type::Invalid], uintptr()));
        }
        pkg.scope.insert("Add".into(), func(vec![pointer(), Type::basic(BasicKind::Int)], pointer()));
        pkg.scope.insert(
            "String".into(),
            func(vec![Type::pointer(Type::byte()), Type::basic(BasicKind::Int)], Type::basic(BasicKind::String)),
        );
        pkg.scope.insert(
            "StringData".into(),
            func(vec![Type::basic(BasicKind::String)], Type::pointer(Type::byte())),
        );
        // Slice and SliceData are generic over the element type
        pkg.scope.insert("Slice".into(), func(vec![Type::Invalid, Type::Invalid], Type::Invalid));
        pkg.scope.insert("SliceData".into(), func(vec![Type::Invalid], Type::Invalid));
        pkg
    }
}
