//! The extracted view of one Go file.
//!
//! A [`SourceFile`] owns every entity. Structs and their fields live in
//! arenas so that a field can name its struct (and a tag its field) by index;
//! [`StructRef`], [`FieldRef`] and [`TagRef`] walk those links.

pub mod import_path;
pub mod tag;

use std::path::Path;

use la_arena::{Arena, Idx};

pub use import_path::{ImportPath, ImportPathError};

pub type StructId = Idx<StructDefinition>;
pub type FieldId = Idx<FieldDefinition>;

/// A rendered type.
///
/// `children` follows the shape of the type: element for arrays, slices,
/// channels and pointers; key then value for maps; parameters then results
/// for functions; one named entry per field for struct literals; the
/// flattened parameters and results of every method for interfaces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeNode {
    /// Binding name (field, parameter, constant); empty when anonymous
    pub name: String,
    pub signature: String,
    /// Normalized underlying type; empty in syntax mode or when unknown
    pub underlying: String,
    pub children: Vec<TypeNode>,
}

impl TypeNode {
    pub fn leaf(signature: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

pub type GlobalConstant = TypeNode;
pub type GlobalVariable = TypeNode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDeclaration {
    /// Empty unless the import is renamed (`.` and `_` included)
    pub alias: String,
    /// Path literal exactly as written, quotes included
    pub path: String,
}

impl ImportDeclaration {
    /// Identifier the importing file most likely uses for this package.
    ///
    /// The alias if there is one, otherwise the last path segment. Packages
    /// whose name differs from their directory are guessed wrong.
    pub fn prefix(&self) -> &str {
        if !self.alias.is_empty() {
            return &self.alias;
        }
        let path = self.path.trim_matches('"');
        match path.rfind('/') {
            Some(i) => &path[i + 1..],
            None => path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDefinition {
    pub name: String,
    pub doc: String,
    pub fields: Vec<FieldId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub owner: StructId,
    pub name: String,
    pub signature: String,
    pub tag: Option<TagLiteral>,
}

/// Struct tag literal, backticks included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagLiteral {
    pub raw: String,
}

impl TagLiteral {
    pub fn get(&self, key: &str) -> String {
        tag::lookup(&self.raw, key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: String,
    pub params: Vec<TypeNode>,
    pub results: Vec<TypeNode>,
    pub doc: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDefinition {
    pub name: String,
    pub doc: String,
    pub methods: Vec<MethodSignature>,
}

/// An exported function declaration.
///
/// Plain functions and methods share this shape; a plain function simply has
/// no receivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundMethod {
    pub signature: MethodSignature,
    /// Receiver type strings, e.g. `*sample.Point`
    pub receivers: Vec<String>,
}

/// Everything extracted from one Go file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: String,
    pub package: String,
    pub imports: Vec<ImportDeclaration>,
    pub constants: Vec<GlobalConstant>,
    pub variables: Vec<GlobalVariable>,
    pub structs: Arena<StructDefinition>,
    pub fields: Arena<FieldDefinition>,
    pub interfaces: Vec<InterfaceDefinition>,
    pub methods: Vec<BoundMethod>,
}

/// A field as it comes out of a struct declaration.
#[derive(Debug, Clone)]
pub struct FieldSeed {
    pub name: String,
    pub signature: String,
    pub tag: Option<String>,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            package: package.into(),
            imports: Vec::new(),
            constants: Vec::new(),
            variables: Vec::new(),
            structs: Arena::new(),
            fields: Arena::new(),
            interfaces: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn add_struct(
        &mut self,
        name: impl Into<String>,
        doc: impl Into<String>,
        fields: impl IntoIterator<Item = FieldSeed>,
    ) -> StructId {
        let owner = self.structs.alloc(StructDefinition {
            name: name.into(),
            doc: doc.into(),
            fields: Vec::new(),
        });
        let ids = fields
            .into_iter()
            .map(|seed| {
                self.fields.alloc(FieldDefinition {
                    owner,
                    name: seed.name,
                    signature: seed.signature,
                    tag: seed.tag.map(|raw| TagLiteral { raw }),
                })
            })
            .collect();
        self.structs[owner].fields = ids;
        owner
    }

    /// Structs in declaration order.
    pub fn structs(&self) -> impl Iterator<Item = StructRef<'_>> + '_ {
        self.structs.iter().map(move |(id, _)| StructRef { file: self, id })
    }

    pub fn struct_named(&self, name: &str) -> Option<StructRef<'_>> {
        self.structs().find(|s| s.name() == name)
    }

    pub fn interface_named(&self, name: &str) -> Option<&InterfaceDefinition> {
        self.interfaces.iter().find(|i| i.name == name)
    }

    pub fn method_named(&self, name: &str) -> Option<&BoundMethod> {
        self.methods.iter().find(|m| m.signature.name == name)
    }

    /// See [`import_path::infer`].
    pub fn import_path(&self, dependency_root: Option<&Path>) -> Result<ImportPath, ImportPathError> {
        import_path::infer(&self.path, dependency_root)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StructRef<'a> {
    file: &'a SourceFile,
    id: StructId,
}

impl<'a> StructRef<'a> {
    pub fn id(self) -> StructId {
        self.id
    }

    pub fn file(self) -> &'a SourceFile {
        self.file
    }

    pub fn def(self) -> &'a StructDefinition {
        &self.file.structs[self.id]
    }

    pub fn name(self) -> &'a str {
        &self.def().name
    }

    pub fn doc(self) -> &'a str {
        &self.def().doc
    }

    pub fn fields(self) -> impl Iterator<Item = FieldRef<'a>> + 'a {
        let file = self.file;
        self.def().fields.iter().map(move |&id| FieldRef { file, id })
    }

    pub fn field(self, name: &str) -> Option<FieldRef<'a>> {
        self.fields().find(|f| f.name() == name)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRef<'a> {
    file: &'a SourceFile,
    id: FieldId,
}

impl<'a> FieldRef<'a> {
    pub fn def(self) -> &'a FieldDefinition {
        &self.file.fields[self.id]
    }

    pub fn name(self) -> &'a str {
        &self.def().name
    }

    pub fn signature(self) -> &'a str {
        &self.def().signature
    }

    pub fn owner(self) -> StructRef<'a> {
        StructRef {
            file: self.file,
            id: self.def().owner,
        }
    }

    pub fn tag(self) -> Option<TagRef<'a>> {
        self.def().tag.as_ref().map(|_| TagRef { field: self })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TagRef<'a> {
    field: FieldRef<'a>,
}

impl<'a> TagRef<'a> {
    pub fn field(self) -> FieldRef<'a> {
        self.field
    }

    pub fn raw(self) -> &'a str {
        self.field.def().tag.as_ref().map_or("", |t| t.raw.as_str())
    }

    pub fn get(self, key: &str) -> String {
        tag::lookup(self.raw(), key)
    }
}
