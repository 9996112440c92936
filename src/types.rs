//! The type resolver.
//!
//! Maps textual type identifiers to type descriptors and back. Primitive
//! keywords, `String`, `object` and array identifiers form a closed set that
//! resolves without registration; every named type (composites, enums and the
//! concrete collection types) lives in a [`TypeRegistry`] built before encoding
//! or decoding starts and read-only afterwards.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::builder::Initializer;
use crate::constants::MAX_ARRAY_RANK;
use crate::error::{Result, UserialError};
use crate::fields::FieldDescriptor;
use crate::format::{ANY_IDENTIFIER, ARRAY_PREFIX, NULL_IDENTIFIER, TEXT_IDENTIFIER};
use crate::reflect::Reflect;
use crate::value::Value;

/// The eight fixed-width primitive kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum PrimitiveKind {
    /// Signed 8-bit integer.
    Byte,
    /// Signed 16-bit integer.
    Short,
    /// Signed 32-bit integer.
    Int,
    /// Signed 64-bit integer.
    Long,
    /// IEEE-754 single precision.
    Float,
    /// IEEE-754 double precision.
    Double,
    /// One UTF-16 code unit.
    Char,
    /// Single byte boolean.
    Boolean,
}

impl PrimitiveKind {
    /// All kinds, in keyword table order.
    pub const ALL: [PrimitiveKind; 8] = [
        Self::Byte,
        Self::Short,
        Self::Int,
        Self::Long,
        Self::Float,
        Self::Double,
        Self::Char,
        Self::Boolean,
    ];

    /// The wire keyword of this kind.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Char => "char",
            Self::Boolean => "boolean",
        }
    }

    /// Looks up a kind by keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.keyword() == keyword)
    }

    /// Encoded payload size in bytes.
    pub fn size(self) -> usize {
        match self {
            Self::Byte | Self::Boolean => 1,
            Self::Short | Self::Char => 2,
            Self::Int | Self::Float => 4,
            Self::Long | Self::Double => 8,
        }
    }

    /// The zero value of this kind.
    pub fn zero(self) -> Value {
        match self {
            Self::Byte => Value::Byte(0),
            Self::Short => Value::Short(0),
            Self::Int => Value::Int(0),
            Self::Long => Value::Long(0),
            Self::Float => Value::Float(0.0),
            Self::Double => Value::Double(0.0),
            Self::Char => Value::Char(0),
            Self::Boolean => Value::Boolean(false),
        }
    }
}

/// One constant of an enum type.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumConstant {
    /// Constant name, used for lookup on decode.
    pub name: String,
    /// Fields the constant carries.
    pub fields: Vec<FieldDescriptor>,
}

impl EnumConstant {
    /// Creates a constant.
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

/// Category of a named type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    /// Plain object made of fields.
    Composite,
    /// Enumeration of named constants.
    Enum(Vec<EnumConstant>),
    /// Key/value mapping.
    Map,
    /// Ordered or unordered collection.
    Sequence,
}

impl TypeKind {
    fn label(&self) -> &'static str {
        match self {
            Self::Composite => "composite",
            Self::Enum(_) => "enum",
            Self::Map => "map",
            Self::Sequence => "sequence",
        }
    }
}

/// Runtime description of a named type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    /// Globally unique identifier.
    pub name: String,
    /// Category.
    pub kind: TypeKind,
    /// Identifier of the parent composite, if any.
    pub parent: Option<String>,
    /// Fields declared by this type itself (inherited ones live on the parent).
    pub fields: Vec<FieldDescriptor>,
    /// Ways to obtain a placeholder instance.
    pub initializers: Vec<Initializer>,
}

impl TypeDescriptor {
    fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parent: None,
            fields: Vec::new(),
            initializers: Vec::new(),
        }
    }

    /// A composite with no fields and no initializers yet.
    pub fn composite(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Composite)
    }

    /// An enum with the given constants.
    pub fn enumeration(name: impl Into<String>, constants: Vec<EnumConstant>) -> Self {
        Self::new(name, TypeKind::Enum(constants))
    }

    /// A sequence type constructed through `empty`.
    pub fn sequence(name: impl Into<String>, empty: fn() -> Result<Value>) -> Self {
        Self::new(name, TypeKind::Sequence).with_initializer(Initializer::Nullary(empty))
    }

    /// A map type constructed through `empty`.
    pub fn map(name: impl Into<String>, empty: fn() -> Result<Value>) -> Self {
        Self::new(name, TypeKind::Map).with_initializer(Initializer::Nullary(empty))
    }

    /// Sets the parent composite.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Adds a declared field.
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds an initializer.
    pub fn with_initializer(mut self, initializer: Initializer) -> Self {
        self.initializers.push(initializer);
        self
    }

    /// Looks up an enum constant by name.
    pub fn constant(&self, name: &str) -> Option<&EnumConstant> {
        match &self.kind {
            TypeKind::Enum(constants) => constants.iter().find(|c| c.name == name),
            _ => None,
        }
    }

    /// Human readable category, for diagnostics.
    pub fn kind_label(&self) -> &'static str {
        self.kind.label()
    }

    fn same_shape(&self, other: &Self) -> bool {
        self.name == other.name
            && self.kind == other.kind
            && self.parent == other.parent
            && self.fields == other.fields
            && self.initializers.len() == other.initializers.len()
    }
}

/// Outcome of resolving a type identifier.
#[derive(Debug, Clone, Copy)]
pub enum Resolved<'a> {
    /// One of the eight primitive keywords.
    Primitive(PrimitiveKind),
    /// The text type.
    Text,
    /// `object`: any value.
    Any,
    /// An array; `element` is the element identifier.
    Array {
        /// Element identifier.
        element: &'a str,
    },
    /// A registered named type.
    Named(&'a TypeDescriptor),
}

/// The process-wide identifier table consulted by writer and reader.
///
/// Built up front, then shared read-only (usually behind an `Arc`).
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: HashMap<String, TypeDescriptor>,
}

macro_rules! empty_collection {
    ($fn_name:ident, $variant:ident, $id:literal, $field:ident) => {
        fn $fn_name() -> Result<Value> {
            Ok(Value::$variant {
                type_name: $id.to_string(),
                $field: Vec::new(),
            })
        }
    };
}

empty_collection!(empty_vec, Sequence, "Vec", items);
empty_collection!(empty_vec_deque, Sequence, "VecDeque", items);
empty_collection!(empty_hash_set, Sequence, "HashSet", items);
empty_collection!(empty_btree_set, Sequence, "BTreeSet", items);
empty_collection!(empty_hash_map, Map, "HashMap", entries);
empty_collection!(empty_btree_map, Map, "BTreeMap", entries);

/// Identifiers of the built-in collection types.
pub mod builtin {
    /// `Vec<T>`.
    pub const VEC: &str = "Vec";
    /// `VecDeque<T>`.
    pub const VEC_DEQUE: &str = "VecDeque";
    /// `HashSet<T>`.
    pub const HASH_SET: &str = "HashSet";
    /// `BTreeSet<T>`.
    pub const BTREE_SET: &str = "BTreeSet";
    /// `HashMap<K, V>`.
    pub const HASH_MAP: &str = "HashMap";
    /// `BTreeMap<K, V>`.
    pub const BTREE_MAP: &str = "BTreeMap";
}

impl TypeRegistry {
    /// Creates a registry holding the built-in collection types.
    pub fn new() -> Self {
        let mut types = HashMap::new();
        for descriptor in [
            TypeDescriptor::sequence(builtin::VEC, empty_vec),
            TypeDescriptor::sequence(builtin::VEC_DEQUE, empty_vec_deque),
            TypeDescriptor::sequence(builtin::HASH_SET, empty_hash_set),
            TypeDescriptor::sequence(builtin::BTREE_SET, empty_btree_set),
            TypeDescriptor::map(builtin::HASH_MAP, empty_hash_map),
            TypeDescriptor::map(builtin::BTREE_MAP, empty_btree_map),
        ] {
            types.insert(descriptor.name.clone(), descriptor);
        }
        Self { types }
    }

    /// True if `identifier` is part of the closed, registration-free set.
    pub fn is_reserved(identifier: &str) -> bool {
        identifier == NULL_IDENTIFIER
            || identifier == TEXT_IDENTIFIER
            || identifier == ANY_IDENTIFIER
            || identifier.starts_with(ARRAY_PREFIX)
            || PrimitiveKind::from_keyword(identifier).is_some()
    }

    /// Adds a named type.
    ///
    /// Registering an identical descriptor twice is a no-op; a different
    /// descriptor under an existing identifier is rejected.
    pub fn insert(&mut self, descriptor: TypeDescriptor) -> Result<()> {
        if descriptor.name.is_empty() || Self::is_reserved(&descriptor.name) {
            return Err(UserialError::Format(format!(
                "`{}` is a reserved type identifier",
                descriptor.name
            )));
        }
        if let Some(existing) = self.types.get(&descriptor.name) {
            if existing.same_shape(&descriptor) {
                return Ok(());
            }
            return Err(UserialError::Format(format!(
                "conflicting registration for `{}`",
                descriptor.name
            )));
        }
        log::debug!(
            "[TypeRegistry] registered {} `{}` ({} declared fields)",
            descriptor.kind_label(),
            descriptor.name,
            descriptor.fields.len()
        );
        self.types.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    /// Registers `T` and every type it references.
    pub fn register<T: Reflect>(&mut self) -> Result<()> {
        T::register(self)
    }

    /// True if a named type is registered under `identifier`.
    pub fn contains(&self, identifier: &str) -> bool {
        self.types.contains_key(identifier)
    }

    /// The descriptor registered under `identifier`.
    pub fn get(&self, identifier: &str) -> Option<&TypeDescriptor> {
        self.types.get(identifier)
    }

    /// Number of named types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// True if no named types are registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Resolves an identifier.
    ///
    /// # Errors
    /// [`UserialError::UnresolvableType`] when the identifier (or an array's
    /// element identifier) names nothing known. `null` does not resolve: it is
    /// a frame sentinel, not a type. [`UserialError::Format`] when an array
    /// identifier nests deeper than [`MAX_ARRAY_RANK`].
    pub fn resolve<'a>(&'a self, identifier: &'a str) -> Result<Resolved<'a>> {
        let base = identifier.trim_start_matches(ARRAY_PREFIX);
        let rank = identifier.len() - base.len();
        if rank > MAX_ARRAY_RANK {
            return Err(UserialError::Format(format!(
                "array identifier of rank {rank} exceeds {MAX_ARRAY_RANK}"
            )));
        }
        match self.resolve_base(base)? {
            _ if rank > 0 => Ok(Resolved::Array {
                element: &identifier[ARRAY_PREFIX.len_utf8()..],
            }),
            resolved => Ok(resolved),
        }
    }

    fn resolve_base<'a>(&'a self, identifier: &'a str) -> Result<Resolved<'a>> {
        if let Some(kind) = PrimitiveKind::from_keyword(identifier) {
            return Ok(Resolved::Primitive(kind));
        }
        if identifier == TEXT_IDENTIFIER {
            return Ok(Resolved::Text);
        }
        if identifier == ANY_IDENTIFIER {
            return Ok(Resolved::Any);
        }
        self.types
            .get(identifier)
            .map(Resolved::Named)
            .ok_or_else(|| UserialError::UnresolvableType(identifier.to_string()))
    }

    /// Resolves an identifier that must name a registered type.
    pub fn named(&self, identifier: &str) -> Result<&TypeDescriptor> {
        self.types
            .get(identifier)
            .ok_or_else(|| UserialError::UnresolvableType(identifier.to_string()))
    }

    /// The identifier a value is framed with.
    pub fn identifier_of<'v>(&self, value: &'v Value) -> Cow<'v, str> {
        value.identifier()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
