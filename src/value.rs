//! The dynamic value model.
//!
//! [`Value`] is the closed set of kinds the codec knows how to frame. Typed Rust
//! values convert into it through [`crate::Reflect`]; [`crate::Codec::decode`]
//! returns it when no target type is named.

use std::borrow::Cow;
use std::cmp::Ordering;

use serde::Serialize;

use crate::error::{Result, UserialError};
use crate::format::{ARRAY_PREFIX, NULL_IDENTIFIER, TEXT_IDENTIFIER};
use crate::types::PrimitiveKind;

/// A dynamically typed value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    /// No value.
    Null,
    /// Signed 8-bit integer (`byte`).
    Byte(i8),
    /// Signed 16-bit integer (`short`).
    Short(i16),
    /// Signed 32-bit integer (`int`).
    Int(i32),
    /// Signed 64-bit integer (`long`).
    Long(i64),
    /// 32-bit float (`float`).
    Float(f32),
    /// 64-bit float (`double`).
    Double(f64),
    /// A single UTF-16 code unit (`char`).
    Char(u16),
    /// `boolean`.
    Boolean(bool),
    /// UTF-8 text (`String`).
    Text(String),
    /// Fixed-length array with a declared element type.
    Array {
        /// Identifier of the element type.
        element_type: String,
        /// The elements.
        items: Vec<Value>,
    },
    /// An enum constant with its payload fields.
    Enum(EnumValue),
    /// A key/value mapping of a registered map type.
    Map {
        /// Identifier of the concrete map type.
        type_name: String,
        /// Entries in encounter order.
        entries: Vec<(Value, Value)>,
    },
    /// A sequence of a registered collection type.
    Sequence {
        /// Identifier of the concrete collection type.
        type_name: String,
        /// Elements in encounter order.
        items: Vec<Value>,
    },
    /// A plain composite object.
    Composite(Composite),
}

impl Value {
    /// The type identifier this value is framed with.
    pub fn identifier(&self) -> Cow<'_, str> {
        match self {
            Self::Null => Cow::Borrowed(NULL_IDENTIFIER),
            Self::Text(_) => Cow::Borrowed(TEXT_IDENTIFIER),
            Self::Array { element_type, .. } => Cow::Owned(format!("{ARRAY_PREFIX}{element_type}")),
            Self::Enum(e) => Cow::Borrowed(&e.type_name),
            Self::Map { type_name, .. } | Self::Sequence { type_name, .. } => {
                Cow::Borrowed(type_name)
            }
            Self::Composite(c) => Cow::Borrowed(&c.type_name),
            other => match other.primitive_kind() {
                Some(kind) => Cow::Borrowed(kind.keyword()),
                None => Cow::Borrowed(NULL_IDENTIFIER),
            },
        }
    }

    /// The primitive kind, if this is one of the eight primitive values.
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        Some(match self {
            Self::Byte(_) => PrimitiveKind::Byte,
            Self::Short(_) => PrimitiveKind::Short,
            Self::Int(_) => PrimitiveKind::Int,
            Self::Long(_) => PrimitiveKind::Long,
            Self::Float(_) => PrimitiveKind::Float,
            Self::Double(_) => PrimitiveKind::Double,
            Self::Char(_) => PrimitiveKind::Char,
            Self::Boolean(_) => PrimitiveKind::Boolean,
            _ => return None,
        })
    }

    /// A total order over values.
    ///
    /// Kinds order by their declaration order in [`Value`]; floats use
    /// `total_cmp`. Unordered collections sort by this before framing, so
    /// equal hash sets and maps produce identical bytes.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Byte(a), Self::Byte(b)) => a.cmp(b),
            (Self::Short(a), Self::Short(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Long(a), Self::Long(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Double(a), Self::Double(b)) => a.total_cmp(b),
            (Self::Char(a), Self::Char(b)) => a.cmp(b),
            (Self::Boolean(a), Self::Boolean(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (
                Self::Array {
                    element_type: ta,
                    items: a,
                },
                Self::Array {
                    element_type: tb,
                    items: b,
                },
            )
            | (
                Self::Sequence {
                    type_name: ta,
                    items: a,
                },
                Self::Sequence {
                    type_name: tb,
                    items: b,
                },
            ) => ta
                .cmp(tb)
                .then_with(|| cmp_slices(&a[..], &b[..], Value::canonical_cmp)),
            (
                Self::Map {
                    type_name: ta,
                    entries: a,
                },
                Self::Map {
                    type_name: tb,
                    entries: b,
                },
            ) => ta.cmp(tb).then_with(|| cmp_slices(&a[..], &b[..], cmp_entries)),
            (Self::Enum(a), Self::Enum(b)) => a
                .type_name
                .cmp(&b.type_name)
                .then_with(|| a.constant.cmp(&b.constant))
                .then_with(|| cmp_slices(&a.fields[..], &b.fields[..], Field::canonical_cmp)),
            (Self::Composite(a), Self::Composite(b)) => a
                .type_name
                .cmp(&b.type_name)
                .then_with(|| cmp_slices(&a.fields[..], &b.fields[..], Field::canonical_cmp)),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Byte(_) => 1,
            Self::Short(_) => 2,
            Self::Int(_) => 3,
            Self::Long(_) => 4,
            Self::Float(_) => 5,
            Self::Double(_) => 6,
            Self::Char(_) => 7,
            Self::Boolean(_) => 8,
            Self::Text(_) => 9,
            Self::Array { .. } => 10,
            Self::Enum(_) => 11,
            Self::Map { .. } => 12,
            Self::Sequence { .. } => 13,
            Self::Composite(_) => 14,
        }
    }

    /// Check if value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get as text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as a composite.
    pub fn as_composite(&self) -> Option<&Composite> {
        match self {
            Self::Composite(c) => Some(c),
            _ => None,
        }
    }

    /// Try to get as an enum constant.
    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Self::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Unwraps a composite of exactly `type_name`.
    pub fn into_composite(self, type_name: &str) -> Result<Composite> {
        match self {
            Self::Composite(c) if c.type_name == type_name => Ok(c),
            other => Err(UserialError::mismatch(type_name, &other)),
        }
    }

    /// Unwraps an enum constant of exactly `type_name`.
    pub fn into_enum(self, type_name: &str) -> Result<EnumValue> {
        match self {
            Self::Enum(e) if e.type_name == type_name => Ok(e),
            other => Err(UserialError::mismatch(type_name, &other)),
        }
    }
}

/// Orders map entries by key, then by value.
pub(crate) fn cmp_entries(a: &(Value, Value), b: &(Value, Value)) -> Ordering {
    a.0.canonical_cmp(&b.0).then_with(|| a.1.canonical_cmp(&b.1))
}

fn cmp_slices<T>(a: &[T], b: &[T], cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| cmp(x, y))
        .find(|o| o.is_ne())
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}

/// A named data member together with the type that declares it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    /// Identifier of the declaring type.
    pub owner: String,
    /// Field name within the declaring type.
    pub name: String,
    /// Current value.
    pub value: Value,
}

impl Field {
    /// Creates a field.
    pub fn new(owner: impl Into<String>, name: impl Into<String>, value: Value) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            value,
        }
    }

    fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.owner
            .cmp(&other.owner)
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.value.canonical_cmp(&other.value))
    }
}

/// The field set of a composite object, inherited fields included.
///
/// Fields are kept in enumeration order: the concrete type's own fields, then
/// each ancestor's, parent-most last. A child may declare a field with the same
/// name as an ancestor; lookups by name alone find the most derived one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Composite {
    type_name: String,
    fields: Vec<Field>,
}

impl Composite {
    /// Creates a composite of `type_name` with the given fields.
    pub fn new(type_name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            type_name: type_name.into(),
            fields,
        }
    }

    /// Identifier of the concrete type.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// All fields in enumeration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Value of the first field called `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    /// Value of the field `name` declared by `owner`.
    pub fn get_declared(&self, owner: &str, name: &str) -> Option<&Value> {
        self.position(owner, name).map(|i| &self.fields[i].value)
    }

    /// Overwrites the field `name` declared by `owner`, appending it if absent.
    pub fn put(&mut self, owner: &str, name: &str, value: Value) {
        match self.position(owner, name) {
            Some(i) => self.fields[i].value = value,
            None => self.fields.push(Field::new(owner, name, value)),
        }
    }

    /// Removes and returns the field `name` declared by `owner`.
    pub fn take(&mut self, owner: &str, name: &str) -> Result<Value> {
        match self.position(owner, name) {
            Some(i) => Ok(self.fields.remove(i).value),
            None => Err(UserialError::field_access(
                self.type_name.clone(),
                name,
                format!("no field declared by `{owner}`"),
            )),
        }
    }

    /// Appends the fields of an ancestor after this type's own fields.
    pub fn extend_inherited(&mut self, parent: Composite) {
        self.fields.extend(parent.fields);
    }

    /// Re-labels the remaining fields as an instance of the ancestor `parent`.
    ///
    /// Used by typed reconstruction once the child's own fields have been taken.
    pub fn into_parent(self, parent: impl Into<String>) -> Composite {
        Composite {
            type_name: parent.into(),
            fields: self.fields,
        }
    }

    fn position(&self, owner: &str, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.owner == owner && f.name == name)
    }
}

/// An enum constant: its name plus the fields that constant carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumValue {
    /// Identifier of the enum type.
    pub type_name: String,
    /// Constant name.
    pub constant: String,
    /// Declared fields of the constant.
    pub fields: Vec<Field>,
}

impl EnumValue {
    /// Creates an enum constant value.
    pub fn new(type_name: impl Into<String>, constant: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            type_name: type_name.into(),
            constant: constant.into(),
            fields,
        }
    }

    /// Value of the payload field `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    /// Removes and returns the payload field `name`.
    pub fn take(&mut self, name: &str) -> Result<Value> {
        match self.fields.iter().position(|f| f.name == name) {
            Some(i) => Ok(self.fields.remove(i).value),
            None => Err(UserialError::field_access(
                format!("{}::{}", self.type_name, self.constant),
                name,
                "missing payload field",
            )),
        }
    }
}
