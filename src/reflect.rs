//! Defines the `Reflect` trait bridging typed Rust values and [`Value`].
//!
//! Instead of runtime reflection, each type describes itself: its identifier,
//! how it turns into a dynamic value, how it is rebuilt from one, and what it
//! registers in a [`TypeRegistry`]. `#[derive(Reflect)]` writes all of this for
//! structs and enums; the impls below cover primitives, text and the standard
//! collections.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;

use crate::error::{Result, UserialError};
use crate::format::{ANY_IDENTIFIER, ARRAY_PREFIX, TEXT_IDENTIFIER};
use crate::types::{PrimitiveKind, TypeRegistry, builtin};
use crate::value::{self, Value};

/// A type that can be encoded and decoded by the codec.
pub trait Reflect: Sized {
    /// The identifier this type is framed with.
    ///
    /// `Option<T>` shares the identifier of `T`: absence is framed as `null`.
    fn type_identifier() -> Cow<'static, str>;

    /// True if the type represents absence as `null`.
    ///
    /// Fields of such a type accept `null` even when their declared type is
    /// primitive.
    const NULLABLE: bool = false;

    /// Converts `self` into a dynamic value.
    fn to_value(&self) -> Result<Value>;

    /// Rebuilds an instance from a dynamic value.
    ///
    /// # Errors
    /// [`UserialError::FieldAccess`] when the value's kind does not match.
    fn from_value(value: Value) -> Result<Self>;

    /// Registers this type and the types it references.
    fn register(registry: &mut TypeRegistry) -> Result<()> {
        let _ = registry;
        Ok(())
    }
}

macro_rules! impl_reflect_primitive {
    ($($t:ty => $kind:ident),* $(,)?) => {
        $(
            impl Reflect for $t {
                fn type_identifier() -> Cow<'static, str> {
                    Cow::Borrowed(PrimitiveKind::$kind.keyword())
                }

                fn to_value(&self) -> Result<Value> {
                    Ok(Value::$kind(*self))
                }

                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::$kind(v) => Ok(v),
                        other => Err(UserialError::mismatch(PrimitiveKind::$kind.keyword(), &other)),
                    }
                }
            }
        )*
    }
}

impl_reflect_primitive!(
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    bool => Boolean,
);

impl Reflect for char {
    fn type_identifier() -> Cow<'static, str> {
        Cow::Borrowed(PrimitiveKind::Char.keyword())
    }

    fn to_value(&self) -> Result<Value> {
        let mut units = [0u16; 2];
        match self.encode_utf16(&mut units) {
            [unit] => Ok(Value::Char(*unit)),
            _ => Err(UserialError::UnsupportedValue(format!(
                "'{self}' (U+{:04X}) does not fit a single UTF-16 code unit",
                u32::from(*self)
            ))),
        }
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Char(unit) => char::from_u32(u32::from(unit)).ok_or_else(|| {
                UserialError::field_access(
                    "char",
                    "<value>",
                    format!("lone surrogate U+{unit:04X} is not a char"),
                )
            }),
            other => Err(UserialError::mismatch("char", &other)),
        }
    }
}

impl Reflect for String {
    fn type_identifier() -> Cow<'static, str> {
        Cow::Borrowed(TEXT_IDENTIFIER)
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Text(self.clone()))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(UserialError::mismatch(TEXT_IDENTIFIER, &other)),
        }
    }
}

impl Reflect for Value {
    fn type_identifier() -> Cow<'static, str> {
        Cow::Borrowed(ANY_IDENTIFIER)
    }

    fn to_value(&self) -> Result<Value> {
        Ok(self.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

/// `None` is framed as `null`. Declared fields of an `Option` type are
/// nullable; array elements of a primitive kind are not.
impl<T: Reflect> Reflect for Option<T> {
    const NULLABLE: bool = true;

    fn type_identifier() -> Cow<'static, str> {
        T::type_identifier()
    }

    fn to_value(&self) -> Result<Value> {
        match self {
            Some(v) => v.to_value(),
            None => Ok(Value::Null),
        }
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn register(registry: &mut TypeRegistry) -> Result<()> {
        T::register(registry)
    }
}

impl<T: Reflect> Reflect for Box<T> {
    const NULLABLE: bool = T::NULLABLE;

    fn type_identifier() -> Cow<'static, str> {
        T::type_identifier()
    }

    fn to_value(&self) -> Result<Value> {
        (**self).to_value()
    }

    fn from_value(value: Value) -> Result<Self> {
        T::from_value(value).map(Box::new)
    }

    fn register(registry: &mut TypeRegistry) -> Result<()> {
        T::register(registry)
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn type_identifier() -> Cow<'static, str> {
        Cow::Owned(format!("{ARRAY_PREFIX}{}", T::type_identifier()))
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Array {
            element_type: T::type_identifier().into_owned(),
            items: self.iter().map(Reflect::to_value).collect::<Result<_>>()?,
        })
    }

    fn from_value(value: Value) -> Result<Self> {
        let element = T::type_identifier();
        let items = match value {
            Value::Array {
                element_type,
                items,
            } if element_type == element => items,
            other => return Err(UserialError::mismatch(&Self::type_identifier(), &other)),
        };
        let found = items.len();
        let decoded = items
            .into_iter()
            .map(T::from_value)
            .collect::<Result<Vec<T>>>()?;
        decoded.try_into().map_err(|_| {
            UserialError::field_access(
                Self::type_identifier(),
                "<length>",
                format!("expected {N} elements, found {found}"),
            )
        })
    }

    fn register(registry: &mut TypeRegistry) -> Result<()> {
        T::register(registry)
    }
}

fn sequence_items(type_name: &str, value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Sequence {
            type_name: found,
            items,
        } if found == type_name => Ok(items),
        other => Err(UserialError::mismatch(type_name, &other)),
    }
}

fn map_entries(type_name: &str, value: Value) -> Result<Vec<(Value, Value)>> {
    match value {
        Value::Map {
            type_name: found,
            entries,
        } if found == type_name => Ok(entries),
        other => Err(UserialError::mismatch(type_name, &other)),
    }
}

/// Items of ordered collections keep their iteration order.
fn keep_order(_: &mut [Value]) {}

/// Items of hash collections are sorted so equal sets frame identically.
fn canonical_order(items: &mut [Value]) {
    items.sort_by(Value::canonical_cmp);
}

macro_rules! impl_reflect_sequence {
    ($($coll:ident<T $(: $bound:ident $(+ $more:ident)*)?> => $id:path, $order:ident),* $(,)?) => {
        $(
            impl<T: Reflect $(+ $bound $(+ $more)*)?> Reflect for $coll<T> {
                fn type_identifier() -> Cow<'static, str> {
                    Cow::Borrowed($id)
                }

                fn to_value(&self) -> Result<Value> {
                    let mut items = self
                        .iter()
                        .map(Reflect::to_value)
                        .collect::<Result<Vec<_>>>()?;
                    $order(&mut items);
                    Ok(Value::Sequence {
                        type_name: $id.to_string(),
                        items,
                    })
                }

                fn from_value(value: Value) -> Result<Self> {
                    sequence_items($id, value)?
                        .into_iter()
                        .map(T::from_value)
                        .collect()
                }

                fn register(registry: &mut TypeRegistry) -> Result<()> {
                    T::register(registry)
                }
            }
        )*
    }
}

impl_reflect_sequence!(
    Vec<T> => builtin::VEC, keep_order,
    VecDeque<T> => builtin::VEC_DEQUE, keep_order,
    HashSet<T: Eq + Hash> => builtin::HASH_SET, canonical_order,
    BTreeSet<T: Ord> => builtin::BTREE_SET, keep_order,
);

impl<K: Reflect + Eq + Hash, V: Reflect> Reflect for HashMap<K, V> {
    fn type_identifier() -> Cow<'static, str> {
        Cow::Borrowed(builtin::HASH_MAP)
    }

    fn to_value(&self) -> Result<Value> {
        let mut entries = self
            .iter()
            .map(|(k, v)| Ok((k.to_value()?, v.to_value()?)))
            .collect::<Result<Vec<_>>>()?;
        entries.sort_by(value::cmp_entries);
        Ok(Value::Map {
            type_name: builtin::HASH_MAP.to_string(),
            entries,
        })
    }

    fn from_value(value: Value) -> Result<Self> {
        map_entries(builtin::HASH_MAP, value)?
            .into_iter()
            .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
            .collect()
    }

    fn register(registry: &mut TypeRegistry) -> Result<()> {
        K::register(registry)?;
        V::register(registry)
    }
}

impl<K: Reflect + Ord, V: Reflect> Reflect for BTreeMap<K, V> {
    fn type_identifier() -> Cow<'static, str> {
        Cow::Borrowed(builtin::BTREE_MAP)
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Map {
            type_name: builtin::BTREE_MAP.to_string(),
            entries: self
                .iter()
                .map(|(k, v)| Ok((k.to_value()?, v.to_value()?)))
                .collect::<Result<_>>()?,
        })
    }

    fn from_value(value: Value) -> Result<Self> {
        map_entries(builtin::BTREE_MAP, value)?
            .into_iter()
            .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
            .collect()
    }

    fn register(registry: &mut TypeRegistry) -> Result<()> {
        K::register(registry)?;
        V::register(registry)
    }
}
