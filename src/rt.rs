// src/rt.rs

//! Runtime utilities for generated code (Macros).
//! Do not use directly.

use crate::error::{Result, UserialError};
use crate::reflect::Reflect;
use crate::value::{Composite, EnumValue, Value};

/// Zero-argument initializer backed by `Default`.
pub fn default_value<T: Reflect + Default>() -> Result<Value> {
    T::default().to_value()
}

/// Takes the field `name` declared by `owner` and converts it to `T`.
pub fn take_field<T: Reflect>(composite: &mut Composite, owner: &str, name: &str) -> Result<T> {
    let value = composite.take(owner, name)?;
    T::from_value(value).map_err(|e| in_field(e, owner, name))
}

/// Takes the payload field `name` of an enum constant and converts it to `T`.
pub fn take_constant_field<T: Reflect>(value: &mut EnumValue, name: &str) -> Result<T> {
    let owner = format!("{}::{}", value.type_name, value.constant);
    let field = value.take(name)?;
    T::from_value(field).map_err(|e| in_field(e, &owner, name))
}

/// Converts what is left of a composite into its parent type.
pub fn take_parent<P: Reflect>(composite: Composite) -> Result<P> {
    P::from_value(Value::Composite(composite.into_parent(P::type_identifier())))
}

/// Error for a constant name the enum does not declare.
pub fn unknown_constant(type_name: &str, constant: &str) -> UserialError {
    UserialError::UnresolvableType(format!("{type_name}::{constant}"))
}

/// Attaches the field location to a conversion error raised for a bare value.
fn in_field(err: UserialError, owner: &str, name: &str) -> UserialError {
    match err {
        UserialError::FieldAccess { field, reason, .. } if field == "<value>" => {
            UserialError::field_access(owner, name, reason)
        }
        other => other,
    }
}
