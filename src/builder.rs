//! The instance builder.
//!
//! Decoding a composite is two-phase: obtain a placeholder instance, then
//! overwrite it field by field with decoded values. This module owns the first
//! phase. A type may offer several [`Initializer`]s; a zero-argument one wins,
//! otherwise the one with the fewest parameters is called with synthesized zero
//! arguments. Whatever the initializer stored is discarded by the reader, which
//! overwrites every encoded field.

use crate::error::{Result, UserialError};
use crate::fields::{self, FieldDescriptor};
use crate::types::{EnumConstant, PrimitiveKind, TypeDescriptor, TypeKind, TypeRegistry};
use crate::value::{Composite, EnumValue, Field, Value};

/// A way to construct an instance of a named type.
#[derive(Debug, Clone)]
pub enum Initializer {
    /// Zero-argument constructor, e.g. the type's `Default`.
    Nullary(fn() -> Result<Value>),
    /// Struct-literal construction: one parameter per instance field, in
    /// field enumeration order.
    Memberwise,
    /// A hand-registered constructor taking `params` (declared identifiers).
    Custom {
        /// Declared identifiers of the parameters.
        params: Vec<String>,
        /// Builds the instance from one argument per parameter.
        construct: fn(Vec<Value>) -> Result<Value>,
    },
}

/// Produces placeholder instances for the reader.
#[derive(Debug, Clone, Copy)]
pub struct InstanceBuilder<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> InstanceBuilder<'r> {
    /// Creates a builder resolving field lists through `registry`.
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    /// Builds a placeholder composite of `descriptor`.
    ///
    /// # Errors
    /// [`UserialError::NoUsableInitializer`] if the type has no initializer.
    pub fn build(&self, descriptor: &TypeDescriptor) -> Result<Composite> {
        if let Some(nullary) = nullary(descriptor) {
            return expect_composite(descriptor, nullary()?);
        }

        let mut best: Option<(usize, &Initializer)> = None;
        for initializer in &descriptor.initializers {
            let arity = self.arity(descriptor, initializer)?;
            if best.is_none_or(|(fewest, _)| arity < fewest) {
                best = Some((arity, initializer));
            }
        }

        match best {
            Some((_, Initializer::Custom { params, construct })) => {
                let args = params.iter().map(|p| self.zero_value(p)).collect();
                expect_composite(descriptor, construct(args)?)
            }
            Some(_) => {
                let staged = fields::instance_fields(self.registry, descriptor)?
                    .into_iter()
                    .map(|f| self.zero_field(f))
                    .collect();
                Ok(Composite::new(descriptor.name.clone(), staged))
            }
            None => Err(UserialError::NoUsableInitializer(descriptor.name.clone())),
        }
    }

    /// Builds an empty map or sequence through its zero-argument initializer.
    pub fn build_empty(&self, descriptor: &TypeDescriptor) -> Result<Value> {
        let nullary = nullary(descriptor)
            .ok_or_else(|| UserialError::NoUsableInitializer(descriptor.name.clone()))?;
        let value = nullary()?;
        let matches = match (&descriptor.kind, &value) {
            (TypeKind::Map, Value::Map { type_name, .. })
            | (TypeKind::Sequence, Value::Sequence { type_name, .. }) => {
                *type_name == descriptor.name
            }
            _ => false,
        };
        if !matches {
            return Err(UserialError::Format(format!(
                "initializer of `{}` produced `{}`",
                descriptor.name,
                value.identifier()
            )));
        }
        Ok(value)
    }

    /// Stages an enum constant with zero values in its payload fields.
    pub fn stage_constant(&self, descriptor: &TypeDescriptor, constant: &EnumConstant) -> EnumValue {
        let staged = fields::declared_constant_fields(constant)
            .into_iter()
            .map(|f| self.zero_field(f))
            .collect();
        EnumValue::new(descriptor.name.clone(), constant.name.clone(), staged)
    }

    /// The synthesized argument for a parameter of `declared_type`: the zero of
    /// a primitive kind, `null` for everything else.
    pub fn zero_value(&self, declared_type: &str) -> Value {
        PrimitiveKind::from_keyword(declared_type).map_or(Value::Null, PrimitiveKind::zero)
    }

    fn zero_field(&self, field: &FieldDescriptor) -> Field {
        let zero = if field.nullable {
            Value::Null
        } else {
            self.zero_value(&field.declared_type)
        };
        Field::new(field.owner.clone(), field.name.clone(), zero)
    }

    fn arity(&self, descriptor: &TypeDescriptor, initializer: &Initializer) -> Result<usize> {
        Ok(match initializer {
            Initializer::Nullary(_) => 0,
            Initializer::Memberwise => fields::instance_fields(self.registry, descriptor)?.len(),
            Initializer::Custom { params, .. } => params.len(),
        })
    }
}

fn nullary(descriptor: &TypeDescriptor) -> Option<fn() -> Result<Value>> {
    descriptor.initializers.iter().find_map(|i| match i {
        Initializer::Nullary(f) => Some(*f),
        _ => None,
    })
}

fn expect_composite(descriptor: &TypeDescriptor, value: Value) -> Result<Composite> {
    match value {
        Value::Composite(c) if c.type_name() == descriptor.name => Ok(c),
        other => Err(UserialError::Format(format!(
            "initializer of `{}` produced `{}`",
            descriptor.name,
            other.identifier()
        ))),
    }
}
