//! The field enumerator.
//!
//! Decides which data members of a type take part in encoding and in which
//! order. No field names are written to the stream, so the order produced here
//! is the format: the concrete type's own fields first, then each ancestor's,
//! parent-most last. Writer and reader both go through this module.

use crate::error::{Result, UserialError};
use crate::format::ANY_IDENTIFIER;
use crate::types::{EnumConstant, PrimitiveKind, TypeDescriptor, TypeKind, TypeRegistry};
use crate::value::{Composite, Value};

/// Describes one data member of a composite or enum constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Identifier of the declaring type.
    pub owner: String,
    /// Member name.
    pub name: String,
    /// Identifier of the declared type.
    pub declared_type: String,
    /// Described but never encoded.
    pub skipped: bool,
    /// Holds `null` even when the declared type is primitive.
    pub nullable: bool,
}

impl FieldDescriptor {
    /// A field that takes part in encoding.
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        declared_type: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            declared_type: declared_type.into(),
            skipped: false,
            nullable: false,
        }
    }

    /// Marks whether the field may hold `null`.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Marks the field as excluded from encoding.
    pub fn skipped(mut self) -> Self {
        self.skipped = true;
        self
    }

    /// Reads this field off a composite.
    pub fn get<'c>(&self, composite: &'c Composite) -> Result<&'c Value> {
        composite
            .get_declared(&self.owner, &self.name)
            .ok_or_else(|| {
                UserialError::field_access(composite.type_name(), &self.name, "field is missing")
            })
    }

    /// Stores `value` into this field of a staged composite.
    ///
    /// Declared field types are not enforced by the staging representation, so
    /// this is the one place that checks them. The slot is overwritten even if
    /// the finished Rust type would expose it as immutable.
    pub fn set(&self, composite: &mut Composite, value: Value) -> Result<()> {
        self.check(composite.type_name(), &value)?;
        composite.put(&self.owner, &self.name, value);
        Ok(())
    }

    /// Checks that `value` may be stored in a field of the declared type.
    pub fn check(&self, type_name: &str, value: &Value) -> Result<()> {
        if (self.nullable && value.is_null()) || accepts(&self.declared_type, value) {
            return Ok(());
        }
        Err(UserialError::field_access(
            type_name,
            &self.name,
            format!(
                "declared `{}`, got `{}`",
                self.declared_type,
                value.identifier()
            ),
        ))
    }
}

/// True if a slot declared as `declared_type` can hold `value`.
///
/// `object` holds anything, `null` fits every non-primitive slot, anything else
/// must carry exactly the declared identifier.
pub fn accepts(declared_type: &str, value: &Value) -> bool {
    if declared_type == ANY_IDENTIFIER {
        return true;
    }
    if value.is_null() {
        return PrimitiveKind::from_keyword(declared_type).is_none();
    }
    value.identifier() == declared_type
}

/// Every described field, skipped ones included, child first then ancestors.
pub fn all_fields<'r>(
    registry: &'r TypeRegistry,
    descriptor: &'r TypeDescriptor,
) -> Result<Vec<&'r FieldDescriptor>> {
    let mut out = Vec::new();
    for ty in lineage(registry, descriptor)? {
        out.extend(ty.fields.iter());
    }
    Ok(out)
}

/// The full inherited list of encoded fields, used for composite objects.
pub fn instance_fields<'r>(
    registry: &'r TypeRegistry,
    descriptor: &'r TypeDescriptor,
) -> Result<Vec<&'r FieldDescriptor>> {
    let mut out = Vec::new();
    for ty in lineage(registry, descriptor)? {
        out.extend(ty.fields.iter().filter(|f| !f.skipped));
    }
    Ok(out)
}

/// Encoded fields declared by the type itself, ancestors excluded.
pub fn declared_fields(descriptor: &TypeDescriptor) -> Vec<&FieldDescriptor> {
    descriptor.fields.iter().filter(|f| !f.skipped).collect()
}

/// Encoded fields carried by one enum constant.
pub fn declared_constant_fields(constant: &EnumConstant) -> Vec<&FieldDescriptor> {
    constant.fields.iter().filter(|f| !f.skipped).collect()
}

/// The type followed by its ancestors, parent-most last.
fn lineage<'r>(
    registry: &'r TypeRegistry,
    descriptor: &'r TypeDescriptor,
) -> Result<Vec<&'r TypeDescriptor>> {
    let mut chain = vec![descriptor];
    let mut current = descriptor;
    while let Some(parent_name) = current.parent.as_deref() {
        let parent = registry.named(parent_name)?;
        if parent.kind != TypeKind::Composite {
            return Err(UserialError::Format(format!(
                "`{}` declares `{parent_name}` as parent, which is a {}",
                current.name,
                parent.kind_label()
            )));
        }
        if chain.iter().any(|t| t.name == parent.name) {
            return Err(UserialError::Format(format!(
                "inheritance cycle through `{parent_name}`"
            )));
        }
        chain.push(parent);
        current = parent;
    }
    Ok(chain)
}
