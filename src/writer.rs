//! The object writer: recursive encoder from [`Value`] to frames.
//!
//! Dispatch follows the value's kind in a fixed order: null, primitive, text,
//! array, enum, map, sequence, composite. Every named type is resolved through
//! the registry before anything about it is written, so a stream can only name
//! types the reader side can resolve as well.

use crate::error::{Result, UserialError};
use crate::fields;
use crate::format::{self, NULL_IDENTIFIER, TEXT_IDENTIFIER};
use crate::types::{TypeDescriptor, TypeKind, TypeRegistry};
use crate::value::{Composite, EnumValue, Value};

/// Appends frames to an owned buffer.
///
/// After an error the buffer holds a partial frame and must be discarded;
/// [`crate::Codec`] never hands such a buffer out.
#[derive(Debug)]
pub struct ObjectWriter<'r> {
    registry: &'r TypeRegistry,
    buf: Vec<u8>,
    depth: usize,
    max_depth: Option<usize>,
}

impl<'r> ObjectWriter<'r> {
    /// Creates a writer with unbounded nesting.
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            buf: Vec::new(),
            depth: 0,
            max_depth: None,
        }
    }

    /// Limits the nesting depth of written frames.
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consumes the writer, returning the buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Writes one frame for `value`, recursing into nested values.
    pub fn write_value(&mut self, value: &Value) -> Result<()> {
        self.depth += 1;
        let result = match self.max_depth {
            Some(limit) if self.depth > limit => Err(UserialError::DepthLimitExceeded(limit)),
            _ => self.write_frame(value),
        };
        self.depth -= 1;
        result
    }

    fn write_frame(&mut self, value: &Value) -> Result<()> {
        log::trace!(
            "[ObjectWriter] frame `{}` at offset {} (depth {})",
            value.identifier(),
            self.buf.len(),
            self.depth
        );
        match value {
            Value::Null => format::put_utf(&mut self.buf, NULL_IDENTIFIER),
            Value::Text(s) => {
                format::put_utf(&mut self.buf, TEXT_IDENTIFIER)?;
                format::put_utf(&mut self.buf, s)
            }
            Value::Array {
                element_type,
                items,
            } => self.write_array(element_type, items),
            Value::Enum(e) => self.write_enum(e),
            Value::Map { type_name, entries } => self.write_map(type_name, entries),
            Value::Sequence { type_name, items } => self.write_sequence(type_name, items),
            Value::Composite(c) => self.write_composite(c),
            primitive => self.write_primitive(primitive),
        }
    }

    fn write_primitive(&mut self, value: &Value) -> Result<()> {
        let kind = value.primitive_kind().ok_or_else(|| {
            UserialError::UnsupportedValue(format!("`{}` is not a primitive", value.identifier()))
        })?;
        format::put_utf(&mut self.buf, kind.keyword())?;
        match *value {
            Value::Byte(v) => self.buf.extend_from_slice(&v.to_be_bytes()),
            Value::Short(v) => self.buf.extend_from_slice(&v.to_be_bytes()),
            Value::Int(v) => self.buf.extend_from_slice(&v.to_be_bytes()),
            Value::Long(v) => self.buf.extend_from_slice(&v.to_be_bytes()),
            Value::Float(v) => self.buf.extend_from_slice(&v.to_be_bytes()),
            Value::Double(v) => self.buf.extend_from_slice(&v.to_be_bytes()),
            Value::Char(v) => self.buf.extend_from_slice(&v.to_be_bytes()),
            Value::Boolean(v) => self.buf.push(u8::from(v)),
            _ => {}
        }
        Ok(())
    }

    fn write_array(&mut self, element_type: &str, items: &[Value]) -> Result<()> {
        let identifier = format!("{}{element_type}", format::ARRAY_PREFIX);
        self.registry.resolve(&identifier)?;
        if let Some((index, item)) = items
            .iter()
            .enumerate()
            .find(|(_, item)| !fields::accepts(element_type, item))
        {
            return Err(UserialError::UnsupportedValue(format!(
                "element {index} of a `{element_type}` array is `{}`",
                item.identifier()
            )));
        }

        format::put_utf(&mut self.buf, &identifier)?;
        format::put_count(&mut self.buf, items.len())?;
        format::put_utf(&mut self.buf, element_type)?;
        for item in items {
            self.write_value(item)?;
        }
        Ok(())
    }

    fn write_enum(&mut self, value: &EnumValue) -> Result<()> {
        let registry = self.registry;
        let descriptor = expect_kind(registry.named(&value.type_name)?, "enum", |k| {
            matches!(k, TypeKind::Enum(_))
        })?;
        let constant = descriptor.constant(&value.constant).ok_or_else(|| {
            UserialError::UnresolvableType(format!("{}::{}", value.type_name, value.constant))
        })?;

        format::put_utf(&mut self.buf, &value.type_name)?;
        format::put_utf(&mut self.buf, &value.constant)?;
        for field in fields::declared_constant_fields(constant) {
            let payload = value.get(&field.name).ok_or_else(|| {
                UserialError::field_access(
                    format!("{}::{}", value.type_name, value.constant),
                    &field.name,
                    "field is missing",
                )
            })?;
            field.check(&value.type_name, payload)?;
            self.write_value(payload)?;
        }
        Ok(())
    }

    fn write_map(&mut self, type_name: &str, entries: &[(Value, Value)]) -> Result<()> {
        expect_kind(self.registry.named(type_name)?, "map", |k| *k == TypeKind::Map)?;
        format::put_utf(&mut self.buf, type_name)?;
        format::put_count(&mut self.buf, entries.len())?;
        for (key, value) in entries {
            self.write_value(key)?;
            self.write_value(value)?;
        }
        Ok(())
    }

    fn write_sequence(&mut self, type_name: &str, items: &[Value]) -> Result<()> {
        expect_kind(self.registry.named(type_name)?, "sequence", |k| {
            *k == TypeKind::Sequence
        })?;
        format::put_utf(&mut self.buf, type_name)?;
        format::put_count(&mut self.buf, items.len())?;
        for item in items {
            self.write_value(item)?;
        }
        Ok(())
    }

    fn write_composite(&mut self, composite: &Composite) -> Result<()> {
        let registry = self.registry;
        let descriptor = expect_kind(registry.named(composite.type_name())?, "composite", |k| {
            *k == TypeKind::Composite
        })?;

        format::put_utf(&mut self.buf, composite.type_name())?;
        for field in fields::instance_fields(registry, descriptor)? {
            let value = field.get(composite)?;
            field.check(composite.type_name(), value)?;
            self.write_value(value)?;
        }
        Ok(())
    }
}

fn expect_kind<'d>(
    descriptor: &'d TypeDescriptor,
    expected: &str,
    is_expected: impl Fn(&TypeKind) -> bool,
) -> Result<&'d TypeDescriptor> {
    if is_expected(&descriptor.kind) {
        Ok(descriptor)
    } else {
        Err(UserialError::UnsupportedValue(format!(
            "`{}` is registered as a {}, not a {expected}",
            descriptor.name,
            descriptor.kind_label()
        )))
    }
}
