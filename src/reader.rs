//! The object reader: recursive decoder from frames to [`Value`].
//!
//! Mirrors [`crate::writer`], branching on the identifier at the head of each
//! frame instead of on a runtime value. Composites are materialized in two
//! phases: the instance builder yields a placeholder, then every field from the
//! field enumerator is decoded and stored into it in enumeration order.

use crate::builder::InstanceBuilder;
use crate::error::{Result, UserialError};
use crate::fields;
use crate::format::{ByteCursor, NULL_IDENTIFIER};
use crate::inspector::FrameRecorder;
use crate::types::{PrimitiveKind, Resolved, TypeDescriptor, TypeKind, TypeRegistry};
use crate::value::Value;

/// Decodes frames from a borrowed buffer.
#[derive(Debug)]
pub struct ObjectReader<'a, 'r> {
    registry: &'r TypeRegistry,
    cursor: ByteCursor<'a>,
    depth: usize,
    max_depth: Option<usize>,
    recorder: Option<FrameRecorder>,
}

impl<'a, 'r> ObjectReader<'a, 'r> {
    /// Creates a reader positioned at the first frame of `bytes`.
    pub fn new(registry: &'r TypeRegistry, bytes: &'a [u8]) -> Self {
        Self {
            registry,
            cursor: ByteCursor::new(bytes),
            depth: 0,
            max_depth: None,
            recorder: None,
        }
    }

    /// Limits the nesting depth of read frames.
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub(crate) fn with_recorder(mut self) -> Self {
        self.recorder = Some(FrameRecorder::default());
        self
    }

    pub(crate) fn take_recorder(&mut self) -> Option<FrameRecorder> {
        self.recorder.take()
    }

    /// Current offset into the buffer.
    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    /// Bytes left after the current position.
    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    /// True once the whole buffer has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.cursor.is_exhausted()
    }

    /// Decodes the frame at the cursor and advances past it.
    pub fn read_value(&mut self) -> Result<Value> {
        self.depth += 1;
        let result = match self.max_depth {
            Some(limit) if self.depth > limit => Err(UserialError::DepthLimitExceeded(limit)),
            _ => self.read_frame(),
        };
        self.depth -= 1;
        result
    }

    fn read_frame(&mut self) -> Result<Value> {
        let start = self.cursor.position();
        let identifier = self.cursor.read_utf()?;
        log::trace!(
            "[ObjectReader] frame `{identifier}` at offset {start} (depth {})",
            self.depth
        );
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.begin(start, identifier);
        }

        let value = if identifier == NULL_IDENTIFIER {
            Value::Null
        } else {
            let registry = self.registry;
            match registry.resolve(identifier)? {
                Resolved::Primitive(kind) => self.read_primitive(kind)?,
                Resolved::Text => Value::Text(self.cursor.read_utf()?.to_string()),
                Resolved::Any => {
                    return Err(UserialError::Format(format!(
                        "`{identifier}` at offset {start} is not a concrete frame type"
                    )));
                }
                Resolved::Array { element } => self.read_array(identifier, element)?,
                Resolved::Named(descriptor) => match descriptor.kind {
                    TypeKind::Enum(_) => self.read_enum(descriptor)?,
                    TypeKind::Map => self.read_map(descriptor)?,
                    TypeKind::Sequence => self.read_sequence(descriptor)?,
                    TypeKind::Composite => self.read_composite(descriptor)?,
                },
            }
        };

        let end = self.cursor.position();
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.end(end, &value);
        }
        Ok(value)
    }

    fn read_primitive(&mut self, kind: PrimitiveKind) -> Result<Value> {
        Ok(match kind {
            PrimitiveKind::Byte => Value::Byte(self.cursor.read_i8()?),
            PrimitiveKind::Short => Value::Short(self.cursor.read_i16()?),
            PrimitiveKind::Int => Value::Int(self.cursor.read_i32()?),
            PrimitiveKind::Long => Value::Long(self.cursor.read_i64()?),
            PrimitiveKind::Float => Value::Float(self.cursor.read_f32()?),
            PrimitiveKind::Double => Value::Double(self.cursor.read_f64()?),
            PrimitiveKind::Char => Value::Char(self.cursor.read_u16()?),
            PrimitiveKind::Boolean => Value::Boolean(self.cursor.read_bool()?),
        })
    }

    fn read_array(&mut self, identifier: &str, element: &str) -> Result<Value> {
        let count = self.cursor.read_count()?;
        let offset = self.cursor.position();
        let element_type = self.cursor.read_utf()?;
        if element_type != element {
            return Err(UserialError::Format(format!(
                "array `{identifier}` declares element type `{element_type}` at offset {offset}"
            )));
        }

        // Each element frame is at least three bytes; never trust the count for allocation.
        let mut items = Vec::with_capacity(count.min(self.cursor.remaining() / 3));
        for index in 0..count {
            let item = self.read_value()?;
            if !fields::accepts(element, &item) {
                return Err(UserialError::field_access(
                    identifier,
                    format!("[{index}]"),
                    format!("cannot store `{}`", item.identifier()),
                ));
            }
            items.push(item);
        }
        Ok(Value::Array {
            element_type: element.to_string(),
            items,
        })
    }

    fn read_enum(&mut self, descriptor: &TypeDescriptor) -> Result<Value> {
        let name = self.cursor.read_utf()?;
        let constant = descriptor.constant(name).ok_or_else(|| {
            UserialError::UnresolvableType(format!("{}::{name}", descriptor.name))
        })?;

        let mut staged = InstanceBuilder::new(self.registry).stage_constant(descriptor, constant);
        for field in fields::declared_constant_fields(constant) {
            let value = self.read_value()?;
            field.check(&descriptor.name, &value)?;
            if let Some(slot) = staged.fields.iter_mut().find(|f| f.name == field.name) {
                slot.value = value;
            }
        }
        Ok(Value::Enum(staged))
    }

    fn read_map(&mut self, descriptor: &TypeDescriptor) -> Result<Value> {
        let Value::Map {
            type_name,
            mut entries,
        } = InstanceBuilder::new(self.registry).build_empty(descriptor)?
        else {
            return Err(UserialError::Format(format!(
                "`{}` did not build a map",
                descriptor.name
            )));
        };

        let count = self.cursor.read_count()?;
        entries.reserve(count.min(self.cursor.remaining() / 6));
        for _ in 0..count {
            let key = self.read_value()?;
            let value = self.read_value()?;
            entries.push((key, value));
        }
        Ok(Value::Map { type_name, entries })
    }

    fn read_sequence(&mut self, descriptor: &TypeDescriptor) -> Result<Value> {
        let Value::Sequence {
            type_name,
            mut items,
        } = InstanceBuilder::new(self.registry).build_empty(descriptor)?
        else {
            return Err(UserialError::Format(format!(
                "`{}` did not build a sequence",
                descriptor.name
            )));
        };

        let count = self.cursor.read_count()?;
        items.reserve(count.min(self.cursor.remaining() / 3));
        for _ in 0..count {
            items.push(self.read_value()?);
        }
        Ok(Value::Sequence { type_name, items })
    }

    fn read_composite(&mut self, descriptor: &TypeDescriptor) -> Result<Value> {
        let registry = self.registry;
        let mut instance = InstanceBuilder::new(registry).build(descriptor)?;
        for field in fields::instance_fields(registry, descriptor)? {
            let value = self.read_value()?;
            field.set(&mut instance, value)?;
        }
        Ok(Value::Composite(instance))
    }
}
