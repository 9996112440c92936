//! The main entry point: [`Codec`] and its builder.

use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;

use crate::constants::DEFAULT_MAX_DEPTH;
use crate::error::{Result, UserialError};
use crate::inspector::{FrameInspector, InspectionReport};
use crate::io::{self, MappedFile};
use crate::reader::ObjectReader;
use crate::reflect::Reflect;
use crate::types::TypeRegistry;
use crate::value::Value;
use crate::writer::ObjectWriter;

/// Tunables for encode and decode calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
    /// Deepest frame nesting accepted in either direction. `None` removes the
    /// guard and lets recursion grow with the object graph.
    pub max_depth: Option<usize>,
    /// Accept bytes after the root frame instead of failing with `Format`.
    pub allow_trailing_bytes: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            max_depth: Some(DEFAULT_MAX_DEPTH),
            allow_trailing_bytes: false,
        }
    }
}

/// Encodes and decodes object graphs against a fixed type registry.
///
/// The registry is frozen behind an `Arc` once the codec is built, so a codec
/// can be cloned cheaply and shared across threads. Each call works on its own
/// buffer or cursor.
///
/// ```rust
/// use userial::{Codec, Value};
///
/// let codec = Codec::default();
/// let bytes = codec.encode(&vec![1i32, 2, 3])?;
/// let back: Vec<i32> = codec.decode_as(&bytes)?;
/// assert_eq!(back, vec![1, 2, 3]);
/// assert!(matches!(codec.decode(&bytes)?, Value::Sequence { .. }));
/// # Ok::<(), userial::UserialError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Codec {
    registry: Arc<TypeRegistry>,
    options: CodecOptions,
}

impl Codec {
    /// Creates a codec over `registry` with default options.
    pub fn new(registry: TypeRegistry) -> Self {
        Self::with_options(registry, CodecOptions::default())
    }

    /// Creates a codec over `registry` with explicit options.
    pub fn with_options(registry: TypeRegistry, options: CodecOptions) -> Self {
        log::debug!(
            "[Codec] built with {} named types, max depth {:?}",
            registry.len(),
            options.max_depth
        );
        Self {
            registry: Arc::new(registry),
            options,
        }
    }

    /// Starts configuring a codec.
    pub fn builder() -> CodecBuilder {
        CodecBuilder::default()
    }

    /// A codec whose registry holds `T` and everything it references.
    pub fn for_type<T: Reflect>() -> Result<Self> {
        Self::builder().register::<T>().build()
    }

    /// The registry consulted by this codec.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// The options in effect.
    pub fn options(&self) -> CodecOptions {
        self.options
    }

    /// Encodes a typed value.
    pub fn encode<T: Reflect>(&self, value: &T) -> Result<Vec<u8>> {
        self.encode_value(&value.to_value()?)
    }

    /// Encodes a dynamic value.
    ///
    /// Either the complete stream is returned or an error; a failed call never
    /// yields a partial buffer.
    pub fn encode_value(&self, value: &Value) -> Result<Vec<u8>> {
        let mut writer = ObjectWriter::new(&self.registry).with_max_depth(self.options.max_depth);
        writer.write_value(value)?;
        let bytes = writer.into_bytes();
        log::debug!(
            "[Codec] encoded `{}` into {} bytes",
            value.identifier(),
            bytes.len()
        );
        Ok(bytes)
    }

    /// Decodes a stream into a dynamic value.
    pub fn decode(&self, bytes: &[u8]) -> Result<Value> {
        let mut reader =
            ObjectReader::new(&self.registry, bytes).with_max_depth(self.options.max_depth);
        let value = reader.read_value()?;
        if !self.options.allow_trailing_bytes && !reader.is_exhausted() {
            return Err(UserialError::Format(format!(
                "{} trailing bytes after the root frame at offset {}",
                reader.remaining(),
                reader.position()
            )));
        }
        log::debug!(
            "[Codec] decoded `{}` from {} bytes",
            value.identifier(),
            reader.position()
        );
        Ok(value)
    }

    /// Decodes a stream into `T`.
    pub fn decode_as<T: Reflect>(&self, bytes: &[u8]) -> Result<T> {
        T::from_value(self.decode(bytes)?)
    }

    /// Encodes `value` and writes it to `path`.
    pub fn save<T: Reflect, P: AsRef<Path>>(&self, path: P, value: &T) -> Result<()> {
        let bytes = self.encode(value)?;
        io::write_file(path.as_ref(), &bytes)
    }

    /// Memory-maps `path` and decodes it.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Value> {
        let file = MappedFile::open(path.as_ref())?;
        self.decode(&file)
    }

    /// Memory-maps `path` and decodes it into `T`.
    pub fn load_as<T: Reflect, P: AsRef<Path>>(&self, path: P) -> Result<T> {
        T::from_value(self.load(path)?)
    }

    /// Reports the frame layout of a stream, under the same depth limit as
    /// [`Codec::decode`].
    pub fn inspect(&self, bytes: &[u8]) -> Result<InspectionReport> {
        FrameInspector::inspect(bytes, &self.registry, self.options.max_depth)
    }

    /// Encodes many values independently on the rayon pool.
    ///
    /// Output order matches input order. The first failure is returned.
    pub fn encode_batch<T: Reflect + Sync>(&self, values: &[T]) -> Result<Vec<Vec<u8>>> {
        values.par_iter().map(|v| self.encode(v)).collect()
    }

    /// Decodes many streams independently on the rayon pool.
    pub fn decode_batch<B: AsRef<[u8]> + Sync>(&self, streams: &[B]) -> Result<Vec<Value>> {
        streams
            .par_iter()
            .map(|bytes| self.decode(bytes.as_ref()))
            .collect()
    }
}

impl Default for Codec {
    /// A codec that knows only the built-in types.
    fn default() -> Self {
        Self::new(TypeRegistry::new())
    }
}

/// Step-by-step configuration of a [`Codec`].
///
/// Registration errors are held back until [`CodecBuilder::build`].
#[derive(Debug, Default)]
pub struct CodecBuilder {
    registry: TypeRegistry,
    options: CodecOptions,
    error: Option<UserialError>,
}

impl CodecBuilder {
    /// Registers `T` and every type it references.
    pub fn register<T: Reflect>(mut self) -> Self {
        if self.error.is_none()
            && let Err(e) = self.registry.register::<T>()
        {
            self.error = Some(e);
        }
        self
    }

    /// Replaces the registry, e.g. one with hand-written descriptors.
    pub fn registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Sets the maximum frame nesting depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.options.max_depth = Some(depth);
        self
    }

    /// Removes the nesting guard.
    pub fn unbounded_depth(mut self) -> Self {
        self.options.max_depth = None;
        self
    }

    /// Accepts bytes after the root frame.
    pub fn allow_trailing_bytes(mut self, allow: bool) -> Self {
        self.options.allow_trailing_bytes = allow;
        self
    }

    /// Finishes configuration.
    pub fn build(self) -> Result<Codec> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(Codec::with_options(self.registry, self.options)),
        }
    }
}

/// Encodes `value` with a codec registered for `T`.
pub fn encode<T: Reflect>(value: &T) -> Result<Vec<u8>> {
    Codec::for_type::<T>()?.encode(value)
}

/// Decodes `bytes` into `T` with a codec registered for `T`.
pub fn decode<T: Reflect>(bytes: &[u8]) -> Result<T> {
    Codec::for_type::<T>()?.decode_as(bytes)
}
