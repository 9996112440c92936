//! Centralized error handling for userial.
//!
//! Every failure in the codec is surfaced as a [`UserialError`]. Nothing in the
//! library panics on bad input: a truncated stream, an unknown type identifier or
//! a value that does not fit its field all come back as `Err`, and the whole
//! encode or decode call is abandoned. There is no partial-success mode.
//!
//! ## Error Categories
//!
//! - **Resolution** ([`UserialError::UnresolvableType`]): an identifier names no registered type
//! - **Construction** ([`UserialError::NoUsableInitializer`]): a type cannot be instantiated
//! - **Truncation** ([`UserialError::TruncatedStream`]): the cursor ran out mid-frame
//! - **Field access** ([`UserialError::FieldAccess`]): a value does not fit the field it targets
//! - **Unsupported values** ([`UserialError::UnsupportedValue`]): nothing in the dispatch can encode it
//! - **Format** ([`UserialError::Format`]): malformed stream or invalid registration
//! - **Depth** ([`UserialError::DepthLimitExceeded`]): nesting beyond the configured limit
//! - **I/O** ([`UserialError::Io`]): file operations
//!
//! ## Usage
//!
//! ```rust
//! use userial::{Codec, UserialError};
//!
//! let codec = Codec::default();
//! match codec.decode(&[0x00, 0x03, b'i', b'n']) {
//!     Err(UserialError::TruncatedStream { offset, .. }) => assert_eq!(offset, 2),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

use std::fmt;
use std::io;
use std::sync::Arc;

/// A specialized `Result` type for userial operations.
pub type Result<T> = std::result::Result<T, UserialError>;

/// The master error enum covering all failure domains of the codec.
///
/// This type is `Clone` so errors can be handed across threads by the batch
/// helpers; I/O errors are wrapped in `Arc` for that reason.
#[derive(Debug, Clone)]
pub enum UserialError {
    /// A type identifier (or an enum constant) names nothing the registry knows.
    ///
    /// Fatal for the current call. Frames consumed before the failure are not
    /// affected, but no value is returned.
    UnresolvableType(String),

    /// The resolved type has no initializer the instance builder can use.
    ///
    /// Raised for composites registered without any initializer and for
    /// collection types lacking a zero-argument one.
    NoUsableInitializer(String),

    /// The byte cursor was exhausted in the middle of a frame.
    TruncatedStream {
        /// Cursor position at which the read was attempted.
        offset: usize,
        /// Bytes the read required.
        needed: usize,
        /// Bytes that were left.
        available: usize,
    },

    /// A value could not be written into (or converted out of) a field.
    ///
    /// The usual cause is a type mismatch between the stored value and the
    /// declared type, or a missing field during typed reconstruction.
    FieldAccess {
        /// Identifier of the type owning the field.
        type_name: String,
        /// Field name, or a positional description for elements.
        field: String,
        /// What went wrong.
        reason: String,
    },

    /// The value matches none of the encodable kinds.
    UnsupportedValue(String),

    /// The stream is malformed (negative counts, invalid UTF-8, trailing bytes)
    /// or a registration is inconsistent.
    Format(String),

    /// Nesting went deeper than `CodecOptions::max_depth`.
    DepthLimitExceeded(usize),

    /// Low-level I/O failure while saving or loading a file.
    Io(Arc<io::Error>),
}

impl UserialError {
    /// Builds a [`UserialError::FieldAccess`].
    pub fn field_access(
        type_name: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::FieldAccess {
            type_name: type_name.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// A `FieldAccess` error describing a kind mismatch during typed conversion.
    pub fn mismatch(expected: &str, found: &crate::value::Value) -> Self {
        Self::field_access(
            expected,
            "<value>",
            format!("expected `{expected}`, found `{}`", found.identifier()),
        )
    }
}

impl fmt::Display for UserialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvableType(name) => write!(f, "Unresolvable type: `{name}`"),
            Self::NoUsableInitializer(name) => {
                write!(f, "No usable initializer for type `{name}`")
            }
            Self::TruncatedStream {
                offset,
                needed,
                available,
            } => write!(
                f,
                "Truncated stream at offset {offset}: needed {needed} bytes, {available} available"
            ),
            Self::FieldAccess {
                type_name,
                field,
                reason,
            } => write!(f, "Field access error on `{type_name}.{field}`: {reason}"),
            Self::UnsupportedValue(s) => write!(f, "Unsupported value: {s}"),
            Self::Format(s) => write!(f, "Format Error: {s}"),
            Self::DepthLimitExceeded(limit) => {
                write!(f, "Nesting depth exceeded the limit of {limit}")
            }
            Self::Io(e) => write!(f, "I/O Error: {e}"),
        }
    }
}

impl std::error::Error for UserialError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for UserialError {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}
