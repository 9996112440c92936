//! # userial
//!
//! A self-describing binary codec for object graphs. A value is turned into a
//! tree of type-tagged frames and rebuilt from them without the caller naming a
//! schema at the call site: every frame carries the identifier of its type, and
//! the identifier alone decides how the rest of the frame is read.
//!
//! ## Overview
//!
//! The codec works on a closed set of value kinds, [`Value`]:
//!
//! *   **null** and the eight **primitives** (`byte`, `short`, `int`, `long`,
//!     `float`, `double`, `char`, `boolean`)
//! *   **text**
//! *   **arrays** with a declared element type
//! *   **enums** whose constants carry their own fields
//! *   **maps** and **sequences** of a concrete collection type
//! *   **composites**: plain objects, including fields inherited from a parent
//!
//! Typed Rust values enter and leave that model through the [`Reflect`]
//! trait, which `#[derive(Reflect)]` implements for structs and enums.
//!
//! ## Architecture
//!
//! *   The **type resolver** ([`types::TypeRegistry`]) maps identifiers to type
//!     descriptors and back. It is built before any call and is read-only
//!     afterwards.
//! *   The **field enumerator** ([`fields`]) fixes which fields are encoded and in
//!     what order: own fields first, then the parent's, parent-most last. No field
//!     names are written, so this order is the format.
//! *   The **instance builder** ([`builder::InstanceBuilder`]) yields placeholder
//!     instances for decoding, even for types without a zero-argument
//!     initializer.
//! *   The **object writer** ([`writer::ObjectWriter`]) and **object reader**
//!     ([`reader::ObjectReader`]) are the symmetric recursive descents.
//!
//! ### Frame Layout
//!
//! ```text
//! [u16 len][identifier][payload]
//! ```
//!
//! See [`format`] for the payload of every kind. The format is deliberately not
//! compact and not versioned.
//!
//! ## Usage Patterns
//!
//! ```rust
//! use userial::{Codec, Reflect};
//!
//! #[derive(Reflect, Debug, PartialEq)]
//! struct Human {
//!     name: String,
//!     age: i32,
//! }
//!
//! #[derive(Reflect, Debug, PartialEq)]
//! struct Student {
//!     faculty: String,
//!     #[userial(parent)]
//!     human: Human,
//! }
//!
//! let codec = Codec::for_type::<Student>()?;
//! let student = Student {
//!     faculty: "FPM".into(),
//!     human: Human { name: "Ivan".into(), age: 21 },
//! };
//! let bytes = codec.encode(&student)?;
//! let back: Student = codec.decode_as(&bytes)?;
//! assert_eq!(student, back);
//! # Ok::<(), userial::UserialError>(())
//! ```
//!
//! ## Limitations
//!
//! Cyclic graphs cannot be expressed with owned values; nesting deeper than
//! [`CodecOptions::max_depth`] is rejected with
//! [`UserialError::DepthLimitExceeded`] instead of exhausting the stack.

#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

// --- PUBLIC API MODULES ---
pub mod api;
pub mod builder;
pub mod error;
pub mod fields;
pub mod format;
pub mod inspector;
pub mod io;
pub mod reader;
pub mod reflect;
pub mod types;
pub mod value;
pub mod writer;

// --- MACRO SUPPORT MODULES ---

/// Runtime utilities used by the derived code.
#[doc(hidden)]
pub mod rt;

// --- RE-EXPORTS ---

pub use api::{Codec, CodecBuilder, CodecOptions, decode, encode};
pub use builder::{InstanceBuilder, Initializer};
pub use error::{Result, UserialError};
pub use fields::FieldDescriptor;
pub use inspector::{FrameInfo, FrameInspector, InspectionReport};
pub use reflect::Reflect;
pub use types::{EnumConstant, PrimitiveKind, Resolved, TypeDescriptor, TypeKind, TypeRegistry};
pub use value::{Composite, EnumValue, Field, Value};

// Re-export the derive macro so it is accessible as `userial::Reflect`
pub use userial_derive::Reflect;

/// Constants used throughout the library.
pub mod constants {
    /// Default nesting limit for encode and decode.
    pub const DEFAULT_MAX_DEPTH: usize = 256;

    /// Most `[` prefixes an array identifier may carry.
    pub const MAX_ARRAY_RANK: usize = 255;
}
