//! Defines the physical binary layout of a userial stream.
//!
//! # Frame Layout
//! A stream is a single root frame. Every frame starts with its type identifier:
//!
//! `[ u16 len ] [ identifier bytes ] [ payload ]`
//!
//! All integers and floats are big-endian. Strings (identifiers, text payloads,
//! enum constant names) are a `u16` byte length followed by UTF-8 bytes.
//! Counts of arrays, sequences and maps are signed 32-bit integers.

use crate::error::{Result, UserialError};

/// Identifier of the "no value" frame. Nothing follows it.
pub const NULL_IDENTIFIER: &str = "null";

/// Identifier of text frames.
pub const TEXT_IDENTIFIER: &str = "String";

/// Identifier accepted as "any value" (declared type of `Value` fields).
pub const ANY_IDENTIFIER: &str = "object";

/// Prefix of array identifiers; the rest is the element identifier.
pub const ARRAY_PREFIX: char = '[';

/// Longest UTF-8 byte sequence a length-prefixed string can hold.
pub const MAX_UTF_LEN: usize = u16::MAX as usize;

/// Appends a length-prefixed UTF-8 string.
pub fn put_utf(buf: &mut Vec<u8>, s: &str) -> Result<()> {
    let len = u16::try_from(s.len()).map_err(|_| {
        UserialError::UnsupportedValue(format!(
            "string of {} bytes exceeds the {MAX_UTF_LEN} byte limit",
            s.len()
        ))
    })?;
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}

/// Appends a signed 32-bit element count.
pub fn put_count(buf: &mut Vec<u8>, count: usize) -> Result<()> {
    let count = i32::try_from(count).map_err(|_| {
        UserialError::UnsupportedValue(format!("{count} elements exceed the i32 count range"))
    })?;
    buf.extend_from_slice(&count.to_be_bytes());
    Ok(())
}

/// A forward-only reader over an encoded buffer.
///
/// Every read is bounds-checked and reports [`UserialError::TruncatedStream`]
/// with the offset at which it was attempted.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Creates a cursor positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset from the start of the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not consumed yet.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// True once every byte has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Consumes exactly `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let available = self.remaining();
        if n > available {
            return Err(UserialError::TruncatedStream {
                offset: self.pos,
                needed: n,
                available,
            });
        }
        let start = self.pos;
        self.pos += n;
        Ok(&self.data[start..self.pos])
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Reads an `i8`.
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(i8::from_be_bytes(self.take_array()?))
    }

    /// Reads a big-endian `i16`.
    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_be_bytes(self.take_array()?))
    }

    /// Reads a big-endian `u16`.
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.take_array()?))
    }

    /// Reads a big-endian `i32`.
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.take_array()?))
    }

    /// Reads a big-endian `i64`.
    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_be_bytes(self.take_array()?))
    }

    /// Reads a big-endian IEEE-754 `f32`.
    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_be_bytes(self.take_array()?))
    }

    /// Reads a big-endian IEEE-754 `f64`.
    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_be_bytes(self.take_array()?))
    }

    /// Reads a boolean byte. Any non-zero byte is `true`.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.take_array::<1>()?[0] != 0)
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_utf(&mut self) -> Result<&'a str> {
        let len = usize::from(self.read_u16()?);
        let offset = self.pos;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes).map_err(|e| {
            UserialError::Format(format!("invalid UTF-8 in string at offset {offset}: {e}"))
        })
    }

    /// Reads a signed 32-bit count and rejects negative values.
    pub fn read_count(&mut self) -> Result<usize> {
        let offset = self.pos;
        let count = self.read_i32()?;
        usize::try_from(count)
            .map_err(|_| UserialError::Format(format!("negative count {count} at offset {offset}")))
    }
}
