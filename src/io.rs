//! File I/O for encoded streams.
//!
//! The stream format has no file header: a saved file is exactly the bytes
//! `Codec::encode` produced. Reading maps the file instead of copying it.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::ops::Deref;
use std::path::Path;

use memmap2::Mmap;

use crate::error::{Result, UserialError};

/// Writes `bytes` to `path`, truncating any existing file.
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(bytes)?;
    writer.flush()?;
    log::debug!("[io] wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// A read-only memory map of an encoded file.
#[derive(Debug)]
pub struct MappedFile {
    mmap: Mmap,
}

impl MappedFile {
    /// Maps `path` into memory.
    ///
    /// # Errors
    /// An empty file cannot hold a frame and is reported as truncated.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();
        if file_size == 0 {
            return Err(UserialError::TruncatedStream {
                offset: 0,
                needed: 2,
                available: 0,
            });
        }

        // Safety: the map is read-only; concurrent modification of the file by
        // another process is outside what the codec can defend against.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self { mmap })
    }

    /// The mapped bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap
    }
}

impl Deref for MappedFile {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}
