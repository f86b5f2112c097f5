//! Binary writer for big-endian serialization.
//!
//! This module provides [`BinaryWriter`], the write-side counterpart of
//! [`BinaryReader`](crate::BinaryReader). It wraps any `Write + Seek` sink so
//! that length fields can be reserved up front and patched once the final
//! size is known.

use std::io::{Cursor, Seek, SeekFrom, Write};

use byteorder::{BigEndian, WriteBytesExt};

use crate::{Error, Result};

/// A big-endian binary writer over a seekable sink.
///
/// # Example
///
/// ```
/// use pssg_common::BinaryWriter;
///
/// let mut writer = BinaryWriter::in_memory();
/// writer.write_bytes(b"PSSG").unwrap();
/// let length_at = writer.reserve_u32().unwrap();
/// writer.write_u32(0xDEADBEEF).unwrap();
/// let end = writer.position().unwrap();
/// writer.patch_u32(length_at, end as u32 - 8).unwrap();
///
/// assert_eq!(
///     writer.into_inner().into_inner(),
///     b"PSSG\x00\x00\x00\x04\xDE\xAD\xBE\xEF"
/// );
/// ```
#[derive(Debug)]
pub struct BinaryWriter<W> {
    inner: W,
}

impl BinaryWriter<Cursor<Vec<u8>>> {
    /// Create a writer backed by a growable in-memory buffer.
    pub fn in_memory() -> Self {
        Self::new(Cursor::new(Vec::new()))
    }

    /// Create an in-memory writer with a pre-allocated buffer.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(Cursor::new(Vec::with_capacity(capacity)))
    }
}

impl<W: Write + Seek> BinaryWriter<W> {
    /// Wrap a seekable sink.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Current absolute position in the sink.
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Write a big-endian u32.
    #[inline]
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.inner.write_u32::<BigEndian>(value)?;
        Ok(())
    }

    /// Write a length as a big-endian u32, rejecting lengths that do not fit.
    #[inline]
    pub fn write_len(&mut self, length: usize) -> Result<()> {
        let value = u32::try_from(length).map_err(|_| Error::LengthOverflow(length))?;
        self.write_u32(value)
    }

    /// Write raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        Ok(())
    }

    /// Write a u32 length prefix followed by the UTF-8 bytes of `value`.
    pub fn write_prefixed_string(&mut self, value: &str) -> Result<()> {
        self.write_len(value.len())?;
        self.write_bytes(value.as_bytes())
    }

    /// Write a zero u32 placeholder and return its position for later patching.
    pub fn reserve_u32(&mut self) -> Result<u64> {
        let position = self.position()?;
        self.write_u32(0)?;
        Ok(position)
    }

    /// Overwrite the u32 at `position`, then return to the current end.
    pub fn patch_u32(&mut self, position: u64, value: u32) -> Result<()> {
        let resume = self.position()?;
        self.inner.seek(SeekFrom::Start(position))?;
        self.write_u32(value)?;
        self.inner.seek(SeekFrom::Start(resume))?;
        Ok(())
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Consume the writer and return the sink.
    pub fn into_inner(self) -> W {
        self.inner
    }
}
