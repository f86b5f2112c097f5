//! Common utilities for PSSG.
//!
//! This crate provides the foundational binary cursor types used by the PSSG
//! format crates:
//!
//! - [`BinaryReader`] - Zero-copy big-endian reading from byte slices
//! - [`BinaryWriter`] - Big-endian writing to any seekable sink, with
//!   placeholder patching
//!
//! Every integer in the PSSG format is a 32-bit, most-significant-byte-first
//! value, so both cursors only speak big-endian.

mod error;
mod reader;
mod writer;

pub use error::{Error, Result};
pub use reader::BinaryReader;
pub use writer::BinaryWriter;

/// Big-endian integer types for zerocopy structs read with [`BinaryReader::read_struct`].
pub use zerocopy::byteorder::big_endian;
