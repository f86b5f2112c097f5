//! PSSG file header structure.

use pssg_common::big_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// PSSG file header.
///
/// The first eight bytes of every (decompressed) PSSG stream. The schema table
/// follows immediately after.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct PssgHeader {
    /// Literal `PSSG` tag.
    pub magic: [u8; 4],
    /// Byte count of everything after this header (file size minus 8).
    pub total_length: U32,
}

impl PssgHeader {
    /// The magic bytes at the start of a PSSG stream.
    pub const MAGIC: &'static [u8; 4] = b"PSSG";

    /// Size of the header in bytes.
    pub const SIZE: usize = 8;

    /// Create a header with the given total length.
    pub fn new(total_length: u32) -> Self {
        Self {
            magic: *Self::MAGIC,
            total_length: U32::new(total_length),
        }
    }

    /// Whether the tag matches `PSSG`.
    pub fn is_valid(&self) -> bool {
        &self.magic == Self::MAGIC
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        assert_eq!(std::mem::size_of::<PssgHeader>(), PssgHeader::SIZE);

        let header = PssgHeader::new(0x0102_0304);
        assert_eq!(header.as_bytes(), b"PSSG\x01\x02\x03\x04");
    }

    #[test]
    fn test_header_from_bytes() {
        let header = PssgHeader::read_from_bytes(b"PSSG\x00\x00\x00\x2A").unwrap();
        assert!(header.is_valid());
        assert_eq!(header.total_length.get(), 42);
    }
}
