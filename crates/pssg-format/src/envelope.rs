//! Optional GZip envelope around PSSG streams.
//!
//! Some PSSG files ship compressed as a whole. The envelope is detected by the
//! two-byte GZip magic and is otherwise invisible to the tree format.

use std::borrow::Cow;
use std::io::{Read, Write};

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::{Error, Result};

/// Magic bytes that open a GZip member.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// How a PSSG stream is wrapped on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Envelope {
    /// Plain, uncompressed bytes.
    #[default]
    Raw,
    /// A GZip stream wrapping the whole file.
    Gzip,
}

impl Envelope {
    /// Sniff the envelope from the first bytes of a stream.
    pub fn detect(data: &[u8]) -> Self {
        if data.len() >= GZIP_MAGIC.len() && data[..GZIP_MAGIC.len()] == GZIP_MAGIC {
            Envelope::Gzip
        } else {
            Envelope::Raw
        }
    }
}

/// Return the bytes ready for header parsing.
///
/// GZip input is fully decompressed, including its trailing CRC and size
/// checks. Anything else is passed through borrowed.
pub fn unwrap_envelope(data: &[u8]) -> Result<Cow<'_, [u8]>> {
    match Envelope::detect(data) {
        Envelope::Raw => Ok(Cow::Borrowed(data)),
        Envelope::Gzip => {
            let mut decoder = MultiGzDecoder::new(data);
            let mut output = Vec::with_capacity(data.len().saturating_mul(4));
            decoder.read_to_end(&mut output).map_err(Error::Envelope)?;

            tracing::debug!(
                compressed = data.len(),
                decompressed = output.len(),
                "unwrapped gzip envelope"
            );
            Ok(Cow::Owned(output))
        }
    }
}

/// Wrap bytes in the given envelope.
pub fn wrap_envelope(data: &[u8], envelope: Envelope) -> Result<Vec<u8>> {
    match envelope {
        Envelope::Raw => Ok(data.to_vec()),
        Envelope::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data)?;
            Ok(encoder.finish()?)
        }
    }
}
