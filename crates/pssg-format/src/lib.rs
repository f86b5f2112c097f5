//! PSSG binary tree format.
//!
//! PSSG is a self-describing tree format used for game assets. A file holds a
//! schema table that maps small integer ids to node type and attribute names,
//! followed by a single tree of node records. Every node carries attributes
//! (opaque byte values) and either child nodes or an opaque data blob. Files
//! are sometimes wrapped in a GZip envelope.
//!
//! This crate decodes any PSSG stream into an in-memory [`Node`] tree and
//! encodes a tree back into bytes. Encoding an unmodified tree with the
//! [`Schema`] that was read alongside it reproduces the input byte for byte.
//!
//! # Layout
//!
//! ```text
//! "PSSG"  u32 totalLength  u32 attrInfoCount  u32 nodeInfoCount
//! nodeInfoCount × { u32 id, u32 len, name, u32 attrCount,
//!                   attrCount × { u32 id, u32 len, name } }
//! root node record:
//!   u32 nodeId  u32 nodeSize  u32 attrBlockSize
//!   { u32 attrId, u32 len, value }*
//!   child records* | data
//! ```
//!
//! All integers are big-endian.
//!
//! # Example
//!
//! ```no_run
//! use pssg_format::PssgFile;
//!
//! let data = std::fs::read("objects.pssg")?;
//! let file = PssgFile::parse(&data)?;
//!
//! for texture in file.root().find_all("TEXTURE") {
//!     println!("{} attributes", texture.attributes.len());
//! }
//!
//! assert_eq!(file.to_bytes()?, data);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod decoder;
mod encoder;
mod envelope;
mod error;
mod file;
mod header;
mod node;
mod schema;
mod stats;

#[cfg(feature = "xml-output")]
pub mod xml;

pub use decoder::{decode, DecodeOptions, Decoded, Decoder, DEFAULT_MAX_DEPTH};
pub use encoder::{Encoder, NodeSizes};
pub use envelope::{unwrap_envelope, wrap_envelope, Envelope, GZIP_MAGIC};
pub use error::{Error, Result};
pub use file::{is_pssg, parse, write, PssgFile};
pub use header::PssgHeader;
pub use node::{Attribute, Descendants, Node};
pub use schema::{check_tree, AttributeTable, NodeType, Schema, SchemaEntry};
pub use stats::TreeStats;
