//! PSSG - game asset tree reading and byte-exact writing library.
//!
//! This crate provides a unified interface to the PSSG crates.
//!
//! # Crates
//!
//! - [`pssg_common`] - Big-endian binary reader and writer
//! - [`pssg_format`] - Schema table, tree decoder and encoder, GZip envelope
//!
//! # Example
//!
//! ```no_run
//! use pssg::prelude::*;
//!
//! let mut file = PssgFile::open("objects.pssg")?;
//!
//! let stats = TreeStats::collect(file.root());
//! println!("Nodes: {}, Textures: {}", stats.node_count, stats.count_named("TEXTURE"));
//!
//! if let Some(texture) = file.root_mut().children.first_mut() {
//!     texture.set_attribute("width", 512u32.to_be_bytes());
//! }
//! file.rebuild_schema();
//! file.write_to("objects.modified.pssg")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use pssg_common as common;
pub use pssg_format as format;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use pssg_common::{BinaryReader, BinaryWriter};
    pub use pssg_format::{
        Attribute, DecodeOptions, Encoder, Envelope, Node, NodeSizes, PssgFile, Schema, TreeStats,
    };
}

// Re-export the two whole-file operations at the crate root
pub use pssg_format::{parse, write};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
