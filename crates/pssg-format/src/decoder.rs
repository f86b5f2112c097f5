//! Tree decoder.
//!
//! Walks the node records that follow the schema table. The format has no
//! explicit leaf marker, so whether a node's payload is a run of child records
//! or an opaque blob is decided by peeking at the next eight bytes: if they
//! look like a header of a known node type whose size fits in what is left,
//! they are taken as a child. A blob that happens to start with such bytes is
//! mis-split into a child. Real files rely on this exact rule, so it must not
//! be tightened.

use pssg_common::BinaryReader;

use crate::schema::{attribute_display_name, node_display_name};
use crate::{Attribute, Error, Node, PssgHeader, Result, Schema};

/// Default maximum node nesting accepted by the decoder and encoder.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Size of a node record's `(nodeId, nodeSize)` prefix.
const NODE_HEADER_SIZE: usize = 8;

/// Options controlling decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Maximum nesting depth; the root is at depth 1.
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A decoded stream: header length, schema and root node.
#[derive(Debug, Clone)]
pub struct Decoded {
    /// `totalLength` as declared in the header.
    pub declared_length: u32,
    /// Schema table read from the stream.
    pub schema: Schema,
    /// Root of the node tree.
    pub root: Node,
}

/// Decode a complete, already unwrapped PSSG stream.
pub fn decode(data: &[u8], options: DecodeOptions) -> Result<Decoded> {
    if data.len() < PssgHeader::SIZE {
        if data.starts_with(PssgHeader::MAGIC) {
            return Err(Error::Truncated {
                context: "header",
                needed: PssgHeader::SIZE,
                available: data.len(),
            });
        }
        return Err(Error::InvalidMagic {
            actual: data[..4.min(data.len())].to_vec(),
        });
    }

    let mut reader = BinaryReader::new(data);
    let header: PssgHeader = reader.read_struct()?;
    if !header.is_valid() {
        return Err(Error::InvalidMagic {
            actual: header.magic.to_vec(),
        });
    }
    let declared_length = header.total_length.get();

    let schema = Schema::read(&mut reader)?;
    let root = Decoder::new(&schema, options).decode_node(&mut reader)?;

    if reader.position() != data.len() || declared_length as usize != data.len() - PssgHeader::SIZE {
        tracing::debug!(
            declared_length,
            stream_length = data.len(),
            consumed = reader.position(),
            "stream length disagrees with header"
        );
    }

    Ok(Decoded {
        declared_length,
        schema,
        root,
    })
}

/// Reads node records against a schema.
#[derive(Debug, Clone, Copy)]
pub struct Decoder<'s> {
    schema: &'s Schema,
    options: DecodeOptions,
}

impl<'s> Decoder<'s> {
    /// Create a decoder resolving names through `schema`.
    pub fn new(schema: &'s Schema, options: DecodeOptions) -> Self {
        Self { schema, options }
    }

    /// Decode the node record at the reader's position, and all its descendants.
    ///
    /// On return the reader sits exactly at the end of the record.
    pub fn decode_node(&self, reader: &mut BinaryReader<'_>) -> Result<Node> {
        self.read_node(reader, 1)
    }

    fn read_node(&self, reader: &mut BinaryReader<'_>, depth: usize) -> Result<Node> {
        if depth > self.options.max_depth {
            return Err(Error::DepthLimit {
                limit: self.options.max_depth,
            });
        }

        let node_id = reader.read_u32()?;
        let node_size = reader.read_u32()? as usize;
        let node_end = bounded_end(reader.position(), node_size, reader.len(), "node")?;

        let attr_block_size = reader.read_u32()? as usize;
        let attr_end = bounded_end(reader.position(), attr_block_size, node_end, "attribute block")?;

        let name = node_display_name(self.schema, node_id);
        let attributes = self.read_attributes(reader, node_id, attr_end)?;

        let mut children = Vec::new();
        let mut data = None;

        while reader.position() < node_end {
            let position = reader.position();
            let remaining = node_end - position;

            if remaining >= NODE_HEADER_SIZE {
                let (candidate_id, candidate_size) = reader.peek_u32_pair()?;
                if self.schema.contains_node_id(candidate_id)
                    && candidate_size as usize <= remaining - NODE_HEADER_SIZE
                {
                    children.push(self.read_node(reader, depth + 1)?);
                    continue;
                }
            }

            data = Some(reader.read_bytes(remaining)?.to_vec());
            break;
        }

        reader.seek(node_end);

        tracing::trace!(
            node = %name,
            node_id,
            node_size,
            children = children.len(),
            "decoded node"
        );

        Ok(Node {
            name,
            attributes,
            data: if children.is_empty() { data } else { None },
            children,
        })
    }

    /// Read `(attrId, valueSize, value)` triples up to `attr_end`.
    ///
    /// Triples on a node id without an attribute table are consumed and dropped.
    fn read_attributes(
        &self,
        reader: &mut BinaryReader<'_>,
        node_id: u32,
        attr_end: usize,
    ) -> Result<Vec<Attribute>> {
        let table = self.schema.attributes(node_id);
        let mut attributes = Vec::new();

        while reader.position() < attr_end {
            let attr_id = reader.read_u32()?;
            let value_size = reader.read_u32()? as usize;
            let value_end = bounded_end(reader.position(), value_size, attr_end, "attribute value")?;
            let value = reader.read_bytes(value_end - reader.position())?;

            if let Some(table) = table {
                attributes.push(Attribute {
                    name: attribute_display_name(table, attr_id),
                    value: value.to_vec(),
                });
            }
        }

        reader.seek(attr_end);
        Ok(attributes)
    }
}

/// `start + size`, checked against the end of the enclosing region.
fn bounded_end(start: usize, size: usize, limit: usize, context: &'static str) -> Result<usize> {
    match start.checked_add(size) {
        Some(end) if end <= limit => Ok(end),
        _ => Err(Error::Truncated {
            context,
            needed: size,
            available: limit.saturating_sub(start),
        }),
    }
}
