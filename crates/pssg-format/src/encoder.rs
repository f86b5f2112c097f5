//! Tree encoder.
//!
//! Encoding runs in two passes. The size pass walks the tree bottom-up and
//! produces a [`NodeSizes`] tree mirroring the node tree. The write pass then
//! emits the header, the schema table and every node record, and finally
//! patches the header's total length.

use std::io::{Cursor, Seek, Write};

use pssg_common::BinaryWriter;

use crate::decoder::DEFAULT_MAX_DEPTH;
use crate::schema::check_tree;
use crate::{Error, Node, PssgHeader, Result, Schema};

/// Size of an attribute's `(attrId, valueSize)` prefix.
const ATTRIBUTE_HEADER_SIZE: u32 = 8;

/// Size of a child's `(nodeId, nodeSize)` prefix.
const NODE_HEADER_SIZE: u32 = 8;

/// Size of the `attrBlockSize` field counted inside `nodeSize`.
const ATTR_BLOCK_FIELD_SIZE: u32 = 4;

/// Derived sizes of one node record and its children.
///
/// These only exist for the duration of an encode; nothing is cached on
/// [`Node`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSizes {
    /// Byte length of the attribute section.
    pub attr_block_size: u32,
    /// Byte length of everything after the node's own size field.
    pub node_size: u32,
    /// Sizes of the child records, in order.
    pub children: Vec<NodeSizes>,
}

impl NodeSizes {
    /// Compute sizes for `node` and its whole subtree.
    pub fn compute(node: &Node) -> Result<Self> {
        Self::compute_at(node, 1, DEFAULT_MAX_DEPTH)
    }

    fn compute_at(node: &Node, depth: usize, max_depth: usize) -> Result<Self> {
        if depth > max_depth {
            return Err(Error::DepthLimit { limit: max_depth });
        }

        let mut attr_block_size = 0u32;
        for attr in &node.attributes {
            attr_block_size = len_u32(attr.value.len(), "attribute value")
                .and_then(|len| add(ATTRIBUTE_HEADER_SIZE, len, "attribute block"))
                .and_then(|size| add(attr_block_size, size, "attribute block"))?;
        }

        let mut children = Vec::with_capacity(node.children.len());
        let payload = if node.is_leaf() {
            len_u32(node.payload().len(), "node data")?
        } else {
            let mut payload = 0u32;
            for child in &node.children {
                let sizes = Self::compute_at(child, depth + 1, max_depth)?;
                payload = add(payload, NODE_HEADER_SIZE, "node payload")
                    .and_then(|p| add(p, sizes.node_size, "node payload"))?;
                children.push(sizes);
            }
            payload
        };

        let node_size = add(ATTR_BLOCK_FIELD_SIZE, attr_block_size, "node")
            .and_then(|size| add(size, payload, "node"))?;

        Ok(Self {
            attr_block_size,
            node_size,
            children,
        })
    }

    /// Bytes of payload (children records or data) after the attribute block.
    pub fn payload_size(&self) -> u32 {
        self.node_size - ATTR_BLOCK_FIELD_SIZE - self.attr_block_size
    }

    /// Bytes the full record occupies, including its id and size fields.
    pub fn record_size(&self) -> u64 {
        u64::from(NODE_HEADER_SIZE) + u64::from(self.node_size)
    }
}

fn len_u32(len: usize, context: &'static str) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::TooLarge { context })
}

fn add(a: u32, b: u32, context: &'static str) -> Result<u32> {
    a.checked_add(b).ok_or(Error::TooLarge { context })
}

/// Serializes a node tree against a schema.
///
/// The schema must cover every node and attribute name in the tree. Use the
/// schema returned by decoding to reproduce a file byte for byte, or
/// [`Schema::build`] for a fresh, deterministic vocabulary.
///
/// # Example
///
/// ```
/// use pssg_format::{Encoder, Node, Schema};
///
/// let root = Node::new("ROOT").attr("id", vec![0, 0, 0, 2]);
/// let schema = Schema::build(&root);
/// let bytes = Encoder::new(&schema).to_vec(&root)?;
///
/// assert_eq!(&bytes[..4], b"PSSG");
/// assert_eq!(u32::from_be_bytes(bytes[4..8].try_into().unwrap()) as usize, bytes.len() - 8);
/// # Ok::<(), pssg_format::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Encoder<'s> {
    schema: &'s Schema,
    max_depth: usize,
}

impl<'s> Encoder<'s> {
    /// Create an encoder for `schema`.
    pub fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Set the maximum tree depth accepted.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Encode `root` into a new buffer.
    pub fn to_vec(&self, root: &Node) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.to_writer(root, &mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Encode `root` into a seekable sink, starting at its current position.
    ///
    /// Nothing is written if the tree does not match the schema.
    pub fn to_writer<W: Write + Seek>(&self, root: &Node, sink: W) -> Result<()> {
        check_tree(self.schema, root)?;
        let sizes = NodeSizes::compute_at(root, 1, self.max_depth)?;

        let mut writer = BinaryWriter::new(sink);
        let start = writer.position()?;

        writer.write_bytes(PssgHeader::MAGIC)?;
        let length_at = writer.reserve_u32()?;
        self.schema.write(&mut writer)?;
        self.write_node(&mut writer, root, &sizes)?;

        let end = writer.position()?;
        let total_length = u32::try_from(end - start - PssgHeader::SIZE as u64)
            .map_err(|_| Error::TooLarge { context: "stream" })?;
        writer.patch_u32(length_at, total_length)?;
        writer.flush()?;

        tracing::debug!(
            total_length,
            node_types = self.schema.node_count(),
            "encoded pssg stream"
        );
        Ok(())
    }

    fn write_node<W: Write + Seek>(
        &self,
        writer: &mut BinaryWriter<W>,
        node: &Node,
        sizes: &NodeSizes,
    ) -> Result<()> {
        let node_id = self.schema.node_id(&node.name).ok_or_else(|| Error::UnknownNode {
            name: node.name.clone(),
        })?;
        let table = self.schema.attributes(node_id);

        writer.write_u32(node_id)?;
        writer.write_u32(sizes.node_size)?;
        writer.write_u32(sizes.attr_block_size)?;

        for attr in &node.attributes {
            let attr_id = table
                .and_then(|t| t.id(&attr.name))
                .ok_or_else(|| Error::UnknownAttribute {
                    node: node.name.clone(),
                    attribute: attr.name.clone(),
                })?;
            writer.write_u32(attr_id)?;
            writer.write_len(attr.value.len())?;
            writer.write_bytes(&attr.value)?;
        }

        if node.is_leaf() {
            writer.write_bytes(node.payload())?;
        } else {
            for (child, child_sizes) in node.children.iter().zip(&sizes.children) {
                self.write_node(writer, child, child_sizes)?;
            }
        }

        Ok(())
    }
}
