//! Schema table: the id ↔ name vocabulary embedded in every PSSG file.
//!
//! Node type ids are global; attribute ids are local to the node type that owns
//! them. A [`Schema`] is produced in one of two ways:
//!
//! - [`Schema::read`] takes the table verbatim from a file, keeping entry order
//!   and the declared attribute count so it can be written back byte for byte.
//! - [`Schema::build`] derives a fresh table from a tree. Ids are assigned from
//!   1 in lexicographic order of the names, so equal trees always get equal ids.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Seek, Write};

use pssg_common::{BinaryReader, BinaryWriter};
use rustc_hash::FxHashMap;

use crate::{Error, Node, Result};

/// A single `(id, name)` schema entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaEntry {
    /// Numeric id used in the node tree.
    pub id: u32,
    /// UTF-8 name.
    pub name: String,
}

/// Attribute vocabulary of one node type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeTable {
    entries: Vec<SchemaEntry>,
    names: FxHashMap<u32, String>,
    ids: FxHashMap<String, u32>,
}

impl AttributeTable {
    fn insert(&mut self, id: u32, name: String) {
        self.names.insert(id, name.clone());
        self.ids.insert(name.clone(), id);
        self.entries.push(SchemaEntry { id, name });
    }

    /// Name mapped to `id`.
    pub fn name(&self, id: u32) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Id mapped to `name`.
    pub fn id(&self, name: &str) -> Option<u32> {
        self.ids.get(name).copied()
    }

    /// Entries in table order.
    pub fn entries(&self) -> &[SchemaEntry] {
        &self.entries
    }

    /// Number of entries in table order, duplicates included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A node type together with its attribute vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeType {
    /// Global node id.
    pub id: u32,
    /// Node type name.
    pub name: String,
    /// Attributes declared for this node type.
    pub attributes: AttributeTable,
}

/// Bidirectional id ↔ name mapping for node types and their attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    /// Node types in table order.
    node_types: Vec<NodeType>,
    /// Node id to index into `node_types`; later duplicates win.
    by_id: FxHashMap<u32, usize>,
    /// Node name to node id; later duplicates win.
    ids: FxHashMap<String, u32>,
    /// `attrInfoCount` header field.
    declared_attribute_count: u32,
}

impl Schema {
    /// Read a schema table from the current reader position.
    ///
    /// No uniqueness validation is performed: a repeated id or name replaces
    /// the earlier mapping, while the raw entry stays in table order.
    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let declared_attribute_count = reader.read_u32()?;
        let node_info_count = reader.read_u32()?;

        let mut schema = Schema {
            declared_attribute_count,
            ..Schema::default()
        };

        for _ in 0..node_info_count {
            let id = reader.read_u32()?;
            let name = reader.read_prefixed_string()?.to_owned();
            let attr_count = reader.read_u32()?;

            let mut attributes = AttributeTable::default();
            for _ in 0..attr_count {
                let attr_id = reader.read_u32()?;
                let attr_name = reader.read_prefixed_string()?.to_owned();
                attributes.insert(attr_id, attr_name);
            }

            schema.push(NodeType {
                id,
                name,
                attributes,
            });
        }

        tracing::debug!(
            node_types = schema.node_types.len(),
            declared_attributes = declared_attribute_count,
            "read schema table"
        );
        Ok(schema)
    }

    /// Build a schema covering every node and attribute name used in `root`.
    ///
    /// Node ids and per-type attribute ids both start at 1 and follow
    /// lexicographic byte order of the names.
    pub fn build(root: &Node) -> Self {
        let mut vocabulary: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for node in root.descendants() {
            vocabulary
                .entry(node.name.as_str())
                .or_default()
                .extend(node.attributes.iter().map(|a| a.name.as_str()));
        }

        let mut schema = Schema::default();
        let mut attribute_total = 0u32;

        for (id, (name, attr_names)) in (1u32..).zip(vocabulary) {
            let mut attributes = AttributeTable::default();
            for (attr_id, attr_name) in (1u32..).zip(attr_names) {
                attributes.insert(attr_id, attr_name.to_owned());
            }
            attribute_total = attribute_total.saturating_add(attributes.len() as u32);

            schema.push(NodeType {
                id,
                name: name.to_owned(),
                attributes,
            });
        }
        schema.declared_attribute_count = attribute_total;

        schema
    }

    fn push(&mut self, node_type: NodeType) {
        self.by_id.insert(node_type.id, self.node_types.len());
        self.ids.insert(node_type.name.clone(), node_type.id);
        self.node_types.push(node_type);
    }

    /// Write the table: attribute count, node count, then every entry.
    pub fn write<W: Write + Seek>(&self, writer: &mut BinaryWriter<W>) -> Result<()> {
        writer.write_u32(self.declared_attribute_count)?;
        writer.write_len(self.node_types.len())?;

        for node_type in &self.node_types {
            writer.write_u32(node_type.id)?;
            writer.write_prefixed_string(&node_type.name)?;
            writer.write_len(node_type.attributes.len())?;
            for entry in node_type.attributes.entries() {
                writer.write_u32(entry.id)?;
                writer.write_prefixed_string(&entry.name)?;
            }
        }

        Ok(())
    }

    /// Node types in table order.
    pub fn node_types(&self) -> &[NodeType] {
        &self.node_types
    }

    /// Node type mapped to `id`.
    pub fn node_type(&self, id: u32) -> Option<&NodeType> {
        self.by_id.get(&id).map(|&index| &self.node_types[index])
    }

    /// Node name mapped to `id`.
    pub fn node_name(&self, id: u32) -> Option<&str> {
        self.node_type(id).map(|t| t.name.as_str())
    }

    /// Node id mapped to `name`.
    pub fn node_id(&self, name: &str) -> Option<u32> {
        self.ids.get(name).copied()
    }

    /// Whether `id` names a node type.
    pub fn contains_node_id(&self, id: u32) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Attribute table for node `id`.
    pub fn attributes(&self, node_id: u32) -> Option<&AttributeTable> {
        self.node_type(node_id).map(|t| &t.attributes)
    }

    /// Attribute name for `attr_id` on node type `node_id`.
    pub fn attribute_name(&self, node_id: u32, attr_id: u32) -> Option<&str> {
        self.attributes(node_id)?.name(attr_id)
    }

    /// Attribute id for `attr_name` on the node type named `node_name`.
    pub fn attribute_id(&self, node_name: &str, attr_name: &str) -> Option<u32> {
        self.attributes(self.node_id(node_name)?)?.id(attr_name)
    }

    /// Number of node type entries.
    pub fn node_count(&self) -> usize {
        self.node_types.len()
    }

    /// Number of attribute entries across all node types.
    pub fn attribute_count(&self) -> usize {
        self.node_types.iter().map(|t| t.attributes.len()).sum()
    }

    /// The `attrInfoCount` value carried in the header.
    ///
    /// For a built schema this equals [`attribute_count`](Self::attribute_count);
    /// for a read schema it is whatever the file declared.
    pub fn declared_attribute_count(&self) -> u32 {
        self.declared_attribute_count
    }
}

/// Resolve a node id, falling back to `unknown_<id>`.
pub(crate) fn node_display_name(schema: &Schema, id: u32) -> String {
    match schema.node_name(id) {
        Some(name) => name.to_owned(),
        None => format!("unknown_{id}"),
    }
}

/// Resolve an attribute id, falling back to `attr_<id>`.
pub(crate) fn attribute_display_name(table: &AttributeTable, id: u32) -> String {
    match table.name(id) {
        Some(name) => name.to_owned(),
        None => format!("attr_{id}"),
    }
}

/// Check that every node and attribute in `root` resolves in `schema`.
pub fn check_tree(schema: &Schema, root: &Node) -> Result<()> {
    for node in root.descendants() {
        let node_id = schema.node_id(&node.name).ok_or_else(|| Error::UnknownNode {
            name: node.name.clone(),
        })?;
        let table = schema.attributes(node_id);
        for attr in &node.attributes {
            if table.and_then(|t| t.id(&attr.name)).is_none() {
                return Err(Error::UnknownAttribute {
                    node: node.name.clone(),
                    attribute: attr.name.clone(),
                });
            }
        }
    }
    Ok(())
}
