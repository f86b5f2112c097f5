//! End-to-end decode/encode tests over hand-assembled PSSG streams.

use pssg_common::{BinaryReader, BinaryWriter};
use pssg_format::{wrap_envelope, Envelope, Error, Node, NodeSizes, PssgFile, Schema};

/// Minimal hand-built stream writer, independent of the crate's encoder.
struct Fixture {
    writer: BinaryWriter<std::io::Cursor<Vec<u8>>>,
}

impl Fixture {
    /// Header plus schema table given as `(node_id, name, [(attr_id, attr_name)])`.
    fn new(attr_info_count: u32, schema: &[(u32, &str, &[(u32, &str)])]) -> Self {
        let mut writer = BinaryWriter::in_memory();
        writer.write_bytes(b"PSSG").unwrap();
        writer.write_u32(0).unwrap();
        writer.write_u32(attr_info_count).unwrap();
        writer.write_len(schema.len()).unwrap();
        for (id, name, attrs) in schema {
            writer.write_u32(*id).unwrap();
            writer.write_prefixed_string(name).unwrap();
            writer.write_len(attrs.len()).unwrap();
            for (attr_id, attr_name) in attrs.iter() {
                writer.write_u32(*attr_id).unwrap();
                writer.write_prefixed_string(attr_name).unwrap();
            }
        }
        Self { writer }
    }

    fn finish(self, root: Vec<u8>) -> Vec<u8> {
        let mut writer = self.writer;
        writer.write_bytes(&root).unwrap();
        let end = writer.position().unwrap() as u32;
        writer.patch_u32(4, end - 8).unwrap();
        writer.into_inner().into_inner()
    }
}

fn record(node_id: u32, attrs: &[(u32, &[u8])], payload: &[u8]) -> Vec<u8> {
    let attr_block: usize = attrs.iter().map(|(_, v)| 8 + v.len()).sum();
    let mut writer = BinaryWriter::in_memory();
    writer.write_u32(node_id).unwrap();
    writer.write_len(4 + attr_block + payload.len()).unwrap();
    writer.write_len(attr_block).unwrap();
    for (id, value) in attrs {
        writer.write_u32(*id).unwrap();
        writer.write_len(value.len()).unwrap();
        writer.write_bytes(value).unwrap();
    }
    writer.write_bytes(payload).unwrap();
    writer.into_inner().into_inner()
}

/// A small scene with schema ids deliberately out of lexicographic order.
fn scene() -> Vec<u8> {
    let texture = record(
        7,
        &[(2, &[0, 0, 1, 0]), (1, b"\x00\x00\x00\x05grass")],
        &[0xAB; 48],
    );
    let empty_texture = record(7, &[], &[]);
    let library = record(3, &[(5, b"\x00\x00\x00\x03tex")], &[texture, empty_texture].concat());
    let mesh = record(12, &[], &[1, 2, 3]);
    let root = record(
        1,
        &[(9, b"creator"), (9, b"again")],
        &[library, mesh].concat(),
    );

    Fixture::new(
        99,
        &[
            (1, "PSSGDATABASE", &[(9, "creator")]),
            (12, "MESH", &[]),
            (3, "LIBRARY", &[(5, "type")]),
            (7, "TEXTURE", &[(1, "id"), (2, "width")]),
        ],
    )
    .finish(root)
}

#[test]
fn test_concrete_minimal_file() {
    let bytes = Fixture::new(1, &[(1, "ROOT", &[(1, "id")])])
        .finish(record(1, &[(1, &[0, 0, 0, 2])], &[]));

    let file = PssgFile::parse(&bytes).unwrap();
    let root = file.root();
    assert_eq!(root.name, "ROOT");
    assert_eq!(root.attributes.len(), 1);
    assert_eq!(root.attribute("id"), Some(&[0u8, 0, 0, 2][..]));
    assert!(root.children.is_empty());
    assert_eq!(root.data, None);

    let encoded = file.to_bytes().unwrap();
    assert_eq!(encoded, bytes);
    assert_eq!(
        u32::from_be_bytes(encoded[4..8].try_into().unwrap()) as usize,
        encoded.len() - 8
    );

    // A freshly built schema happens to match for this vocabulary.
    assert_eq!(pssg_format::write(root, &Schema::build(root)).unwrap(), bytes);
}

#[test]
fn test_roundtrip_with_decoded_schema() {
    let bytes = scene();
    let file = PssgFile::parse(&bytes).unwrap();

    assert_eq!(file.schema().declared_attribute_count(), 99);
    assert_eq!(file.to_bytes().unwrap(), bytes);
}

#[test]
fn test_decoded_scene_shape() {
    let file = PssgFile::parse(&scene()).unwrap();
    let root = file.root();

    assert_eq!(root.name, "PSSGDATABASE");
    assert_eq!(root.attributes.len(), 2);
    assert_eq!(root.attributes[1].value, b"again");

    let library = &root.children[0];
    assert_eq!(library.name, "LIBRARY");
    assert_eq!(library.children.len(), 2);

    let texture = &library.children[0];
    assert_eq!(texture.attributes[0].name, "width");
    assert_eq!(texture.attributes[1].name, "id");
    assert_eq!(texture.data.as_deref(), Some(&[0xAB; 48][..]));
    assert_eq!(library.children[1].data, None);

    assert_eq!(root.children[1].data, Some(vec![1, 2, 3]));
}

#[test]
fn test_leaf_branch_exclusivity() {
    let file = PssgFile::parse(&scene()).unwrap();
    for node in file.root().descendants() {
        assert!(node.children.is_empty() || node.data.is_none(), "{}", node.name);
    }
}

#[test]
fn test_rebuilt_schema_is_structurally_valid() {
    let file = PssgFile::parse(&scene()).unwrap();
    let schema = Schema::build(file.root());
    let bytes = pssg_format::write(file.root(), &schema).unwrap();

    let reparsed = PssgFile::parse(&bytes).unwrap();
    assert_eq!(reparsed.root(), file.root());
    assert_eq!(reparsed.schema(), &schema);
}

#[test]
fn test_schema_determinism() {
    let a = Node::new("ROOT")
        .child(Node::new("TEXTURE").attr("width", vec![]).attr("id", vec![]))
        .child(Node::new("MESH").attr("count", vec![]));
    let b = Node::new("ROOT")
        .child(Node::new("MESH").attr("count", vec![]))
        .child(Node::new("TEXTURE").attr("id", vec![]))
        .child(Node::new("TEXTURE").attr("width", vec![]));

    assert_eq!(Schema::build(&a), Schema::build(&b));
    assert_eq!(Schema::build(&a), Schema::build(&a.clone()));
}

/// Walk the encoded records alongside the computed sizes and check the size law.
fn check_sizes(reader: &mut BinaryReader<'_>, node: &Node, sizes: &NodeSizes) {
    let _node_id = reader.read_u32().unwrap();
    let node_size = reader.read_u32().unwrap();
    let start = reader.position();
    let attr_block_size = reader.read_u32().unwrap();

    assert_eq!(node_size, sizes.node_size);
    assert_eq!(attr_block_size, sizes.attr_block_size);

    let expected_attrs: usize = node.attributes.iter().map(|a| 8 + a.value.len()).sum();
    assert_eq!(attr_block_size as usize, expected_attrs);
    reader.advance(attr_block_size as usize);

    let payload: usize = if node.children.is_empty() {
        node.payload().len()
    } else {
        node.children
            .iter()
            .zip(&sizes.children)
            .map(|(child, child_sizes)| {
                check_sizes(reader, child, child_sizes);
                8 + child_sizes.node_size as usize
            })
            .sum()
    };
    assert_eq!(node_size as usize, 4 + attr_block_size as usize + payload);

    reader.seek(start + node_size as usize);
}

#[test]
fn test_size_law() {
    let file = PssgFile::parse(&scene()).unwrap();
    let bytes = file.to_bytes().unwrap();
    let sizes = NodeSizes::compute(file.root()).unwrap();

    // Skip header and schema by re-reading it.
    let mut reader = BinaryReader::new(&bytes);
    reader.advance(8);
    Schema::read(&mut reader).unwrap();

    check_sizes(&mut reader, file.root(), &sizes);
    assert!(reader.is_empty());
}

#[test]
fn test_unknown_node_id_tolerated() {
    let child = record(40, &[(1, b"zzz")], &[9; 20]);
    let bytes = Fixture::new(0, &[(1, "ROOT", &[])]).finish(record(1, &[], &child));

    // The unknown child is not recognised by the lookahead, so it stays data.
    let file = PssgFile::parse(&bytes).unwrap();
    assert_eq!(file.root().data, Some(child.clone()));

    // As the root itself, an unknown id is named and delimited by its size.
    let bytes = Fixture::new(0, &[(1, "ROOT", &[])]).finish(child);
    let file = PssgFile::parse(&bytes).unwrap();
    assert_eq!(file.root().name, "unknown_40");
    assert!(file.root().attributes.is_empty());
    assert_eq!(file.root().data, Some(vec![9; 20]));
}

#[test]
fn test_compressed_envelope_transparency() {
    let bytes = scene();
    let compressed = wrap_envelope(&bytes, Envelope::Gzip).unwrap();

    let plain = PssgFile::parse(&bytes).unwrap();
    let unwrapped = PssgFile::parse(&compressed).unwrap();

    assert_eq!(unwrapped.envelope(), Envelope::Gzip);
    assert_eq!(plain.root(), unwrapped.root());
    assert_eq!(plain.schema(), unwrapped.schema());
    assert_eq!(unwrapped.to_bytes().unwrap(), bytes);
}

#[test]
fn test_signature_error() {
    let mut bytes = scene();
    bytes[0] = b'X';
    assert!(matches!(PssgFile::parse(&bytes), Err(Error::InvalidMagic { .. })));
}

#[test]
fn test_truncated_stream() {
    let bytes = scene();

    // Cuts inside the tree are caught by the root record's size check.
    for cut in [bytes.len() - 1, bytes.len() - 60] {
        let result = PssgFile::parse(&bytes[..cut]);
        assert!(
            matches!(result, Err(Error::Truncated { context: "node", .. })),
            "cut at {cut}: {result:?}"
        );
    }

    // Cut inside the first schema entry, before its name length.
    let result = PssgFile::parse(&bytes[..20]);
    assert!(
        matches!(
            result,
            Err(Error::Common(pssg_common::Error::UnexpectedEof { needed: 4, available: 0 }))
        ),
        "{result:?}"
    );

    let result = PssgFile::parse(&bytes[..6]);
    assert!(
        matches!(result, Err(Error::Truncated { context: "header", .. })),
        "{result:?}"
    );
}

#[test]
fn test_corrupt_envelope() {
    let mut compressed = wrap_envelope(&scene(), Envelope::Gzip).unwrap();
    let crc_at = compressed.len() - 8;
    compressed[crc_at] ^= 0x55;
    assert!(matches!(PssgFile::parse(&compressed), Err(Error::Envelope(_))));
}
