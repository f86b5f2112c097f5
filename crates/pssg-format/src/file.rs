//! Whole-file entry points.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::decoder::{decode, DecodeOptions};
use crate::envelope::{unwrap_envelope, wrap_envelope, Envelope};
use crate::{Encoder, Node, PssgHeader, Result, Schema};

/// Check if data looks like a PSSG stream, compressed or not.
///
/// Compressed data is only sniffed for the GZip magic, not inflated.
pub fn is_pssg(data: &[u8]) -> bool {
    match Envelope::detect(data) {
        Envelope::Gzip => true,
        Envelope::Raw => data.len() >= PssgHeader::SIZE && &data[..4] == PssgHeader::MAGIC,
    }
}

/// Decode a PSSG file into its tree and the schema read from it.
pub fn parse(data: &[u8]) -> Result<(Node, Schema)> {
    let file = PssgFile::parse(data)?;
    Ok((file.root, file.schema))
}

/// Encode a tree against a schema into uncompressed PSSG bytes.
pub fn write(root: &Node, schema: &Schema) -> Result<Vec<u8>> {
    Encoder::new(schema).to_vec(root)
}

/// A decoded PSSG file.
///
/// Keeps the schema read from the file so that an unmodified tree encodes back
/// to the same bytes.
///
/// # Example
///
/// ```no_run
/// use pssg_format::PssgFile;
///
/// let file = PssgFile::open("land.pssg")?;
/// println!("{} node types", file.schema().node_count());
///
/// let bytes = file.to_bytes()?;
/// # Ok::<(), pssg_format::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct PssgFile {
    root: Node,
    schema: Schema,
    envelope: Envelope,
    declared_length: u32,
}

impl PssgFile {
    /// Parse a PSSG file from bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::parse_with(data, DecodeOptions::default())
    }

    /// Parse a PSSG file from bytes with explicit decode options.
    pub fn parse_with(data: &[u8], options: DecodeOptions) -> Result<Self> {
        let envelope = Envelope::detect(data);
        let stream = unwrap_envelope(data)?;
        let decoded = decode(&stream, options)?;

        Ok(Self {
            root: decoded.root,
            schema: decoded.schema,
            envelope,
            declared_length: decoded.declared_length,
        })
    }

    /// Open and parse a PSSG file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;

        // Mapping a zero-length file fails on some platforms.
        if file.metadata()?.len() == 0 {
            return Self::parse(&[]);
        }

        let mmap = unsafe { Mmap::map(&file)? };
        tracing::debug!(path = %path.display(), size = mmap.len(), "opened pssg file");
        Self::parse(&mmap)
    }

    /// Wrap an existing tree and schema.
    pub fn from_parts(root: Node, schema: Schema) -> Self {
        Self {
            root,
            schema,
            envelope: Envelope::Raw,
            declared_length: 0,
        }
    }

    /// Create a file for a tree, with a schema built from it.
    pub fn from_tree(root: Node) -> Self {
        let schema = Schema::build(&root);
        Self::from_parts(root, schema)
    }

    /// Root node.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Mutable root node.
    ///
    /// New node or attribute names must be followed by
    /// [`rebuild_schema`](Self::rebuild_schema) before encoding.
    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    /// Schema used for encoding.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Envelope the file was read with.
    pub fn envelope(&self) -> Envelope {
        self.envelope
    }

    /// `totalLength` from the header as read; 0 for files not read from bytes.
    pub fn declared_length(&self) -> u32 {
        self.declared_length
    }

    /// Replace the schema with one built from the current tree.
    ///
    /// The output stays structurally valid but ids may differ from the
    /// original file.
    pub fn rebuild_schema(&mut self) {
        self.schema = Schema::build(&self.root);
    }

    /// Encode to uncompressed bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Encoder::new(&self.schema).to_vec(&self.root)
    }

    /// Encode and wrap in `envelope`.
    pub fn to_bytes_with(&self, envelope: Envelope) -> Result<Vec<u8>> {
        wrap_envelope(&self.to_bytes()?, envelope)
    }

    /// Encode uncompressed to a file.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.write_to_with(path, Envelope::Raw)
    }

    /// Encode to a file, wrapped in `envelope`.
    ///
    /// The whole stream is encoded in memory first, so a failed encode leaves
    /// no partial file behind.
    pub fn write_to_with<P: AsRef<Path>>(&self, path: P, envelope: Envelope) -> Result<()> {
        let bytes = self.to_bytes_with(envelope)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn sample() -> Node {
        Node::new("PSSGDATABASE")
            .attr("creator", b"test".to_vec())
            .child(Node::new("TEXTURE").attr("width", vec![0, 0, 0, 4]).with_data(vec![7; 32]))
    }

    #[test]
    fn test_is_pssg() {
        assert!(is_pssg(b"PSSG\x00\x00\x00\x00"));
        assert!(is_pssg(&[0x1F, 0x8B, 0x08, 0x00]));
        assert!(!is_pssg(b"PSSG"));
        assert!(!is_pssg(b"DDS |...."));
    }

    #[test]
    fn test_parse_write_functions() {
        let bytes = PssgFile::from_tree(sample()).to_bytes().unwrap();
        let (root, schema) = parse(&bytes).unwrap();
        assert_eq!(root, sample());
        assert_eq!(write(&root, &schema).unwrap(), bytes);
    }

    #[test]
    fn test_declared_length() {
        let bytes = PssgFile::from_tree(sample()).to_bytes().unwrap();
        let file = PssgFile::parse(&bytes).unwrap();
        assert_eq!(file.declared_length() as usize, bytes.len() - 8);
        assert_eq!(file.envelope(), Envelope::Raw);
    }

    #[test]
    fn test_rebuild_schema_after_edit() {
        let bytes = PssgFile::from_tree(sample()).to_bytes().unwrap();
        let mut file = PssgFile::parse(&bytes).unwrap();
        file.root_mut().set_attribute("version", vec![1]);

        assert!(matches!(file.to_bytes(), Err(Error::UnknownAttribute { .. })));

        file.rebuild_schema();
        let reparsed = PssgFile::parse(&file.to_bytes().unwrap()).unwrap();
        assert_eq!(reparsed.root().attribute("version"), Some(&[1u8][..]));
    }

    #[test]
    fn test_open_and_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.pssg");
        let gz_path = dir.path().join("sample.pssg.gz");

        let file = PssgFile::from_tree(sample());
        file.write_to(&path).unwrap();
        file.write_to_with(&gz_path, Envelope::Gzip).unwrap();

        let plain = PssgFile::open(&path).unwrap();
        let compressed = PssgFile::open(&gz_path).unwrap();
        assert_eq!(compressed.envelope(), Envelope::Gzip);
        assert_eq!(plain.root(), compressed.root());
        assert_eq!(std::fs::read(&path).unwrap(), compressed.to_bytes().unwrap());
    }

    #[test]
    fn test_open_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pssg");
        std::fs::write(&path, b"").unwrap();

        assert!(matches!(PssgFile::open(&path), Err(Error::InvalidMagic { .. })));
    }
}
