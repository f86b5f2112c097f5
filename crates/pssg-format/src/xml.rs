//! XML view of a PSSG tree.
//!
//! Each node becomes an element named after the node type. Attribute values
//! are written as uppercase hex, and a leaf's data blob becomes the element's
//! hex text content. A repeated attribute name on one node gets a `.2`, `.3`
//! suffix so the output stays well-formed. This is an inspection view, not an
//! import format.

use std::fmt::Write as _;
use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use rustc_hash::FxHashSet;

use crate::{Error, Node, Result};

/// Convert a tree to an indented XML string.
pub fn to_xml_string(root: &Node) -> Result<String> {
    let mut output = Vec::new();
    write_xml(root, &mut output)?;
    String::from_utf8(output).map_err(|e| Error::Xml(e.to_string()))
}

/// Write a tree as XML to a writer.
pub fn write_xml<W: Write>(root: &Node, writer: &mut W) -> Result<()> {
    let mut xml_writer = Writer::new_with_indent(writer, b' ', 2);

    xml_writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(|e| Error::Xml(e.to_string()))?;

    write_element(&mut xml_writer, root)
}

fn write_element<W: Write>(writer: &mut Writer<W>, node: &Node) -> Result<()> {
    let mut elem = BytesStart::new(node.name.as_str());
    let mut used = FxHashSet::default();
    for attr in &node.attributes {
        let mut key = attr.name.clone();
        let mut occurrence = 1;
        while !used.insert(key.clone()) {
            occurrence += 1;
            key = format!("{}.{}", attr.name, occurrence);
        }
        elem.push_attribute((key.as_str(), hex(&attr.value).as_str()));
    }

    let data = node.payload();
    if node.is_leaf() && data.is_empty() {
        return writer
            .write_event(Event::Empty(elem))
            .map_err(|e| Error::Xml(e.to_string()));
    }

    writer
        .write_event(Event::Start(elem))
        .map_err(|e| Error::Xml(e.to_string()))?;

    if node.is_leaf() {
        writer
            .write_event(Event::Text(BytesText::new(&hex(data))))
            .map_err(|e| Error::Xml(e.to_string()))?;
    } else {
        for child in &node.children {
            write_element(writer, child)?;
        }
    }

    writer
        .write_event(Event::End(BytesEnd::new(node.name.as_str())))
        .map_err(|e| Error::Xml(e.to_string()))?;

    Ok(())
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02X}");
    }
    out
}
