//! In-memory PSSG tree.

/// A named attribute value.
///
/// Values are opaque byte blobs; their meaning belongs to the asset pipeline,
/// not to the file format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name, from the schema or `attr_<id>` when unmapped.
    pub name: String,
    /// Raw value bytes.
    pub value: Vec<u8>,
}

impl Attribute {
    /// Create a new attribute.
    pub fn new(name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A node in the PSSG tree.
///
/// A node carries either child nodes or an opaque `data` blob. Editing code
/// may transiently set both; the encoder then writes the children and ignores
/// `data`.
///
/// # Example
///
/// ```
/// use pssg_format::Node;
///
/// let root = Node::new("PSSGDATABASE")
///     .attr("creator", b"tool".to_vec())
///     .child(Node::new("TEXTURE").attr("width", 256u32.to_be_bytes()))
///     .child(Node::new("TEXTUREIMAGEBLOCKDATA").with_data(vec![0u8; 16]));
///
/// assert_eq!(root.children.len(), 2);
/// assert_eq!(root.find_all("texture").count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Node {
    /// Node type name, from the schema or `unknown_<id>` when unmapped.
    pub name: String,
    /// Attributes in file order. Duplicates are preserved.
    pub attributes: Vec<Attribute>,
    /// Child nodes in file order.
    pub children: Vec<Node>,
    /// Opaque payload, only meaningful when `children` is empty.
    pub data: Option<Vec<u8>>,
}

impl Node {
    /// Create an empty node with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append an attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    /// Append a child node.
    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Append multiple children.
    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    /// Set the opaque payload.
    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Value of the first attribute with the given name.
    pub fn attribute(&self, name: &str) -> Option<&[u8]> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_slice())
    }

    /// Mutable value of the first attribute with the given name.
    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut Vec<u8>> {
        self.attributes
            .iter_mut()
            .find(|a| a.name == name)
            .map(|a| &mut a.value)
    }

    /// Replace the first attribute with `name`, or append it.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) {
        let name = name.into();
        let value = value.into();
        match self.attribute_mut(&name) {
            Some(slot) => *slot = value,
            None => self.attributes.push(Attribute { name, value }),
        }
    }

    /// True if this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Payload bytes the encoder will write for a leaf.
    pub fn payload(&self) -> &[u8] {
        if self.is_leaf() {
            self.data.as_deref().unwrap_or_default()
        } else {
            &[]
        }
    }

    /// Pre-order iterator over this node and all of its descendants.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Descendants (including self) whose name matches, ignoring ASCII case.
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.descendants()
            .filter(move |n| n.name.eq_ignore_ascii_case(name))
    }

    /// First descendant (including self) whose name matches, ignoring ASCII case.
    pub fn find<'a>(&'a self, name: &'a str) -> Option<&'a Node> {
        self.find_all(name).next()
    }

}

/// Pre-order traversal of a subtree, see [`Node::descendants`].
#[derive(Debug)]
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        Node::new("A")
            .child(Node::new("B").child(Node::new("D")))
            .child(Node::new("C"))
    }

    #[test]
    fn test_descendants_pre_order() {
        let names: Vec<_> = sample().descendants().map(|n| n.name.clone()).collect();
        assert_eq!(names, ["A", "B", "D", "C"]);
    }

    #[test]
    fn test_find() {
        let tree = sample();
        assert_eq!(tree.find("d").map(|n| n.name.as_str()), Some("D"));
        assert!(tree.find("E").is_none());

        let wanted = String::from("c");
        let found = tree.find(&wanted);
        assert!(found.is_some_and(|n| n.is_leaf()));
    }

    #[test]
    fn test_set_attribute() {
        let mut node = Node::new("TEXTURE").attr("width", vec![0, 0, 1, 0]);
        node.set_attribute("width", vec![0, 0, 2, 0]);
        node.set_attribute("height", vec![0, 0, 2, 0]);

        assert_eq!(node.attributes.len(), 2);
        assert_eq!(node.attribute("width"), Some(&[0u8, 0, 2, 0][..]));
    }

    #[test]
    fn test_payload_prefers_children() {
        let mut node = Node::new("P").with_data(vec![1, 2, 3]);
        assert_eq!(node.payload(), &[1, 2, 3]);

        node.children.push(Node::new("C"));
        assert!(node.payload().is_empty());
    }

    #[test]
    fn test_find_ignores_case() {
        let root = Node::new("ROOT").child(Node::new("Mesh")).child(Node::new("MESH"));
        assert_eq!(root.find_all("mesh").count(), 2);
        assert!(root.find("texture").is_none());
    }
}
