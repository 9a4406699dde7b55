//! Document tree model.
//!
//! A document is a single [`Node::Root`] whose children are owned outright:
//! no sharing, no back-pointers, no cycles. Stages receive the tree by value,
//! mutate it, and hand it on.
//!
//! `ForeignInline` only exists between parsing and normalization; it carries
//! parser-specific inline constructs (MDX JSX elements such as `<u>`) that
//! have not yet been mapped to a canonical element.

mod visit;

pub use visit::{Parent, Slot, Visit, visit, visit_mut};

use std::collections::BTreeMap;

/// An attribute value: either a plain string or a token list (`class`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Str(String),
    List(Vec<String>),
}

impl AttrValue {
    /// Render the value the way it appears in markup.
    ///
    /// Lists are space-separated.
    pub fn as_text(&self) -> String {
        match self {
            AttrValue::Str(s) => s.clone(),
            AttrValue::List(items) => items.join(" "),
        }
    }

    /// Borrow a plain string value, `None` for lists.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            AttrValue::List(_) => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(items: Vec<String>) -> Self {
        AttrValue::List(items)
    }
}

/// A canonical element node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Lowercase tag name (`p`, `a`, `h2`, ...).
    pub tag: String,
    /// Ordered so serialization is deterministic.
    pub attributes: BTreeMap<String, AttrValue>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Builder: set an attribute.
    pub fn with_attr(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    /// Builder: set the class list.
    pub fn with_classes(mut self, classes: &[&str]) -> Self {
        let list = classes.iter().map(|c| c.to_string()).collect::<Vec<_>>();
        self.attributes
            .insert("class".to_string(), AttrValue::List(list));
        self
    }

    /// Builder: append a child.
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Builder: replace the children.
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Get an attribute value as a string, if it is a plain string.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(AttrValue::as_str)
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<AttrValue>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn has_class(&self, class: &str) -> bool {
        match self.attributes.get("class") {
            Some(AttrValue::List(items)) => items.iter().any(|c| c == class),
            Some(AttrValue::Str(s)) => s.split_whitespace().any(|c| c == class),
            None => false,
        }
    }

    /// Heading level for `h1`..`h6`.
    pub fn heading_level(&self) -> Option<u8> {
        match self.tag.as_str() {
            "h1" => Some(1),
            "h2" => Some(2),
            "h3" => Some(3),
            "h4" => Some(4),
            "h5" => Some(5),
            "h6" => Some(6),
            _ => None,
        }
    }
}

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Document root. Never has a parent.
    Root { children: Vec<Node> },
    Element(Element),
    Text { value: String },
    /// Parser-specific inline construct, identified by name.
    ForeignInline { name: String, children: Vec<Node> },
}

impl Node {
    pub fn root(children: Vec<Node>) -> Self {
        Node::Root { children }
    }

    pub fn element(tag: impl Into<String>) -> Self {
        Node::Element(Element::new(tag))
    }

    pub fn text(value: impl Into<String>) -> Self {
        Node::Text {
            value: value.into(),
        }
    }

    pub fn foreign(name: impl Into<String>, children: Vec<Node>) -> Self {
        Node::ForeignInline {
            name: name.into(),
            children,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Root { children } | Node::ForeignInline { children, .. } => children,
            Node::Element(el) => &el.children,
            Node::Text { .. } => &[],
        }
    }

    /// Mutable access to the child list. `None` for text nodes.
    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Root { children } | Node::ForeignInline { children, .. } => Some(children),
            Node::Element(el) => Some(&mut el.children),
            Node::Text { .. } => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Tag name for element nodes.
    pub fn tag(&self) -> Option<&str> {
        self.as_element().map(|el| el.tag.as_str())
    }

    pub fn is_element(&self, tag: &str) -> bool {
        self.tag() == Some(tag)
    }

    pub fn is_foreign(&self) -> bool {
        matches!(self, Node::ForeignInline { .. })
    }

    /// Concatenated text of every descendant text node, in document order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

fn collect_text(node: &Node, out: &mut String) {
    match node {
        Node::Text { value } => out.push_str(value),
        other => {
            for child in other.children() {
                collect_text(child, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_content_concatenates_descendants() {
        let node = Node::from(
            Element::new("h2")
                .with_child(Node::text("Hello "))
                .with_child(Node::from(
                    Element::new("em").with_child(Node::text("World")),
                ))
                .with_child(Node::foreign("mark", vec![Node::text("!")])),
        );
        assert_eq!(node.text_content(), "Hello World!");
    }

    #[test]
    fn test_heading_level() {
        assert_eq!(Element::new("h1").heading_level(), Some(1));
        assert_eq!(Element::new("h6").heading_level(), Some(6));
        assert_eq!(Element::new("h7").heading_level(), None);
        assert_eq!(Element::new("p").heading_level(), None);
    }

    #[test]
    fn test_has_class_list_and_string() {
        let list = Element::new("div").with_classes(&["a", "b"]);
        assert!(list.has_class("b"));
        assert!(!list.has_class("c"));

        let plain = Element::new("div").with_attr("class", "x y");
        assert!(plain.has_class("y"));
    }

    #[test]
    fn test_attr_value_text() {
        let list = AttrValue::List(vec!["rounded-lg".into(), "w-full".into()]);
        assert_eq!(list.as_text(), "rounded-lg w-full");
        assert_eq!(list.as_str(), None);
        assert_eq!(AttrValue::from("x").as_str(), Some("x"));
    }

    #[test]
    fn test_text_node_has_no_children() {
        let mut node = Node::text("leaf");
        assert!(node.children().is_empty());
        assert!(node.children_mut().is_none());
    }
}
