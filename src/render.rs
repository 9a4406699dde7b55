//! HTML serialization of rendered trees and outlines.
//!
//! Output is HTML5: void elements have no closing tag and boolean
//! attributes (an empty value) are written bare. Block elements end with a
//! newline; nothing is indented so `pre` content survives untouched.

use std::fmt::Write;

use crate::transform::TocEntry;
use crate::tree::{AttrValue, Node};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const BLOCK_ELEMENTS: &[&str] = &[
    "blockquote", "div", "figure", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "iframe", "li", "nav",
    "ol", "p", "pre", "section", "table", "tbody", "thead", "tr", "ul",
];

/// Attributes written without a value when empty.
const BOOLEAN_ATTRIBUTES: &[&str] = &["allowfullscreen", "checked", "disabled", "itemscope"];

/// Serialize a tree to an HTML fragment.
pub fn to_html(tree: &Node) -> String {
    let mut out = String::new();
    write_node(tree, &mut out, true);
    out
}

/// Serialize without block newlines, so re-parsing the markup yields no
/// whitespace text nodes that were not in the tree.
pub(crate) fn to_compact_html(tree: &Node) -> String {
    let mut out = String::new();
    write_node(tree, &mut out, false);
    out
}

fn write_node(node: &Node, out: &mut String, newlines: bool) {
    match node {
        Node::Root { children } | Node::ForeignInline { children, .. } => {
            for child in children {
                write_node(child, out, newlines);
            }
        }
        Node::Text { value } => out.push_str(&escape_text(value)),
        Node::Element(el) => {
            write!(out, "<{}", el.tag).unwrap();
            for (name, value) in &el.attributes {
                let value = match value {
                    AttrValue::Str(s) => escape_attr(s),
                    AttrValue::List(items) => escape_attr(&items.join(" ")),
                };
                if value.is_empty() && BOOLEAN_ATTRIBUTES.contains(&name.as_str()) {
                    write!(out, " {name}").unwrap();
                } else {
                    write!(out, " {name}=\"{value}\"").unwrap();
                }
            }
            out.push('>');

            let tag = el.tag.as_str();
            if !VOID_ELEMENTS.contains(&tag) {
                for child in &el.children {
                    write_node(child, out, newlines);
                }
                write!(out, "</{tag}>").unwrap();
            }
            if newlines && BLOCK_ELEMENTS.contains(&tag) {
                out.push('\n');
            }
        }
    }
}

/// Serialize an outline as a nested `<nav>` list of fragment links.
///
/// The entry whose id equals `active` gets `class="active"`.
pub fn toc_to_html(entries: &[TocEntry], active: Option<&str>) -> String {
    let mut out = String::from("<nav class=\"toc\">\n");
    if !entries.is_empty() {
        write_toc_list(entries, active, &mut out);
    }
    out.push_str("</nav>\n");
    out
}

fn write_toc_list(entries: &[TocEntry], active: Option<&str>, out: &mut String) {
    out.push_str("<ul>\n");
    for entry in entries {
        out.push_str("<li>");
        let class = if active == Some(entry.id.as_str()) {
            " class=\"active\""
        } else {
            ""
        };
        write!(
            out,
            "<a href=\"{}\"{class}>{}</a>",
            escape_attr(&entry.href()),
            escape_text(&entry.text)
        )
        .unwrap();
        if !entry.children.is_empty() {
            out.push('\n');
            write_toc_list(&entry.children, active, out);
        }
        out.push_str("</li>\n");
    }
    out.push_str("</ul>\n");
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Element;

    #[test]
    fn test_escaping() {
        let tree = Node::root(vec![Node::from(
            Element::new("a")
                .with_attr("href", "/?a=1&b=\"2\"")
                .with_child(Node::text("<x> & y")),
        )]);
        assert_eq!(
            to_html(&tree),
            "<a href=\"/?a=1&amp;b=&quot;2&quot;\">&lt;x&gt; &amp; y</a>"
        );
    }

    #[test]
    fn test_void_and_boolean() {
        let tree = Node::root(vec![
            Node::from(
                Element::new("input")
                    .with_attr("type", "checkbox")
                    .with_attr("disabled", ""),
            ),
            Node::from(Element::new("br")),
        ]);
        assert_eq!(to_html(&tree), "<input disabled type=\"checkbox\"><br>");
    }

    #[test]
    fn test_class_list_joined() {
        let tree = Node::root(vec![Node::from(
            Element::new("div").with_classes(&["youtube-embed", "my-4"]),
        )]);
        assert_eq!(to_html(&tree), "<div class=\"youtube-embed my-4\"></div>\n");
    }

    #[test]
    fn test_compact_html_has_no_block_newlines() {
        let tree = Node::root(vec![
            Node::from(Element::new("p").with_child(Node::text("a\nb"))),
            Node::from(Element::new("hr")),
        ]);
        assert_eq!(to_compact_html(&tree), "<p>a\nb</p><hr>");
        assert_eq!(to_html(&tree), "<p>a\nb</p>\n<hr>\n");
    }

    #[test]
    fn test_foreign_nodes_render_children() {
        let tree = Node::root(vec![Node::foreign("Note", vec![Node::text("hi")])]);
        assert_eq!(to_html(&tree), "hi");
    }

    #[test]
    fn test_toc_nav() {
        let mut intro = TocEntry::new("Intro", 1, "intro");
        intro.children.push(TocEntry::new("Set up", 2, "set-up"));
        let html = toc_to_html(&[intro], Some("set-up"));
        assert_eq!(
            html,
            "<nav class=\"toc\">\n<ul>\n<li><a href=\"#intro\">Intro</a>\n<ul>\n\
             <li><a href=\"#set-up\" class=\"active\">Set up</a></li>\n</ul>\n</li>\n</ul>\n</nav>\n"
        );
    }

    #[test]
    fn test_empty_toc() {
        assert_eq!(toc_to_html(&[], None), "<nav class=\"toc\">\n</nav>\n");
    }
}
