//! Depth-first traversal over a document tree.
//!
//! Both walkers visit in pre-order (document order). Nodes rejected by the
//! `test` predicate are not reported, but their descendants still are.
//!
//! [`visit_mut`] hands the callback a [`Slot`]: "child `index` of `parent`".
//! Replacing through the slot is an owned swap, so the displaced subtree is
//! returned to the caller and never walked. After the callback returns
//! [`Visit::Continue`] the walk descends into whatever occupies the slot.

use super::{Element, Node};

/// What the walker does after a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Descend into the current occupant of the slot.
    Continue,
    /// Do not descend.
    Skip,
}

/// The parent of a visited node, as seen from the child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent<'p> {
    Root { len: usize },
    Element { tag: &'p str, len: usize },
    Foreign { name: &'p str, len: usize },
}

impl<'p> Parent<'p> {
    /// Tag name if the parent is an element.
    pub fn tag(&self) -> Option<&'p str> {
        match self {
            Parent::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    /// Number of children the parent has (siblings plus the node itself).
    pub fn len(&self) -> usize {
        match self {
            Parent::Root { len } | Parent::Element { len, .. } | Parent::Foreign { len, .. } => {
                *len
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An updatable position in the tree.
pub struct Slot<'a, 'p> {
    node: &'a mut Node,
    position: Option<(usize, Parent<'p>)>,
}

impl<'p> Slot<'_, 'p> {
    pub fn node(&self) -> &Node {
        self.node
    }

    pub fn node_mut(&mut self) -> &mut Node {
        self.node
    }

    /// Index in the parent's child list. `None` for the root.
    pub fn index(&self) -> Option<usize> {
        self.position.map(|(index, _)| index)
    }

    pub fn parent(&self) -> Option<Parent<'p>> {
        self.position.map(|(_, parent)| parent)
    }

    /// Put `node` in this slot and return the displaced node.
    ///
    /// The root has no parent to hold a replacement, so the request is
    /// refused and `None` returned with the tree unchanged.
    pub fn replace(&mut self, node: Node) -> Option<Node> {
        self.position?;
        Some(std::mem::replace(self.node, node))
    }
}

/// Walk the tree mutably, calling `visitor` for every node passing `test`.
pub fn visit_mut<T, F>(root: &mut Node, test: T, mut visitor: F)
where
    T: Fn(&Node) -> bool,
    F: FnMut(&mut Slot<'_, '_>) -> Visit,
{
    walk_mut(root, None, &test, &mut visitor);
}

fn walk_mut<T, F>(node: &mut Node, position: Option<(usize, Parent<'_>)>, test: &T, visitor: &mut F)
where
    T: Fn(&Node) -> bool,
    F: FnMut(&mut Slot<'_, '_>) -> Visit,
{
    if test(node) {
        let mut slot = Slot {
            node: &mut *node,
            position,
        };
        if visitor(&mut slot) == Visit::Skip {
            return;
        }
    }

    let (parent, children) = match node {
        Node::Root { children } => (
            Parent::Root {
                len: children.len(),
            },
            children,
        ),
        Node::Element(Element { tag, children, .. }) => (
            Parent::Element {
                tag: tag.as_str(),
                len: children.len(),
            },
            children,
        ),
        Node::ForeignInline { name, children } => (
            Parent::Foreign {
                name: name.as_str(),
                len: children.len(),
            },
            children,
        ),
        Node::Text { .. } => return,
    };

    for (index, child) in children.iter_mut().enumerate() {
        walk_mut(child, Some((index, parent)), test, visitor);
    }
}

/// Walk the tree read-only, reporting `(node, index, parent)` triples.
///
/// The root is reported with no index and no parent.
pub fn visit<T, F>(root: &Node, test: T, mut visitor: F)
where
    T: Fn(&Node) -> bool,
    F: FnMut(&Node, Option<usize>, Option<&Node>) -> Visit,
{
    walk(root, None, None, &test, &mut visitor);
}

fn walk<T, F>(node: &Node, index: Option<usize>, parent: Option<&Node>, test: &T, visitor: &mut F)
where
    T: Fn(&Node) -> bool,
    F: FnMut(&Node, Option<usize>, Option<&Node>) -> Visit,
{
    if test(node) && visitor(node, index, parent) == Visit::Skip {
        return;
    }
    for (i, child) in node.children().iter().enumerate() {
        walk(child, Some(i), Some(node), test, visitor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        Node::root(vec![
            Node::from(Element::new("p").with_child(Node::text("a"))),
            Node::from(
                Element::new("ul").with_child(Node::from(
                    Element::new("li").with_child(Node::text("b")),
                )),
            ),
            Node::text("c"),
        ])
    }

    #[test]
    fn test_visit_is_pre_order() {
        let tree = sample();
        let mut seen = Vec::new();
        visit(
            &tree,
            |_| true,
            |node, index, parent| {
                let label = match node {
                    Node::Root { .. } => "root".to_string(),
                    Node::Element(el) => el.tag.clone(),
                    Node::Text { value } => value.clone(),
                    Node::ForeignInline { name, .. } => name.clone(),
                };
                seen.push((label, index, parent.and_then(Node::tag).map(String::from)));
                Visit::Continue
            },
        );
        let labels: Vec<_> = seen.iter().map(|(l, _, _)| l.as_str()).collect();
        assert_eq!(labels, ["root", "p", "a", "ul", "li", "b", "c"]);
        assert_eq!(seen[0].1, None);
        assert_eq!(seen[4], ("li".to_string(), Some(0), Some("ul".to_string())));
        assert_eq!(seen[6].1, Some(2));
    }

    #[test]
    fn test_filtered_nodes_still_descend() {
        let tree = sample();
        let mut texts = Vec::new();
        visit(
            &tree,
            |node| matches!(node, Node::Text { .. }),
            |node, _, _| {
                texts.push(node.text_content());
                Visit::Continue
            },
        );
        assert_eq!(texts, ["a", "b", "c"]);
    }

    #[test]
    fn test_replacement_skips_original_children() {
        let mut tree = sample();
        let mut visited_li = false;
        visit_mut(
            &mut tree,
            |_| true,
            |slot| {
                if slot.node().is_element("li") {
                    visited_li = true;
                }
                if slot.node().is_element("ul") {
                    let old = slot.replace(Node::element("hr"));
                    assert!(old.is_some_and(|n| n.is_element("ul")));
                }
                Visit::Continue
            },
        );
        assert!(!visited_li);
        assert!(tree.children()[1].is_element("hr"));
    }

    #[test]
    fn test_continue_descends_into_replacement() {
        let mut tree = Node::root(vec![Node::foreign(
            "u",
            vec![Node::foreign("s", vec![Node::text("x")])],
        )]);
        let mut names = Vec::new();
        visit_mut(&mut tree, Node::is_foreign, |slot| {
            if let Node::ForeignInline { name, children } = slot.node_mut() {
                names.push(name.clone());
                let children = std::mem::take(children);
                slot.replace(Node::from(Element::new("span").with_children(children)));
            }
            Visit::Continue
        });
        assert_eq!(names, ["u", "s"]);
        assert!(tree.children()[0].children()[0].is_element("span"));
    }

    #[test]
    fn test_root_replacement_is_refused() {
        let mut tree = sample();
        visit_mut(
            &mut tree,
            |node| matches!(node, Node::Root { .. }),
            |slot| {
                assert_eq!(slot.index(), None);
                assert!(slot.parent().is_none());
                assert!(slot.replace(Node::text("gone")).is_none());
                Visit::Skip
            },
        );
        assert_eq!(tree, sample());
    }

    #[test]
    fn test_slot_reports_parent_and_len() {
        let mut tree = sample();
        let mut seen = Vec::new();
        visit_mut(
            &mut tree,
            |node| matches!(node, Node::Text { .. }),
            |slot| {
                let parent = slot.parent().expect("text nodes have parents");
                seen.push((slot.index(), parent.tag().map(str::to_owned), parent.len()));
                Visit::Continue
            },
        );
        let seen: Vec<_> = seen
            .iter()
            .map(|(index, tag, len)| (*index, tag.as_deref(), *len))
            .collect();
        assert_eq!(
            seen,
            [
                (Some(0), Some("p"), 1),
                (Some(0), Some("li"), 1),
                (Some(2), None, 3)
            ]
        );
    }
}
