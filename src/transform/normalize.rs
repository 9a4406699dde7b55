//! Foreign inline nodes → canonical elements.
//!
//! MDX hands formatting tags like `<u>` and `<s>` over as JSX elements.
//! Later stages (the sanitizer in particular) only understand canonical
//! elements, and would drop these, so they are rewritten here:
//!
//! | foreign name  | element |
//! |---------------|---------|
//! | `u`           | `u`     |
//! | `del`, `s`    | `del`   |
//!
//! Any other name passes through untouched. Children move over verbatim;
//! no attributes are carried.

use tracing::debug;

use super::{Stage, StageOutput};
use crate::tree::{Element, Node, Visit, visit_mut};

/// Canonical tag for a foreign node name, if it has one.
pub fn canonical_tag(name: &str) -> Option<&'static str> {
    match name {
        "u" => Some("u"),
        "del" | "s" => Some("del"),
        _ => None,
    }
}

/// Rewrite every known foreign node in place.
pub fn normalize(tree: &mut Node) {
    let mut rewritten = 0usize;

    visit_mut(tree, Node::is_foreign, |slot| {
        let Node::ForeignInline { name, children } = slot.node_mut() else {
            return Visit::Continue;
        };
        let Some(tag) = canonical_tag(name) else {
            return Visit::Continue;
        };
        let children = std::mem::take(children);
        if slot
            .replace(Node::from(Element::new(tag).with_children(children)))
            .is_some()
        {
            rewritten += 1;
        }
        // The new element holds the same children; keep walking them so
        // nested foreign nodes are handled in this pass.
        Visit::Continue
    });

    if rewritten > 0 {
        debug!(rewritten, "normalized foreign inline nodes");
    }
}

/// Pipeline stage wrapper for [`normalize`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Normalizer;

impl Stage for Normalizer {
    fn name(&self) -> &'static str {
        "normalize"
    }

    fn apply(&self, mut tree: Node, _out: &mut StageOutput) -> Node {
        normalize(&mut tree);
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn p(children: Vec<Node>) -> Node {
        Node::from(Element::new("p").with_children(children))
    }

    #[test]
    fn test_u_becomes_element() {
        let mut tree = Node::root(vec![p(vec![Node::foreign("u", vec![Node::text("x")])])]);
        normalize(&mut tree);
        let u = &tree.children()[0].children()[0];
        assert!(u.is_element("u"));
        assert_eq!(u.text_content(), "x");
        assert!(u.as_element().unwrap().attributes.is_empty());
    }

    #[test]
    fn test_s_and_del_become_del() {
        let mut tree = Node::root(vec![p(vec![
            Node::foreign("s", vec![Node::text("a")]),
            Node::foreign("del", vec![Node::text("b")]),
        ])]);
        normalize(&mut tree);
        let children = tree.children()[0].children();
        assert!(children[0].is_element("del"));
        assert!(children[1].is_element("del"));
    }

    #[test]
    fn test_unknown_name_passes_through() {
        let original = Node::root(vec![p(vec![Node::foreign(
            "Callout",
            vec![Node::text("keep")],
        )])]);
        let mut tree = original.clone();
        normalize(&mut tree);
        assert_eq!(tree, original);
    }

    #[test]
    fn test_nested_foreign_nodes() {
        let mut tree = Node::root(vec![p(vec![Node::foreign(
            "mark",
            vec![Node::foreign(
                "u",
                vec![Node::foreign("s", vec![Node::text("deep")])],
            )],
        )])]);
        normalize(&mut tree);
        let mark = &tree.children()[0].children()[0];
        assert!(mark.is_foreign());
        let u = &mark.children()[0];
        assert!(u.is_element("u"));
        assert!(u.children()[0].is_element("del"));
        assert_eq!(u.text_content(), "deep");
    }

    fn arb_tree() -> impl Strategy<Value = Node> {
        let leaf = "[a-z]{0,4}".prop_map(Node::text);
        leaf.prop_recursive(4, 32, 4, |inner| {
            prop_oneof![
                (
                    prop_oneof![Just("u"), Just("s"), Just("del"), Just("kbd")],
                    prop::collection::vec(inner.clone(), 0..4)
                )
                    .prop_map(|(name, children)| Node::foreign(name, children)),
                prop::collection::vec(inner, 0..4)
                    .prop_map(|children| Node::from(Element::new("span").with_children(children))),
            ]
        })
        .prop_map(|node| Node::root(vec![node]))
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(tree in arb_tree()) {
            let mut once = tree;
            normalize(&mut once);
            let mut twice = once.clone();
            normalize(&mut twice);
            prop_assert_eq!(once, twice);
        }
    }
}
