//! html5ever TreeSink that reads cleaned markup back into document nodes.

use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute as Html5Attribute, QualName};

use crate::tree::{AttrValue, Element, Node};

type NodeRef = Rc<SinkNode>;

enum SinkData {
    Document,
    Element {
        name: QualName,
        attrs: RefCell<Vec<Html5Attribute>>,
    },
    Text(RefCell<String>),
    /// Comments, processing instructions.
    Ignored,
}

struct SinkNode {
    data: SinkData,
    parent: RefCell<Option<Weak<SinkNode>>>,
    children: RefCell<Vec<NodeRef>>,
}

impl SinkNode {
    fn new(data: SinkData) -> NodeRef {
        Rc::new(Self {
            data,
            parent: RefCell::new(None),
            children: RefCell::new(Vec::new()),
        })
    }

    fn text(value: &str) -> NodeRef {
        Self::new(SinkData::Text(RefCell::new(value.to_string())))
    }

    fn parent(&self) -> Option<NodeRef> {
        self.parent.borrow().as_ref().and_then(Weak::upgrade)
    }

    fn is_element(&self, tag: &str) -> bool {
        matches!(&self.data, SinkData::Element { name, .. } if &*name.local == tag)
    }
}

/// Unlink `node` from its parent, if it has one.
fn detach(node: &NodeRef) {
    let parent = node.parent.borrow_mut().take().and_then(|weak| weak.upgrade());
    if let Some(parent) = parent {
        parent
            .children
            .borrow_mut()
            .retain(|child| !Rc::ptr_eq(child, node));
    }
}

fn append_node(parent: &NodeRef, child: NodeRef) {
    detach(&child);
    *child.parent.borrow_mut() = Some(Rc::downgrade(parent));
    parent.children.borrow_mut().push(child);
}

/// Append text, merging with a trailing text node.
fn append_text(parent: &NodeRef, text: &str) {
    if let Some(last) = parent.children.borrow().last()
        && let SinkData::Text(existing) = &last.data
    {
        existing.borrow_mut().push_str(text);
        return;
    }
    append_node(parent, SinkNode::text(text));
}

fn insert_before(sibling: &NodeRef, child: NodeOrText<NodeRef>) {
    let Some(parent) = sibling.parent() else {
        return;
    };
    let node = match child {
        NodeOrText::AppendNode(node) => {
            detach(&node);
            node
        }
        NodeOrText::AppendText(text) => {
            let children = parent.children.borrow();
            let index = children.iter().position(|c| Rc::ptr_eq(c, sibling));
            if let Some(prev) = index.and_then(|i| i.checked_sub(1)).map(|i| &children[i])
                && let SinkData::Text(existing) = &prev.data
            {
                existing.borrow_mut().push_str(&text);
                return;
            }
            SinkNode::text(&text)
        }
    };

    let mut children = parent.children.borrow_mut();
    let Some(index) = children.iter().position(|c| Rc::ptr_eq(c, sibling)) else {
        return;
    };
    *node.parent.borrow_mut() = Some(Rc::downgrade(&parent));
    children.insert(index, node);
}

/// Builds a DOM of reference-counted nodes; [`finish`](TreeSink::finish)
/// converts the `body` content to [`Node`]s.
struct FragmentSink {
    document: NodeRef,
}

impl FragmentSink {
    fn new() -> Self {
        Self {
            document: SinkNode::new(SinkData::Document),
        }
    }
}

impl TreeSink for FragmentSink {
    type Handle = NodeRef;
    type Output = Vec<Node>;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        let Some(body) =
            child_element(&self.document, "html").and_then(|html| child_element(&html, "body"))
        else {
            return Vec::new();
        };
        let children = body.children.borrow();
        children.iter().filter_map(to_node).collect()
    }

    fn parse_error(&self, _msg: Cow<'static, str>) {}

    fn get_document(&self) -> Self::Handle {
        self.document.clone()
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        static EMPTY: QualName = QualName {
            prefix: None,
            ns: html5ever::ns!(),
            local: html5ever::local_name!(""),
        };

        match &target.data {
            SinkData::Element { name, .. } => name,
            _ => &EMPTY,
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Html5Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        SinkNode::new(SinkData::Element {
            name,
            attrs: RefCell::new(attrs),
        })
    }

    fn create_comment(&self, _text: StrTendril) -> Self::Handle {
        SinkNode::new(SinkData::Ignored)
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        SinkNode::new(SinkData::Ignored)
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        match child {
            NodeOrText::AppendNode(node) => append_node(parent, node),
            NodeOrText::AppendText(text) => append_text(parent, &text),
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        if element.parent().is_some() {
            insert_before(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        target.clone()
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        Rc::ptr_eq(x, y)
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        insert_before(sibling, new_node);
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Html5Attribute>) {
        if let SinkData::Element {
            attrs: existing, ..
        } = &target.data
        {
            let mut existing = existing.borrow_mut();
            for attr in attrs {
                if !existing.iter().any(|a| a.name == attr.name) {
                    existing.push(attr);
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        detach(target);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let children = std::mem::take(&mut *node.children.borrow_mut());
        let mut adopted = new_parent.children.borrow_mut();
        for child in children {
            *child.parent.borrow_mut() = Some(Rc::downgrade(new_parent));
            adopted.push(child);
        }
    }
}

fn child_element(parent: &NodeRef, tag: &str) -> Option<NodeRef> {
    parent
        .children
        .borrow()
        .iter()
        .find(|child| child.is_element(tag))
        .cloned()
}

fn to_node(handle: &NodeRef) -> Option<Node> {
    match &handle.data {
        SinkData::Text(text) => Some(Node::text(text.borrow().as_str())),
        SinkData::Element { name, attrs } => {
            let mut el = Element::new(name.local.to_string());
            for attr in attrs.borrow().iter() {
                let key = attr.name.local.to_string();
                let value = if key == "class" {
                    AttrValue::List(attr.value.split_whitespace().map(str::to_string).collect())
                } else {
                    AttrValue::Str(attr.value.to_string())
                };
                el.attributes.insert(key, value);
            }
            el.children = handle.children.borrow().iter().filter_map(to_node).collect();
            Some(Node::Element(el))
        }
        SinkData::Document | SinkData::Ignored => None,
    }
}

/// Parse an HTML fragment and return the nodes html5ever places in `body`.
pub(super) fn parse_fragment(html: &str) -> Vec<Node> {
    parse_document(FragmentSink::new(), ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes())
}
