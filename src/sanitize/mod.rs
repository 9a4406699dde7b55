//! Allow-list sanitization.
//!
//! [`Sanitize`] is the contract the pipeline relies on: given a tree,
//! return one with no disallowed tags or attributes and nothing that can
//! run script (event handler attributes, `script` elements, `javascript:`
//! URLs). [`SchemaSanitizer`] implements it against a [`Schema`].
//!
//! Removal is silent; nothing reports what was stripped.

mod schema;
mod sink;

pub use schema::{ANY_TAG, Schema, SchemaExtension};

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use ammonia::{Builder, UrlRelative};
use tracing::{debug, trace};
use url::Url;

use crate::render::to_compact_html;
use crate::tree::Node;

/// Removes everything a schema does not allow.
pub trait Sanitize {
    fn sanitize(&self, tree: Node) -> Node;
}

/// Sanitizer driven by a [`Schema`].
///
/// The tree is serialized, cleaned by an [`ammonia::Builder`] configured
/// from the schema, and parsed back with html5ever:
///
/// - tags in `strip` are dropped with their content
/// - other disallowed tags are unwrapped (children kept, sanitized)
/// - foreign inline nodes are unwrapped too, unless named like a `strip`
///   tag
/// - `on*` attributes never survive, whatever the schema says
/// - URL attributes must be relative or use an allowed scheme
#[derive(Debug, Clone, Default)]
pub struct SchemaSanitizer {
    schema: Schema,
}

impl SchemaSanitizer {
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Replace foreign nodes by their children, or drop them outright when
    /// their name is a `strip` tag.
    fn unwrap_foreign(&self, children: Vec<Node>) -> Vec<Node> {
        let mut out = Vec::with_capacity(children.len());
        for child in children {
            match child {
                Node::ForeignInline { name, children } => {
                    if self.schema.strip.contains(&name.to_ascii_lowercase()) {
                        trace!(%name, "stripping foreign node with content");
                    } else {
                        trace!(%name, "unwrapping foreign node");
                        out.extend(self.unwrap_foreign(children));
                    }
                }
                Node::Element(mut el) => {
                    el.children = self.unwrap_foreign(el.children);
                    out.push(Node::Element(el));
                }
                Node::Root { children } => out.extend(self.unwrap_foreign(children)),
                text @ Node::Text { .. } => out.push(text),
            }
        }
        out
    }

    fn builder(&self) -> Builder<'_> {
        let schema = &self.schema;
        let tags: HashSet<&str> = schema.tag_names.iter().map(String::as_str).collect();
        let clean_content: HashSet<&str> = schema
            .strip
            .iter()
            .map(String::as_str)
            .filter(|tag| !tags.contains(tag))
            .collect();

        let mut generic = HashSet::new();
        let mut tag_attributes: HashMap<&str, HashSet<&str>> = HashMap::new();
        for (tag, names) in &schema.attributes {
            let names = names.iter().map(String::as_str);
            if tag == ANY_TAG {
                generic.extend(names);
            } else {
                tag_attributes.entry(tag.as_str()).or_default().extend(names);
            }
        }

        let schemes: HashSet<&str> = schema
            .protocols
            .values()
            .flatten()
            .map(String::as_str)
            .collect();

        let mut builder = Builder::empty();
        builder
            .tags(tags)
            .clean_content_tags(clean_content)
            .tag_attributes(tag_attributes)
            .generic_attributes(generic)
            .url_schemes(schemes)
            .url_relative(UrlRelative::PassThrough)
            .link_rel(None)
            .strip_comments(true)
            .attribute_filter(attribute_filter(schema.protocols.clone()));
        builder
    }
}

impl Sanitize for SchemaSanitizer {
    fn sanitize(&self, tree: Node) -> Node {
        let children = match tree {
            Node::Root { children } => children,
            other => vec![other],
        };
        let html = to_compact_html(&Node::root(self.unwrap_foreign(children)));
        let cleaned = self.builder().clean(&html).to_string();
        debug!(before = html.len(), after = cleaned.len(), "sanitized markup");
        Node::root(sink::parse_fragment(&cleaned))
    }
}

/// Per-attribute checks on top of ammonia's allow-lists: event handlers go,
/// and a `tag.attribute` protocol entry overrides the attribute-wide one.
fn attribute_filter(
    protocols: BTreeMap<String, BTreeSet<String>>,
) -> impl for<'u> Fn(&str, &str, &'u str) -> Option<Cow<'u, str>> + Send + Sync + 'static {
    move |element, attribute, value| {
        if attribute.starts_with("on") {
            return None;
        }
        let schemes = protocols
            .get(&format!("{element}.{attribute}"))
            .or_else(|| protocols.get(attribute));
        match schemes {
            Some(schemes) if !scheme_allowed(value, schemes) => {
                trace!(element, attribute, "dropping URL with disallowed scheme");
                None
            }
            _ => Some(Cow::Borrowed(value)),
        }
    }
}

/// Relative URLs are always allowed; absolute ones need a listed scheme.
fn scheme_allowed(value: &str, schemes: &BTreeSet<String>) -> bool {
    match Url::parse(value) {
        Ok(url) => schemes.contains(url.scheme()),
        Err(url::ParseError::RelativeUrlWithoutBase) => true,
        Err(_) => false,
    }
}
