//! Markdown/MDX source → document tree.
//!
//! Parsing is delegated to `markdown` (markdown-rs), which yields mdast.
//! This module only maps mdast onto the [`tree`](crate::tree) model:
//!
//! - Block and inline constructs become canonical elements (`p`, `h2`,
//!   `pre > code.language-rust`, `ul > li`, `table > thead/tbody`, ...)
//! - MDX JSX elements (`<u>`, `<s>`, `<Custom>`) become
//!   [`Node::ForeignInline`] and are left for the normalizer
//! - MDX expressions, ESM, frontmatter and definitions produce no output
//! - GFM footnote references become `sup > a`; their definitions are
//!   collected into a trailing `section.footnotes`, numbered in order of
//!   first reference
//!
//! A parse failure surfaces as [`Error::Parse`]; nothing downstream ever
//! sees a partial tree.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use markdown::mdast::{self, AlignKind};
use markdown::{Constructs, ParseOptions};
use tracing::trace;

use crate::error::{Error, Result};
use crate::tree::{Element, Node};

/// Marks a footnote reference anchor.
pub(crate) const FOOTNOTE_REF: &str = "data-footnote-ref";
/// Marks the link from a footnote back to its reference.
pub(crate) const FOOTNOTE_BACKREF: &str = "data-footnote-backref";

/// Parser options: MDX with GFM tables, strikethrough, task lists,
/// footnotes and autolink literals. ESM is off since there is no
/// JavaScript parser behind it.
pub fn parse_options() -> ParseOptions {
    ParseOptions {
        constructs: Constructs {
            frontmatter: true,
            gfm_autolink_literal: true,
            gfm_footnote_definition: true,
            gfm_label_start_footnote: true,
            gfm_strikethrough: true,
            gfm_table: true,
            gfm_task_list_item: true,
            mdx_esm: false,
            ..Constructs::mdx()
        },
        ..ParseOptions::mdx()
    }
}

/// Parse source text into a document tree.
pub fn parse(source: &str) -> Result<Node> {
    let mdast =
        markdown::to_mdast(source, &parse_options()).map_err(|e| Error::Parse(e.to_string()))?;

    let mut definitions = HashMap::new();
    collect_definitions(&mdast, &mut definitions);

    let mut footnotes = Footnotes::default();
    collect_footnotes(&mdast, &mut footnotes);
    footnotes
        .order
        .retain(|id| footnotes.definitions.contains_key(id));

    let cx = Converter {
        definitions,
        footnotes,
        referenced: RefCell::default(),
    };
    let mut out = Vec::new();
    cx.convert(&mdast, false, &mut out);

    let mut children = match out.pop() {
        Some(Node::Root { children }) => children,
        Some(other) => vec![other],
        None => Vec::new(),
    };
    if let Some(section) = cx.footnote_section() {
        children.push(section);
    }
    Ok(Node::root(children))
}

/// Link reference definition target.
struct Definition {
    url: String,
    title: Option<String>,
}

fn collect_definitions(node: &mdast::Node, out: &mut HashMap<String, Definition>) {
    if let mdast::Node::Definition(def) = node {
        // First definition wins, as in CommonMark.
        out.entry(def.identifier.clone()).or_insert(Definition {
            url: def.url.clone(),
            title: def.title.clone(),
        });
    }
    if let Some(children) = node.children() {
        for child in children {
            collect_definitions(child, out);
        }
    }
}

#[derive(Default)]
struct Footnotes<'a> {
    definitions: HashMap<String, &'a mdast::FootnoteDefinition>,
    /// Identifiers in order of first reference.
    order: Vec<String>,
}

fn collect_footnotes<'a>(node: &'a mdast::Node, out: &mut Footnotes<'a>) {
    match node {
        mdast::Node::FootnoteDefinition(def) => {
            out.definitions.entry(def.identifier.clone()).or_insert(def);
        }
        mdast::Node::FootnoteReference(reference) => {
            if !out.order.contains(&reference.identifier) {
                out.order.push(reference.identifier.clone());
            }
        }
        _ => {}
    }
    if let Some(children) = node.children() {
        for child in children {
            collect_footnotes(child, out);
        }
    }
}

struct Converter<'a> {
    definitions: HashMap<String, Definition>,
    footnotes: Footnotes<'a>,
    /// Footnote numbers whose first reference has been emitted.
    referenced: RefCell<HashSet<usize>>,
}

impl Converter<'_> {
    fn all(&self, children: &[mdast::Node], tight: bool) -> Vec<Node> {
        let mut out = Vec::with_capacity(children.len());
        for child in children {
            self.convert(child, tight, &mut out);
        }
        out
    }

    /// Convert one mdast node, appending zero or more nodes to `out`.
    ///
    /// `tight` is set for the direct children of items in a tight list,
    /// whose paragraphs are unwrapped.
    fn convert(&self, node: &mdast::Node, tight: bool, out: &mut Vec<Node>) {
        use mdast::Node as M;

        match node {
            M::Root(root) => out.push(Node::root(self.all(&root.children, false))),

            M::Paragraph(p) if tight => out.extend(self.all(&p.children, false)),
            M::Paragraph(p) => out.push(element("p", self.all(&p.children, false))),

            M::Heading(h) => {
                let tag = format!("h{}", h.depth.clamp(1, 6));
                out.push(element(&tag, self.all(&h.children, false)));
            }

            M::Text(t) => out.push(Node::text(t.value.clone())),
            M::Emphasis(e) => out.push(element("em", self.all(&e.children, false))),
            M::Strong(s) => out.push(element("strong", self.all(&s.children, false))),
            M::Delete(d) => out.push(element("del", self.all(&d.children, false))),
            M::InlineCode(c) => out.push(element("code", vec![Node::text(c.value.clone())])),
            M::Break(_) => out.push(Node::element("br")),
            M::ThematicBreak(_) => out.push(Node::element("hr")),

            M::Code(c) => {
                let mut code = Element::new("code").with_child(Node::text(format!("{}\n", c.value)));
                if let Some(lang) = c.lang.as_deref().filter(|l| !l.is_empty()) {
                    code = code.with_classes(&[format!("language-{lang}").as_str()]);
                }
                out.push(element("pre", vec![Node::from(code)]));
            }

            M::Blockquote(q) => out.push(element("blockquote", self.all(&q.children, false))),

            M::List(list) => out.push(self.list(list)),

            M::Link(link) => {
                let mut a = Element::new("a")
                    .with_attr("href", link.url.as_str())
                    .with_children(self.all(&link.children, false));
                if let Some(title) = &link.title {
                    a.set_attr("title", title.as_str());
                }
                out.push(Node::from(a));
            }

            M::LinkReference(reference) => {
                let children = self.all(&reference.children, false);
                match self.definitions.get(&reference.identifier) {
                    Some(def) => {
                        let mut a = Element::new("a")
                            .with_attr("href", def.url.as_str())
                            .with_children(children);
                        if let Some(title) = &def.title {
                            a.set_attr("title", title.as_str());
                        }
                        out.push(Node::from(a));
                    }
                    None => out.extend(children),
                }
            }

            M::Image(image) => {
                let mut img = Element::new("img")
                    .with_attr("src", image.url.as_str())
                    .with_attr("alt", image.alt.as_str());
                if let Some(title) = &image.title {
                    img.set_attr("title", title.as_str());
                }
                out.push(Node::from(img));
            }

            M::ImageReference(reference) => match self.definitions.get(&reference.identifier) {
                Some(def) => {
                    let mut img = Element::new("img")
                        .with_attr("src", def.url.as_str())
                        .with_attr("alt", reference.alt.as_str());
                    if let Some(title) = &def.title {
                        img.set_attr("title", title.as_str());
                    }
                    out.push(Node::from(img));
                }
                None => out.push(Node::text(reference.alt.clone())),
            },

            M::Table(table) => out.push(self.table(table)),

            M::FootnoteReference(reference) => out.push(self.footnote_ref(reference)),

            M::MdxJsxTextElement(jsx) => {
                self.jsx(jsx.name.as_deref(), &jsx.children, out);
            }
            M::MdxJsxFlowElement(jsx) => {
                self.jsx(jsx.name.as_deref(), &jsx.children, out);
            }

            M::Definition(_)
            | M::FootnoteDefinition(_)
            | M::MdxjsEsm(_)
            | M::MdxFlowExpression(_)
            | M::MdxTextExpression(_)
            | M::Yaml(_)
            | M::Toml(_) => {}

            other => {
                trace!(node = ?std::mem::discriminant(other), "dropping unsupported mdast node");
            }
        }
    }

    fn list(&self, list: &mdast::List) -> Node {
        let loose = list.spread
            || list
                .children
                .iter()
                .any(|item| matches!(item, mdast::Node::ListItem(li) if li.spread));

        let tag = if list.ordered { "ol" } else { "ul" };
        let mut el = Element::new(tag);
        if list.ordered
            && let Some(start) = list.start
            && start != 1
        {
            el.set_attr("start", start.to_string());
        }

        let mut has_tasks = false;
        for child in &list.children {
            let mdast::Node::ListItem(item) = child else {
                continue;
            };
            let mut li = Element::new("li");
            if let Some(checked) = item.checked {
                has_tasks = true;
                li = li.with_classes(&["task-list-item"]);
                let mut input = Element::new("input")
                    .with_attr("type", "checkbox")
                    .with_attr("disabled", "");
                if checked {
                    input.set_attr("checked", "");
                }
                li.children.push(Node::from(input));
                li.children.push(Node::text(" "));
            }
            li.children.extend(self.all(&item.children, !loose));
            el.children.push(Node::from(li));
        }
        if has_tasks {
            el = el.with_classes(&["contains-task-list"]);
        }
        Node::from(el)
    }

    fn table(&self, table: &mdast::Table) -> Node {
        let mut head = Element::new("thead");
        let mut body = Element::new("tbody");

        for (row_index, row) in table.children.iter().enumerate() {
            let mdast::Node::TableRow(row) = row else {
                continue;
            };
            let cell_tag = if row_index == 0 { "th" } else { "td" };
            let mut tr = Element::new("tr");
            for (col, cell) in row.children.iter().enumerate() {
                let mdast::Node::TableCell(cell) = cell else {
                    continue;
                };
                let mut el = Element::new(cell_tag).with_children(self.all(&cell.children, false));
                if let Some(align) = table.align.get(col).and_then(align_name) {
                    el.set_attr("align", align);
                }
                tr.children.push(Node::from(el));
            }
            if row_index == 0 {
                head.children.push(Node::from(tr));
            } else {
                body.children.push(Node::from(tr));
            }
        }

        let mut el = Element::new("table").with_child(Node::from(head));
        if !body.children.is_empty() {
            el.children.push(Node::from(body));
        }
        Node::from(el)
    }

    fn footnote_number(&self, identifier: &str) -> Option<usize> {
        self.footnotes
            .order
            .iter()
            .position(|id| id == identifier)
            .map(|i| i + 1)
    }

    fn footnote_ref(&self, reference: &mdast::FootnoteReference) -> Node {
        let Some(n) = self.footnote_number(&reference.identifier) else {
            let label = reference.label.as_deref().unwrap_or(&reference.identifier);
            return Node::text(format!("[^{label}]"));
        };
        let mut a = Element::new("a")
            .with_attr("href", format!("#fn-{n}"))
            .with_attr(FOOTNOTE_REF, "")
            .with_child(Node::text(n.to_string()));
        // Only the first reference is a back-reference target.
        if self.referenced.borrow_mut().insert(n) {
            a.set_attr("id", format!("fnref-{n}"));
        }
        element("sup", vec![Node::from(a)])
    }

    fn footnote_section(&self) -> Option<Node> {
        if self.footnotes.order.is_empty() {
            return None;
        }
        let mut ol = Element::new("ol");
        for (i, id) in self.footnotes.order.iter().enumerate() {
            let n = i + 1;
            let Some(def) = self.footnotes.definitions.get(id) else {
                continue;
            };
            let backref = Node::from(
                Element::new("a")
                    .with_attr("href", format!("#fnref-{n}"))
                    .with_attr("aria-label", format!("Back to reference {n}"))
                    .with_attr(FOOTNOTE_BACKREF, "")
                    .with_child(Node::text("\u{21a9}")),
            );
            let mut children = self.all(&def.children, false);
            let last_paragraph = children
                .last_mut()
                .and_then(Node::as_element_mut)
                .filter(|el| el.tag == "p");
            if let Some(p) = last_paragraph {
                p.children.push(Node::text(" "));
                p.children.push(backref);
            } else {
                children.push(backref);
            }
            ol.children.push(Node::from(
                Element::new("li")
                    .with_attr("id", format!("fn-{n}"))
                    .with_children(children),
            ));
        }
        Some(Node::from(
            Element::new("section")
                .with_classes(&["footnotes"])
                .with_child(Node::from(ol)),
        ))
    }

    fn jsx(&self, name: Option<&str>, children: &[mdast::Node], out: &mut Vec<Node>) {
        let children = self.all(children, false);
        match name {
            Some(name) => out.push(Node::foreign(name, children)),
            // Fragments (`<>...</>`) have no element of their own.
            None => out.extend(children),
        }
    }
}

fn element(tag: &str, children: Vec<Node>) -> Node {
    Node::from(Element::new(tag).with_children(children))
}

fn align_name(align: &AlignKind) -> Option<&'static str> {
    match align {
        AlignKind::Left => Some("left"),
        AlignKind::Right => Some("right"),
        AlignKind::Center => Some("center"),
        AlignKind::None => None,
    }
}
