//! Heading ids and table of contents extraction.
//!
//! Walks headings in document order, gives each a unique `id` derived from
//! its text, and folds the flat `(depth, text, id)` sequence into a nested
//! outline with a stack of open entries.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use tracing::debug;

use super::slugify::Slugger;
use super::{Stage, StageOutput};
use crate::tree::{Node, Visit, visit_mut};

/// Characters escaped in a URL fragment.
const FRAGMENT: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>').add(b'`');

/// One entry in the table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct TocEntry {
    /// Heading text.
    pub text: String,
    /// Heading level (1-6).
    pub depth: u8,
    /// Id assigned to the heading element.
    pub id: String,
    /// Entries for deeper headings that follow, in document order.
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Vec::is_empty"))]
    pub children: Vec<TocEntry>,
}

impl TocEntry {
    pub fn new(text: impl Into<String>, depth: u8, id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            depth,
            id: id.into(),
            children: Vec::new(),
        }
    }

    /// Fragment link to the heading.
    pub fn href(&self) -> String {
        format!("#{}", utf8_percent_encode(&self.id, FRAGMENT))
    }
}

/// All ids in the forest, in pre-order (document order).
pub fn flatten_ids(entries: &[TocEntry]) -> Vec<String> {
    fn walk(entries: &[TocEntry], out: &mut Vec<String>) {
        for entry in entries {
            out.push(entry.id.clone());
            walk(&entry.children, out);
        }
    }

    let mut out = Vec::new();
    walk(entries, &mut out);
    out
}

/// Builds a nested outline from headings fed in document order.
#[derive(Debug, Default)]
pub struct OutlineBuilder {
    /// Open entries; depths strictly increase from bottom to top.
    stack: Vec<TocEntry>,
    roots: Vec<TocEntry>,
}

impl OutlineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the next heading.
    ///
    /// Closes every open entry at the same or a deeper level, then opens
    /// the new one beneath whatever is left on top.
    pub fn push(&mut self, entry: TocEntry) {
        while self
            .stack
            .last()
            .is_some_and(|open| open.depth >= entry.depth)
        {
            self.close_top();
        }
        self.stack.push(entry);
    }

    /// Close everything and return the root-level entries.
    pub fn finish(mut self) -> Vec<TocEntry> {
        while !self.stack.is_empty() {
            self.close_top();
        }
        self.roots
    }

    fn close_top(&mut self) {
        let Some(done) = self.stack.pop() else {
            return;
        };
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(done),
            None => self.roots.push(done),
        }
    }
}

/// Assign heading ids and return the table of contents.
///
/// Headings that already carry an `id` keep it unless an earlier heading
/// owns it, in which case it gets a `-n` suffix like any repeated slug.
pub fn extract_toc(tree: &mut Node) -> Vec<TocEntry> {
    let mut slugger = Slugger::new();
    let mut outline = OutlineBuilder::new();
    let mut count = 0usize;

    visit_mut(
        tree,
        |node| node.as_element().and_then(|el| el.heading_level()).is_some(),
        |slot| {
            let text = slot.node().text_content();
            let Some(el) = slot.node_mut().as_element_mut() else {
                return Visit::Skip;
            };
            let Some(depth) = el.heading_level() else {
                return Visit::Skip;
            };

            let id = match el.attr("id").filter(|id| !id.is_empty()) {
                Some(existing) => {
                    let existing = existing.to_string();
                    let id = slugger.unique(&existing);
                    if id != existing {
                        el.set_attr("id", id.as_str());
                    }
                    id
                }
                None => {
                    let id = slugger.slug(&text);
                    el.set_attr("id", id.as_str());
                    id
                }
            };

            outline.push(TocEntry::new(text.trim(), depth, id));
            count += 1;
            // Headings do not nest.
            Visit::Skip
        },
    );

    debug!(headings = count, "extracted table of contents");
    outline.finish()
}

/// Pipeline stage wrapper for [`extract_toc`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TocExtractor;

impl Stage for TocExtractor {
    fn name(&self) -> &'static str {
        "toc"
    }

    fn apply(&self, mut tree: Node, out: &mut StageOutput) -> Node {
        out.toc = extract_toc(&mut tree);
        tree
    }
}
