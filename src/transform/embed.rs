//! Embed rewriting for video and file-hosting links.
//!
//! Anchors pointing at Google Drive/Docs files or YouTube videos are
//! replaced with an embed block: a `div` wrapping an `iframe` configured
//! for autoplay, full screen and responsive sizing. Every other anchor is
//! kept, but opens in a new context with `target="_blank"` and
//! `rel="noopener noreferrer"`. Footnote references and back-references
//! are in-page jumps and are left alone.
//!
//! ## Replacement rules
//!
//! 1. A `p` whose sole child is an embeddable anchor is itself replaced by
//!    the embed block, so no empty paragraph is left around it.
//! 2. An embeddable anchor that shares its `p` with other content stays a
//!    link (with the safe-linking attributes).
//! 3. An embeddable anchor anywhere else is replaced by the embed block.
//!
//! Embed blocks contain no anchors, so a second run is a no-op.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::{Stage, StageOutput};
use crate::parse::{FOOTNOTE_BACKREF, FOOTNOTE_REF};
use crate::tree::{Element, Node, Parent, Visit, visit_mut};

/// Hosting provider recognized by the rewriter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedKind {
    GoogleDrive,
    YouTube,
}

impl EmbedKind {
    /// Class placed on the embed container.
    fn class_name(self) -> &'static str {
        match self {
            EmbedKind::GoogleDrive => "google-drive-embed",
            EmbedKind::YouTube => "youtube-embed",
        }
    }
}

/// A resource recognized in a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub kind: EmbedKind,
    pub resource_id: String,
}

impl Embed {
    /// URL the frame loads.
    pub fn frame_src(&self) -> String {
        match self.kind {
            EmbedKind::GoogleDrive => {
                format!("https://drive.google.com/file/d/{}/preview", self.resource_id)
            }
            EmbedKind::YouTube => format!("https://www.youtube.com/embed/{}", self.resource_id),
        }
    }

    /// Build the embed block.
    pub fn to_node(&self) -> Node {
        let frame = Element::new("iframe")
            .with_attr("src", self.frame_src())
            .with_attr("width", "100%")
            .with_attr("height", "480")
            .with_attr("allow", "autoplay; encrypted-media")
            .with_attr("allowfullscreen", "")
            .with_attr("frameborder", "0")
            .with_classes(&["rounded-lg", "w-full", "aspect-video"])
            .with_attr("style", "max-width: 100%;");

        Node::from(
            Element::new("div")
                .with_classes(&[self.kind.class_name(), "my-4"])
                .with_child(Node::from(frame)),
        )
    }
}

static DRIVE_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"/file/d/([a-zA-Z0-9_-]+)").unwrap(),
        Regex::new(r"id=([a-zA-Z0-9_-]+)").unwrap(),
        Regex::new(r"/d/([a-zA-Z0-9_-]+)").unwrap(),
    ]
});

static YOUTUBE_PATTERNS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        Regex::new(r"youtube\.com/watch\?v=([a-zA-Z0-9_-]+)").unwrap(),
        Regex::new(r"youtube\.com/embed/([a-zA-Z0-9_-]+)").unwrap(),
        Regex::new(r"youtu\.be/([a-zA-Z0-9_-]+)").unwrap(),
        Regex::new(r"youtube\.com/v/([a-zA-Z0-9_-]+)").unwrap(),
    ]
});

fn first_capture(patterns: &[Regex], url: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn is_drive_url(url: &str) -> bool {
    url.contains("drive.google.com") || url.contains("docs.google.com")
}

fn is_youtube_url(url: &str) -> bool {
    url.contains("youtube.com") || url.contains("youtu.be")
}

/// Classify a URL. Drive is checked before YouTube; a recognized host with
/// no extractable id is not an embed.
pub fn classify(url: &str) -> Option<Embed> {
    if is_drive_url(url)
        && let Some(resource_id) = first_capture(&*DRIVE_PATTERNS, url)
    {
        return Some(Embed {
            kind: EmbedKind::GoogleDrive,
            resource_id,
        });
    }

    if is_youtube_url(url)
        && let Some(resource_id) = first_capture(&*YOUTUBE_PATTERNS, url)
    {
        return Some(Embed {
            kind: EmbedKind::YouTube,
            resource_id,
        });
    }

    None
}

/// Embed for an anchor node, if its `href` is recognized.
fn anchor_embed(node: &Node) -> Option<Embed> {
    let el = node.as_element().filter(|el| el.tag == "a")?;
    classify(el.attr("href")?)
}

/// Make an anchor open in a new context without exposing the opener.
fn is_footnote_link(el: &Element) -> bool {
    [FOOTNOTE_REF, FOOTNOTE_BACKREF]
        .iter()
        .any(|marker| el.attributes.contains_key(*marker))
}

fn make_safe(el: &mut Element) {
    el.set_attr("target", "_blank");
    el.set_attr("rel", "noopener noreferrer");
}

/// Rewrite anchors in place. Returns the number of embed blocks created.
pub fn rewrite_embeds(tree: &mut Node) -> usize {
    let mut embedded = 0usize;
    let mut secured = 0usize;

    visit_mut(
        tree,
        |node| node.is_element("a") || node.is_element("p"),
        |slot| {
            // Sole-anchor paragraph: the paragraph itself gives way.
            if slot.node().is_element("p") {
                if let [only] = slot.node().children()
                    && let Some(embed) = anchor_embed(only)
                    && slot.replace(embed.to_node()).is_some()
                {
                    embedded += 1;
                    return Visit::Skip;
                }
                return Visit::Continue;
            }

            let shares_paragraph =
                matches!(slot.parent(), Some(p @ Parent::Element { tag: "p", .. }) if p.len() > 1);

            if !shares_paragraph
                && let Some(embed) = anchor_embed(slot.node())
                && slot.replace(embed.to_node()).is_some()
            {
                embedded += 1;
                return Visit::Skip;
            }

            if let Some(el) = slot.node_mut().as_element_mut()
                && el.attr("href").is_some()
                && !is_footnote_link(el)
            {
                make_safe(el);
                secured += 1;
            }
            Visit::Continue
        },
    );

    debug!(embedded, secured, "rewrote anchors");
    embedded
}

/// Pipeline stage wrapper for [`rewrite_embeds`].
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbedRewriter;

impl Stage for EmbedRewriter {
    fn name(&self) -> &'static str {
        "embed"
    }

    fn apply(&self, mut tree: Node, _out: &mut StageOutput) -> Node {
        rewrite_embeds(&mut tree);
        tree
    }
}
