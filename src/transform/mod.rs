//! Tree transformation stages.
//!
//! Each stage takes the tree by value, rewrites it, and returns it. Stages
//! share nothing but the tree and the [`StageOutput`] side channel, and
//! their order is part of the contract (see [`crate::pipeline`]):
//!
//! 1. **Normalize** - foreign inline nodes become canonical elements
//! 2. **Embed** - hosted video/file links become embed blocks
//! 3. **Toc** - headings get ids, the outline is collected
//! 4. **Sanitize** - disallowed tags and attributes are removed

mod embed;
mod normalize;
mod slugify;
mod toc;

pub use embed::{Embed, EmbedKind, EmbedRewriter, classify, rewrite_embeds};
pub use normalize::{Normalizer, canonical_tag, normalize};
pub use slugify::{Slugger, slugify};
pub use toc::{OutlineBuilder, TocEntry, TocExtractor, extract_toc, flatten_ids};

use crate::tree::Node;

/// Values stages produce besides the tree itself.
#[derive(Debug, Clone, Default)]
pub struct StageOutput {
    pub toc: Vec<TocEntry>,
}

/// One tree-in/tree-out pass.
pub trait Stage {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn apply(&self, tree: Node, out: &mut StageOutput) -> Node;
}
