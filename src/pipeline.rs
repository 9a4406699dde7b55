//! The ordered transformation pipeline.
//!
//! ```text
//! source ─► parse ─► Normalize ─► Embed ─► Toc ─► Sanitize ─► Rendered
//! ```
//!
//! The order is fixed. Normalization must precede sanitization or the
//! foreign `<u>`/`<s>` nodes would be dropped as unrecognized; the sanitizer
//! runs last so that the elements earlier stages introduce (`u`, `del`,
//! embed frames, heading ids) are checked against an allow-list that was
//! extended for them.
//!
//! A pipeline holds only its configuration. Independent documents can be
//! processed by independent pipelines on different threads.

use std::fmt;

use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::parse::parse;
use crate::sanitize::{Sanitize, Schema, SchemaExtension, SchemaSanitizer};
use crate::transform::{EmbedRewriter, Normalizer, Stage, StageOutput, TocEntry, TocExtractor};
use crate::tree::Node;

/// Output of a pipeline run.
#[derive(Debug, Clone)]
pub struct Rendered {
    /// Sanitized tree, ready for a renderer.
    pub tree: Node,
    /// Outline of the document. Every `id` matches a heading's `id`.
    pub toc: Vec<TocEntry>,
}

/// Adapts a [`Sanitize`] implementation to the stage interface.
struct SanitizeStage<S> {
    sanitizer: S,
}

impl<S: Sanitize> Stage for SanitizeStage<S> {
    fn name(&self) -> &'static str {
        "sanitize"
    }

    fn apply(&self, tree: Node, _out: &mut StageOutput) -> Node {
        self.sanitizer.sanitize(tree)
    }
}

/// A fixed, ordered list of stages.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage + Send + Sync>>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Pipeline {
    /// Build the pipeline with the bundled [`SchemaSanitizer`].
    ///
    /// The sanitizer's baseline schema is extended with the formatting
    /// tags and the footnotes block, with the embed block when embeds are
    /// enabled, and finally with `config.sanitize`.
    pub fn new(config: &Config) -> Self {
        let mut extension = SchemaExtension::formatting().merge(SchemaExtension::footnotes());
        if config.embeds {
            extension = extension.merge(SchemaExtension::embeds());
        }
        let schema = Schema::default()
            .with(&extension)
            .with(&config.sanitize);
        Self::with_sanitizer(config, SchemaSanitizer::new(schema))
    }

    /// Build the pipeline around an external sanitizer.
    ///
    /// The caller is responsible for allowing `u`, `del` and `section` (and
    /// the embed block, if embeds are enabled).
    pub fn with_sanitizer<S>(config: &Config, sanitizer: S) -> Self
    where
        S: Sanitize + Send + Sync + 'static,
    {
        let mut stages: Vec<Box<dyn Stage + Send + Sync>> = vec![Box::new(Normalizer)];
        if config.embeds {
            stages.push(Box::new(EmbedRewriter));
        }
        stages.push(Box::new(TocExtractor));
        stages.push(Box::new(SanitizeStage { sanitizer }));
        Self { stages }
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Parse `source` and run every stage.
    pub fn render(&self, source: &str) -> Result<Rendered> {
        debug!(bytes = source.len(), "parsing source");
        let tree = parse(source)?;
        Ok(self.process(tree))
    }

    /// Run every stage on an already-parsed tree.
    pub fn process(&self, tree: Node) -> Rendered {
        let mut out = StageOutput::default();
        let mut tree = tree;
        for stage in &self.stages {
            debug!(stage = stage.name(), "running stage");
            tree = stage.apply(tree, &mut out);
        }
        Rendered { tree, toc: out.toc }
    }
}
