//! # folio
//!
//! Markdown/MDX to sanitized HTML for blog posts, with a table of contents
//! and scroll-driven active heading tracking.
//!
//! ## Features
//!
//! - Markdown with MDX inline elements; `<u>` and `<s>` become `u` and `del`
//! - Google Drive and YouTube links become embedded players
//! - Every heading gets a unique id and a nested outline entry
//! - Allow-list sanitization with no script-capable output
//! - An active heading tracker driven by host visibility reports
//!
//! ## Quick Start
//!
//! ```
//! use folio::{Pipeline, render::to_html};
//!
//! let rendered = Pipeline::default()
//!     .render("# Setup\n\nSome <u>underlined</u> text.")
//!     .unwrap();
//!
//! assert_eq!(rendered.toc[0].id, "setup");
//! assert!(to_html(&rendered.tree).contains("<u>underlined</u>"));
//! ```
//!
//! ## Tracking the Active Heading
//!
//! ```
//! use folio::tracker::{ActiveHeadingTracker, ScrollLayout, TrackerConfig};
//! use folio::Pipeline;
//!
//! let rendered = Pipeline::default().render("## One\n\n## Two").unwrap();
//! let layout = ScrollLayout::new(1000.0)
//!     .with_region("one", 120.0, 40.0)
//!     .with_region("two", 900.0, 40.0);
//!
//! let mut tracker = ActiveHeadingTracker::mount(layout, &rendered.toc, TrackerConfig::default());
//! let batch = tracker.host_mut().scroll_to(700.0);
//! assert_eq!(tracker.handle_batch(&batch), Some("two"));
//! ```

pub mod config;
pub mod error;
pub mod parse;
pub mod pipeline;
pub mod render;
pub mod sanitize;
pub mod tracker;
pub mod transform;
pub mod tree;

pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::{Pipeline, Rendered};
pub use sanitize::{Sanitize, Schema, SchemaExtension, SchemaSanitizer};
pub use tracker::{ActiveHeadingTracker, TrackerConfig, VisibilityEntry, VisibilityHost};
pub use transform::TocEntry;
pub use tree::{Element, Node};
