//! Scroll-driven active heading tracking.
//!
//! [`ActiveHeadingTracker`] follows which heading of a rendered document the
//! reader is looking at, so a table of contents can highlight it. Layout
//! and visibility come from a [`VisibilityHost`]; the tracker only decides.
//!
//! Selection, for each batch of visibility changes:
//!
//! 1. Among entries intersecting the observation band, the one nearest the
//!    top of the viewport wins.
//! 2. If none intersect, among entries whose top is at or above
//!    `activation_offset`, the one closest to `anchor_offset` wins.
//! 3. Otherwise the active heading does not change.
//!
//! Ties go to the heading that comes first in the document. A batch that
//! selects nothing never clears the active heading.

mod host;

pub use host::{
    Measurement, ObservationBand, ScrollLayout, SubscriptionId, VisibilityEntry, VisibilityHost,
};

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::transform::{TocEntry, flatten_ids};

/// Tracker tuning.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "cli", derive(serde::Deserialize))]
#[cfg_attr(feature = "cli", serde(default, rename_all = "camelCase"))]
pub struct TrackerConfig {
    pub band: ObservationBand,
    /// A heading whose top is at or above this offset can be activated
    /// when nothing intersects the band, and at mount.
    pub activation_offset: f64,
    /// Preferred reading position; the fallback picks the heading closest
    /// to it.
    pub anchor_offset: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            band: ObservationBand::default(),
            activation_offset: 150.0,
            anchor_offset: 100.0,
        }
    }
}

/// The currently highlighted heading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveHeadingState {
    pub active_id: Option<String>,
}

/// Tracks the active heading for one mounted table of contents.
///
/// The tracker owns its host subscription. Replacing the TOC or dropping
/// the tracker releases it; batches that arrive afterwards are ignored.
pub struct ActiveHeadingTracker<H: VisibilityHost> {
    host: H,
    config: TrackerConfig,
    /// Document position of every tracked id.
    order: HashMap<String, usize>,
    subscription: Option<H::Subscription>,
    state: ActiveHeadingState,
}

impl<H: VisibilityHost> ActiveHeadingTracker<H> {
    /// Start tracking the headings of `toc`.
    ///
    /// With no headings nothing is observed and the active heading stays
    /// empty. Otherwise the first heading is activated right away if its
    /// top is already at or above `activation_offset`.
    pub fn mount(host: H, toc: &[TocEntry], config: TrackerConfig) -> Self {
        let mut tracker = Self {
            host,
            config,
            order: HashMap::new(),
            subscription: None,
            state: ActiveHeadingState::default(),
        };
        tracker.attach(toc);
        tracker
    }

    fn attach(&mut self, toc: &[TocEntry]) {
        let ids: Vec<String> = flatten_ids(toc)
            .into_iter()
            .filter(|id| !id.is_empty())
            .collect();
        self.order.clear();
        for (position, id) in ids.iter().enumerate() {
            self.order.entry(id.clone()).or_insert(position);
        }

        let Some(first) = ids.first() else {
            debug!("no headings to track");
            return;
        };

        if let Some(top) = self.host.top_of(first)
            && top <= self.config.activation_offset
        {
            trace!(id = %first, top, "initial activation");
            self.state.active_id = Some(first.clone());
        }

        debug!(headings = ids.len(), "observing headings");
        self.subscription = Some(self.host.observe(&ids, &self.config.band));
    }

    fn release(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            debug!("releasing heading observation");
            self.host.unobserve(subscription);
        }
    }

    /// Process one batch of visibility changes and return the active id.
    pub fn handle_batch(&mut self, entries: &[VisibilityEntry]) -> Option<&str> {
        if self.subscription.is_none() {
            trace!(entries = entries.len(), "batch after release ignored");
            return self.active_id();
        }

        if let Some(next) = self.select(entries)
            && self.state.active_id.as_deref() != Some(next)
        {
            trace!(id = %next, "active heading changed");
            self.state.active_id = Some(next.to_string());
        }
        self.active_id()
    }

    fn select<'e>(&self, entries: &'e [VisibilityEntry]) -> Option<&'e str> {
        let known: Vec<(&VisibilityEntry, usize)> = entries
            .iter()
            .filter_map(|e| self.order.get(&e.id).map(|&pos| (e, pos)))
            .collect();

        let intersecting = known
            .iter()
            .filter(|(e, _)| e.is_intersecting)
            .min_by(|(a, pa), (b, pb)| a.top.total_cmp(&b.top).then(pa.cmp(pb)));
        if let Some(&(entry, _)) = intersecting {
            return Some(entry.id.as_str());
        }

        let anchor = self.config.anchor_offset;
        let distance = |e: &VisibilityEntry| (e.top - anchor).abs();
        known
            .iter()
            .filter(|(e, _)| e.top <= self.config.activation_offset)
            .min_by(|(a, pa), (b, pb)| distance(*a).total_cmp(&distance(*b)).then(pa.cmp(pb)))
            .map(|&(entry, _)| entry.id.as_str())
    }

    /// Swap in a new table of contents.
    ///
    /// The old subscription is released before the new one is made; the
    /// active heading carries over.
    pub fn set_toc(&mut self, toc: &[TocEntry]) {
        self.release();
        self.attach(toc);
    }

    /// Release the host subscription. Further batches are ignored.
    pub fn unmount(&mut self) {
        self.release();
        self.order.clear();
    }

    pub fn active_id(&self) -> Option<&str> {
        self.state.active_id.as_deref()
    }

    pub fn state(&self) -> &ActiveHeadingState {
        &self.state
    }

    pub fn is_observing(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

impl<H: VisibilityHost> Drop for ActiveHeadingTracker<H> {
    fn drop(&mut self) {
        self.release();
    }
}
