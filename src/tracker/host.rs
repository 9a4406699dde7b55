//! Host-side layout and visibility observation.
//!
//! The tracker never measures anything itself. A [`VisibilityHost`]
//! resolves heading ids to on-screen regions and delivers batches of
//! [`VisibilityEntry`] as headings move through the observation band. In a
//! browser that is an `IntersectionObserver`; [`ScrollLayout`] is an
//! in-memory host for tests and non-browser front ends.

use std::collections::HashMap;

/// The part of the viewport where a heading counts as "in view".
///
/// Insets shrink the viewport: `top_inset` pixels come off the top (the
/// sticky header) and `bottom_inset_ratio` of the height comes off the
/// bottom, leaving a band near the top of the reading area.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "cli", derive(serde::Deserialize))]
#[cfg_attr(feature = "cli", serde(default, rename_all = "camelCase"))]
pub struct ObservationBand {
    pub top_inset: f64,
    pub bottom_inset_ratio: f64,
    /// Visible-ratio thresholds at which the host reports a change.
    pub thresholds: Vec<f64>,
}

impl Default for ObservationBand {
    fn default() -> Self {
        Self {
            top_inset: 100.0,
            bottom_inset_ratio: 0.6,
            thresholds: vec![0.0, 0.1, 0.5, 1.0],
        }
    }
}

/// Intersection of one region with the band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub is_intersecting: bool,
    /// Fraction of the region inside the band, 0.0..=1.0.
    pub ratio: f64,
}

impl ObservationBand {
    /// Equivalent `rootMargin` for an `IntersectionObserver`.
    pub fn root_margin(&self) -> String {
        format!(
            "-{}px 0px -{}% 0px",
            self.top_inset,
            self.bottom_inset_ratio * 100.0
        )
    }

    /// Band edges for a viewport of the given height, viewport-relative.
    pub fn edges(&self, viewport_height: f64) -> (f64, f64) {
        let bottom = viewport_height * (1.0 - self.bottom_inset_ratio);
        (self.top_inset, bottom.max(self.top_inset))
    }

    /// Measure a region whose top edge is `top` (viewport-relative).
    pub fn measure(&self, top: f64, height: f64, viewport_height: f64) -> Measurement {
        let (band_top, band_bottom) = self.edges(viewport_height);
        let bottom = top + height.max(0.0);
        let overlap = (bottom.min(band_bottom) - top.max(band_top)).max(0.0);

        if height <= 0.0 {
            let inside = top >= band_top && top <= band_bottom;
            return Measurement {
                is_intersecting: inside,
                ratio: if inside { 1.0 } else { 0.0 },
            };
        }

        Measurement {
            is_intersecting: overlap > 0.0,
            ratio: (overlap / height).clamp(0.0, 1.0),
        }
    }

    /// Number of thresholds a measurement has crossed.
    fn bucket(&self, m: Measurement) -> usize {
        self.thresholds
            .iter()
            .filter(|&&t| m.ratio >= t && (t > 0.0 || m.is_intersecting))
            .count()
    }
}

/// One heading's visibility as reported in a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityEntry {
    pub id: String,
    pub is_intersecting: bool,
    /// Top edge of the heading's bounding box, relative to the viewport top.
    pub top: f64,
}

impl VisibilityEntry {
    pub fn new(id: impl Into<String>, is_intersecting: bool, top: f64) -> Self {
        Self {
            id: id.into(),
            is_intersecting,
            top,
        }
    }
}

/// Layout and visibility services supplied by the rendering host.
pub trait VisibilityHost {
    /// Handle for one `observe` call, given back to `unobserve`.
    type Subscription;

    /// Top edge of the region rendered for `id`, viewport-relative, or
    /// `None` if nothing is rendered under that id.
    fn top_of(&self, id: &str) -> Option<f64>;

    /// Start reporting visibility changes for `ids` against `band`.
    /// Ids that do not resolve to a region are skipped.
    fn observe(&mut self, ids: &[String], band: &ObservationBand) -> Self::Subscription;

    /// Stop every report belonging to `subscription`.
    fn unobserve(&mut self, subscription: Self::Subscription);
}

/// Handle issued by [`ScrollLayout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone, Copy)]
struct Region {
    top: f64,
    height: f64,
}

#[derive(Debug)]
struct Observation {
    ids: Vec<String>,
    band: ObservationBand,
    /// Last reported (is_intersecting, threshold bucket) per id.
    last: HashMap<String, (bool, usize)>,
}

/// A scrollable document with fixed heading positions.
///
/// Positions are in document coordinates; `scroll_to` moves the viewport
/// and returns the batch an intersection observer would deliver: every
/// observed heading whose intersection state or threshold bucket changed.
/// The first batch after `observe` reports every observed heading.
#[derive(Debug)]
pub struct ScrollLayout {
    viewport_height: f64,
    scroll_y: f64,
    regions: HashMap<String, Region>,
    observations: HashMap<SubscriptionId, Observation>,
    next_subscription: u64,
}

impl ScrollLayout {
    pub fn new(viewport_height: f64) -> Self {
        Self {
            viewport_height,
            scroll_y: 0.0,
            regions: HashMap::new(),
            observations: HashMap::new(),
            next_subscription: 0,
        }
    }

    /// Builder: place a heading region at document offset `top`.
    pub fn with_region(mut self, id: &str, top: f64, height: f64) -> Self {
        self.place(id, top, height);
        self
    }

    pub fn place(&mut self, id: &str, top: f64, height: f64) {
        self.regions.insert(id.to_string(), Region { top, height });
    }

    pub fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    /// Number of live subscriptions.
    pub fn active_subscriptions(&self) -> usize {
        self.observations.len()
    }

    /// Ids currently observed across all subscriptions.
    pub fn observed_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .observations
            .values()
            .flat_map(|o| o.ids.iter().map(String::as_str))
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Scroll to `y` and return the resulting batch.
    pub fn scroll_to(&mut self, y: f64) -> Vec<VisibilityEntry> {
        self.scroll_y = y.max(0.0);
        self.take_records()
    }

    /// Changes not yet reported, without scrolling.
    pub fn take_records(&mut self) -> Vec<VisibilityEntry> {
        let mut batch = Vec::new();
        for observation in self.observations.values_mut() {
            for id in &observation.ids {
                let Some(region) = self.regions.get(id) else {
                    continue;
                };
                let top = region.top - self.scroll_y;
                let m = observation
                    .band
                    .measure(top, region.height, self.viewport_height);
                let state = (m.is_intersecting, observation.band.bucket(m));
                if observation.last.get(id) != Some(&state) {
                    observation.last.insert(id.clone(), state);
                    batch.push(VisibilityEntry::new(id.as_str(), m.is_intersecting, top));
                }
            }
        }
        batch
    }
}

impl VisibilityHost for ScrollLayout {
    type Subscription = SubscriptionId;

    fn top_of(&self, id: &str) -> Option<f64> {
        self.regions.get(id).map(|r| r.top - self.scroll_y)
    }

    fn observe(&mut self, ids: &[String], band: &ObservationBand) -> SubscriptionId {
        let handle = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        let ids = ids
            .iter()
            .filter(|id| self.regions.contains_key(id.as_str()))
            .cloned()
            .collect();
        self.observations.insert(
            handle,
            Observation {
                ids,
                band: band.clone(),
                last: HashMap::new(),
            },
        );
        handle
    }

    fn unobserve(&mut self, subscription: SubscriptionId) {
        self.observations.remove(&subscription);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_margin() {
        assert_eq!(ObservationBand::default().root_margin(), "-100px 0px -60% 0px");
    }

    #[test]
    fn test_band_excludes_top_and_bottom() {
        let band = ObservationBand::default();
        // 1000px viewport: band is 100..400.
        assert_eq!(band.edges(1000.0), (100.0, 400.0));
        assert!(!band.measure(20.0, 40.0, 1000.0).is_intersecting);
        assert!(band.measure(120.0, 40.0, 1000.0).is_intersecting);
        assert!(!band.measure(600.0, 40.0, 1000.0).is_intersecting);
        let partial = band.measure(80.0, 40.0, 1000.0);
        assert!(partial.is_intersecting);
        assert!((partial.ratio - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_first_batch_reports_everything() {
        let mut layout = ScrollLayout::new(1000.0)
            .with_region("a", 150.0, 40.0)
            .with_region("b", 900.0, 40.0);
        let ids = vec!["a".to_string(), "b".to_string(), "missing".to_string()];
        layout.observe(&ids, &ObservationBand::default());
        assert_eq!(layout.observed_ids(), ["a", "b"]);

        let batch = layout.take_records();
        assert_eq!(batch.len(), 2);
        assert!(batch.iter().any(|e| e.id == "a" && e.is_intersecting));
        assert!(batch.iter().any(|e| e.id == "b" && !e.is_intersecting));

        // Nothing moved, nothing to report.
        assert!(layout.take_records().is_empty());
    }

    #[test]
    fn test_scroll_reports_changes_only() {
        let mut layout = ScrollLayout::new(1000.0)
            .with_region("a", 150.0, 40.0)
            .with_region("b", 900.0, 40.0);
        let ids = vec!["a".to_string(), "b".to_string()];
        layout.observe(&ids, &ObservationBand::default());
        layout.take_records();

        let batch = layout.scroll_to(700.0);
        let a = batch.iter().find(|e| e.id == "a").unwrap();
        assert!(!a.is_intersecting);
        assert_eq!(a.top, -550.0);
        let b = batch.iter().find(|e| e.id == "b").unwrap();
        assert!(b.is_intersecting);
        assert_eq!(b.top, 200.0);
    }

    #[test]
    fn test_unobserve_releases() {
        let mut layout = ScrollLayout::new(1000.0).with_region("a", 0.0, 10.0);
        let handle = layout.observe(&["a".to_string()], &ObservationBand::default());
        assert_eq!(layout.active_subscriptions(), 1);
        layout.unobserve(handle);
        assert_eq!(layout.active_subscriptions(), 0);
        assert!(layout.scroll_to(10.0).is_empty());
    }
}
