use folio::tracker::{ActiveHeadingTracker, ScrollLayout, TrackerConfig};
use folio::transform::flatten_ids;
use folio::Pipeline;

const POST: &str = "\
# Intro

Opening words.

## Setup

Install things.

### Linux

### macOS

## Usage

Run things.
";

/// Lay the headings out 600px apart, starting at 120.
fn layout_for(ids: &[String]) -> ScrollLayout {
    ids.iter()
        .enumerate()
        .fold(ScrollLayout::new(1000.0), |layout, (i, id)| {
            layout.with_region(id, 120.0 + 600.0 * i as f64, 40.0)
        })
}

#[test]
fn test_scrolling_through_a_post() {
    let rendered = Pipeline::default().render(POST).unwrap();
    let ids = flatten_ids(&rendered.toc);
    assert_eq!(ids, ["intro", "setup", "linux", "macos", "usage"]);

    let mut tracker =
        ActiveHeadingTracker::mount(layout_for(&ids), &rendered.toc, TrackerConfig::default());
    assert_eq!(tracker.active_id(), Some("intro"));

    let mut seen = Vec::new();
    for y in (0..=2600).step_by(50) {
        let batch = tracker.host_mut().scroll_to(y as f64);
        if let Some(id) = tracker.handle_batch(&batch)
            && seen.last().map(String::as_str) != Some(id)
        {
            seen.push(id.to_string());
        }
    }
    assert_eq!(seen, ids);
}

#[test]
fn test_scrolling_back_up() {
    let rendered = Pipeline::default().render(POST).unwrap();
    let ids = flatten_ids(&rendered.toc);
    let mut tracker =
        ActiveHeadingTracker::mount(layout_for(&ids), &rendered.toc, TrackerConfig::default());

    let batch = tracker.host_mut().scroll_to(2400.0);
    assert_eq!(tracker.handle_batch(&batch), Some("usage"));

    // setup at 720 lands at 220, inside the band.
    let batch = tracker.host_mut().scroll_to(500.0);
    assert_eq!(tracker.handle_batch(&batch), Some("setup"));
}

#[test]
fn test_replacing_the_toc_releases_the_old_subscription() {
    let first = Pipeline::default().render("## A\n\n## B").unwrap();
    let second = Pipeline::default().render("## C").unwrap();
    let layout = ScrollLayout::new(1000.0)
        .with_region("a", 500.0, 40.0)
        .with_region("b", 1100.0, 40.0)
        .with_region("c", 200.0, 40.0);

    let mut tracker = ActiveHeadingTracker::mount(layout, &first.toc, TrackerConfig::default());
    assert_eq!(tracker.host().observed_ids(), ["a", "b"]);

    tracker.set_toc(&second.toc);
    assert_eq!(tracker.host().active_subscriptions(), 1);
    assert_eq!(tracker.host().observed_ids(), ["c"]);

    let batch = tracker.host_mut().take_records();
    assert_eq!(tracker.handle_batch(&batch), Some("c"));

    tracker.unmount();
    assert_eq!(tracker.host().active_subscriptions(), 0);
}

#[test]
fn test_post_without_headings() {
    let rendered = Pipeline::default().render("Just a paragraph.").unwrap();
    let tracker = ActiveHeadingTracker::mount(
        ScrollLayout::new(800.0),
        &rendered.toc,
        TrackerConfig::default(),
    );
    assert!(!tracker.is_observing());
    assert_eq!(tracker.host().active_subscriptions(), 0);
    assert_eq!(tracker.active_id(), None);
}

#[test]
fn test_custom_offsets() {
    let rendered = Pipeline::default().render("## A\n\n## B").unwrap();
    let layout = ScrollLayout::new(1000.0)
        .with_region("a", 180.0, 40.0)
        .with_region("b", 900.0, 40.0);
    let config = TrackerConfig {
        activation_offset: 200.0,
        ..TrackerConfig::default()
    };
    let tracker = ActiveHeadingTracker::mount(layout, &rendered.toc, config);
    assert_eq!(tracker.active_id(), Some("a"));
}
