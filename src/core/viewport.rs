//! Scroll offset <-> calendar date mapping and scroll-driven presentation state

use chrono::NaiveDate;

use super::calendar::{utc_midnight_ms, Season};
use super::{TimelineConfig, TimelineGeometry, TimelineLayout};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollMode {
    /// Jump without animation (cold load)
    Instant,
    /// Animated, for user navigation
    Smooth,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollRequest {
    pub offset_px: f64,
    pub mode: ScrollMode,
}

/// Presentation state recomputed once the scroll position settles
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollState {
    pub date: NaiveDate,
    pub season: Season,
    pub parallax_offset_px: f64,
}

/// Horizontal alignment chosen for a tooltip
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TooltipAlign {
    Center,
    /// Pinned against the left viewport edge
    Start,
    /// Pinned against the right viewport edge
    End,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TooltipPlacement {
    pub align: TooltipAlign,
    /// Left edge of the tooltip in viewport coordinates
    pub left_px: f64,
}

/// Fallback scroll fraction for a track with no usable width
const DEGENERATE_SCROLL_FRACTION: f64 = 0.5;

#[derive(Clone, Debug)]
pub struct ViewportController {
    geometry: TimelineGeometry,
    viewport_width_px: f64,
    parallax_factor: f64,
    tooltip_edge_padding_px: f64,
}

impl ViewportController {
    pub fn new(geometry: TimelineGeometry, viewport_width_px: f64, config: &TimelineConfig) -> Self {
        Self {
            geometry,
            viewport_width_px: viewport_width_px.max(0.0),
            parallax_factor: config.parallax_factor,
            tooltip_edge_padding_px: config.tooltip_edge_padding_px,
        }
    }

    pub fn viewport_width(&self) -> f64 {
        self.viewport_width_px
    }

    /// Call when the viewport is resized
    pub fn set_viewport_width(&mut self, width_px: f64) {
        self.viewport_width_px = width_px.max(0.0);
    }

    /// Scroll offset that centers the track coordinate `track_px`
    pub fn center_on(&self, track_px: f64, mode: ScrollMode) -> ScrollRequest {
        ScrollRequest {
            offset_px: track_px - self.viewport_width_px / 2.0,
            mode,
        }
    }

    pub fn scroll_to_date(&self, date: NaiveDate, mode: ScrollMode) -> ScrollRequest {
        self.center_on(self.geometry.position_of(utc_midnight_ms(date)), mode)
    }

    /// Center a marker, solo or inside a capsule
    pub fn center_on_hike(&self, layout: &TimelineLayout, hike_id: &str, mode: ScrollMode) -> Option<ScrollRequest> {
        layout
            .absolute_left(hike_id)
            .map(|track_px| self.center_on(track_px, mode))
    }

    /// Fraction of the span under the viewport center, clamped to [0, 1]
    pub fn scroll_fraction(&self, offset_px: f64) -> f64 {
        let usable = self.geometry.usable_width();
        if usable <= 0.0 {
            return DEGENERATE_SCROLL_FRACTION;
        }
        let center = offset_px + self.viewport_width_px / 2.0 - self.geometry.padding_px / 2.0;
        (center / usable).clamp(0.0, 1.0)
    }

    pub fn date_from_scroll(&self, offset_px: f64) -> NaiveDate {
        self.geometry.date_at_fraction(self.scroll_fraction(offset_px))
    }

    pub fn parallax_offset(&self, offset_px: f64) -> f64 {
        offset_px * self.parallax_factor
    }

    pub fn settle(&self, offset_px: f64) -> ScrollState {
        let date = self.date_from_scroll(offset_px);
        ScrollState {
            date,
            season: Season::of(date),
            parallax_offset_px: self.parallax_offset(offset_px),
        }
    }

    /// Keep a tooltip of `tooltip_width_px` centered on `anchor_px` (viewport
    /// coordinates) unless that would cross an edge, in which case pin it.
    pub fn place_tooltip(&self, anchor_px: f64, tooltip_width_px: f64) -> TooltipPlacement {
        let pad = self.tooltip_edge_padding_px;
        let ideal_left = anchor_px - tooltip_width_px / 2.0;

        if ideal_left < pad {
            TooltipPlacement {
                align: TooltipAlign::Start,
                left_px: pad,
            }
        } else if ideal_left + tooltip_width_px > self.viewport_width_px - pad {
            TooltipPlacement {
                align: TooltipAlign::End,
                left_px: (self.viewport_width_px - pad - tooltip_width_px).max(pad),
            }
        } else {
            TooltipPlacement {
                align: TooltipAlign::Center,
                left_px: ideal_left,
            }
        }
    }
}

/// At most one scroll recompute per animation frame
#[derive(Debug, Default)]
pub struct ScrollThrottle {
    in_flight: bool,
    latest_offset: Option<f64>,
}

impl ScrollThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a scroll event. Returns true when the caller must request an
    /// animation frame; false when one is already queued.
    pub fn on_scroll(&mut self, offset_px: f64) -> bool {
        self.latest_offset = Some(offset_px);
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        true
    }

    /// Called from the animation frame; yields the offset to process
    pub fn on_frame(&mut self) -> Option<f64> {
        self.in_flight = false;
        self.latest_offset.take()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{HikeRecord, TimeIndex, TripPartition};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup(records: &[HikeRecord], viewport: f64) -> (TimelineLayout, ViewportController) {
        let config = TimelineConfig::default();
        let index = TimeIndex::build(records).unwrap();
        let partition = TripPartition::build(&index.entries);
        let layout = TimelineLayout::build(&index, &partition, &config);
        let controller = ViewportController::new(layout.geometry, viewport, &config);
        (layout, controller)
    }

    fn three_hikes() -> Vec<HikeRecord> {
        vec![
            HikeRecord::new("jan", "A", date(2023, 1, 1)),
            HikeRecord::new("jun", "B", date(2023, 6, 1)),
            HikeRecord::new("dec", "C", date(2023, 12, 31)),
        ]
    }

    #[test]
    fn test_center_on_middle_hike() {
        let (layout, controller) = setup(&three_hikes(), 800.0);
        let marker_left = layout.absolute_left("jun").unwrap();
        let request = controller
            .center_on_hike(&layout, "jun", ScrollMode::Smooth)
            .unwrap();
        assert_eq!(request.offset_px, marker_left - 400.0);
        assert_eq!(request.mode, ScrollMode::Smooth);

        // the inverse mapping lands on the same day
        assert_eq!(controller.date_from_scroll(request.offset_px), date(2023, 6, 1));
    }

    #[test]
    fn test_scroll_to_date_matches_marker() {
        let (layout, controller) = setup(&three_hikes(), 600.0);
        let by_date = controller.scroll_to_date(date(2023, 12, 31), ScrollMode::Instant);
        let by_hike = controller.center_on_hike(&layout, "dec", ScrollMode::Instant).unwrap();
        assert_eq!(by_date, by_hike);
    }

    #[test]
    fn test_capsule_child_centering_adds_capsule_offset() {
        let mut records = three_hikes();
        let mut a = HikeRecord::new("t1", "T", date(2023, 8, 1));
        a.trip_tag = Some("Trip".into());
        let mut b = HikeRecord::new("t2", "T", date(2023, 8, 20));
        b.trip_tag = Some("Trip".into());
        records.push(a);
        records.push(b);

        let (layout, controller) = setup(&records, 1000.0);
        let capsule = &layout.capsules[0];
        let child = &capsule.children[1];
        let request = controller.center_on_hike(&layout, "t2", ScrollMode::Smooth).unwrap();
        assert_eq!(request.offset_px, capsule.left_px + child.left_px - 500.0);
    }

    #[test]
    fn test_single_hike_scroll_is_degenerate_safe() {
        let (_, controller) = setup(&[HikeRecord::new("only", "A", date(2024, 7, 4))], 800.0);
        assert_eq!(controller.scroll_fraction(-300.0), 0.5);
        assert_eq!(controller.date_from_scroll(12_345.0), date(2024, 7, 4));
    }

    #[test]
    fn test_settle_derives_season_and_parallax() {
        let (layout, controller) = setup(&three_hikes(), 800.0);
        let offset = controller.center_on_hike(&layout, "jun", ScrollMode::Instant).unwrap().offset_px;
        let state = controller.settle(offset);
        assert_eq!(state.season, Season::Summer);
        assert!((state.parallax_offset_px - offset * 0.3).abs() < 1e-9);

        let start = controller.settle(-10_000.0);
        assert_eq!(start.date, date(2023, 1, 1));
        assert_eq!(start.season, Season::Winter);
    }

    #[test]
    fn test_tooltip_stays_in_viewport() {
        let (_, controller) = setup(&three_hikes(), 400.0);

        let centered = controller.place_tooltip(200.0, 100.0);
        assert_eq!(centered.align, TooltipAlign::Center);
        assert_eq!(centered.left_px, 150.0);

        let left = controller.place_tooltip(20.0, 100.0);
        assert_eq!(left.align, TooltipAlign::Start);
        assert_eq!(left.left_px, 10.0);

        let right = controller.place_tooltip(380.0, 100.0);
        assert_eq!(right.align, TooltipAlign::End);
        assert_eq!(right.left_px, 290.0);
        assert!(right.left_px + 100.0 <= 390.0);
    }

    #[test]
    fn test_scroll_throttle_gates_frames() {
        let mut throttle = ScrollThrottle::new();
        assert!(throttle.on_scroll(10.0));
        assert!(!throttle.on_scroll(20.0));
        assert!(!throttle.on_scroll(30.0));
        assert!(throttle.is_in_flight());

        assert_eq!(throttle.on_frame(), Some(30.0));
        assert!(!throttle.is_in_flight());
        assert_eq!(throttle.on_frame(), None);

        assert!(throttle.on_scroll(40.0));
    }
}
