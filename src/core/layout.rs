//! Timeline layout: solo markers and trip capsules on a time-proportional track
//!
//! Solo markers and capsule origins use absolute track coordinates. Markers
//! inside a capsule are relative to the capsule's left edge and scaled by the
//! capsule's own time span, not the global one.

use chrono::NaiveDate;
use tracing::debug;

use super::calendar::utc_midnight_ms;
use super::{
    AtlasError, HikeId, HikeRecord, TimeIndex, TimelineConfig, TimelineGeometry, TripGroup, TripPartition, TripTag,
};

/// Tooltip anchoring hint for markers near either end of the track
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EdgeClass {
    #[default]
    None,
    Left,
    Right,
}

impl EdgeClass {
    pub fn from_percent(percent: f64, threshold: f64) -> Self {
        if percent < threshold {
            EdgeClass::Left
        } else if percent > 100.0 - threshold {
            EdgeClass::Right
        } else {
            EdgeClass::None
        }
    }

    pub fn css_class(self) -> Option<&'static str> {
        match self {
            EdgeClass::None => None,
            EdgeClass::Left => Some("edge-left"),
            EdgeClass::Right => Some("edge-right"),
        }
    }
}

/// A single hike on the track
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerPosition {
    pub hike_id: HikeId,
    /// Absolute for solo markers, capsule-relative for trip members
    pub left_px: f64,
    pub date_key: NaiveDate,
    pub edge: EdgeClass,
}

/// A trip drawn as one clickable span
#[derive(Clone, Debug, PartialEq)]
pub struct TripCapsule {
    pub trip_tag: TripTag,
    pub left_px: f64,
    pub width_px: f64,
    pub children: Vec<MarkerPosition>,
}

impl TripCapsule {
    fn build(trip: &TripGroup, geometry: &TimelineGeometry, config: &TimelineConfig) -> Self {
        let start = utc_midnight_ms(trip.start_date);
        let end = utc_midnight_ms(trip.end_date);
        let left_px = geometry.position_of(start);
        let right_px = geometry.position_of(end);
        let width_px = (right_px - left_px).max(config.min_capsule_width_px);
        let span = end - start;

        let mut children: Vec<MarkerPosition> = trip
            .members
            .iter()
            .map(|member| {
                let fraction = if span == 0 {
                    0.5
                } else {
                    (member.time_ms() - start) as f64 / span as f64
                };
                MarkerPosition {
                    hike_id: member.id.clone(),
                    left_px: fraction * width_px,
                    date_key: member.date_completed,
                    edge: EdgeClass::from_percent(
                        geometry.percent_of(member.time_ms()),
                        config.edge_threshold_percent,
                    ),
                }
            })
            .collect();

        spread_same_day(&mut children, config.same_day_spread_px);

        Self {
            trip_tag: trip.tag.clone(),
            left_px,
            width_px,
            children,
        }
    }

    /// Absolute track coordinate of a child marker
    pub fn absolute_left(&self, child: &MarkerPosition) -> f64 {
        self.left_px + child.left_px
    }
}

/// Symmetric offsets for `group_size` markers sharing one nominal position.
/// The offsets always sum to zero.
pub fn cluster_offsets(group_size: usize, spread_px: f64) -> Vec<f64> {
    let center = (group_size as f64 - 1.0) / 2.0;
    (0..group_size)
        .map(|i| (i as f64 - center) * spread_px)
        .collect()
}

/// Fan out markers that share a date so they sit around their nominal
/// position instead of stacking
fn spread_same_day(children: &mut [MarkerPosition], spread_px: f64) {
    let mut groups: Vec<(NaiveDate, Vec<usize>)> = Vec::new();
    for (i, child) in children.iter().enumerate() {
        match groups.iter_mut().find(|(date, _)| *date == child.date_key) {
            Some((_, members)) => members.push(i),
            None => groups.push((child.date_key, vec![i])),
        }
    }

    for (_, members) in groups.iter().filter(|(_, m)| m.len() > 1) {
        for (&i, offset) in members.iter().zip(cluster_offsets(members.len(), spread_px)) {
            children[i].left_px += offset;
        }
    }
}

/// Positions for a hovered capsule: chronological, consecutive markers at
/// least `spacing_px` apart, the run centered in `width_px`. Gaps already
/// wider than `spacing_px` are kept. Returned in the same order as `children`.
///
/// Returns None when there is nothing to fan out.
pub fn expanded_positions(children: &[MarkerPosition], width_px: f64, spacing_px: f64) -> Option<Vec<f64>> {
    if children.len() < 2 {
        return None;
    }

    let mut order: Vec<usize> = (0..children.len()).collect();
    // stable: same-day children keep their capsule order
    order.sort_by_key(|&i| children[i].date_key);

    let mut offsets = Vec::with_capacity(order.len());
    let mut run = 0.0;
    offsets.push(run);
    for pair in order.windows(2) {
        let natural = children[pair[1]].left_px - children[pair[0]].left_px;
        run += natural.max(spacing_px);
        offsets.push(run);
    }
    let start = (width_px - run) / 2.0;

    let mut positions = vec![0.0; children.len()];
    for (&i, offset) in order.iter().zip(offsets) {
        positions[i] = start + offset;
    }
    Some(positions)
}

/// Full layout for one render pass
#[derive(Clone, Debug)]
pub struct TimelineLayout {
    pub geometry: TimelineGeometry,
    pub solos: Vec<MarkerPosition>,
    pub capsules: Vec<TripCapsule>,
}

impl TimelineLayout {
    pub fn build(index: &TimeIndex, partition: &TripPartition, config: &TimelineConfig) -> Self {
        let geometry = index.geometry(config);

        let solos: Vec<MarkerPosition> = partition
            .solos
            .iter()
            .map(|hike| solo_marker(hike, &geometry, config))
            .collect();

        let capsules: Vec<TripCapsule> = partition
            .trips
            .iter()
            .map(|trip| TripCapsule::build(trip, &geometry, config))
            .collect();

        debug!(
            width = geometry.total_track_width_px,
            solos = solos.len(),
            capsules = capsules.len(),
            "Timeline laid out"
        );

        Self {
            geometry,
            solos,
            capsules,
        }
    }

    /// Absolute track coordinate of any hike, solo or inside a capsule
    pub fn absolute_left(&self, hike_id: &str) -> Option<f64> {
        if let Some(marker) = self.solos.iter().find(|m| m.hike_id == hike_id) {
            return Some(marker.left_px);
        }
        self.capsules.iter().find_map(|capsule| {
            capsule
                .children
                .iter()
                .find(|c| c.hike_id == hike_id)
                .map(|child| capsule.absolute_left(child))
        })
    }

    /// Index of the capsule holding `hike_id`
    pub fn capsule_of(&self, hike_id: &str) -> Option<usize> {
        self.capsules
            .iter()
            .position(|c| c.children.iter().any(|m| m.hike_id == hike_id))
    }

    pub fn marker_count(&self) -> usize {
        self.solos.len() + self.capsules.iter().map(|c| c.children.len()).sum::<usize>()
    }
}

/// Index, partition and layout built together from one dataset
#[derive(Clone, Debug)]
pub struct Timeline {
    pub index: TimeIndex,
    pub partition: TripPartition,
    pub layout: TimelineLayout,
}

impl Timeline {
    pub fn build(records: &[HikeRecord], config: &TimelineConfig) -> Result<Self, AtlasError> {
        let index = TimeIndex::build(records)?;
        let partition = TripPartition::build(&index.entries);
        let layout = TimelineLayout::build(&index, &partition, config);
        Ok(Self {
            index,
            partition,
            layout,
        })
    }
}

fn solo_marker(hike: &HikeRecord, geometry: &TimelineGeometry, config: &TimelineConfig) -> MarkerPosition {
    let time = hike.time_ms();
    MarkerPosition {
        hike_id: hike.id.clone(),
        left_px: geometry.position_of(time),
        date_key: hike.date_completed,
        edge: EdgeClass::from_percent(geometry.percent_of(time), config.edge_threshold_percent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, y: i32, m: u32, d: u32, trip: Option<&str>) -> HikeRecord {
        let mut r = HikeRecord::new(id, id, NaiveDate::from_ymd_opt(y, m, d).unwrap());
        r.trip_tag = trip.map(str::to_string);
        r
    }

    fn layout_of(records: &[HikeRecord]) -> TimelineLayout {
        let index = TimeIndex::build(records).unwrap();
        let partition = TripPartition::build(&index.entries);
        TimelineLayout::build(&index, &partition, &TimelineConfig::default())
    }

    #[test]
    fn test_three_solo_hikes_span_the_track() {
        let layout = layout_of(&[
            record("jan", 2023, 1, 1, None),
            record("jun", 2023, 6, 1, None),
            record("dec", 2023, 12, 31, None),
        ]);
        let g = layout.geometry;
        let usable = g.usable_width();
        let pct = |id: &str| (layout.absolute_left(id).unwrap() - g.padding_px / 2.0) / usable;

        assert!((pct("jan") - 0.0).abs() < 1e-9);
        assert!((pct("jun") - 0.5).abs() < 0.1, "June sits near the middle");
        assert!((pct("dec") - 1.0).abs() < 1e-9);

        assert_eq!(layout.solos[0].edge, EdgeClass::Left);
        assert_eq!(layout.solos[1].edge, EdgeClass::None);
        assert_eq!(layout.solos[2].edge, EdgeClass::Right);
    }

    #[test]
    fn test_single_hike_centered() {
        let layout = layout_of(&[record("only", 2024, 7, 4, None)]);
        assert_eq!(layout.geometry.total_span_ms, 0);
        let left = layout.absolute_left("only").unwrap();
        assert_eq!(left, layout.geometry.total_track_width_px / 2.0);
    }

    #[test]
    fn test_short_trip_gets_minimum_width() {
        let layout = layout_of(&[
            record("a", 2023, 1, 1, None),
            record("t1", 2023, 6, 1, Some("Weekend")),
            record("z", 2023, 12, 31, None),
        ]);
        let capsule = &layout.capsules[0];
        assert_eq!(capsule.width_px, 50.0);
        // zero-span capsule centers its only child
        assert_eq!(capsule.children[0].left_px, 25.0);
    }

    #[test]
    fn test_long_trip_width_follows_time() {
        let layout = layout_of(&[
            record("t1", 2023, 1, 1, Some("Thru")),
            record("t2", 2023, 3, 1, Some("Thru")),
        ]);
        let capsule = &layout.capsules[0];
        assert_eq!(capsule.width_px, 59.0 * 4.0);
        assert_eq!(capsule.left_px, 100.0);
        assert_eq!(capsule.children[0].left_px, 0.0);
        assert_eq!(capsule.children[1].left_px, capsule.width_px);
        assert_eq!(layout.absolute_left("t2"), Some(100.0 + 236.0));
        assert_eq!(layout.capsule_of("t2"), Some(0));
        assert_eq!(layout.capsule_of("nope"), None);
    }

    #[test]
    fn test_cluster_offsets_sum_to_zero() {
        for n in 1..8 {
            let offsets = cluster_offsets(n, 10.0);
            assert_eq!(offsets.len(), n);
            let sum: f64 = offsets.iter().sum();
            assert!(sum.abs() < 1e-9, "group of {} sums to {}", n, sum);
        }
        assert_eq!(cluster_offsets(3, 10.0), vec![-10.0, 0.0, 10.0]);
        assert_eq!(cluster_offsets(2, 10.0), vec![-5.0, 5.0]);
    }

    #[test]
    fn test_same_day_children_spread_around_nominal() {
        let layout = layout_of(&[
            record("d1", 2023, 8, 1, Some("Loop")),
            record("d3a", 2023, 8, 3, Some("Loop")),
            record("d3b", 2023, 8, 3, Some("Loop")),
            record("d3c", 2023, 8, 3, Some("Loop")),
            record("d5", 2023, 8, 5, Some("Loop")),
        ]);
        let capsule = &layout.capsules[0];
        let nominal = capsule.width_px / 2.0;
        let lefts: Vec<f64> = capsule.children[1..4].iter().map(|c| c.left_px).collect();
        assert_eq!(lefts, vec![nominal - 10.0, nominal, nominal + 10.0]);
        let mean = lefts.iter().sum::<f64>() / 3.0;
        assert!((mean - nominal).abs() < 1e-9);
        assert_eq!(capsule.children[0].left_px, 0.0);
    }

    #[test]
    fn test_expanded_positions_are_spaced_and_centered() {
        let date = |d| NaiveDate::from_ymd_opt(2023, 8, d).unwrap();
        let children: Vec<MarkerPosition> = [("c", 3), ("a", 1), ("b", 2)]
            .into_iter()
            .map(|(id, d)| MarkerPosition {
                hike_id: id.into(),
                left_px: 25.0,
                date_key: date(d),
                edge: EdgeClass::None,
            })
            .collect();
        let positions = expanded_positions(&children, 50.0, 28.0).unwrap();
        // chronological: a, b, c
        assert_eq!(positions[1], 25.0 - 28.0);
        assert_eq!(positions[2], 25.0);
        assert_eq!(positions[0], 25.0 + 28.0);

        assert!(expanded_positions(&children[..1], 50.0, 28.0).is_none());
    }

    #[test]
    fn test_expansion_never_narrows_a_wide_capsule() {
        let layout = layout_of(&[
            record("t1", 2023, 1, 1, Some("Thru")),
            record("t2", 2023, 3, 1, Some("Thru")),
        ]);
        let capsule = &layout.capsules[0];
        let positions = expanded_positions(&capsule.children, capsule.width_px, 28.0).unwrap();
        assert_eq!(positions, vec![0.0, 236.0]);
    }

    #[test]
    fn test_expansion_widens_only_tight_gaps() {
        let date = |d| NaiveDate::from_ymd_opt(2023, 8, d).unwrap();
        let children: Vec<MarkerPosition> = [("a", 1, 0.0), ("b", 2, 10.0), ("c", 3, 100.0)]
            .into_iter()
            .map(|(id, d, left_px)| MarkerPosition {
                hike_id: id.into(),
                left_px,
                date_key: date(d),
                edge: EdgeClass::None,
            })
            .collect();
        let positions = expanded_positions(&children, 100.0, 28.0).unwrap();

        let before: Vec<f64> = children.windows(2).map(|w| w[1].left_px - w[0].left_px).collect();
        let after: Vec<f64> = positions.windows(2).map(|w| w[1] - w[0]).collect();
        for (b, a) in before.iter().zip(&after) {
            assert!(*a >= b.max(28.0) - 1e-9, "gap {} shrank to {}", b, a);
        }
        assert_eq!(after, vec![28.0, 90.0]);
        // run of 118 centered in 100
        assert_eq!(positions[0], -9.0);
    }
}
