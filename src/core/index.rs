//! Chronological index over the dataset and the track geometry derived from it

use chrono::NaiveDate;
use tracing::debug;

use super::calendar::{date_from_ms, MS_PER_DAY};
use super::{AtlasError, HikeEntry, HikeRecord, TimelineConfig};

/// Hikes in date order plus the overall time span
#[derive(Debug, Clone)]
pub struct TimeIndex {
    /// Sorted by date; same-day hikes keep their dataset order
    pub entries: Vec<HikeEntry>,
    pub first_time: i64,
    pub last_time: i64,
}

impl TimeIndex {
    /// Sort a copy of `records` and classify each one.
    ///
    /// Fails with `InsufficientData` on an empty dataset.
    pub fn build(records: &[HikeRecord]) -> Result<Self, AtlasError> {
        let mut sorted: Vec<HikeRecord> = records.to_vec();
        // sort_by_key is stable, which keeps same-day clustering deterministic
        sorted.sort_by_key(HikeRecord::time_ms);

        let (first_time, last_time) = match (sorted.first(), sorted.last()) {
            (Some(first), Some(last)) => (first.time_ms(), last.time_ms()),
            _ => return Err(AtlasError::InsufficientData),
        };

        let entries: Vec<HikeEntry> = sorted.into_iter().map(HikeEntry::from_record).collect();
        debug!(
            hikes = entries.len(),
            first = %date_from_ms(first_time),
            last = %date_from_ms(last_time),
            "Time index built"
        );

        Ok(Self {
            entries,
            first_time,
            last_time,
        })
    }

    #[inline]
    pub fn total_span_ms(&self) -> i64 {
        self.last_time - self.first_time
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn geometry(&self, config: &TimelineConfig) -> TimelineGeometry {
        TimelineGeometry::new(self.first_time, self.last_time, config)
    }
}

/// Pixel mapping of the time span onto the horizontal track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineGeometry {
    pub first_time: i64,
    pub last_time: i64,
    pub total_span_ms: i64,
    pub pixels_per_day: f64,
    pub padding_px: f64,
    pub total_track_width_px: f64,
}

impl TimelineGeometry {
    pub fn new(first_time: i64, last_time: i64, config: &TimelineConfig) -> Self {
        let total_span_ms = (last_time - first_time).max(0);
        let days = total_span_ms as f64 / MS_PER_DAY as f64;
        Self {
            first_time,
            last_time,
            total_span_ms,
            pixels_per_day: config.pixels_per_day,
            padding_px: config.padding_px,
            total_track_width_px: days * config.pixels_per_day + config.padding_px,
        }
    }

    /// Track width minus the padding at both ends
    #[inline]
    pub fn usable_width(&self) -> f64 {
        self.total_track_width_px - self.padding_px
    }

    /// Fraction of the span elapsed at `time_ms`; 0.5 when the span is empty
    pub fn fraction_of(&self, time_ms: i64) -> f64 {
        if self.total_span_ms == 0 {
            return 0.5;
        }
        (time_ms - self.first_time) as f64 / self.total_span_ms as f64
    }

    /// Absolute track position of an instant
    pub fn position_of(&self, time_ms: i64) -> f64 {
        self.padding_px / 2.0 + self.fraction_of(time_ms) * self.usable_width()
    }

    /// Position as a percentage of the usable width
    pub fn percent_of(&self, time_ms: i64) -> f64 {
        self.fraction_of(time_ms) * 100.0
    }

    /// Instant at a fraction of the span
    pub fn time_at_fraction(&self, fraction: f64) -> i64 {
        self.first_time + (fraction * self.total_span_ms as f64).round() as i64
    }

    pub fn date_at_fraction(&self, fraction: f64) -> NaiveDate {
        date_from_ms(self.time_at_fraction(fraction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calendar::{normalize_ms, utc_midnight_ms};

    fn hike(id: &str, y: i32, m: u32, d: u32) -> HikeRecord {
        HikeRecord::new(id, id, NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_empty_dataset_rejected() {
        assert_eq!(TimeIndex::build(&[]).unwrap_err(), AtlasError::InsufficientData);
    }

    #[test]
    fn test_sorted_copy_bounds_every_hike() {
        let input = vec![
            hike("c", 2023, 12, 31),
            hike("a", 2023, 1, 1),
            hike("b", 2023, 6, 1),
        ];
        let index = TimeIndex::build(&input).unwrap();

        // input untouched
        assert_eq!(input[0].id, "c");

        let ids: Vec<&str> = index.entries.iter().map(|e| e.record().id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        for entry in &index.entries {
            let t = entry.record().time_ms();
            assert!(index.first_time <= t && t <= index.last_time);
            assert_eq!(normalize_ms(t), t);
        }
        assert_eq!(index.first_time, utc_midnight_ms(input[1].date_completed));
    }

    #[test]
    fn test_same_day_order_is_stable() {
        let input = vec![
            hike("z", 2023, 5, 5),
            hike("early", 2023, 1, 1),
            hike("y", 2023, 5, 5),
            hike("x", 2023, 5, 5),
        ];
        let index = TimeIndex::build(&input).unwrap();
        let ids: Vec<&str> = index.entries.iter().map(|e| e.record().id.as_str()).collect();
        assert_eq!(ids, ["early", "z", "y", "x"]);
    }

    #[test]
    fn test_geometry_width_formula() {
        let index = TimeIndex::build(&[hike("a", 2023, 1, 1), hike("b", 2023, 1, 11)]).unwrap();
        let config = TimelineConfig::default();
        let geometry = index.geometry(&config);
        assert_eq!(geometry.total_span_ms, 10 * MS_PER_DAY);
        assert_eq!(geometry.total_track_width_px, 10.0 * 4.0 + 200.0);
        assert_eq!(geometry.position_of(index.first_time), 100.0);
        assert_eq!(geometry.position_of(index.last_time), 140.0);
    }

    #[test]
    fn test_single_hike_falls_back_to_center() {
        let index = TimeIndex::build(&[hike("solo", 2024, 7, 4)]).unwrap();
        let geometry = index.geometry(&TimelineConfig::default());
        assert_eq!(geometry.total_span_ms, 0);
        assert_eq!(geometry.fraction_of(index.first_time), 0.5);
        let pos = geometry.position_of(index.first_time);
        assert!(pos.is_finite());
        assert_eq!(pos, geometry.total_track_width_px / 2.0);
    }

    #[test]
    fn test_date_at_fraction_round_trips_ends() {
        let index = TimeIndex::build(&[hike("a", 2023, 1, 1), hike("b", 2023, 12, 31)]).unwrap();
        let geometry = index.geometry(&TimelineConfig::default());
        assert_eq!(geometry.date_at_fraction(0.0), NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(geometry.date_at_fraction(1.0), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }
}
