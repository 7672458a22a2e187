//! Partition of the sorted hikes into trips and solo hikes

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use super::{HikeEntry, HikeRecord, TripTag};

/// Hikes sharing a trip tag. Rebuilt on every render, never edited.
#[derive(Debug, Clone, PartialEq)]
pub struct TripGroup {
    pub tag: TripTag,
    /// Members in index order
    pub members: Vec<HikeRecord>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl TripGroup {
    fn new(tag: TripTag, first: HikeRecord) -> Self {
        Self {
            tag,
            start_date: first.date_completed,
            end_date: first.date_completed,
            members: vec![first],
        }
    }

    fn push(&mut self, record: HikeRecord) {
        self.start_date = self.start_date.min(record.date_completed);
        self.end_date = self.end_date.max(record.date_completed);
        self.members.push(record);
    }

    /// Length in whole days; zero for a single-day trip
    pub fn span_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }
}

/// Every input hike lands in exactly one trip bucket or in `solos`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripPartition {
    /// Trips in order of first appearance
    pub trips: Vec<TripGroup>,
    pub solos: Vec<HikeRecord>,
}

impl TripPartition {
    pub fn build(entries: &[HikeEntry]) -> Self {
        let mut trips: Vec<TripGroup> = Vec::new();
        let mut slot_by_tag: HashMap<&str, usize> = HashMap::new();
        let mut solos = Vec::new();

        for entry in entries {
            match entry {
                HikeEntry::Solo(record) => solos.push(record.clone()),
                HikeEntry::PartOfTrip(record, tag) => match slot_by_tag.get(tag.as_str()) {
                    Some(&slot) => trips[slot].push(record.clone()),
                    None => {
                        slot_by_tag.insert(tag.as_str(), trips.len());
                        trips.push(TripGroup::new(tag.clone(), record.clone()));
                    }
                },
            }
        }

        debug!(trips = trips.len(), solos = solos.len(), "Trips partitioned");
        Self { trips, solos }
    }

    pub fn trip(&self, tag: &str) -> Option<&TripGroup> {
        self.trips.iter().find(|t| t.tag == tag)
    }

    /// Count of hikes across trips and solos
    pub fn hike_count(&self) -> usize {
        self.solos.len() + self.trips.iter().map(|t| t.members.len()).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn entry(id: &str, date: (i32, u32, u32), trip: Option<&str>) -> HikeEntry {
        let mut record = HikeRecord::new(id, id, NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap());
        record.trip_tag = trip.map(str::to_string);
        HikeEntry::from_record(record)
    }

    #[test]
    fn test_partition_is_complete_without_duplicates() {
        let entries = vec![
            entry("a", (2023, 1, 1), None),
            entry("b", (2023, 2, 1), Some("Zion")),
            entry("c", (2023, 2, 2), Some("Zion")),
            entry("d", (2023, 3, 1), None),
            entry("e", (2023, 4, 1), Some("Olympics")),
        ];
        let partition = TripPartition::build(&entries);

        assert_eq!(partition.hike_count(), entries.len());
        let mut seen = HashSet::new();
        for record in partition.solos.iter().chain(partition.trips.iter().flat_map(|t| &t.members)) {
            assert!(seen.insert(record.id.clone()), "{} placed twice", record.id);
        }
        assert_eq!(seen.len(), entries.len());

        let tags: Vec<&str> = partition.trips.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(tags, ["Zion", "Olympics"]);
    }

    #[test]
    fn test_trip_bounds_use_dates_not_order() {
        // Out-of-order input still yields min/max over member dates
        let entries = vec![
            entry("late", (2023, 8, 5), Some("Sierra")),
            entry("early", (2023, 8, 1), Some("Sierra")),
            entry("mid", (2023, 8, 3), Some("Sierra")),
        ];
        let partition = TripPartition::build(&entries);
        let trip = partition.trip("Sierra").unwrap();
        assert_eq!(trip.start_date, NaiveDate::from_ymd_opt(2023, 8, 1).unwrap());
        assert_eq!(trip.end_date, NaiveDate::from_ymd_opt(2023, 8, 5).unwrap());
        let ids: Vec<&str> = trip.members.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["late", "early", "mid"]);
    }

    #[test]
    fn test_single_member_trip_has_zero_span() {
        let partition = TripPartition::build(&[entry("x", (2024, 6, 1), Some("Quick"))]);
        let trip = &partition.trips[0];
        assert_eq!(trip.start_date, trip.end_date);
        assert_eq!(trip.span_days(), 0);
    }
}
