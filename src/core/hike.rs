//! Hike records as they appear in the dataset
//!
//! This module contains:
//! - HikeRecord, the immutable dataset row
//! - HikeType, the visit category driving icons and wording
//! - HikeEntry, the solo/trip split decided once at ingestion

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::calendar::{parse_date, utc_midnight_ms};

pub type HikeId = String;
pub type TripTag = String;

/// Visit category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HikeType {
    #[serde(rename = "Overnight Trip")]
    OvernightTrip,
    #[serde(rename = "Day Trip")]
    DayTrip,
    #[serde(rename = "Day Hike")]
    DayHike,
    #[serde(rename = "Car Camping")]
    CarCamping,
    Backpacking,
    Viewpoint,
    #[default]
    #[serde(other)]
    Other,
}

impl HikeType {
    pub fn label(self) -> &'static str {
        match self {
            HikeType::OvernightTrip => "Overnight Trip",
            HikeType::DayTrip => "Day Trip",
            HikeType::DayHike => "Day Hike",
            HikeType::CarCamping => "Car Camping",
            HikeType::Backpacking => "Backpacking",
            HikeType::Viewpoint => "Viewpoint",
            HikeType::Other => "Hike",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// One logged visit. Never mutated after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HikeRecord {
    #[serde(rename = "trail_id", deserialize_with = "de_id")]
    pub id: HikeId,
    pub trail_name: String,
    #[serde(
        rename = "trip_name",
        alias = "trip",
        default,
        deserialize_with = "de_trip_tag",
        skip_serializing_if = "Option::is_none"
    )]
    pub trip_tag: Option<TripTag>,
    #[serde(deserialize_with = "de_date")]
    pub date_completed: NaiveDate,
    #[serde(default)]
    pub hike_type: HikeType,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub gpx_file: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub miles: Option<f64>,
    #[serde(default)]
    pub elevation_gain: Option<f64>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub hike_size: Option<String>,
    #[serde(default)]
    pub hiked_with: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
}

impl HikeRecord {
    /// Minimal record; everything optional left empty
    pub fn new(id: impl Into<HikeId>, trail_name: impl Into<String>, date_completed: NaiveDate) -> Self {
        Self {
            id: id.into(),
            trail_name: trail_name.into(),
            trip_tag: None,
            date_completed,
            hike_type: HikeType::default(),
            latitude: None,
            longitude: None,
            gpx_file: None,
            location: None,
            region: None,
            miles: None,
            elevation_gain: None,
            difficulty: None,
            hike_size: None,
            hiked_with: Vec::new(),
            notes: None,
            images: Vec::new(),
            videos: Vec::new(),
        }
    }

    /// UTC-midnight instant of the visit
    #[inline]
    pub fn time_ms(&self) -> i64 {
        utc_midnight_ms(self.date_completed)
    }

    pub fn year(&self) -> i32 {
        self.date_completed.year()
    }

    /// Both coordinates, when present and usable
    pub fn coordinates(&self) -> Option<LatLng> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => Some(LatLng { lat, lng }),
            _ => None,
        }
    }

    pub fn track_file(&self) -> Option<&str> {
        self.gpx_file.as_deref().filter(|f| !f.trim().is_empty())
    }

    pub fn is_viewpoint(&self) -> bool {
        self.hike_type == HikeType::Viewpoint
    }
}

/// A record classified as standalone or as one day of a trip
#[derive(Debug, Clone, PartialEq)]
pub enum HikeEntry {
    Solo(HikeRecord),
    PartOfTrip(HikeRecord, TripTag),
}

impl HikeEntry {
    pub fn from_record(record: HikeRecord) -> Self {
        match record.trip_tag.clone() {
            Some(tag) => HikeEntry::PartOfTrip(record, tag),
            None => HikeEntry::Solo(record),
        }
    }

    #[inline]
    pub fn record(&self) -> &HikeRecord {
        match self {
            HikeEntry::Solo(record) | HikeEntry::PartOfTrip(record, _) => record,
        }
    }

    pub fn trip_tag(&self) -> Option<&str> {
        match self {
            HikeEntry::Solo(_) => None,
            HikeEntry::PartOfTrip(_, tag) => Some(tag),
        }
    }
}

fn de_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<HikeId, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid trail_id: {other}"))),
    }
}

fn de_trip_tag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<TripTag>, D::Error> {
    let tag: Option<String> = Option::deserialize(deserializer)?;
    Ok(tag.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()))
}

fn de_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date_completed: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_record() {
        let json = r#"{
            "trail_id": "mt-si-2023",
            "trail_name": "Mount Si",
            "date_completed": "2023-06-01",
            "hike_type": "Day Hike",
            "latitude": 47.48,
            "longitude": -121.72,
            "gpx_file": "mt-si.gpx",
            "hiked_with": ["Sam"],
            "unknown_field": 1
        }"#;
        let hike: HikeRecord = serde_json::from_str(json).unwrap();
        assert_eq!(hike.id, "mt-si-2023");
        assert_eq!(hike.hike_type, HikeType::DayHike);
        assert_eq!(hike.track_file(), Some("mt-si.gpx"));
        assert_eq!(hike.coordinates(), Some(LatLng { lat: 47.48, lng: -121.72 }));
        assert_eq!(hike.year(), 2023);
        assert!(hike.trip_tag.is_none());
    }

    #[test]
    fn test_numeric_id_and_blank_trip() {
        let json = r#"{"trail_id": 7, "trail_name": "X", "date_completed": "2024-01-02", "trip_name": "  "}"#;
        let hike: HikeRecord = serde_json::from_str(json).unwrap();
        assert_eq!(hike.id, "7");
        assert!(hike.trip_tag.is_none());
        assert_eq!(hike.hike_type, HikeType::Other);
    }

    #[test]
    fn test_unknown_category_falls_back() {
        let json = r#"{"trail_id": "a", "trail_name": "A", "date_completed": "2024-01-02", "hike_type": "Canoeing"}"#;
        let hike: HikeRecord = serde_json::from_str(json).unwrap();
        assert_eq!(hike.hike_type, HikeType::Other);
    }

    #[test]
    fn test_entry_classification() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let solo = HikeEntry::from_record(HikeRecord::new("a", "A", date));
        assert!(matches!(solo, HikeEntry::Solo(_)));
        assert_eq!(solo.trip_tag(), None);

        let mut record = HikeRecord::new("b", "B", date);
        record.trip_tag = Some("Olympics 2024".into());
        let trip = HikeEntry::from_record(record);
        assert_eq!(trip.trip_tag(), Some("Olympics 2024"));
        assert_eq!(trip.record().id, "b");
    }

    #[test]
    fn test_blank_track_file_ignored() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut record = HikeRecord::new("a", "A", date);
        record.gpx_file = Some(String::new());
        assert_eq!(record.track_file(), None);
        record.latitude = Some(1.0);
        assert_eq!(record.coordinates(), None);
    }
}
