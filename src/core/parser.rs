//! Dataset parser for `hikes.json`
//!
//! A malformed top level fails the whole load. A single malformed record is
//! skipped and logged so one bad row never blanks the site.

use serde_json::Value;
use tracing::{debug, trace, warn};

use super::{AtlasError, HikeRecord};

/// Parse the dataset body into records, preserving file order
pub fn parse_dataset(body: &str) -> Result<Vec<HikeRecord>, AtlasError> {
    trace!(len = body.len(), "Parsing dataset");

    let json: Value =
        serde_json::from_str(body).map_err(|e| AtlasError::DatasetParse(e.to_string()))?;

    let Value::Array(rows) = json else {
        return Err(AtlasError::DatasetParse("expected a top-level array".into()));
    };

    let total = rows.len();
    let hikes: Vec<HikeRecord> = rows
        .into_iter()
        .enumerate()
        .filter_map(|(row, value)| {
            serde_json::from_value::<HikeRecord>(value)
                .map_err(|e| {
                    warn!(row, error = %e, "Skipping malformed hike record");
                })
                .ok()
        })
        .collect();

    debug!(total, parsed = hikes.len(), "Dataset parsed");
    Ok(hikes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dataset_keeps_order() {
        let body = r#"[
            {"trail_id": "b", "trail_name": "B", "date_completed": "2023-06-01"},
            {"trail_id": "a", "trail_name": "A", "date_completed": "2023-01-01"}
        ]"#;
        let hikes = parse_dataset(body).unwrap();
        assert_eq!(hikes.len(), 2);
        assert_eq!(hikes[0].id, "b");
        assert_eq!(hikes[1].id, "a");
    }

    #[test]
    fn test_parse_skips_bad_rows() {
        let body = r#"[
            {"trail_id": "ok", "trail_name": "OK", "date_completed": "2023-06-01"},
            {"trail_id": "bad", "trail_name": "Bad", "date_completed": "someday"},
            {"trail_name": "No id", "date_completed": "2023-06-01"}
        ]"#;
        let hikes = parse_dataset(body).unwrap();
        assert_eq!(hikes.len(), 1);
        assert_eq!(hikes[0].id, "ok");
    }

    #[test]
    fn test_parse_rejects_non_array() {
        assert!(matches!(
            parse_dataset(r#"{"hikes": []}"#),
            Err(AtlasError::DatasetParse(_))
        ));
        assert!(matches!(parse_dataset("<html>"), Err(AtlasError::DatasetParse(_))));
    }
}
