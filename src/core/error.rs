//! Error taxonomy for the atlas core
//!
//! Degenerate geometry (zero-span timelines, single-day trips) is never an
//! error; it resolves through the fallback constants in `layout`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AtlasError {
    #[error("could not load hike dataset: {0}")]
    DatasetLoad(String),
    #[error("failed to parse hike dataset: {0}")]
    DatasetParse(String),
    #[error("insufficient data to build a timeline")]
    InsufficientData,
    #[error("no hike data found for ID: {0}")]
    RecordNotFound(String),
    #[error("failed to load track {file}: {reason}")]
    TrackLoad { file: String, reason: String },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Text shown in the page's title/subtitle slots in place of a hike
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub title: String,
    pub subtitle: String,
}

impl Placeholder {
    pub fn new(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
        }
    }
}

impl AtlasError {
    /// Whether the whole view is unusable after this error
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AtlasError::DatasetLoad(_) | AtlasError::DatasetParse(_) | AtlasError::InvalidConfig(_)
        )
    }

    /// Map the error to the user-visible placeholder slots
    pub fn placeholder(&self) -> Placeholder {
        match self {
            AtlasError::RecordNotFound(_) => Placeholder::new("Hike Not Found", self.to_string()),
            AtlasError::InsufficientData => {
                Placeholder::new("Hike Not Found", "No hikes have been logged yet.")
            }
            _ => Placeholder::new(
                "Error Loading Data",
                "Could not load hike details. Please check the console.",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_placeholder_names_id() {
        let err = AtlasError::RecordNotFound("half-dome".into());
        assert!(!err.is_fatal());
        let slots = err.placeholder();
        assert_eq!(slots.title, "Hike Not Found");
        assert_eq!(slots.subtitle, "No hike data found for ID: half-dome");
    }

    #[test]
    fn test_dataset_failure_is_fatal() {
        let err = AtlasError::DatasetLoad("HTTP 404".into());
        assert!(err.is_fatal());
        assert_eq!(err.placeholder().title, "Error Loading Data");
    }

    #[test]
    fn test_track_failure_is_local() {
        let err = AtlasError::TrackLoad {
            file: "a.gpx".into(),
            reason: "404".into(),
        };
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "failed to load track a.gpx: 404");
    }
}
