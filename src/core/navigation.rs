//! Hike detail navigation: shareable ids, history entries and page state
//!
//! `AtlasSession` replaces page-global state. It owns the dataset (fetched
//! once), the timeline built from it and the hike on display, so back and
//! forward navigation resolve from memory instead of re-fetching.

use tracing::{debug, info, warn};

use super::calendar::format_long;
use super::{AtlasError, HikeId, HikeRecord, HikeType, Placeholder, Timeline, TimelineConfig, TimelineLayout};

pub const HIKE_PAGE: &str = "hike.html";

/// Extract `id` from a `?id=...` query string, percent-decoded
pub fn parse_hike_id(query: &str) -> Option<HikeId> {
    let query = query.split_once('#').map_or(query, |(before, _)| before);
    query
        .trim_start_matches('?')
        .split('&')
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .find(|(key, _)| *key == "id")
        .map(|(_, value)| value.replace('+', " "))
        .and_then(|value| urlencoding::decode(&value).ok().map(|v| v.into_owned()))
        .filter(|id| !id.is_empty())
}

pub fn hike_page_url(id: &str) -> String {
    format!("{}?id={}", HIKE_PAGE, urlencoding::encode(id))
}

/// What the detail page is showing
#[derive(Debug, Clone, PartialEq)]
pub enum PageState {
    Showing(HikeId),
    /// No id in the address
    NoSelection,
    NotFound(HikeId),
    /// Dataset could not be loaded
    Error,
}

impl PageState {
    /// Title/subtitle text for every state except `Showing`
    pub fn placeholder(&self) -> Option<Placeholder> {
        match self {
            PageState::Showing(_) => None,
            PageState::NoSelection => Some(Placeholder::new(
                "Hike Not Found",
                "Please select a hike from the map or timeline.",
            )),
            PageState::NotFound(id) => Some(AtlasError::RecordNotFound(id.clone()).placeholder()),
            PageState::Error => Some(AtlasError::DatasetLoad(String::new()).placeholder()),
        }
    }

    pub fn hike_id(&self) -> Option<&str> {
        match self {
            PageState::Showing(id) => Some(id),
            _ => None,
        }
    }
}

/// Browser history operation to perform alongside a page change
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryAction {
    /// Record the cold-load state without adding an entry
    Replace { hike_id: Option<HikeId> },
    /// New entry with a shareable URL
    Push { hike_id: HikeId, url: String },
    /// Entry already current
    None,
}

/// Header lines of the detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HikeHeader {
    pub title: String,
    pub date_line: String,
    pub location_line: String,
}

impl HikeHeader {
    pub fn for_hike(hike: &HikeRecord) -> Self {
        let prefix = if hike.hike_type == HikeType::Viewpoint {
            "Visited on"
        } else {
            "Hiked on"
        };
        let location_line = match (hike.location.as_deref(), hike.region.as_deref()) {
            (Some(location), Some(region)) => format!("{} • {}", location, region),
            (Some(only), None) | (None, Some(only)) => only.to_string(),
            (None, None) => String::new(),
        };
        Self {
            title: hike.trail_name.clone(),
            date_line: format!("{} {}", prefix, format_long(hike.date_completed)),
            location_line,
        }
    }
}

/// One row of the repeat-visit logbook
#[derive(Debug, Clone, PartialEq)]
pub struct LogbookEntry {
    pub hike_id: HikeId,
    pub date: chrono::NaiveDate,
    pub meta: String,
    pub notes: Option<String>,
    pub is_current: bool,
}

impl LogbookEntry {
    /// Link target for rows other than the current hike
    pub fn href(&self) -> Option<String> {
        (!self.is_current).then(|| hike_page_url(&self.hike_id))
    }
}

fn logbook_meta(hike: &HikeRecord) -> String {
    let size = hike.hike_size.as_deref().unwrap_or("Solo");
    let mut meta = format!("Hiked as a {}", size);
    if !hike.hiked_with.is_empty() {
        meta.push_str(" with ");
        meta.push_str(&hike.hiked_with.join(", "));
    }
    meta
}

/// Visits sharing `current`'s trail name, newest first. Empty unless the
/// trail was visited more than once.
pub fn logbook(records: &[HikeRecord], current: &HikeRecord) -> Vec<LogbookEntry> {
    let mut visits: Vec<&HikeRecord> = records
        .iter()
        .filter(|r| r.trail_name == current.trail_name)
        .collect();
    if visits.len() < 2 {
        return Vec::new();
    }
    visits.sort_by(|a, b| b.date_completed.cmp(&a.date_completed));
    visits
        .into_iter()
        .map(|visit| LogbookEntry {
            hike_id: visit.id.clone(),
            date: visit.date_completed,
            meta: logbook_meta(visit),
            notes: visit.notes.clone(),
            is_current: visit.id == current.id,
        })
        .collect()
}

/// Most recently completed hike, for the "Latest Hike" link
pub fn latest_hike(records: &[HikeRecord]) -> Option<&HikeRecord> {
    // max_by_key keeps the last maximum; ties resolve to the later row
    records.iter().max_by_key(|r| r.date_completed)
}

pub struct AtlasSession {
    records: Vec<HikeRecord>,
    timeline: Option<Timeline>,
    current: Option<HikeId>,
}

impl AtlasSession {
    /// An empty dataset yields a session with no timeline
    pub fn new(records: Vec<HikeRecord>, config: &TimelineConfig) -> Self {
        let timeline = match Timeline::build(&records, config) {
            Ok(timeline) => Some(timeline),
            Err(e) => {
                warn!(error = %e, "No timeline for this dataset");
                None
            }
        };
        info!(hikes = records.len(), "Atlas session ready");
        Self {
            records,
            timeline,
            current: None,
        }
    }

    pub fn records(&self) -> &[HikeRecord] {
        &self.records
    }

    pub fn timeline(&self) -> Option<&Timeline> {
        self.timeline.as_ref()
    }

    pub fn layout(&self) -> Option<&TimelineLayout> {
        self.timeline.as_ref().map(|t| &t.layout)
    }

    pub fn find(&self, id: &str) -> Result<&HikeRecord, AtlasError> {
        self.records
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| AtlasError::RecordNotFound(id.to_string()))
    }

    pub fn current(&self) -> Option<&HikeRecord> {
        self.current.as_deref().and_then(|id| self.find(id).ok())
    }

    /// Cold load from the page's query string
    pub fn open_initial(&mut self, query: &str) -> (HistoryAction, PageState) {
        let requested = parse_hike_id(query);
        let action = HistoryAction::Replace {
            hike_id: requested.clone(),
        };
        let state = self.show(requested.as_deref());
        (action, state)
    }

    /// User picked a marker. Unknown ids leave the current hike in place.
    pub fn select(&mut self, id: &str) -> Result<(HistoryAction, PageState), AtlasError> {
        self.find(id)?;
        if self.current.as_deref() == Some(id) {
            return Ok((HistoryAction::None, PageState::Showing(id.to_string())));
        }
        self.current = Some(id.to_string());
        debug!(hike = %id, "Selected hike");
        Ok((
            HistoryAction::Push {
                hike_id: id.to_string(),
                url: hike_page_url(id),
            },
            PageState::Showing(id.to_string()),
        ))
    }

    /// Back/forward navigation; `state` is the id stored with the entry
    pub fn restore(&mut self, state: Option<&str>) -> PageState {
        self.show(state)
    }

    fn show(&mut self, id: Option<&str>) -> PageState {
        let Some(id) = id else {
            self.current = None;
            return PageState::NoSelection;
        };
        match self.find(id) {
            Ok(_) => {
                self.current = Some(id.to_string());
                PageState::Showing(id.to_string())
            }
            Err(e) => {
                warn!(error = %e, "Requested hike missing");
                self.current = None;
                PageState::NotFound(id.to_string())
            }
        }
    }

    pub fn header(&self) -> Option<HikeHeader> {
        self.current().map(HikeHeader::for_hike)
    }

    pub fn logbook(&self) -> Vec<LogbookEntry> {
        match self.current() {
            Some(current) => logbook(&self.records, current),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn hike(id: &str, trail: &str, y: i32, m: u32, d: u32) -> HikeRecord {
        HikeRecord::new(id, trail, NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn session() -> AtlasSession {
        AtlasSession::new(
            vec![
                hike("si-22", "Mount Si", 2022, 5, 1),
                hike("si-24", "Mount Si", 2024, 6, 2),
                hike("tiger", "Tiger Mountain", 2023, 3, 3),
            ],
            &TimelineConfig::default(),
        )
    }

    #[test]
    fn test_parse_hike_id() {
        assert_eq!(parse_hike_id("?id=mount-si"), Some("mount-si".to_string()));
        assert_eq!(parse_hike_id("foo=1&id=a%20b"), Some("a b".to_string()));
        assert_eq!(parse_hike_id("?id="), None);
        assert_eq!(parse_hike_id(""), None);
        assert_eq!(hike_page_url("a b"), "hike.html?id=a%20b");
    }

    #[test]
    fn test_parse_hike_id_ignores_fragment() {
        assert_eq!(parse_hike_id("?id=x#top"), Some("x".to_string()));
        assert_eq!(parse_hike_id("?id=x&foo=1#id=y"), Some("x".to_string()));
        assert_eq!(parse_hike_id("?foo=1#id=y"), None);
        assert_eq!(parse_hike_id("?id=a%23b"), Some("a#b".to_string()));
    }

    #[test]
    fn test_cold_load_states() {
        let mut s = session();
        let (action, state) = s.open_initial("?id=tiger");
        assert_eq!(action, HistoryAction::Replace { hike_id: Some("tiger".into()) });
        assert_eq!(state, PageState::Showing("tiger".into()));

        let (_, state) = s.open_initial("");
        assert_eq!(state, PageState::NoSelection);
        assert_eq!(
            state.placeholder().unwrap().subtitle,
            "Please select a hike from the map or timeline."
        );

        let (_, state) = s.open_initial("?id=nope");
        let slots = state.placeholder().unwrap();
        assert_eq!(slots.title, "Hike Not Found");
        assert_eq!(slots.subtitle, "No hike data found for ID: nope");
        assert!(s.current().is_none());
    }

    #[test]
    fn test_select_pushes_and_restore_uses_memory() {
        let mut s = session();
        s.open_initial("?id=si-22");

        let (action, state) = s.select("tiger").unwrap();
        assert_eq!(
            action,
            HistoryAction::Push {
                hike_id: "tiger".into(),
                url: "hike.html?id=tiger".into()
            }
        );
        assert_eq!(state.hike_id(), Some("tiger"));

        // same hike again: no new history entry
        assert_eq!(s.select("tiger").unwrap().0, HistoryAction::None);

        assert_eq!(s.restore(Some("si-22")), PageState::Showing("si-22".into()));
        assert_eq!(s.current().unwrap().id, "si-22");

        assert!(matches!(s.select("ghost"), Err(AtlasError::RecordNotFound(_))));
        assert_eq!(s.current().unwrap().id, "si-22");
    }

    #[test]
    fn test_header_wording() {
        let mut h = hike("vp", "Artist Point", 2024, 8, 9);
        h.hike_type = HikeType::Viewpoint;
        h.location = Some("Mount Baker".into());
        h.region = Some("North Cascades".into());
        let header = HikeHeader::for_hike(&h);
        assert_eq!(header.date_line, "Visited on August 9, 2024");
        assert_eq!(header.location_line, "Mount Baker • North Cascades");

        h.hike_type = HikeType::DayHike;
        assert!(HikeHeader::for_hike(&h).date_line.starts_with("Hiked on"));
    }

    #[test]
    fn test_logbook_only_for_repeat_visits() {
        let mut s = session();
        s.open_initial("?id=tiger");
        assert!(s.logbook().is_empty());

        s.select("si-22").unwrap();
        let log = s.logbook();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].hike_id, "si-24");
        assert!(!log[0].is_current);
        assert_eq!(log[0].href().as_deref(), Some("hike.html?id=si-24"));
        assert!(log[1].is_current);
        assert!(log[1].href().is_none());
    }

    #[test]
    fn test_logbook_meta_line() {
        let mut h = hike("a", "A", 2024, 1, 1);
        h.hike_size = Some("Group".into());
        h.hiked_with = vec!["Ana".into(), "Ben".into()];
        assert_eq!(logbook_meta(&h), "Hiked as a Group with Ana, Ben");
    }

    #[test]
    fn test_latest_hike() {
        let s = session();
        assert_eq!(latest_hike(s.records()).unwrap().id, "si-24");
        assert!(latest_hike(&[]).is_none());
    }

    #[test]
    fn test_empty_dataset_has_no_timeline() {
        let s = AtlasSession::new(Vec::new(), &TimelineConfig::default());
        assert!(s.timeline().is_none());
        assert!(s.layout().is_none());
    }
}
