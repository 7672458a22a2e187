//! Browser front end: fetches the dataset once and mounts whichever atlas
//! surfaces the current page contains

mod fetch;
mod leaflet;
mod map;
mod page;
mod timeline;
mod timers;

use tracing::{error, info, warn};
use wasm_bindgen::JsValue;

use crate::core::config::DEFAULT_DATASET_PATH;
use crate::core::{parse_dataset, AtlasError, AtlasSession, TimelineConfig};
use crate::time::{elapsed_ms, now_seconds};

const MAP_ID: &str = "map";
const SHOWCASE_MAP_ID: &str = "showcase-map";

/// Log a failed DOM or JS call instead of dropping it
trait WarnOnErr {
    fn warn_on_err(self, what: &str);
}

impl<T> WarnOnErr for Result<T, JsValue> {
    fn warn_on_err(self, what: &str) {
        if let Err(e) = self {
            warn!(?e, what, "DOM call failed");
        }
    }
}

pub async fn run() {
    if let Err(e) = start().await {
        error!(error = %e, "Atlas failed to start");
        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            page::show_placeholder(&document, &e.placeholder());
        }
    }
}

async fn start() -> Result<(), AtlasError> {
    let window = web_sys::window().ok_or_else(|| AtlasError::DatasetLoad("no window".into()))?;
    let document = window
        .document()
        .ok_or_else(|| AtlasError::DatasetLoad("no document".into()))?;

    let started = now_seconds();
    let body = fetch::fetch_text(DEFAULT_DATASET_PATH).await?;
    let records = parse_dataset(&body)?;
    info!(hikes = records.len(), elapsed_ms = elapsed_ms(started), "Dataset loaded");

    let config = TimelineConfig::default();

    for (id, interactive) in [(MAP_ID, true), (SHOWCASE_MAP_ID, false)] {
        if document.get_element_by_id(id).is_some() {
            wasm_bindgen_futures::spawn_local(map::draw_atlas(id, records.clone(), interactive));
        }
    }

    let session = AtlasSession::new(records, &config);
    page::update_latest_link(&document, &session);

    if document.get_element_by_id(page::TIMELINE_ID).is_some() {
        page::open(window, document, session, &config)
            .map_err(|e| AtlasError::DatasetLoad(format!("page setup failed: {e:?}")))?;
    }
    Ok(())
}
