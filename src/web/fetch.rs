//! Static resource fetches

use tracing::{debug, error};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

use crate::core::AtlasError;

/// GET `url` and return the body as text. Non-success statuses are errors.
pub async fn fetch_text(url: &str) -> Result<String, AtlasError> {
    let window = web_sys::window().ok_or_else(|| AtlasError::DatasetLoad("no window".into()))?;

    debug!(url, "Fetching");
    let resp = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| AtlasError::DatasetLoad(format!("{url}: {e:?}")))?;
    let resp: Response = resp
        .dyn_into()
        .map_err(|_| AtlasError::DatasetLoad(format!("{url}: not a response")))?;

    if !resp.ok() {
        error!(url, status = resp.status(), "Fetch failed");
        return Err(AtlasError::DatasetLoad(format!(
            "{url}: HTTP {} {}",
            resp.status(),
            resp.status_text()
        )));
    }

    let text = resp
        .text()
        .map_err(|e| AtlasError::DatasetLoad(format!("{url}: {e:?}")))?;
    let text = JsFuture::from(text)
        .await
        .map_err(|e| AtlasError::DatasetLoad(format!("{url}: {e:?}")))?;
    text.as_string()
        .ok_or_else(|| AtlasError::DatasetLoad(format!("{url}: body is not text")))
}
