//! Atlas map pages: every trail group drawn once, then fitted to the tracks

use futures_util::future::join_all;
use tracing::{debug, info};

use super::leaflet::{self, LeafletRenderer};
use crate::core::trail::{draw_composite, visit_summary_html};
use crate::core::{compose_trail_group, group_by_trail, settle, HikeRecord, LatLng, RenderOptions, TrackBounds, TrailLook};
use crate::time::{elapsed_ms, now_seconds};

/// Roughly the middle of the contiguous US
const INITIAL_CENTER: LatLng = LatLng {
    lat: 39.82,
    lng: -98.58,
};
const INITIAL_ZOOM: u8 = 4;

/// Draw `records` on the map in `element_id`. Interactive maps get the
/// ghost stacks and popups; the showcase map gets dots only.
pub async fn draw_atlas(element_id: &str, records: Vec<HikeRecord>, interactive: bool) {
    let started = now_seconds();
    let map = leaflet::create_map(element_id, INITIAL_CENTER, INITIAL_ZOOM);
    let mut renderer = LeafletRenderer::new();

    let options = RenderOptions {
        interactive,
        look: if interactive { TrailLook::Full } else { TrailLook::Showcase },
        popup: Some(&visit_summary_html),
    };

    let groups = group_by_trail(&records);
    let mut drawn = Vec::new();
    for group in &groups {
        let Some(composite) = compose_trail_group(group, &options) else {
            continue;
        };
        let layer = draw_composite(&mut renderer, &composite);
        leaflet::add_to_map(&layer, &map);
        drawn.push((composite, layer));
    }
    info!(element = element_id, trails = groups.len(), drawn = drawn.len(), "Trail groups drawn");

    let tracks = renderer.track_source();
    let settled = join_all(drawn.iter().map(|(composite, _)| settle(&tracks, composite))).await;

    let mut bounds: Option<TrackBounds> = None;
    for ((_, group_layer), result) in drawn.iter().zip(&settled) {
        for hike_id in &result.dropped {
            if let Some(layer) = renderer.track_layer(hike_id) {
                leaflet::remove_from_group(group_layer, &layer);
            }
        }
        if let Some(b) = result.bounds {
            bounds = Some(bounds.map_or(b, |acc| acc.union(b)));
        }
    }

    // the showcase map keeps its fixed framing
    if interactive {
        if let Some(bounds) = bounds {
            leaflet::fit_map(&map, bounds);
        }
    }
    debug!(elapsed_ms = elapsed_ms(started), "Atlas settled");
}
