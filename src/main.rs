//! Standalone CLI for checking a hike dataset and its GPX tracks
//!
//! Run with: cargo run --features cli --bin trailprint-cli

#[cfg(not(target_arch = "wasm32"))]
mod gpx_source {
    use std::io::Cursor;
    use std::path::PathBuf;

    use trailprint::core::{AtlasError, LatLng, TrackBounds, TrackRef, TrackSource};

    /// Reads `<dir>/<file>` and reduces the GPX to its bounding box
    pub struct GpxDir {
        pub dir: PathBuf,
    }

    impl TrackSource for GpxDir {
        async fn load(&self, track: &TrackRef) -> Result<TrackBounds, AtlasError> {
            let path = self.dir.join(&track.file);
            let failed = |reason: String| AtlasError::TrackLoad {
                file: track.file.clone(),
                reason,
            };

            let bytes = tokio::fs::read(&path).await.map_err(|e| failed(e.to_string()))?;
            let gpx = gpx::read(Cursor::new(bytes)).map_err(|e| failed(e.to_string()))?;

            let track_points = gpx
                .tracks
                .iter()
                .flat_map(|t| t.segments.iter())
                .flat_map(|s| s.points.iter());
            let route_points = gpx.routes.iter().flat_map(|r| r.points.iter());
            let points = track_points.chain(route_points).map(|p| {
                let point = p.point();
                LatLng {
                    lat: point.y(),
                    lng: point.x(),
                }
            });

            TrackBounds::of_points(points).ok_or_else(|| failed("track has no points".into()))
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::path::PathBuf;

    use futures_util::future::join_all;
    use tracing::{debug, info, warn};
    use tracing_subscriber::{fmt, EnvFilter};
    use trailprint::core::{
        config::{DEFAULT_DATASET_PATH, DEFAULT_TRAILS_DIR},
        group_by_trail, parse_dataset, settle, AtlasError, AtlasSession, HoverBoard, PageState, RenderOptions,
        ScrollMode, TimelineConfig, TrackBounds, TrailLook, ViewportController,
    };
    use trailprint::core::media::{dot_indices, MediaCarousel, MediaItem};
    use trailprint::time::{elapsed_ms, now_seconds};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,trailprint=debug,trailprint_cli=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let data_path = std::env::var("TRAILPRINT_DATA").unwrap_or_else(|_| DEFAULT_DATASET_PATH.to_string());
    let trails_dir = std::env::var("TRAILPRINT_TRAILS").unwrap_or_else(|_| DEFAULT_TRAILS_DIR.to_string());
    let viewport_width: f64 = match std::env::var("TRAILPRINT_VIEWPORT") {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AtlasError::InvalidConfig(format!("TRAILPRINT_VIEWPORT: {raw}")))?,
        Err(_) => 1200.0,
    };
    let config = match std::env::var("TRAILPRINT_CONFIG") {
        Ok(path) => {
            info!(path = %path, "Loading timeline config");
            TimelineConfig::from_json(&tokio::fs::read_to_string(&path).await?)?
        }
        Err(_) => TimelineConfig::default(),
    };

    let started = now_seconds();
    info!(path = %data_path, "Loading dataset");
    let body = tokio::fs::read_to_string(&data_path)
        .await
        .map_err(|e| AtlasError::DatasetLoad(format!("{data_path}: {e}")))?;
    let records = parse_dataset(&body)?;

    let mut session = AtlasSession::new(records, &config);
    let requested = std::env::var("TRAILPRINT_HIKE").ok();
    let state = session.restore(requested.as_deref());

    if let Some(timeline) = session.timeline() {
        let layout = &timeline.layout;
        info!(
            hikes = timeline.index.len(),
            trips = timeline.partition.trips.len(),
            solos = timeline.partition.solos.len(),
            track_px = layout.geometry.total_track_width_px,
            "Timeline built"
        );
        for capsule in &layout.capsules {
            debug!(
                trip = %capsule.trip_tag,
                left = capsule.left_px,
                width = capsule.width_px,
                hikes = capsule.children.len(),
                "Capsule"
            );
        }
        let hover = HoverBoard::new(layout, &config);
        let expandable = (0..layout.capsules.len())
            .filter(|&id| hover.capsule(id).is_some_and(|c| c.positions().len() > 1))
            .count();
        debug!(expandable, "Capsules with hover expansion");

        let viewport = ViewportController::new(layout.geometry, viewport_width, &config);
        let target = state.hike_id().and_then(|id| viewport.center_on_hike(layout, id, ScrollMode::Instant));
        let offset = target.map_or(0.0, |r| r.offset_px);
        let settled = viewport.settle(offset);
        info!(
            offset,
            date = %settled.date,
            season = ?settled.season,
            parallax = settled.parallax_offset_px,
            "Viewport"
        );
    }

    match &state {
        PageState::Showing(_) => {
            if let Some(header) = session.header() {
                info!(title = %header.title, "{} | {}", header.date_line, header.location_line);
            }
            for entry in session.logbook() {
                info!(hike = %entry.hike_id, current = entry.is_current, "{} - {}", entry.date, entry.meta);
            }
            if let Some(hike) = session.current() {
                let items = MediaItem::from_hike(hike);
                let dots = dot_indices(&items);
                let mut carousel = MediaCarousel::new(items.len());
                info!(
                    items = items.len(),
                    dots = dots.len(),
                    navigation = carousel.shows_navigation(),
                    "Media"
                );
                for _ in 0..carousel.len() {
                    let item = &items[carousel.current()];
                    match item.card_url() {
                        Some(url) => debug!(index = carousel.current(), %url, "Media item"),
                        None => warn!(index = carousel.current(), ?item, "Media item has nothing to show"),
                    }
                    carousel = carousel.next();
                }
            }
        }
        other => {
            if let Some(slots) = other.placeholder() {
                warn!(title = %slots.title, "{}", slots.subtitle);
            }
        }
    }

    let source = gpx_source::GpxDir {
        dir: PathBuf::from(&trails_dir),
    };
    let options = RenderOptions {
        interactive: true,
        look: TrailLook::Full,
        popup: None,
    };
    let groups = group_by_trail(session.records());
    let composites: Vec<_> = groups
        .iter()
        .filter_map(|g| trailprint::core::compose_trail_group(g, &options))
        .collect();
    info!(trails = groups.len(), drawable = composites.len(), dir = %trails_dir, "Settling trail groups");

    let results = join_all(composites.iter().map(|c| settle(&source, c))).await;

    let mut map_bounds: Option<TrackBounds> = None;
    let mut dropped = 0usize;
    for (composite, result) in composites.iter().zip(&results) {
        dropped += result.dropped.len();
        if let Some(b) = result.bounds {
            map_bounds = Some(map_bounds.map_or(b, |acc| acc.union(b)));
        }
        debug!(
            trail = %composite.trail_name,
            layers = result.layers.len(),
            dropped = result.dropped.len(),
            "Trail group"
        );
    }

    info!(
        dropped,
        bounds = ?map_bounds,
        elapsed_ms = format!("{:.1}", elapsed_ms(started)),
        "Done"
    );
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {}
