//! Trail group rendering: every visit to one trail as a single map layer
//!
//! The most recent visit is the primary path. Older visits sit
//! underneath as "ghost" paths that get wider and fainter with age, so
//! repeated visits read as a fading halo around the current track.
//!
//! Composition is pure (`compose_trail_group`); a `MapRenderer` turns the
//! result into real layers, and `settle` waits for every track load.

use std::fmt::Write as _;

use futures_util::future::join_all;
use tracing::{debug, warn};

use super::calendar::format_short;
use super::config::DEFAULT_TRAILS_DIR;
use super::{AtlasError, HikeId, HikeRecord, LatLng};
use crate::theme::{icons, strokes, year_color};

/// All visits to one trail name, most recent first
#[derive(Debug, Clone, PartialEq)]
pub struct TrailVisitGroup {
    visits: Vec<HikeRecord>,
}

impl TrailVisitGroup {
    /// None for an empty visit list
    pub fn new(mut visits: Vec<HikeRecord>) -> Option<Self> {
        if visits.is_empty() {
            return None;
        }
        visits.sort_by(|a, b| b.date_completed.cmp(&a.date_completed));
        Some(Self { visits })
    }

    pub fn trail_name(&self) -> &str {
        &self.visits[0].trail_name
    }

    pub fn most_recent(&self) -> &HikeRecord {
        &self.visits[0]
    }

    /// Visits before the most recent, newest first
    pub fn older_visits(&self) -> &[HikeRecord] {
        &self.visits[1..]
    }

    pub fn visits(&self) -> &[HikeRecord] {
        &self.visits
    }

    pub fn len(&self) -> usize {
        self.visits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }
}

/// Group records by trail name, in order of first appearance
pub fn group_by_trail(records: &[HikeRecord]) -> Vec<TrailVisitGroup> {
    let mut buckets: Vec<(String, Vec<HikeRecord>)> = Vec::new();
    for record in records {
        match buckets.iter_mut().find(|(name, _)| *name == record.trail_name) {
            Some((_, visits)) => visits.push(record.clone()),
            None => buckets.push((record.trail_name.clone(), vec![record.clone()])),
        }
    }
    buckets
        .into_iter()
        .filter_map(|(_, visits)| TrailVisitGroup::new(visits))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct IconSpec {
    pub url: String,
    pub size: [u32; 2],
    pub anchor: [i32; 2],
    pub popup_anchor: [i32; 2],
    pub class_name: String,
}

impl IconSpec {
    /// Category icon; `multi_visit` and `interactive` add styling classes
    pub fn for_visit(visit: &HikeRecord, interactive: bool, multi_visit: bool) -> Self {
        let mut class_name = icons::CLASS_BASE.to_string();
        if interactive && !visit.is_viewpoint() {
            class_name.push(' ');
            class_name.push_str(icons::CLASS_TRAIL_START);
        }
        if interactive && multi_visit {
            class_name.push(' ');
            class_name.push_str(icons::CLASS_MULTI_YEAR);
        }
        Self {
            url: format!("{}/{}", icons::ICON_DIR, icons::file_for(visit.hike_type)),
            size: icons::SIZE,
            anchor: icons::ANCHOR,
            popup_anchor: icons::POPUP_ANCHOR,
            class_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathStyle {
    pub color: &'static str,
    pub weight: f64,
    pub opacity: f64,
    pub interactive: bool,
    /// Draw on the raised main-trail pane
    pub raised: bool,
}

impl PathStyle {
    pub fn primary(year: i32, interactive: bool) -> Self {
        Self {
            color: year_color(year),
            weight: strokes::PRIMARY_WEIGHT,
            opacity: strokes::PRIMARY_OPACITY,
            interactive,
            raised: true,
        }
    }

    /// Style for a visit `steps_back` places behind the most recent one.
    /// Weight grows and opacity shrinks with age, both clamped.
    pub fn ghost(year: i32, steps_back: usize) -> Self {
        let steps = steps_back.max(1) as f64;
        Self {
            color: year_color(year),
            weight: (strokes::GHOST_BASE_WEIGHT + strokes::GHOST_WEIGHT_STEP * steps)
                .min(strokes::GHOST_MAX_WEIGHT),
            opacity: (strokes::GHOST_OPACITY_START - strokes::GHOST_OPACITY_STEP * steps)
                .clamp(strokes::GHOST_MIN_OPACITY, strokes::GHOST_MAX_OPACITY),
            interactive: false,
            raised: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DotStyle {
    pub radius: f64,
    pub fill_color: &'static str,
    pub fill_opacity: f64,
    pub class_name: &'static str,
}

/// A track file to be fetched for one visit
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRef {
    pub hike_id: HikeId,
    pub file: String,
}

impl TrackRef {
    /// Site-relative URL of the track
    pub fn url(&self) -> String {
        format!("{}/{}", DEFAULT_TRAILS_DIR, self.file)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerSpec {
    Marker { at: LatLng, icon: IconSpec },
    Dot { at: LatLng, style: DotStyle },
    Path {
        track: TrackRef,
        style: PathStyle,
        start_icon: Option<IconSpec>,
    },
}

impl LayerSpec {
    pub fn track(&self) -> Option<&TrackRef> {
        match self {
            LayerSpec::Path { track, .. } => Some(track),
            _ => None,
        }
    }
}

/// Layers for one trail in draw order: first is bottom-most
#[derive(Debug, Clone, PartialEq)]
pub struct TrailComposite {
    pub trail_name: String,
    pub layers: Vec<LayerSpec>,
    pub popup_html: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TrailLook {
    /// Ghost stack or point marker
    #[default]
    Full,
    /// Homepage dots at the trail's coordinates
    Showcase,
}

pub type PopupFn<'a> = &'a dyn Fn(&[HikeRecord]) -> String;

#[derive(Clone, Copy, Default)]
pub struct RenderOptions<'a> {
    pub interactive: bool,
    pub look: TrailLook,
    /// Only called for interactive composites that produced a layer
    pub popup: Option<PopupFn<'a>>,
}

/// Decide which layers represent a trail. None when the most recent visit
/// has neither coordinates nor a track file.
pub fn compose_trail_group(group: &TrailVisitGroup, options: &RenderOptions<'_>) -> Option<TrailComposite> {
    let latest = group.most_recent();
    let multi_visit = group.len() > 1;

    let layers = match options.look {
        TrailLook::Showcase => showcase_dots(latest)?,
        TrailLook::Full => match (latest.track_file(), latest.coordinates()) {
            (None, None) => {
                debug!(trail = %group.trail_name(), "Trail has no geometry");
                return None;
            }
            (None, Some(at)) => vec![LayerSpec::Marker {
                at,
                icon: IconSpec::for_visit(latest, options.interactive, multi_visit),
            }],
            (Some(file), _) => {
                let mut layers = ghost_layers(group.older_visits());
                layers.push(LayerSpec::Path {
                    track: TrackRef {
                        hike_id: latest.id.clone(),
                        file: file.to_string(),
                    },
                    style: PathStyle::primary(latest.year(), options.interactive),
                    start_icon: Some(IconSpec::for_visit(latest, options.interactive, multi_visit)),
                });
                layers
            }
        },
    };

    let popup_html = match (options.interactive, options.popup) {
        (true, Some(popup)) => Some(popup(group.visits())),
        _ => None,
    };

    Some(TrailComposite {
        trail_name: group.trail_name().to_string(),
        layers,
        popup_html,
    })
}

/// Oldest first, so each ghost is drawn beneath the next newer one
fn ghost_layers(older: &[HikeRecord]) -> Vec<LayerSpec> {
    older
        .iter()
        .enumerate()
        .rev()
        .filter_map(|(i, visit)| {
            let file = visit.track_file()?;
            Some(LayerSpec::Path {
                track: TrackRef {
                    hike_id: visit.id.clone(),
                    file: file.to_string(),
                },
                style: PathStyle::ghost(visit.year(), i + 1),
                start_icon: None,
            })
        })
        .collect()
}

fn showcase_dots(latest: &HikeRecord) -> Option<Vec<LayerSpec>> {
    let at = latest.coordinates()?;
    let fill_color = year_color(latest.year());
    Some(vec![
        LayerSpec::Dot {
            at,
            style: DotStyle {
                radius: strokes::HALO_RADIUS,
                fill_color,
                fill_opacity: 0.0,
                class_name: strokes::HALO_CLASS,
            },
        },
        LayerSpec::Dot {
            at,
            style: DotStyle {
                radius: strokes::DOT_RADIUS,
                fill_color,
                fill_opacity: 0.0,
                class_name: strokes::DOT_CLASS,
            },
        },
    ])
}

/// Map-library capability the composite is drawn with
pub trait MapRenderer {
    type Layer;

    fn marker(&mut self, at: LatLng, icon: &IconSpec) -> Self::Layer;
    fn dot(&mut self, at: LatLng, style: &DotStyle) -> Self::Layer;
    /// Starts an asynchronous track load
    fn track(&mut self, track: &TrackRef, style: &PathStyle, start_icon: Option<&IconSpec>) -> Self::Layer;
    /// Group layers; later layers draw on top
    fn group(&mut self, layers: Vec<Self::Layer>) -> Self::Layer;
    fn bind_popup(&mut self, layer: &Self::Layer, html: &str);
}

/// Compose and draw one trail group
pub fn render_trail_group<R: MapRenderer>(
    renderer: &mut R,
    group: &TrailVisitGroup,
    options: &RenderOptions<'_>,
) -> Option<R::Layer> {
    let composite = compose_trail_group(group, options)?;
    Some(draw_composite(renderer, &composite))
}

pub fn draw_composite<R: MapRenderer>(renderer: &mut R, composite: &TrailComposite) -> R::Layer {
    let layers: Vec<R::Layer> = composite
        .layers
        .iter()
        .map(|spec| match spec {
            LayerSpec::Marker { at, icon } => renderer.marker(*at, icon),
            LayerSpec::Dot { at, style } => renderer.dot(*at, style),
            LayerSpec::Path {
                track,
                style,
                start_icon,
            } => renderer.track(track, style, start_icon.as_ref()),
        })
        .collect();

    let group = renderer.group(layers);
    if let Some(html) = &composite.popup_html {
        renderer.bind_popup(&group, html);
    }
    group
}

/// Geographic bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl TrackBounds {
    pub fn point(at: LatLng) -> Self {
        Self {
            south: at.lat,
            west: at.lng,
            north: at.lat,
            east: at.lng,
        }
    }

    pub fn extend(&mut self, at: LatLng) {
        self.south = self.south.min(at.lat);
        self.north = self.north.max(at.lat);
        self.west = self.west.min(at.lng);
        self.east = self.east.max(at.lng);
    }

    pub fn union(self, other: TrackBounds) -> Self {
        Self {
            south: self.south.min(other.south),
            west: self.west.min(other.west),
            north: self.north.max(other.north),
            east: self.east.max(other.east),
        }
    }

    /// Bounds of a point sequence; None when empty
    pub fn of_points(points: impl IntoIterator<Item = LatLng>) -> Option<Self> {
        let mut iter = points.into_iter();
        let mut bounds = TrackBounds::point(iter.next()?);
        for at in iter {
            bounds.extend(at);
        }
        Some(bounds)
    }
}

/// Where track files come from
#[allow(async_fn_in_trait)]
pub trait TrackSource {
    async fn load(&self, track: &TrackRef) -> Result<TrackBounds, AtlasError>;
}

/// A composite after every track load resolved
#[derive(Debug, Clone, PartialEq)]
pub struct SettledComposite {
    /// Surviving layers, draw order preserved
    pub layers: Vec<LayerSpec>,
    /// Visits whose track could not be loaded
    pub dropped: Vec<HikeId>,
    pub bounds: Option<TrackBounds>,
}

/// Load every track of `composite` concurrently and wait for all of them.
/// Failed visits are dropped and logged; they never fail the group.
pub async fn settle<S: TrackSource>(source: &S, composite: &TrailComposite) -> SettledComposite {
    let loads = composite.layers.iter().map(|spec| async move {
        match spec {
            LayerSpec::Path { track, .. } => source.load(track).await,
            LayerSpec::Marker { at, .. } | LayerSpec::Dot { at, .. } => Ok(TrackBounds::point(*at)),
        }
    });
    let results = join_all(loads).await;

    let mut layers = Vec::with_capacity(results.len());
    let mut dropped = Vec::new();
    let mut bounds: Option<TrackBounds> = None;

    for (spec, result) in composite.layers.iter().zip(results) {
        match result {
            Ok(b) => {
                bounds = Some(bounds.map_or(b, |acc| acc.union(b)));
                layers.push(spec.clone());
            }
            Err(e) => {
                warn!(trail = %composite.trail_name, error = %e, "Dropping visit with unloadable track");
                if let Some(track) = spec.track() {
                    dropped.push(track.hike_id.clone());
                }
            }
        }
    }

    debug!(
        trail = %composite.trail_name,
        layers = layers.len(),
        dropped = dropped.len(),
        "Trail group settled"
    );

    SettledComposite {
        layers,
        dropped,
        bounds,
    }
}

/// Popup body listing every visit to the trail
pub fn visit_summary_html(visits: &[HikeRecord]) -> String {
    let Some(latest) = visits.iter().max_by_key(|v| v.date_completed) else {
        return String::new();
    };

    let mut html = format!("<b>{}</b>", escape_html(&latest.trail_name));
    if visits.len() > 1 {
        let _ = write!(html, "<br><small>Visited {} times</small>", visits.len());
    }
    html.push_str("<ul class=\"visit-list\">");
    let mut ordered: Vec<&HikeRecord> = visits.iter().collect();
    ordered.sort_by(|a, b| b.date_completed.cmp(&a.date_completed));
    for visit in ordered {
        let _ = write!(
            html,
            "<li><a href=\"hike.html?id={}\">{}</a></li>",
            urlencoding::encode(&visit.id),
            format_short(visit.date_completed)
        );
    }
    html.push_str("</ul>");
    html
}

pub(crate) fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
