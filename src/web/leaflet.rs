//! Leaflet bindings and the map renderer built on them
//!
//! Track layers come from the leaflet-gpx plugin (`L.GPX`). Each track layer
//! registers a promise that settles on its `loaded`/`error` event, so
//! `LeafletTracks` can wait for every load of a group.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::Serialize;
use tracing::{error, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use super::WarnOnErr;
use crate::core::trail::{DotStyle, IconSpec, PathStyle};
use crate::core::{AtlasError, HikeId, LatLng, MapRenderer, TrackBounds, TrackRef, TrackSource};

pub const MAIN_TRAIL_PANE: &str = "mainTrailPane";
const MAIN_TRAIL_PANE_Z: &str = "450";
const TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
const TILE_ATTRIBUTION: &str =
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors";

#[wasm_bindgen]
extern "C" {
    pub type LeafletMap;

    #[wasm_bindgen(js_namespace = L, js_name = map)]
    fn leaflet_map(element_id: &str) -> LeafletMap;

    #[wasm_bindgen(method, js_name = setView)]
    fn set_view(this: &LeafletMap, center: &JsValue, zoom: u8) -> LeafletMap;

    #[wasm_bindgen(method, js_name = createPane)]
    fn create_pane(this: &LeafletMap, name: &str) -> web_sys::HtmlElement;

    #[wasm_bindgen(method, js_name = fitBounds)]
    fn fit_bounds(this: &LeafletMap, bounds: &JsValue);

    #[derive(Clone)]
    pub type Layer;

    #[wasm_bindgen(method, js_name = addTo)]
    fn add_to(this: &Layer, map: &LeafletMap) -> Layer;

    #[wasm_bindgen(method, js_name = bindPopup)]
    fn bind_popup(this: &Layer, html: &str) -> Layer;

    #[wasm_bindgen(method, js_name = removeLayer)]
    fn remove_layer(this: &Layer, layer: &Layer) -> Layer;

    #[wasm_bindgen(method)]
    fn on(this: &Layer, event: &str, handler: &js_sys::Function) -> Layer;

    #[wasm_bindgen(method, js_name = getBounds)]
    fn get_bounds(this: &Layer) -> LatLngBounds;

    pub type LatLngBounds;

    #[wasm_bindgen(method, js_name = isValid)]
    fn is_valid(this: &LatLngBounds) -> bool;
    #[wasm_bindgen(method, js_name = getSouth)]
    fn get_south(this: &LatLngBounds) -> f64;
    #[wasm_bindgen(method, js_name = getWest)]
    fn get_west(this: &LatLngBounds) -> f64;
    #[wasm_bindgen(method, js_name = getNorth)]
    fn get_north(this: &LatLngBounds) -> f64;
    #[wasm_bindgen(method, js_name = getEast)]
    fn get_east(this: &LatLngBounds) -> f64;

    #[wasm_bindgen(js_namespace = L, js_name = tileLayer)]
    fn tile_layer(url: &str, options: &JsValue) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = marker)]
    fn marker(at: &JsValue, options: &JsValue) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = icon)]
    fn icon(options: &JsValue) -> JsValue;

    #[wasm_bindgen(js_namespace = L, js_name = circleMarker)]
    fn circle_marker(at: &JsValue, options: &JsValue) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = featureGroup)]
    fn feature_group(layers: &js_sys::Array) -> Layer;
}

/// Leaflet map mounted on `element_id`, with tiles and the raised trail pane
pub fn create_map(element_id: &str, center: LatLng, zoom: u8) -> LeafletMap {
    let map = leaflet_map(element_id);
    map.set_view(&lat_lng(center), zoom);

    let tile_options = to_js(&TileOptions {
        max_zoom: 19,
        attribution: TILE_ATTRIBUTION,
    });
    tile_layer(TILE_URL, &tile_options).add_to(&map);

    let pane = map.create_pane(MAIN_TRAIL_PANE);
    if let Err(e) = pane.style().set_property("z-index", MAIN_TRAIL_PANE_Z) {
        warn!(?e, "Could not raise main trail pane");
    }
    map
}

pub fn add_to_map(layer: &Layer, map: &LeafletMap) {
    layer.add_to(map);
}

pub fn remove_from_group(group: &Layer, layer: &Layer) {
    group.remove_layer(layer);
}

pub fn fit_map(map: &LeafletMap, bounds: TrackBounds) {
    let corners = js_sys::Array::of2(
        &lat_lng(LatLng {
            lat: bounds.south,
            lng: bounds.west,
        }),
        &lat_lng(LatLng {
            lat: bounds.north,
            lng: bounds.east,
        }),
    );
    map.fit_bounds(&corners);
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TileOptions {
    max_zoom: u8,
    attribution: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IconOptions<'a> {
    icon_url: &'a str,
    icon_size: [u32; 2],
    icon_anchor: [i32; 2],
    popup_anchor: [i32; 2],
    class_name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CircleOptions {
    radius: f64,
    fill_color: &'static str,
    fill_opacity: f64,
    stroke: bool,
    class_name: &'static str,
}

#[derive(Serialize)]
struct PolylineOptions {
    color: &'static str,
    weight: f64,
    opacity: f64,
    interactive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pane: Option<&'static str>,
}

#[derive(Serialize)]
struct GpxOptions {
    #[serde(rename = "async")]
    load_async: bool,
    gpx_options: GpxParseOptions,
    polyline_options: PolylineOptions,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GpxParseOptions {
    parse_elements: [&'static str; 1],
}

fn to_js<T: Serialize>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or_else(|e| {
        error!(error = %e, "Failed to convert Leaflet options");
        JsValue::UNDEFINED
    })
}

fn lat_lng(at: LatLng) -> JsValue {
    js_sys::Array::of2(&at.lat.into(), &at.lng.into()).into()
}

fn leaflet_icon(spec: &IconSpec) -> JsValue {
    icon(&to_js(&IconOptions {
        icon_url: &spec.url,
        icon_size: spec.size,
        icon_anchor: spec.anchor,
        popup_anchor: spec.popup_anchor,
        class_name: &spec.class_name,
    }))
}

/// `new L.GPX(url, options)` through reflection, the plugin has no typings
fn new_gpx_layer(url: &str, options: &JsValue) -> Result<Layer, JsValue> {
    let leaflet = js_sys::Reflect::get(&js_sys::global(), &"L".into())?;
    let ctor: js_sys::Function = js_sys::Reflect::get(&leaflet, &"GPX".into())?.dyn_into()?;
    let args = js_sys::Array::of2(&url.into(), options);
    Ok(js_sys::Reflect::construct(&ctor, &args)?.unchecked_into())
}

/// Settles once the layer fires `loaded` or `error`
fn load_promise(layer: &Layer) -> js_sys::Promise {
    js_sys::Promise::new(&mut |resolve, reject| {
        let on_loaded = Closure::once_into_js(move |_e: JsValue| {
            resolve.call0(&JsValue::NULL).warn_on_err("resolve track load");
        });
        layer.on("loaded", on_loaded.unchecked_ref());

        let on_error = Closure::once_into_js(move |e: JsValue| {
            reject.call1(&JsValue::NULL, &e).warn_on_err("reject track load");
        });
        layer.on("error", on_error.unchecked_ref());
    })
}

type TrackRegistry = Rc<RefCell<HashMap<HikeId, (Layer, js_sys::Promise)>>>;

/// `MapRenderer` producing Leaflet layers
#[derive(Default)]
pub struct LeafletRenderer {
    tracks: TrackRegistry,
}

impl LeafletRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track source resolving the loads this renderer started
    pub fn track_source(&self) -> LeafletTracks {
        LeafletTracks {
            tracks: self.tracks.clone(),
        }
    }

    pub fn track_layer(&self, hike_id: &str) -> Option<Layer> {
        self.tracks.borrow().get(hike_id).map(|(layer, _)| layer.clone())
    }
}

impl MapRenderer for LeafletRenderer {
    type Layer = Layer;

    fn marker(&mut self, at: LatLng, icon: &IconSpec) -> Layer {
        let options = js_sys::Object::new();
        js_sys::Reflect::set(&options, &"icon".into(), &leaflet_icon(icon)).warn_on_err("marker icon");
        marker(&lat_lng(at), &options)
    }

    fn dot(&mut self, at: LatLng, style: &DotStyle) -> Layer {
        circle_marker(
            &lat_lng(at),
            &to_js(&CircleOptions {
                radius: style.radius,
                fill_color: style.fill_color,
                fill_opacity: style.fill_opacity,
                stroke: false,
                class_name: style.class_name,
            }),
        )
    }

    fn track(&mut self, track: &TrackRef, style: &PathStyle, start_icon: Option<&IconSpec>) -> Layer {
        let options = to_js(&GpxOptions {
            load_async: true,
            gpx_options: GpxParseOptions {
                parse_elements: ["track"],
            },
            polyline_options: PolylineOptions {
                color: style.color,
                weight: style.weight,
                opacity: style.opacity,
                interactive: style.interactive,
                pane: style.raised.then_some(MAIN_TRAIL_PANE),
            },
        });

        // Ghosts carry no start/end markers
        let marker_options = js_sys::Object::new();
        let start = start_icon.map(leaflet_icon).unwrap_or(JsValue::NULL);
        js_sys::Reflect::set(&marker_options, &"startIcon".into(), &start).warn_on_err("start icon");
        js_sys::Reflect::set(&marker_options, &"startIconUrl".into(), &JsValue::NULL).warn_on_err("gpx marker options");
        js_sys::Reflect::set(&marker_options, &"endIconUrl".into(), &JsValue::NULL).warn_on_err("gpx marker options");
        js_sys::Reflect::set(&marker_options, &"shadowUrl".into(), &JsValue::NULL).warn_on_err("gpx marker options");
        js_sys::Reflect::set(&options, &"marker_options".into(), &marker_options).warn_on_err("gpx marker options");

        let url = track.url();
        let (layer, promise) = match new_gpx_layer(&url, &options) {
            Ok(layer) => {
                let promise = load_promise(&layer);
                (layer, promise)
            }
            Err(e) => {
                error!(url = %url, ?e, "Could not create GPX layer");
                (feature_group(&js_sys::Array::new()), js_sys::Promise::reject(&e))
            }
        };
        self.tracks
            .borrow_mut()
            .insert(track.hike_id.clone(), (layer.clone(), promise));
        layer
    }

    fn group(&mut self, layers: Vec<Layer>) -> Layer {
        let array = js_sys::Array::new();
        for layer in layers {
            array.push(&layer);
        }
        feature_group(&array)
    }

    fn bind_popup(&mut self, layer: &Layer, html: &str) {
        layer.bind_popup(html);
    }
}

/// Waits on track layers started by a `LeafletRenderer`
pub struct LeafletTracks {
    tracks: TrackRegistry,
}

impl TrackSource for LeafletTracks {
    async fn load(&self, track: &TrackRef) -> Result<TrackBounds, AtlasError> {
        let failed = |reason: String| AtlasError::TrackLoad {
            file: track.file.clone(),
            reason,
        };

        let entry = self.tracks.borrow().get(&track.hike_id).cloned();
        let (layer, promise) = entry.ok_or_else(|| failed("layer was never created".into()))?;

        JsFuture::from(promise)
            .await
            .map_err(|e| failed(format!("{e:?}")))?;

        let bounds = layer.get_bounds();
        if !bounds.is_valid() {
            return Err(failed("track has no points".into()));
        }
        Ok(TrackBounds {
            south: bounds.get_south(),
            west: bounds.get_west(),
            north: bounds.get_north(),
            east: bounds.get_east(),
        })
    }
}
