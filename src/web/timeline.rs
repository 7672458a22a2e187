//! DOM timeline: markers, trip capsules, hover expansion and scroll effects

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, HtmlElement, ScrollBehavior, ScrollToOptions};

use super::timers::{request_frame, BrowserTimers};
use super::WarnOnErr;
use crate::core::calendar::{format_short, Season};
use crate::core::trail::escape_html;
use crate::core::viewport::TooltipAlign;
use crate::core::{
    CapsuleId, HikeRecord, HoverBoard, HoverEffect, HoverState, MarkerPosition, ScrollMode, ScrollThrottle, Timeline,
    TimelineConfig, TimelineLayout, TimerHandle, ViewportController,
};

const DATE_LABEL_ID: &str = "timeline-current-date";

pub type SelectFn = Rc<dyn Fn(String)>;

struct ViewState {
    window: web_sys::Window,
    container: Element,
    capsules: Vec<Element>,
    layout: TimelineLayout,
    hover: HoverBoard,
    timers: BrowserTimers,
    viewport: ViewportController,
    throttle: ScrollThrottle,
}

pub struct TimelineView {
    state: Rc<RefCell<ViewState>>,
}

impl TimelineView {
    /// Render the timeline into `container` and wire its events
    pub fn mount(
        window: web_sys::Window,
        container: Element,
        records: &[HikeRecord],
        timeline: &Timeline,
        config: &TimelineConfig,
        on_select: SelectFn,
    ) -> Result<Self, JsValue> {
        let layout = timeline.layout.clone();
        container.set_inner_html(&timeline_html(&layout, records));

        let capsules = (0..layout.capsules.len())
            .filter_map(|i| {
                container
                    .query_selector(&format!("[data-capsule=\"{i}\"]"))
                    .ok()
                    .flatten()
            })
            .collect::<Vec<_>>();

        let viewport = ViewportController::new(layout.geometry, container.client_width() as f64, config);
        let hover = HoverBoard::new(&layout, config);

        let state = Rc::new_cyclic(|weak: &Weak<RefCell<ViewState>>| {
            let weak = weak.clone();
            let on_fired = Rc::new(move |handle: TimerHandle, capsule: CapsuleId| {
                if let Some(state) = weak.upgrade() {
                    let mut st = state.borrow_mut();
                    let effect = st.hover.fire(capsule, handle);
                    st.apply(capsule, effect);
                }
            });
            RefCell::new(ViewState {
                window: window.clone(),
                container: container.clone(),
                capsules,
                layout,
                hover,
                timers: BrowserTimers::new(window.clone(), on_fired),
                viewport,
                throttle: ScrollThrottle::new(),
            })
        });

        let view = Self { state };
        view.wire_clicks(on_select)?;
        view.wire_hover()?;
        view.wire_scroll()?;
        view.wire_tooltips()?;

        debug!(markers = view.state.borrow().layout.marker_count(), "Timeline mounted");
        Ok(view)
    }

    /// Mark `hike_id` as the displayed hike
    pub fn set_active(&self, hike_id: Option<&str>) {
        let st = self.state.borrow();
        if let Ok(Some(prev)) = st.container.query_selector(".timeline-dot.active") {
            prev.class_list().remove_1("active").warn_on_err("clear active dot");
        }
        if let Some(id) = hike_id {
            let selector = format!(".timeline-dot[data-hike-id=\"{}\"]", css_escape(id));
            if let Ok(Some(dot)) = st.container.query_selector(&selector) {
                dot.class_list().add_1("active").warn_on_err("mark active dot");
            }
        }
    }

    pub fn center_on(&self, hike_id: &str, mode: ScrollMode) {
        let mut st = self.state.borrow_mut();
        let width = st.container.client_width() as f64;
        st.viewport.set_viewport_width(width);
        let Some(request) = st.viewport.center_on_hike(&st.layout, hike_id, mode) else {
            return;
        };

        let options = ScrollToOptions::new();
        options.set_left(request.offset_px);
        options.set_behavior(match request.mode {
            ScrollMode::Instant => ScrollBehavior::Instant,
            ScrollMode::Smooth => ScrollBehavior::Smooth,
        });
        st.container.scroll_to_with_scroll_to_options(&options);
        trace!(hike = %hike_id, offset = request.offset_px, "Centered timeline");
    }

    fn wire_clicks(&self, on_select: SelectFn) -> Result<(), JsValue> {
        let container = self.state.borrow().container.clone();
        let on_click = Closure::wrap(Box::new(move |e: Event| {
            let id = target_element(&e)
                .and_then(|el| el.closest(".timeline-dot").ok().flatten())
                .and_then(|dot| dot.get_attribute("data-hike-id"));
            if let Some(id) = id {
                on_select(id);
            }
        }) as Box<dyn FnMut(Event)>);
        container.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
        on_click.forget();
        Ok(())
    }

    fn wire_hover(&self) -> Result<(), JsValue> {
        let capsules = self.state.borrow().capsules.clone();
        for (id, element) in capsules.into_iter().enumerate() {
            let state = self.state.clone();
            let on_enter = Closure::wrap(Box::new(move |_e: Event| {
                let mut guard = state.borrow_mut();
                let st = &mut *guard;
                let effect = st.hover.enter(id, &mut st.timers);
                st.apply(id, effect);
            }) as Box<dyn FnMut(Event)>);
            element.add_event_listener_with_callback("mouseenter", on_enter.as_ref().unchecked_ref())?;
            on_enter.forget();

            let state = self.state.clone();
            let on_leave = Closure::wrap(Box::new(move |_e: Event| {
                let mut guard = state.borrow_mut();
                let st = &mut *guard;
                let effect = st.hover.leave(id, &mut st.timers);
                st.apply(id, effect);
            }) as Box<dyn FnMut(Event)>);
            element.add_event_listener_with_callback("mouseleave", on_leave.as_ref().unchecked_ref())?;
            on_leave.forget();
        }
        Ok(())
    }

    fn wire_scroll(&self) -> Result<(), JsValue> {
        let container = self.state.borrow().container.clone();
        let state = self.state.clone();
        let on_scroll = Closure::wrap(Box::new(move |_e: Event| {
            let mut st = state.borrow_mut();
            let offset = st.container.scroll_left() as f64;
            if !st.throttle.on_scroll(offset) {
                return;
            }
            let window = st.window.clone();
            drop(st);

            let state = state.clone();
            request_frame(&window, move || {
                let mut st = state.borrow_mut();
                if let Some(offset) = st.throttle.on_frame() {
                    st.on_scroll_settled(offset);
                }
            });
        }) as Box<dyn FnMut(Event)>);
        container.add_event_listener_with_callback("scroll", on_scroll.as_ref().unchecked_ref())?;
        on_scroll.forget();

        // initial season/date before any scroll
        let mut st = self.state.borrow_mut();
        let offset = st.container.scroll_left() as f64;
        st.on_scroll_settled(offset);
        Ok(())
    }

    fn wire_tooltips(&self) -> Result<(), JsValue> {
        let container = self.state.borrow().container.clone();
        let state = self.state.clone();
        let on_over = Closure::wrap(Box::new(move |e: Event| {
            let Some(dot) = target_element(&e).and_then(|el| el.closest(".timeline-dot").ok().flatten()) else {
                return;
            };
            let Ok(Some(tooltip)) = dot.query_selector(".timeline-tooltip") else {
                return;
            };
            state.borrow().place_tooltip(&dot, &tooltip);
        }) as Box<dyn FnMut(Event)>);
        container.add_event_listener_with_callback("mouseover", on_over.as_ref().unchecked_ref())?;
        on_over.forget();
        Ok(())
    }
}

impl ViewState {
    fn apply(&self, capsule: CapsuleId, effect: HoverEffect) {
        let Some(element) = self.capsules.get(capsule) else {
            return;
        };
        let expanded = self
            .hover
            .capsule(capsule)
            .is_some_and(|c| c.state() != HoverState::Collapsed);
        element.class_list().toggle_with_force("expanded", expanded).warn_on_err("toggle expanded");

        let HoverEffect::Reposition(positions) = effect else {
            return;
        };
        let Ok(dots) = element.query_selector_all(".timeline-dot") else {
            return;
        };
        for (i, left) in positions.iter().enumerate() {
            let dot = dots.get(i as u32).and_then(|n| n.dyn_into::<HtmlElement>().ok());
            if let Some(dot) = dot {
                dot.style().set_property("left", &format!("{left}px")).warn_on_err("move dot");
            }
        }
    }

    fn on_scroll_settled(&mut self, offset: f64) {
        let width = self.container.client_width() as f64;
        self.viewport.set_viewport_width(width);
        let settled = self.viewport.settle(offset);

        let classes = self.container.class_list();
        for season in Season::ALL {
            classes.remove_1(season.css_class()).warn_on_err("clear season");
        }
        classes.add_1(settled.season.css_class()).warn_on_err("set season");

        if let Some(container) = self.container.dyn_ref::<HtmlElement>() {
            container
                .style()
                .set_property("background-position-x", &format!("{}px", -settled.parallax_offset_px))
                .warn_on_err("parallax offset");
        }

        let label = self
            .window
            .document()
            .and_then(|d| d.get_element_by_id(DATE_LABEL_ID));
        if let Some(label) = label {
            label.set_text_content(Some(&format_short(settled.date)));
        }
    }

    fn place_tooltip(&self, dot: &Element, tooltip: &Element) {
        let frame = self.container.get_bounding_client_rect();
        let dot_rect = dot.get_bounding_client_rect();
        let dot_left = dot_rect.left() - frame.left();
        let anchor = dot_left + dot_rect.width() / 2.0;
        let width = tooltip.get_bounding_client_rect().width();

        let placement = self.viewport.place_tooltip(anchor, width);
        let classes = tooltip.class_list();
        classes
            .toggle_with_force("align-start", placement.align == TooltipAlign::Start)
            .warn_on_err("tooltip align");
        classes
            .toggle_with_force("align-end", placement.align == TooltipAlign::End)
            .warn_on_err("tooltip align");
        if let Some(tooltip) = tooltip.dyn_ref::<HtmlElement>() {
            tooltip
                .style()
                .set_property("left", &format!("{}px", placement.left_px - dot_left))
                .warn_on_err("tooltip left");
        }
    }
}

fn target_element(e: &Event) -> Option<Element> {
    e.target().and_then(|t| t.dyn_into::<Element>().ok())
}

/// Quote characters that would break an attribute selector
fn css_escape(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}

fn timeline_html(layout: &TimelineLayout, records: &[HikeRecord]) -> String {
    let by_id: HashMap<&str, &HikeRecord> = records.iter().map(|r| (r.id.as_str(), r)).collect();

    let mut html = format!(
        "<div class=\"timeline-track\" style=\"width: {}px;\">",
        layout.geometry.total_track_width_px
    );
    for marker in &layout.solos {
        push_dot(&mut html, marker, by_id.get(marker.hike_id.as_str()).copied());
    }
    for (i, capsule) in layout.capsules.iter().enumerate() {
        let _ = write!(
            html,
            "<div class=\"trip-capsule\" data-capsule=\"{}\" style=\"left: {}px; width: {}px;\">\
             <span class=\"trip-label\">{}</span>",
            i,
            capsule.left_px,
            capsule.width_px,
            escape_html(&capsule.trip_tag)
        );
        for child in &capsule.children {
            push_dot(&mut html, child, by_id.get(child.hike_id.as_str()).copied());
        }
        html.push_str("</div>");
    }
    html.push_str("</div>");
    html
}

fn push_dot(html: &mut String, marker: &MarkerPosition, record: Option<&HikeRecord>) {
    let edge = marker.edge.css_class().unwrap_or("");
    let name = record.map(|r| escape_html(&r.trail_name)).unwrap_or_default();
    let _ = write!(
        html,
        "<div class=\"timeline-dot {}\" style=\"left: {}px;\" data-hike-id=\"{}\">\
         <div class=\"timeline-tooltip\">{}<br><small>{}</small></div></div>",
        edge,
        marker.left_px,
        escape_html(&marker.hike_id),
        name,
        format_short(marker.date_key)
    );
}
