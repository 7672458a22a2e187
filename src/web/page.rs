//! Hike detail page: header, logbook, timeline and history wiring

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement, PopStateEvent};

use super::timeline::TimelineView;
use super::WarnOnErr;
use crate::core::calendar::format_short;
use crate::core::navigation::{hike_page_url, latest_hike, LogbookEntry};
use crate::core::trail::escape_html;
use crate::core::{AtlasSession, HistoryAction, PageState, Placeholder, ScrollMode, TimelineConfig};

const TITLE_ID: &str = "hike-title";
const DATE_ID: &str = "hike-date";
const LOCATION_ID: &str = "hike-location";
const LOGBOOK_SECTION_ID: &str = "hike-log";
const LOGBOOK_ID: &str = "logbook-container";
const LATEST_LINK_ID: &str = "latest-hike-link";
pub const TIMELINE_ID: &str = "timeline-nav-container";

struct DetailPage {
    window: web_sys::Window,
    document: Document,
    session: AtlasSession,
    timeline: Option<TimelineView>,
}

/// Point the "Latest Hike" nav link at the newest hike, or hide it
pub fn update_latest_link(document: &Document, session: &AtlasSession) {
    let Some(link) = document.get_element_by_id(LATEST_LINK_ID) else {
        return;
    };
    match latest_hike(session.records()) {
        Some(hike) => {
            link.set_attribute("href", &hike_page_url(&hike.id))
                .warn_on_err("latest link href");
        }
        None => hide(&link),
    }
}

/// Write placeholder text into the title/subtitle slots
pub fn show_placeholder(document: &Document, slots: &Placeholder) {
    set_text(document, TITLE_ID, &slots.title);
    set_text(document, DATE_ID, "");
    set_text(document, LOCATION_ID, &slots.subtitle);
}

pub fn open(
    window: web_sys::Window,
    document: Document,
    session: AtlasSession,
    config: &TimelineConfig,
) -> Result<(), JsValue> {
    let page = Rc::new(RefCell::new(DetailPage {
        window: window.clone(),
        document: document.clone(),
        session,
        timeline: None,
    }));

    let query = window.location().search()?;
    let (action, state) = page.borrow_mut().session.open_initial(&query);

    let container = document.get_element_by_id(TIMELINE_ID);
    let view = {
        let p = page.borrow();
        match (container, p.session.timeline()) {
            (Some(container), Some(timeline)) => {
                let weak = Rc::downgrade(&page);
                let on_select = Rc::new(move |id: String| {
                    if let Some(page) = weak.upgrade() {
                        select(&page, &id);
                    }
                });
                Some(TimelineView::mount(
                    window.clone(),
                    container,
                    p.session.records(),
                    timeline,
                    config,
                    on_select,
                )?)
            }
            _ => None,
        }
    };
    page.borrow_mut().timeline = view;

    {
        let p = page.borrow();
        p.apply_history(&action);
        p.render(&state, ScrollMode::Instant);
    }

    let weak = Rc::downgrade(&page);
    let on_pop = Closure::wrap(Box::new(move |e: PopStateEvent| {
        let Some(page) = weak.upgrade() else {
            return;
        };
        let requested = e.state().as_string();
        let state = page.borrow_mut().session.restore(requested.as_deref());
        debug!(?state, "History restored");
        page.borrow().render(&state, ScrollMode::Smooth);
    }) as Box<dyn FnMut(PopStateEvent)>);
    window.add_event_listener_with_callback("popstate", on_pop.as_ref().unchecked_ref())?;
    on_pop.forget();

    Ok(())
}

fn select(page: &Rc<RefCell<DetailPage>>, id: &str) {
    let result = page.borrow_mut().session.select(id);
    match result {
        Ok((action, state)) => {
            let p = page.borrow();
            p.apply_history(&action);
            p.render(&state, ScrollMode::Smooth);
        }
        Err(e) => warn!(error = %e, "Ignoring selection"),
    }
}

impl DetailPage {
    fn apply_history(&self, action: &HistoryAction) {
        let Ok(history) = self.window.history() else {
            return;
        };
        let result = match action {
            HistoryAction::Replace { hike_id } => {
                let state = hike_id.as_deref().map(JsValue::from_str).unwrap_or(JsValue::NULL);
                history.replace_state(&state, "")
            }
            HistoryAction::Push { hike_id, url } => {
                history.push_state_with_url(&JsValue::from_str(hike_id), "", Some(url.as_str()))
            }
            HistoryAction::None => Ok(()),
        };
        if let Err(e) = result {
            warn!(?e, "History update failed");
        }
    }

    fn render(&self, state: &PageState, mode: ScrollMode) {
        if let Some(view) = &self.timeline {
            view.set_active(state.hike_id());
            if let Some(id) = state.hike_id() {
                view.center_on(id, mode);
            }
        }

        if let Some(slots) = state.placeholder() {
            show_placeholder(&self.document, &slots);
            self.render_logbook(&[]);
            return;
        }

        if let Some(header) = self.session.header() {
            set_text(&self.document, TITLE_ID, &header.title);
            set_text(&self.document, DATE_ID, &header.date_line);
            set_text(&self.document, LOCATION_ID, &header.location_line);
        }
        self.render_logbook(&self.session.logbook());
    }

    fn render_logbook(&self, entries: &[LogbookEntry]) {
        let Some(section) = self.document.get_element_by_id(LOGBOOK_SECTION_ID) else {
            return;
        };
        if entries.is_empty() {
            hide(&section);
            return;
        }
        if let Some(section) = section.dyn_ref::<HtmlElement>() {
            section.style().set_property("display", "block").warn_on_err("show logbook");
        }

        let html: String = entries.iter().map(logbook_entry_html).collect();
        if let Ok(Some(container)) = section.query_selector(&format!("#{LOGBOOK_ID}")) {
            container.set_inner_html(&html);
        }
    }
}

fn logbook_entry_html(entry: &LogbookEntry) -> String {
    let notes = entry
        .notes
        .as_deref()
        .map(|n| format!("<div class=\"notes\">{}</div>", escape_html(n)))
        .unwrap_or_default();
    let inner = format!(
        "<div class=\"date\">{}</div><p class=\"meta\">{}</p>{}",
        format_short(entry.date),
        escape_html(&entry.meta),
        notes
    );
    match entry.href() {
        Some(href) => format!("<a href=\"{}\" class=\"log-entry\">{}</a>", href, inner),
        None => format!("<div class=\"log-entry current-hike\">{}</div>", inner),
    }
}

fn set_text(document: &Document, id: &str, text: &str) {
    if let Some(el) = document.get_element_by_id(id) {
        el.set_text_content(Some(text));
    }
}

fn hide(element: &web_sys::Element) {
    if let Some(el) = element.dyn_ref::<HtmlElement>() {
        el.style().set_property("display", "none").warn_on_err("hide element");
    }
}
