//! Browser implementation of [`Page`] on top of `web-sys`.
//!
//! Listener closures, observers and timers are leaked with `forget()`: the
//! effects live exactly as long as the document does. A rejected DOM call is
//! logged and otherwise ignored so one broken element cannot take the rest
//! of the page down with it.
//!
//! Dictionary arguments (`ScrollToOptions`, `IntersectionObserverInit`, ...)
//! are built as plain objects; the setter names on the generated bindings
//! have changed between `web-sys` releases, the object shape has not.

use std::rc::Rc;
use std::time::Duration;

use futures::future::LocalBoxFuture;
use gloo_timers::callback::Timeout;
use js_sys::{Array, Function, Object, Reflect};
use wasm_bindgen::{JsCast, JsValue, closure::Closure};
use web_sys::{
    AddEventListenerOptions, Document, Event, EventTarget, FormData, HtmlElement, HtmlFormElement,
    IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit, MediaQueryList, ScrollToOptions, Window,
};

use super::*;
use crate::config::{CONFIG_ELEMENT_ID, Config};
use crate::effects;

const DARK_QUERY: &str = "(prefers-color-scheme: dark)";

fn report<T>(result: Result<T, JsValue>, action: &str) {
    if let Err(err) = result {
        log::warn!("{action} failed: {err:?}");
    }
}

fn js_error(err: JsValue) -> PlatformError {
    PlatformError::Js(format!("{err:?}"))
}

fn millis(delay: Duration) -> u32 {
    u32::try_from(delay.as_millis()).unwrap_or(u32::MAX)
}

/// Plain object with the given properties.
fn dictionary(entries: &[(&str, JsValue)]) -> Object {
    let object = Object::new();
    for (key, value) in entries {
        report(Reflect::set(&object, &JsValue::from_str(key), value), "dictionary property");
    }
    object
}

fn has_property(target: &JsValue, name: &str) -> bool {
    target.is_object() && Reflect::has(target, &JsValue::from_str(name)).unwrap_or(false)
}

fn number(target: &JsValue, name: &str) -> Option<f64> {
    match Reflect::get(target, &JsValue::from_str(name)) {
        Ok(value) => value.as_f64(),
        Err(_) => None,
    }
}

fn call_method(target: &JsValue, name: &str, args: &Array) -> Result<JsValue, JsValue> {
    let method = Reflect::get(target, &JsValue::from_str(name))?.dyn_into::<Function>()?;
    Reflect::apply(&method, target, args)
}

fn vital_entry(entry: &JsValue) -> VitalEntry {
    VitalEntry {
        start_time: number(entry, "startTime").unwrap_or(0.0),
        render_time: number(entry, "renderTime"),
        load_time: number(entry, "loadTime"),
        processing_start: number(entry, "processingStart"),
    }
}

/// Register `handler` for `event` on `target` for the rest of the page.
fn listen(target: &EventTarget, event: &str, passive: bool, handler: Box<dyn FnMut(Event)>) -> Result<(), JsValue> {
    let closure = Closure::wrap(handler);
    let callback: &Function = closure.as_ref().unchecked_ref();
    if passive {
        let options: AddEventListenerOptions = dictionary(&[("passive", JsValue::from_bool(true))]).unchecked_into();
        target.add_event_listener_with_callback_and_add_event_listener_options(event, callback, &options)?;
    } else {
        target.add_event_listener_with_callback(event, callback)?;
    }
    closure.forget();
    Ok(())
}

fn as_element<T: JsCast>(value: T) -> Option<WebElement> {
    match value.dyn_into::<web_sys::Element>() {
        Ok(element) => Some(WebElement(element)),
        Err(_) => None,
    }
}

fn click_listener(handler: ClickHandler<WebElement>) -> Box<dyn FnMut(Event)> {
    Box::new(move |event: Event| {
        let target = event.target().and_then(as_element);
        if handler(&ClickEvent { target }) == Navigation::Prevent {
            event.prevent_default();
        }
    })
}

/// A DOM element. Layout and style calls need an `HTMLElement`; on other
/// elements (SVG) they read as zero and write nothing.
#[derive(Clone, Debug)]
pub struct WebElement(web_sys::Element);

impl WebElement {
    fn html(&self) -> Option<&HtmlElement> {
        self.0.dyn_ref::<HtmlElement>()
    }
}

impl Element for WebElement {
    fn attribute(&self, name: &str) -> Option<String> {
        self.0.get_attribute(name)
    }

    fn set_attribute(&self, name: &str, value: &str) {
        report(self.0.set_attribute(name, value), "setAttribute");
    }

    fn remove_attribute(&self, name: &str) {
        report(self.0.remove_attribute(name), "removeAttribute");
    }

    fn has_class(&self, class: &str) -> bool {
        self.0.class_list().contains(class)
    }

    fn add_class(&self, class: &str) {
        report(self.0.class_list().add_1(class), "classList.add");
    }

    fn remove_class(&self, class: &str) {
        report(self.0.class_list().remove_1(class), "classList.remove");
    }

    fn toggle_class(&self, class: &str) -> bool {
        match self.0.class_list().toggle(class) {
            Ok(present) => present,
            Err(err) => {
                log::warn!("classList.toggle failed: {err:?}");
                self.has_class(class)
            }
        }
    }

    fn set_class_name(&self, value: &str) {
        self.0.set_class_name(value);
    }

    fn set_style(&self, property: &str, value: &str) {
        if let Some(html) = self.html() {
            report(html.style().set_property(property, value), "style.setProperty");
        }
    }

    fn text(&self) -> Option<String> {
        self.0.text_content()
    }

    fn set_text(&self, text: &str) {
        self.0.set_text_content(Some(text));
    }

    fn offset_top(&self) -> f64 {
        self.html().map_or(0.0, |html| f64::from(html.offset_top()))
    }

    fn offset_height(&self) -> f64 {
        self.html().map_or(0.0, |html| f64::from(html.offset_height()))
    }

    fn within(&self, selector: &str) -> bool {
        matches!(self.0.closest(selector), Ok(Some(_)))
    }

    fn append(&self, child: &Self) {
        report(self.0.append_child(&child.0), "appendChild");
    }

    fn remove(&self) {
        self.0.remove();
    }
}

pub struct WebPage {
    window: Window,
    document: Document,
}

impl WebPage {
    /// `None` outside a browsing context (workers, SSR).
    pub fn new() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(Self { window, document })
    }

    fn dark_query(&self) -> Option<MediaQueryList> {
        match self.window.match_media(DARK_QUERY) {
            Ok(query) => query,
            Err(err) => {
                log::debug!("matchMedia unavailable: {err:?}");
                None
            }
        }
    }

    fn supports_native_lazy_loading(&self) -> bool {
        let Ok(image) = Reflect::get(&self.window, &JsValue::from_str("HTMLImageElement")) else {
            return false;
        };
        let Ok(prototype) = Reflect::get(&image, &JsValue::from_str("prototype")) else {
            return false;
        };
        has_property(&prototype, "loading")
    }

    /// Run `ready` once the DOM is parsed, immediately if it already is.
    fn when_ready(self: Rc<Self>, ready: impl FnOnce(Rc<Self>) + 'static) {
        if self.document.ready_state() != "loading" {
            ready(self);
            return;
        }
        let document = self.document.clone();
        let callback = Closure::once_into_js(move || ready(self));
        report(
            document.add_event_listener_with_callback("DOMContentLoaded", callback.unchecked_ref()),
            "DOMContentLoaded listener",
        );
    }
}

impl Page for WebPage {
    type Element = WebElement;

    fn element_by_id(&self, id: &str) -> Option<WebElement> {
        self.document.get_element_by_id(id).map(WebElement)
    }

    fn query(&self, selector: &str) -> Option<WebElement> {
        match self.document.query_selector(selector) {
            Ok(found) => found.map(WebElement),
            Err(err) => {
                log::debug!("invalid selector {selector:?}: {err:?}");
                None
            }
        }
    }

    fn query_all(&self, selector: &str) -> Vec<WebElement> {
        let list = match self.document.query_selector_all(selector) {
            Ok(list) => list,
            Err(err) => {
                log::debug!("invalid selector {selector:?}: {err:?}");
                return Vec::new();
            }
        };
        (0..list.length())
            .filter_map(|index| list.item(index))
            .filter_map(as_element)
            .collect()
    }

    fn body(&self) -> Option<WebElement> {
        self.document.body().map(|body| WebElement(body.into()))
    }

    fn create_element(&self, tag: &str) -> Option<WebElement> {
        match self.document.create_element(tag) {
            Ok(element) => Some(WebElement(element)),
            Err(err) => {
                log::warn!("createElement({tag}) failed: {err:?}");
                None
            }
        }
    }

    fn scroll_offset(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn smooth_scroll_to(&self, top: f64) {
        let options: ScrollToOptions =
            dictionary(&[("top", JsValue::from_f64(top)), ("behavior", JsValue::from_str("smooth"))]).unchecked_into();
        self.window.scroll_to_with_scroll_to_options(&options);
    }

    fn on_scroll(&self, handler: Box<dyn Fn()>) {
        report(listen(&self.window, "scroll", true, Box::new(move |_| handler())), "scroll listener");
    }

    fn on_click(&self, target: &WebElement, handler: ClickHandler<WebElement>) {
        report(listen(&target.0, "click", false, click_listener(handler)), "click listener");
    }

    fn on_document_click(&self, handler: ClickHandler<WebElement>) {
        report(listen(&self.document, "click", false, click_listener(handler)), "document click listener");
    }

    fn on_submit(&self, form: &WebElement, handler: SubmitHandler) {
        let listener = Box::new(move |event: Event| {
            if handler() == Navigation::Prevent {
                event.prevent_default();
            }
        });
        report(listen(&form.0, "submit", false, listener), "submit listener");
    }

    fn on_load(&self, handler: Box<dyn FnOnce()>) {
        if self.document.ready_state() == "complete" {
            Timeout::new(0, handler).forget();
            return;
        }
        let callback = Closure::once_into_js(move || handler());
        report(self.window.add_event_listener_with_callback("load", callback.unchecked_ref()), "load listener");
    }

    fn form_values(&self, form: &WebElement) -> FormFields {
        let mut fields = FormFields::new();
        let Some(form) = form.0.dyn_ref::<HtmlFormElement>() else {
            return fields;
        };
        let data = match FormData::new_with_form(form) {
            Ok(data) => data,
            Err(err) => {
                log::warn!("FormData failed: {err:?}");
                return fields;
            }
        };
        let Ok(Some(entries)) = js_sys::try_iter(&data) else {
            return fields;
        };
        for entry in entries.flatten() {
            let pair = Array::from(&entry);
            if let (Some(name), Some(value)) = (pair.get(0).as_string(), pair.get(1).as_string()) {
                fields.insert(name, value);
            }
        }
        fields
    }

    fn reset_form(&self, form: &WebElement) {
        if let Some(form) = form.0.dyn_ref::<HtmlFormElement>() {
            form.reset();
        }
    }

    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) {
        Timeout::new(millis(delay), callback).forget();
    }

    fn sleep(&self, delay: Duration) -> LocalBoxFuture<'static, ()> {
        Box::pin(gloo_timers::future::sleep(delay))
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }

    fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::IntersectionObserver => has_property(&self.window, "IntersectionObserver"),
            Capability::NativeLazyLoading => self.supports_native_lazy_loading(),
            Capability::PerformanceTiming => self.window.performance().is_some(),
            Capability::PerformanceObserver => has_property(&self.window, "PerformanceObserver"),
            Capability::ColorSchemeQuery => self.dark_query().is_some(),
        }
    }

    fn observe_intersections(
        &self,
        targets: &[WebElement],
        options: &ObserverOptions,
        handler: IntersectionHandler<WebElement>,
    ) -> Result<(), PlatformError> {
        if !self.supports(Capability::IntersectionObserver) {
            return Err(PlatformError::Unsupported(Capability::IntersectionObserver));
        }

        let callback = Closure::wrap(Box::new(move |entries: Array, observer: IntersectionObserver| {
            for entry in entries.iter() {
                let entry = entry.unchecked_into::<IntersectionObserverEntry>();
                let target = entry.target();
                let seen = IntersectionEntry { target: WebElement(target.clone()), is_intersecting: entry.is_intersecting() };
                if handler(&seen) == Watch::Stop {
                    observer.unobserve(&target);
                }
            }
        }) as Box<dyn FnMut(Array, IntersectionObserver)>);

        let init: IntersectionObserverInit = dictionary(&[
            ("threshold", JsValue::from_f64(options.threshold)),
            ("rootMargin", JsValue::from_str(&options.root_margin)),
        ])
        .unchecked_into();
        let observer = IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init).map_err(js_error)?;
        callback.forget();

        for target in targets {
            observer.observe(&target.0);
        }
        Ok(())
    }

    fn prefers_dark(&self) -> Option<bool> {
        self.dark_query().map(|query| query.matches())
    }

    fn on_color_scheme_change(&self, handler: Box<dyn Fn(bool)>) -> Result<(), PlatformError> {
        let Some(query) = self.dark_query() else {
            return Err(PlatformError::Unsupported(Capability::ColorSchemeQuery));
        };
        let watched = query.clone();
        listen(&query, "change", false, Box::new(move |_| handler(watched.matches()))).map_err(js_error)
    }

    fn navigation_timing(&self) -> Option<NavigationTiming> {
        let timing = self.window.performance()?.timing();
        Some(NavigationTiming {
            navigation_start: timing.navigation_start(),
            request_start: timing.request_start(),
            response_end: timing.response_end(),
            dom_loading: timing.dom_loading(),
            dom_complete: timing.dom_complete(),
            load_event_end: timing.load_event_end(),
        })
    }

    fn observe_vitals(&self, kind: VitalKind, handler: VitalsHandler) -> Result<(), PlatformError> {
        if !self.supports(Capability::PerformanceObserver) {
            return Err(PlatformError::Unsupported(Capability::PerformanceObserver));
        }
        let constructor = Reflect::get(&self.window, &JsValue::from_str("PerformanceObserver"))
            .and_then(|value| value.dyn_into::<Function>())
            .map_err(js_error)?;

        let callback = Closure::wrap(Box::new(move |list: JsValue, _observer: JsValue| {
            let entries = match call_method(&list, "getEntries", &Array::new()) {
                Ok(entries) => Array::from(&entries),
                Err(err) => {
                    log::debug!("{} entries unreadable: {err:?}", kind.entry_type());
                    return;
                }
            };
            let vitals = entries.iter().map(|entry| vital_entry(&entry)).collect::<Vec<_>>();
            handler(&vitals);
        }) as Box<dyn FnMut(JsValue, JsValue)>);

        let observer = Reflect::construct(&constructor, &Array::of1(callback.as_ref())).map_err(js_error)?;
        let entry_types = Array::of1(&JsValue::from_str(kind.entry_type()));
        let init = dictionary(&[("entryTypes", entry_types.into())]);
        call_method(&observer, "observe", &Array::of1(&init)).map_err(js_error)?;
        callback.forget();
        Ok(())
    }
}

/// Install the panic hook and logger, read the config, and attach every
/// effect once the DOM is ready.
pub fn boot() {
    console_error_panic_hook::set_once();

    let Some(page) = WebPage::new() else {
        return;
    };
    let page = Rc::new(page);

    let (config, config_error) = match Config::from_page(page.as_ref()) {
        Ok(config) => (config, None),
        Err(err) => (Config::default(), Some(err)),
    };
    if console_log::init_with_level(config.level().unwrap_or(log::Level::Info)).is_err() {
        log::debug!("console logger already installed");
    }
    if let Some(err) = config_error {
        log::warn!("ignoring #{CONFIG_ELEMENT_ID}, using defaults: {err}");
    }

    let config = Rc::new(config);
    page.when_ready(move |page| {
        effects::install(&page, &config);
    });
}
