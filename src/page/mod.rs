//! Explicit handle to the document and window the controllers act on.
//!
//! SYSTEM CONTEXT
//! ==============
//! Controllers only talk to the platform through [`Page`] and [`Element`].
//! The browser implementation lives in [`web`] (feature `browser`); tests use
//! an in-memory page with a virtual clock.
//!
//! Subscriptions registered here live for the rest of the page. Nothing is
//! ever unsubscribed.

#[cfg(test)]
pub(crate) mod fake;
#[cfg(feature = "browser")]
pub mod web;

use std::collections::BTreeMap;
use std::time::Duration;

use futures::future::LocalBoxFuture;

/// Field name to value, in the order a form reports them.
pub type FormFields = BTreeMap<String, String>;

pub type ClickHandler<E> = Box<dyn Fn(&ClickEvent<E>) -> Navigation>;
pub type SubmitHandler = Box<dyn Fn() -> Navigation>;
pub type IntersectionHandler<E> = Box<dyn Fn(&IntersectionEntry<E>) -> Watch>;
pub type VitalsHandler = Box<dyn Fn(&[VitalEntry])>;

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("{0} is not supported on this platform")]
    Unsupported(Capability),

    #[error("javascript call failed: {0}")]
    Js(String),
}

/// Optional platform features a controller may probe for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    IntersectionObserver,
    NativeLazyLoading,
    PerformanceTiming,
    PerformanceObserver,
    ColorSchemeQuery,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::IntersectionObserver => "IntersectionObserver",
            Self::NativeLazyLoading => "native image lazy loading",
            Self::PerformanceTiming => "performance timing",
            Self::PerformanceObserver => "PerformanceObserver",
            Self::ColorSchemeQuery => "prefers-color-scheme media query",
        };
        f.write_str(name)
    }
}

/// What the platform should do with an event's default action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Navigation {
    Allow,
    Prevent,
}

/// Whether an intersection observer keeps watching an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Watch {
    Continue,
    Stop,
}

#[derive(Clone, Debug)]
pub struct ClickEvent<E> {
    /// Element the click originated on, if it was an element at all.
    pub target: Option<E>,
}

#[derive(Clone, Debug)]
pub struct IntersectionEntry<E> {
    pub target: E,
    pub is_intersecting: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ObserverOptions {
    pub threshold: f64,
    pub root_margin: String,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self { threshold: 0.0, root_margin: "0px".to_owned() }
    }
}

/// Subset of the legacy `performance.timing` figures, in epoch milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NavigationTiming {
    pub navigation_start: f64,
    pub request_start: f64,
    pub response_end: f64,
    pub dom_loading: f64,
    pub dom_complete: f64,
    pub load_event_end: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VitalKind {
    LargestContentfulPaint,
    FirstInput,
}

impl VitalKind {
    /// Entry type name understood by `PerformanceObserver`.
    pub fn entry_type(self) -> &'static str {
        match self {
            Self::LargestContentfulPaint => "largest-contentful-paint",
            Self::FirstInput => "first-input",
        }
    }
}

/// One performance entry. Fields a given entry type lacks are `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VitalEntry {
    pub start_time: f64,
    pub render_time: Option<f64>,
    pub load_time: Option<f64>,
    pub processing_start: Option<f64>,
}

/// A DOM element handle. Cloning clones the handle, not the node.
///
/// Mutators never fail loudly: a rejected platform call is logged by the
/// implementation and otherwise ignored.
pub trait Element: Clone + 'static {
    fn attribute(&self, name: &str) -> Option<String>;
    fn set_attribute(&self, name: &str, value: &str);
    fn remove_attribute(&self, name: &str);

    fn has_class(&self, class: &str) -> bool;
    fn add_class(&self, class: &str);
    fn remove_class(&self, class: &str);
    /// Flip `class` and return whether it is now present.
    fn toggle_class(&self, class: &str) -> bool;
    fn set_class_name(&self, value: &str);

    fn set_style(&self, property: &str, value: &str);
    fn text(&self) -> Option<String>;
    fn set_text(&self, text: &str);

    fn offset_top(&self) -> f64;
    fn offset_height(&self) -> f64;

    /// True when this element or one of its ancestors matches `selector`.
    fn within(&self, selector: &str) -> bool;
    fn append(&self, child: &Self);
    fn remove(&self);
}

/// The document and window, passed explicitly to every controller.
pub trait Page: 'static {
    type Element: Element;

    // --- Lookup ---

    fn element_by_id(&self, id: &str) -> Option<Self::Element>;
    /// First match for `selector`; `None` also for an invalid selector.
    fn query(&self, selector: &str) -> Option<Self::Element>;
    fn query_all(&self, selector: &str) -> Vec<Self::Element>;
    fn body(&self) -> Option<Self::Element>;
    fn create_element(&self, tag: &str) -> Option<Self::Element>;

    // --- Scrolling ---

    fn scroll_offset(&self) -> f64;
    fn smooth_scroll_to(&self, top: f64);

    // --- Events ---

    fn on_scroll(&self, handler: Box<dyn Fn()>);
    fn on_click(&self, target: &Self::Element, handler: ClickHandler<Self::Element>);
    fn on_document_click(&self, handler: ClickHandler<Self::Element>);
    fn on_submit(&self, form: &Self::Element, handler: SubmitHandler);
    /// Runs once the page has finished loading, or soon if it already has.
    fn on_load(&self, handler: Box<dyn FnOnce()>);

    // --- Forms ---

    fn form_values(&self, form: &Self::Element) -> FormFields;
    fn reset_form(&self, form: &Self::Element);

    // --- Scheduling ---

    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>);
    fn sleep(&self, delay: Duration) -> LocalBoxFuture<'static, ()>;
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);

    // --- Platform capabilities ---

    fn supports(&self, capability: Capability) -> bool;

    fn observe_intersections(
        &self,
        targets: &[Self::Element],
        options: &ObserverOptions,
        handler: IntersectionHandler<Self::Element>,
    ) -> Result<(), PlatformError>;

    /// Current `prefers-color-scheme: dark` state, `None` when unavailable.
    fn prefers_dark(&self) -> Option<bool>;
    fn on_color_scheme_change(&self, handler: Box<dyn Fn(bool)>) -> Result<(), PlatformError>;

    fn navigation_timing(&self) -> Option<NavigationTiming>;
    fn observe_vitals(&self, kind: VitalKind, handler: VitalsHandler) -> Result<(), PlatformError>;
}
