//! In-memory [`Page`] for unit tests.
//!
//! Nodes live in a flat arena with parent links. Time is virtual and only
//! moves on [`FakePage::advance`]; spawned tasks run on
//! [`FakePage::run_tasks`]. Selector support covers what the controllers
//! use: tags, `.class`, `#id`, `[attr]`, `[attr="v"]`, `[attr^="v"]` and
//! comma-separated lists.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use futures::executor::{LocalPool, LocalSpawner};
use futures::future::{self, LocalBoxFuture};
use futures::task::LocalSpawnExt;

use super::*;

const BODY: usize = 0;

#[derive(Debug, Default)]
struct Node {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    style: BTreeMap<String, String>,
    style_writes: Vec<(String, String)>,
    text: Option<String>,
    top: f64,
    height: f64,
    parent: Option<usize>,
    fields: FormFields,
}

#[derive(Debug, Default)]
struct Dom {
    nodes: Vec<Node>,
}

impl Dom {
    fn push(&mut self, tag: &str, parent: Option<usize>) -> usize {
        self.nodes.push(Node { tag: tag.to_owned(), parent, ..Node::default() });
        self.nodes.len() - 1
    }

    fn ancestry(&self, index: usize) -> Vec<usize> {
        let mut chain = vec![index];
        let mut cursor = self.nodes[index].parent;
        while let Some(parent) = cursor {
            chain.push(parent);
            cursor = self.nodes[parent].parent;
        }
        chain
    }

    fn is_attached(&self, index: usize) -> bool {
        self.ancestry(index).last() == Some(&BODY)
    }
}

fn is_simple_start(c: char) -> bool {
    matches!(c, '.' | '#' | '[')
}

fn matches_attribute(node: &Node, inner: &str) -> bool {
    if let Some((name, value)) = inner.split_once("^=") {
        let value = value.trim_matches('"');
        return node.attributes.get(name).is_some_and(|v| v.starts_with(value));
    }
    if let Some((name, value)) = inner.split_once('=') {
        let value = value.trim_matches('"');
        return node.attributes.get(name).is_some_and(|v| v == value);
    }
    node.attributes.contains_key(inner)
}

fn matches_compound(node: &Node, compound: &str) -> bool {
    let compound = compound.trim();
    if compound.is_empty() {
        return false;
    }
    let tag_end = compound.find(is_simple_start).unwrap_or(compound.len());
    let tag = &compound[..tag_end];
    if !tag.is_empty() && tag != node.tag {
        return false;
    }

    let mut rest = &compound[tag_end..];
    while let Some(lead) = rest.chars().next() {
        match lead {
            '.' | '#' => {
                let body = &rest[1..];
                let end = body.find(is_simple_start).unwrap_or(body.len());
                let name = &body[..end];
                let found = if lead == '.' {
                    node.classes.iter().any(|class| class == name)
                } else {
                    node.attributes.get("id").is_some_and(|id| id == name)
                };
                if name.is_empty() || !found {
                    return false;
                }
                rest = &body[end..];
            }
            '[' => {
                let Some(close) = rest.find(']') else {
                    return false;
                };
                if !matches_attribute(node, &rest[1..close]) {
                    return false;
                }
                rest = &rest[close + 1..];
            }
            _ => return false,
        }
    }
    true
}

fn matches(node: &Node, selector: &str) -> bool {
    selector.split(',').any(|compound| matches_compound(node, compound))
}

/// Handle to a node in a [`FakePage`].
#[derive(Clone)]
pub(crate) struct FakeElement {
    dom: Rc<RefCell<Dom>>,
    index: usize,
}

impl std::fmt::Debug for FakeElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dom = self.dom.borrow();
        let node = &dom.nodes[self.index];
        write!(f, "<{} #{}>", node.tag, self.index)
    }
}

impl PartialEq for FakeElement {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.dom, &other.dom) && self.index == other.index
    }
}

impl FakeElement {
    /// Create a child element and return it.
    pub fn child(&self, tag: &str) -> FakeElement {
        let index = self.dom.borrow_mut().push(tag, Some(self.index));
        FakeElement { dom: Rc::clone(&self.dom), index }
    }

    pub fn id(self, id: &str) -> Self {
        self.set_attribute("id", id);
        self
    }

    pub fn class(self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    pub fn attr(self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn layout(self, top: f64, height: f64) -> Self {
        {
            let mut dom = self.dom.borrow_mut();
            dom.nodes[self.index].top = top;
            dom.nodes[self.index].height = height;
        }
        self
    }

    pub fn field(self, name: &str, value: &str) -> Self {
        self.dom.borrow_mut().nodes[self.index].fields.insert(name.to_owned(), value.to_owned());
        self
    }

    pub fn fields(&self) -> FormFields {
        self.dom.borrow().nodes[self.index].fields.clone()
    }

    pub fn style(&self, property: &str) -> Option<String> {
        self.dom.borrow().nodes[self.index].style.get(property).cloned()
    }

    /// Every value ever written to `property`, oldest first.
    pub fn style_history(&self, property: &str) -> Vec<String> {
        self.dom.borrow().nodes[self.index]
            .style_writes
            .iter()
            .filter(|(name, _)| name == property)
            .map(|(_, value)| value.clone())
            .collect()
    }

    pub fn is_attached(&self) -> bool {
        self.dom.borrow().is_attached(self.index)
    }
}

impl Element for FakeElement {
    fn attribute(&self, name: &str) -> Option<String> {
        self.dom.borrow().nodes[self.index].attributes.get(name).cloned()
    }

    fn set_attribute(&self, name: &str, value: &str) {
        self.dom.borrow_mut().nodes[self.index].attributes.insert(name.to_owned(), value.to_owned());
    }

    fn remove_attribute(&self, name: &str) {
        self.dom.borrow_mut().nodes[self.index].attributes.remove(name);
    }

    fn has_class(&self, class: &str) -> bool {
        self.dom.borrow().nodes[self.index].classes.iter().any(|c| c == class)
    }

    fn add_class(&self, class: &str) {
        if !self.has_class(class) {
            self.dom.borrow_mut().nodes[self.index].classes.push(class.to_owned());
        }
    }

    fn remove_class(&self, class: &str) {
        self.dom.borrow_mut().nodes[self.index].classes.retain(|c| c != class);
    }

    fn toggle_class(&self, class: &str) -> bool {
        if self.has_class(class) {
            self.remove_class(class);
            false
        } else {
            self.add_class(class);
            true
        }
    }

    fn set_class_name(&self, value: &str) {
        self.dom.borrow_mut().nodes[self.index].classes = value.split_whitespace().map(str::to_owned).collect();
    }

    fn set_style(&self, property: &str, value: &str) {
        let mut dom = self.dom.borrow_mut();
        let node = &mut dom.nodes[self.index];
        node.style.insert(property.to_owned(), value.to_owned());
        node.style_writes.push((property.to_owned(), value.to_owned()));
    }

    fn text(&self) -> Option<String> {
        self.dom.borrow().nodes[self.index].text.clone()
    }

    fn set_text(&self, text: &str) {
        self.dom.borrow_mut().nodes[self.index].text = Some(text.to_owned());
    }

    fn offset_top(&self) -> f64 {
        self.dom.borrow().nodes[self.index].top
    }

    fn offset_height(&self) -> f64 {
        self.dom.borrow().nodes[self.index].height
    }

    fn within(&self, selector: &str) -> bool {
        let dom = self.dom.borrow();
        dom.ancestry(self.index).into_iter().any(|index| matches(&dom.nodes[index], selector))
    }

    fn append(&self, child: &Self) {
        self.dom.borrow_mut().nodes[child.index].parent = Some(self.index);
    }

    fn remove(&self) {
        self.dom.borrow_mut().nodes[self.index].parent = None;
    }
}

type SharedClick = Rc<dyn Fn(&ClickEvent<FakeElement>) -> Navigation>;

struct Timer {
    due_ms: u64,
    seq: u64,
    callback: Box<dyn FnOnce()>,
}

struct Observer {
    targets: Vec<usize>,
    options: ObserverOptions,
    handler: Rc<dyn Fn(&IntersectionEntry<FakeElement>) -> Watch>,
}

pub(crate) struct FakePage {
    dom: Rc<RefCell<Dom>>,
    scroll: Cell<f64>,
    scroll_requests: RefCell<Vec<f64>>,
    scroll_handlers: RefCell<Vec<Rc<dyn Fn()>>>,
    click_handlers: RefCell<Vec<(usize, SharedClick)>>,
    document_click_handlers: RefCell<Vec<SharedClick>>,
    submit_handlers: RefCell<Vec<(usize, Rc<dyn Fn() -> Navigation>)>>,
    load_handlers: RefCell<Vec<Box<dyn FnOnce()>>>,
    now_ms: Cell<u64>,
    timer_seq: Cell<u64>,
    timers: RefCell<Vec<Timer>>,
    sleeps: RefCell<Vec<Duration>>,
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
    observers: RefCell<Vec<Observer>>,
    capabilities: RefCell<Vec<Capability>>,
    dark: Cell<bool>,
    scheme_handlers: RefCell<Vec<Rc<dyn Fn(bool)>>>,
    timing: Cell<Option<NavigationTiming>>,
    vitals: RefCell<Vec<(VitalKind, Rc<dyn Fn(&[VitalEntry])>)>>,
    reject_vitals: Cell<bool>,
}

impl FakePage {
    /// A page with an empty body and every capability except native lazy loading.
    pub fn new() -> Rc<Self> {
        let mut dom = Dom::default();
        dom.push("body", None);
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Rc::new(Self {
            dom: Rc::new(RefCell::new(dom)),
            scroll: Cell::new(0.0),
            scroll_requests: RefCell::new(Vec::new()),
            scroll_handlers: RefCell::new(Vec::new()),
            click_handlers: RefCell::new(Vec::new()),
            document_click_handlers: RefCell::new(Vec::new()),
            submit_handlers: RefCell::new(Vec::new()),
            load_handlers: RefCell::new(Vec::new()),
            now_ms: Cell::new(0),
            timer_seq: Cell::new(0),
            timers: RefCell::new(Vec::new()),
            sleeps: RefCell::new(Vec::new()),
            pool: RefCell::new(pool),
            spawner,
            observers: RefCell::new(Vec::new()),
            capabilities: RefCell::new(vec![
                Capability::IntersectionObserver,
                Capability::PerformanceTiming,
                Capability::PerformanceObserver,
                Capability::ColorSchemeQuery,
            ]),
            dark: Cell::new(false),
            scheme_handlers: RefCell::new(Vec::new()),
            timing: Cell::new(None),
            vitals: RefCell::new(Vec::new()),
            reject_vitals: Cell::new(false),
        })
    }

    fn handle(&self, index: usize) -> FakeElement {
        FakeElement { dom: Rc::clone(&self.dom), index }
    }

    /// Body element, for building the tree.
    pub fn root(&self) -> FakeElement {
        self.handle(BODY)
    }

    /// Shorthand for a new child of `body`.
    pub fn add(&self, tag: &str) -> FakeElement {
        self.root().child(tag)
    }

    // --- Driving events ---

    /// Jump to `offset` and fire the scroll listeners.
    pub fn scroll_to(&self, offset: f64) {
        self.scroll.set(offset);
        let handlers = self.scroll_handlers.borrow().clone();
        for handler in handlers {
            handler();
        }
    }

    /// Click `target`, bubbling through its ancestors to the document.
    pub fn click(&self, target: &FakeElement) -> Navigation {
        let chain = self.dom.borrow().ancestry(target.index);
        let mut handlers = Vec::new();
        for index in chain {
            handlers.extend(
                self.click_handlers
                    .borrow()
                    .iter()
                    .filter(|(owner, _)| *owner == index)
                    .map(|(_, handler)| Rc::clone(handler)),
            );
        }
        handlers.extend(self.document_click_handlers.borrow().iter().cloned());

        let event = ClickEvent { target: Some(target.clone()) };
        let mut navigation = Navigation::Allow;
        for handler in handlers {
            if handler(&event) == Navigation::Prevent {
                navigation = Navigation::Prevent;
            }
        }
        navigation
    }

    pub fn submit(&self, form: &FakeElement) -> Navigation {
        let handlers = self
            .submit_handlers
            .borrow()
            .iter()
            .filter(|(owner, _)| *owner == form.index)
            .map(|(_, handler)| Rc::clone(handler))
            .collect::<Vec<_>>();
        let mut navigation = Navigation::Allow;
        for handler in handlers {
            if handler() == Navigation::Prevent {
                navigation = Navigation::Prevent;
            }
        }
        navigation
    }

    pub fn fire_load(&self) {
        let handlers = std::mem::take(&mut *self.load_handlers.borrow_mut());
        for handler in handlers {
            handler();
        }
    }

    /// Move the virtual clock forward, running timers in due order.
    pub fn advance(&self, ms: u64) {
        let until = self.now_ms.get() + ms;
        loop {
            let next = {
                let mut timers = self.timers.borrow_mut();
                let due = timers
                    .iter()
                    .enumerate()
                    .filter(|(_, timer)| timer.due_ms <= until)
                    .min_by_key(|(_, timer)| (timer.due_ms, timer.seq))
                    .map(|(position, _)| position);
                due.map(|position| timers.remove(position))
            };
            let Some(timer) = next else {
                break;
            };
            self.now_ms.set(timer.due_ms);
            (timer.callback)();
        }
        self.now_ms.set(until);
    }

    /// Drive spawned tasks until none can make progress.
    pub fn run_tasks(&self) {
        self.pool.borrow_mut().run_until_stalled();
    }

    /// Report `target` entering or leaving the viewport to every observer watching it.
    pub fn intersect(&self, target: &FakeElement, is_intersecting: bool) {
        let handlers = self
            .observers
            .borrow()
            .iter()
            .enumerate()
            .filter(|(_, observer)| observer.targets.contains(&target.index))
            .map(|(position, observer)| (position, Rc::clone(&observer.handler)))
            .collect::<Vec<_>>();

        let entry = IntersectionEntry { target: target.clone(), is_intersecting };
        for (position, handler) in handlers {
            if handler(&entry) == Watch::Stop {
                self.observers.borrow_mut()[position].targets.retain(|index| *index != target.index);
            }
        }
    }

    pub fn change_scheme(&self, dark: bool) {
        self.dark.set(dark);
        let handlers = self.scheme_handlers.borrow().clone();
        for handler in handlers {
            handler(dark);
        }
    }

    pub fn emit_vitals(&self, kind: VitalKind, entries: &[VitalEntry]) {
        let handlers = self
            .vitals
            .borrow()
            .iter()
            .filter(|(watched, _)| *watched == kind)
            .map(|(_, handler)| Rc::clone(handler))
            .collect::<Vec<_>>();
        for handler in handlers {
            handler(entries);
        }
    }

    // --- Platform setup ---

    pub fn set_supported(&self, capability: Capability, supported: bool) {
        let mut capabilities = self.capabilities.borrow_mut();
        capabilities.retain(|c| *c != capability);
        if supported {
            capabilities.push(capability);
        }
    }

    pub fn set_dark(&self, dark: bool) {
        self.dark.set(dark);
    }

    pub fn set_timing(&self, timing: NavigationTiming) {
        self.timing.set(Some(timing));
    }

    pub fn reject_vitals(&self) {
        self.reject_vitals.set(true);
    }

    // --- Inspection ---

    pub fn scroll_requests(&self) -> Vec<f64> {
        self.scroll_requests.borrow().clone()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    pub fn scroll_listeners(&self) -> usize {
        self.scroll_handlers.borrow().len()
    }

    pub fn click_listeners(&self) -> usize {
        self.click_handlers.borrow().len() + self.document_click_handlers.borrow().len()
    }

    pub fn observer_options(&self) -> Vec<ObserverOptions> {
        self.observers.borrow().iter().map(|observer| observer.options.clone()).collect()
    }

    pub fn is_observed(&self, target: &FakeElement) -> bool {
        self.observers.borrow().iter().any(|observer| observer.targets.contains(&target.index))
    }

    pub fn vital_kinds(&self) -> Vec<VitalKind> {
        self.vitals.borrow().iter().map(|(kind, _)| *kind).collect()
    }

    /// Notifications currently attached to the document.
    pub fn notifications(&self) -> Vec<FakeElement> {
        self.query_all(".notification")
    }
}

impl Page for FakePage {
    type Element = FakeElement;

    fn element_by_id(&self, id: &str) -> Option<FakeElement> {
        self.query(&format!("#{id}"))
    }

    fn query(&self, selector: &str) -> Option<FakeElement> {
        self.query_all(selector).into_iter().next()
    }

    fn query_all(&self, selector: &str) -> Vec<FakeElement> {
        let matching = {
            let dom = self.dom.borrow();
            (0..dom.nodes.len())
                .filter(|index| dom.is_attached(*index) && matches(&dom.nodes[*index], selector))
                .collect::<Vec<_>>()
        };
        matching.into_iter().map(|index| self.handle(index)).collect()
    }

    fn body(&self) -> Option<FakeElement> {
        Some(self.root())
    }

    fn create_element(&self, tag: &str) -> Option<FakeElement> {
        let index = self.dom.borrow_mut().push(tag, None);
        Some(self.handle(index))
    }

    fn scroll_offset(&self) -> f64 {
        self.scroll.get()
    }

    fn smooth_scroll_to(&self, top: f64) {
        self.scroll_requests.borrow_mut().push(top);
    }

    fn on_scroll(&self, handler: Box<dyn Fn()>) {
        self.scroll_handlers.borrow_mut().push(Rc::from(handler));
    }

    fn on_click(&self, target: &FakeElement, handler: ClickHandler<FakeElement>) {
        self.click_handlers.borrow_mut().push((target.index, Rc::from(handler)));
    }

    fn on_document_click(&self, handler: ClickHandler<FakeElement>) {
        self.document_click_handlers.borrow_mut().push(Rc::from(handler));
    }

    fn on_submit(&self, form: &FakeElement, handler: SubmitHandler) {
        self.submit_handlers.borrow_mut().push((form.index, Rc::from(handler)));
    }

    fn on_load(&self, handler: Box<dyn FnOnce()>) {
        self.load_handlers.borrow_mut().push(handler);
    }

    fn form_values(&self, form: &FakeElement) -> FormFields {
        form.fields()
    }

    fn reset_form(&self, form: &FakeElement) {
        for value in self.dom.borrow_mut().nodes[form.index].fields.values_mut() {
            value.clear();
        }
    }

    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) {
        let seq = self.timer_seq.get();
        self.timer_seq.set(seq + 1);
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.timers.borrow_mut().push(Timer { due_ms: self.now_ms.get().saturating_add(delay_ms), seq, callback });
    }

    fn sleep(&self, delay: Duration) -> LocalBoxFuture<'static, ()> {
        self.sleeps.borrow_mut().push(delay);
        Box::pin(future::ready(()))
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        if let Err(err) = self.spawner.spawn_local(task) {
            log::warn!("fake page could not spawn task: {err}");
        }
    }

    fn supports(&self, capability: Capability) -> bool {
        self.capabilities.borrow().contains(&capability)
    }

    fn observe_intersections(
        &self,
        targets: &[FakeElement],
        options: &ObserverOptions,
        handler: IntersectionHandler<FakeElement>,
    ) -> Result<(), PlatformError> {
        if !self.supports(Capability::IntersectionObserver) {
            return Err(PlatformError::Unsupported(Capability::IntersectionObserver));
        }
        self.observers.borrow_mut().push(Observer {
            targets: targets.iter().map(|target| target.index).collect(),
            options: options.clone(),
            handler: Rc::from(handler),
        });
        Ok(())
    }

    fn prefers_dark(&self) -> Option<bool> {
        self.supports(Capability::ColorSchemeQuery).then(|| self.dark.get())
    }

    fn on_color_scheme_change(&self, handler: Box<dyn Fn(bool)>) -> Result<(), PlatformError> {
        if !self.supports(Capability::ColorSchemeQuery) {
            return Err(PlatformError::Unsupported(Capability::ColorSchemeQuery));
        }
        self.scheme_handlers.borrow_mut().push(Rc::from(handler));
        Ok(())
    }

    fn navigation_timing(&self) -> Option<NavigationTiming> {
        if self.supports(Capability::PerformanceTiming) { self.timing.get() } else { None }
    }

    fn observe_vitals(&self, kind: VitalKind, handler: VitalsHandler) -> Result<(), PlatformError> {
        if self.reject_vitals.get() {
            return Err(PlatformError::Js(format!("entry type {} rejected", kind.entry_type())));
        }
        self.vitals.borrow_mut().push((kind, Rc::from(handler)));
        Ok(())
    }
}
