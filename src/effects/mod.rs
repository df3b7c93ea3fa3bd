//! Effect controllers and the single install point.
//!
//! ARCHITECTURE
//! ============
//! Each controller is a small, independent unit: locate DOM targets, bail
//! out as a permanent no-op when they are missing, otherwise subscribe to a
//! few events and answer each with a DOM mutation. Controllers share nothing
//! but the read-only [`Config`] and the page itself.

pub mod active_nav;
pub mod animate_on_scroll;
pub mod contact_form;
pub mod header_scroll;
pub mod lazy_loader;
pub mod mobile_nav;
pub mod notification;
pub mod perf_monitor;
pub mod scroll_to_top;
pub mod smooth_scroll;
pub mod theme;


use std::rc::Rc;

use crate::config::Config;
use crate::page::Page;

use self::contact_form::{ContactForm, FormTransport, SimulatedTransport};

/// Outcome of attaching a controller to a page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attachment {
    Attached,
    /// Nothing was registered; the controller stays inert for the page.
    Skipped(&'static str),
}

/// A behavior that wires itself into a page.
pub trait Effect<P: Page> {
    fn name(&self) -> &'static str;

    /// Register this controller's subscriptions. Called once per page.
    fn attach(&self, page: &Rc<P>) -> Attachment;
}

/// Install every controller with the simulated form transport.
pub fn install<P: Page>(page: &Rc<P>, config: &Rc<Config>) -> Vec<(&'static str, Attachment)> {
    let transport = Rc::new(SimulatedTransport::new(Rc::clone(page), config.submit_delay_ms));
    install_with_transport(page, config, transport)
}

/// Install every controller in page order, using `transport` for the contact form.
pub fn install_with_transport<P: Page>(
    page: &Rc<P>,
    config: &Rc<Config>,
    transport: Rc<dyn FormTransport>,
) -> Vec<(&'static str, Attachment)> {
    log::info!("initialising page effects");

    let effects: Vec<Box<dyn Effect<P>>> = vec![
        Box::new(mobile_nav::MobileNav),
        Box::new(header_scroll::HeaderScroll::new(Rc::clone(config))),
        Box::new(scroll_to_top::ScrollToTop::new(Rc::clone(config))),
        Box::new(smooth_scroll::SmoothScroll),
        Box::new(animate_on_scroll::AnimateOnScroll),
        Box::new(ContactForm::new(Rc::clone(config), transport)),
        Box::new(perf_monitor::PerformanceMonitor),
        Box::new(lazy_loader::LazyLoader),
        Box::new(active_nav::ActiveNavLink::new(Rc::clone(config))),
        Box::new(theme::ThemeToggle),
    ];

    let report = effects
        .iter()
        .map(|effect| {
            let outcome = effect.attach(page);
            match outcome {
                Attachment::Attached => log::debug!("{}: attached", effect.name()),
                Attachment::Skipped(reason) => log::debug!("{}: skipped ({reason})", effect.name()),
            }
            (effect.name(), outcome)
        })
        .collect::<Vec<_>>();

    log::info!("page effects ready");
    report
}
