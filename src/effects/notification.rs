//! Transient toast shown in the top-right corner.
//!
//! A toast slides in, stays for the display period, slides out, and removes
//! itself. Toasts are independent; several can be on screen at once.

use std::rc::Rc;
use std::time::Duration;

use crate::config::Config;
use crate::page::{Element, Page};

pub const SUCCESS_COLOR: &str = "#28a745";
pub const ERROR_COLOR: &str = "#dc3545";

const BASE_STYLE: &[(&str, &str)] = &[
    ("position", "fixed"),
    ("top", "20px"),
    ("right", "20px"),
    ("padding", "1rem 1.5rem"),
    ("color", "white"),
    ("border-radius", "8px"),
    ("box-shadow", "0 4px 6px rgba(0, 0, 0, 0.1)"),
    ("z-index", "10000"),
    ("animation", "slideIn 0.3s ease"),
];

const EXIT_ANIMATION: &str = "slideOut 0.3s ease";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    fn background(self) -> &'static str {
        match self {
            Self::Success => SUCCESS_COLOR,
            Self::Error => ERROR_COLOR,
        }
    }
}

/// Shows toasts on a page with the configured timings.
pub struct Notifier<P: Page> {
    page: Rc<P>,
    display: Duration,
    exit: Duration,
}

impl<P: Page> Clone for Notifier<P> {
    fn clone(&self) -> Self {
        Self { page: Rc::clone(&self.page), display: self.display, exit: self.exit }
    }
}

impl<P: Page> Notifier<P> {
    pub fn new(page: Rc<P>, config: &Config) -> Self {
        Self {
            page,
            display: Duration::from_millis(u64::from(config.notification_display_ms)),
            exit: Duration::from_millis(u64::from(config.notification_exit_ms)),
        }
    }

    /// Show `message` and schedule its removal.
    pub fn show(&self, kind: NotificationKind, message: &str) {
        let (Some(body), Some(toast)) = (self.page.body(), self.page.create_element("div")) else {
            log::warn!("cannot show {} notification: {message}", kind.as_str());
            return;
        };

        toast.set_class_name(&format!("notification notification-{}", kind.as_str()));
        toast.set_text(message);
        for (property, value) in BASE_STYLE {
            toast.set_style(property, value);
        }
        toast.set_style("background-color", kind.background());
        body.append(&toast);

        let page = Rc::clone(&self.page);
        let exit = self.exit;
        self.page.set_timeout(
            self.display,
            Box::new(move || {
                toast.set_style("animation", EXIT_ANIMATION);
                page.set_timeout(exit, Box::new(move || toast.remove()));
            }),
        );
    }
}

#[cfg(test)]
#[path = "notification_test.rs"]
mod tests;
