//! Dark mode that follows the platform color-scheme preference.
//!
//! The preference is read live every session and never stored; there is no
//! manual override.

use std::rc::Rc;

use super::{Attachment, Effect};
use crate::page::{Element, Page};

pub const DARK_CLASS: &str = "dark-mode";

pub struct ThemeToggle;

fn apply<E: Element>(body: &E, dark: bool) {
    if dark {
        body.add_class(DARK_CLASS);
    } else {
        body.remove_class(DARK_CLASS);
    }
}

impl<P: Page> Effect<P> for ThemeToggle {
    fn name(&self) -> &'static str {
        "theme-toggle"
    }

    fn attach(&self, page: &Rc<P>) -> Attachment {
        let Some(dark) = page.prefers_dark() else {
            return Attachment::Skipped("no color-scheme preference");
        };
        let Some(body) = page.body() else {
            return Attachment::Skipped("no body");
        };

        if dark {
            body.add_class(DARK_CLASS);
        }

        if let Err(err) = page.on_color_scheme_change(Box::new(move |dark| apply(&body, dark))) {
            log::debug!("color-scheme changes not tracked: {err}");
        }
        Attachment::Attached
    }
}

#[cfg(test)]
#[path = "theme_test.rs"]
mod tests;
