//! Mobile navigation drawer.
//!
//! Open/closed lives in the `active` class on the toggle button and the menu,
//! mirrored into the button's `aria-expanded`.

use std::rc::Rc;

use super::{Attachment, Effect};
use crate::page::{Element, Navigation, Page};

pub const TOGGLE_ID: &str = "menuToggle";
pub const MENU_ID: &str = "navMenu";
pub const LINK_SELECTOR: &str = ".nav-link";
pub const NAVBAR_SELECTOR: &str = ".navbar";
pub const OPEN_CLASS: &str = "active";

pub struct MobileNav;

/// The toggle button and the menu it controls.
#[derive(Clone)]
struct Drawer<E> {
    toggle: E,
    menu: E,
}

impl<E: Element> Drawer<E> {
    fn toggle(&self) -> bool {
        let open = self.toggle.toggle_class(OPEN_CLASS);
        self.menu.toggle_class(OPEN_CLASS);
        self.toggle.set_attribute("aria-expanded", if open { "true" } else { "false" });
        open
    }

    fn close(&self) {
        self.toggle.remove_class(OPEN_CLASS);
        self.menu.remove_class(OPEN_CLASS);
        self.toggle.set_attribute("aria-expanded", "false");
    }
}

impl<P: Page> Effect<P> for MobileNav {
    fn name(&self) -> &'static str {
        "mobile-nav"
    }

    fn attach(&self, page: &Rc<P>) -> Attachment {
        let (Some(toggle), Some(menu)) = (page.element_by_id(TOGGLE_ID), page.element_by_id(MENU_ID)) else {
            return Attachment::Skipped("menu toggle or menu missing");
        };
        let drawer = Drawer { toggle, menu };

        let on_toggle = drawer.clone();
        page.on_click(
            &drawer.toggle,
            Box::new(move |_| {
                on_toggle.toggle();
                Navigation::Allow
            }),
        );

        for link in page.query_all(LINK_SELECTOR) {
            let on_link = drawer.clone();
            page.on_click(
                &link,
                Box::new(move |_| {
                    on_link.close();
                    Navigation::Allow
                }),
            );
        }

        page.on_document_click(Box::new(move |event| {
            let inside_navbar = event
                .target
                .as_ref()
                .is_some_and(|target| target.within(NAVBAR_SELECTOR));
            if !inside_navbar {
                drawer.close();
            }
            Navigation::Allow
        }));

        Attachment::Attached
    }
}

#[cfg(test)]
#[path = "mobile_nav_test.rs"]
mod tests;
