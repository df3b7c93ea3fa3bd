//! Header restyle once the page leaves the top.

use std::rc::Rc;

use super::{Attachment, Effect};
use crate::config::Config;
use crate::page::{Element, Page};

pub const HEADER_ID: &str = "header";

pub struct HeaderScroll {
    config: Rc<Config>,
}

impl HeaderScroll {
    pub fn new(config: Rc<Config>) -> Self {
        Self { config }
    }
}

/// Whether the header should carry the scrolled class at `offset`.
pub fn is_scrolled(offset: f64, config: &Config) -> bool {
    offset > config.header_scroll_offset
}

impl<P: Page> Effect<P> for HeaderScroll {
    fn name(&self) -> &'static str {
        "header-scroll"
    }

    fn attach(&self, page: &Rc<P>) -> Attachment {
        let Some(header) = page.element_by_id(HEADER_ID) else {
            return Attachment::Skipped("no #header");
        };

        let config = Rc::clone(&self.config);
        let scroll_page = Rc::clone(page);
        page.on_scroll(Box::new(move || {
            if is_scrolled(scroll_page.scroll_offset(), &config) {
                header.add_class(&config.nav_scroll_class);
            } else {
                header.remove_class(&config.nav_scroll_class);
            }
        }));

        Attachment::Attached
    }
}

#[cfg(test)]
#[path = "header_scroll_test.rs"]
mod tests;
