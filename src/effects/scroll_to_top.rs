//! Floating "back to top" button.

use std::rc::Rc;

use super::{Attachment, Effect};
use crate::config::Config;
use crate::page::{Element, Navigation, Page};

pub const BUTTON_ID: &str = "scrollToTop";
pub const VISIBLE_CLASS: &str = "visible";

pub struct ScrollToTop {
    config: Rc<Config>,
}

impl ScrollToTop {
    pub fn new(config: Rc<Config>) -> Self {
        Self { config }
    }
}

pub fn is_visible(offset: f64, config: &Config) -> bool {
    offset > config.scroll_threshold
}

impl<P: Page> Effect<P> for ScrollToTop {
    fn name(&self) -> &'static str {
        "scroll-to-top"
    }

    fn attach(&self, page: &Rc<P>) -> Attachment {
        let Some(button) = page.element_by_id(BUTTON_ID) else {
            return Attachment::Skipped("no #scrollToTop");
        };

        let config = Rc::clone(&self.config);
        let scroll_page = Rc::clone(page);
        let scroll_button = button.clone();
        page.on_scroll(Box::new(move || {
            if is_visible(scroll_page.scroll_offset(), &config) {
                scroll_button.add_class(VISIBLE_CLASS);
            } else {
                scroll_button.remove_class(VISIBLE_CLASS);
            }
        }));

        let click_page = Rc::clone(page);
        page.on_click(
            &button,
            Box::new(move |_| {
                click_page.smooth_scroll_to(0.0);
                Navigation::Allow
            }),
        );

        Attachment::Attached
    }
}

#[cfg(test)]
#[path = "scroll_to_top_test.rs"]
mod tests;
