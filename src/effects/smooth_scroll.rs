//! Animated scrolling for in-page anchor links.
//!
//! Links whose target cannot be resolved keep the browser's default jump.

use std::rc::Rc;

use super::{Attachment, Effect};
use crate::page::{Element, Navigation, Page};

pub const ANCHOR_SELECTOR: &str = "a[href^=\"#\"]";
pub const HEADER_SELECTOR: &str = ".header";

pub struct SmoothScroll;

/// Scroll position that lands `target` just below the fixed header.
fn landing_offset<P: Page>(page: &P, target: &P::Element) -> f64 {
    let header_height = page.query(HEADER_SELECTOR).map_or(0.0, |header| header.offset_height());
    target.offset_top() - header_height
}

fn follow<P: Page>(page: &P, href: Option<&str>) -> Navigation {
    let Some(href) = href.filter(|href| !href.is_empty() && *href != "#") else {
        return Navigation::Allow;
    };
    let Some(target) = page.query(href) else {
        return Navigation::Allow;
    };
    page.smooth_scroll_to(landing_offset(page, &target));
    Navigation::Prevent
}

impl<P: Page> Effect<P> for SmoothScroll {
    fn name(&self) -> &'static str {
        "smooth-scroll"
    }

    fn attach(&self, page: &Rc<P>) -> Attachment {
        let links = page.query_all(ANCHOR_SELECTOR);
        if links.is_empty() {
            return Attachment::Skipped("no in-page anchors");
        }

        for link in links {
            let click_page = Rc::clone(page);
            let anchor = link.clone();
            page.on_click(
                &link,
                Box::new(move |_| follow(click_page.as_ref(), anchor.attribute("href").as_deref())),
            );
        }

        Attachment::Attached
    }
}

#[cfg(test)]
#[path = "smooth_scroll_test.rs"]
mod tests;
