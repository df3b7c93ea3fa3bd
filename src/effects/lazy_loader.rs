//! Deferred image loading for platforms without `loading="lazy"` support.
//!
//! Images carry their real source in `data-src`; it is promoted to `src` the
//! first time the image scrolls into view.

use std::rc::Rc;

use super::{Attachment, Effect};
use crate::page::{Capability, Element, ObserverOptions, Page, Watch};

pub const LAZY_IMAGE_SELECTOR: &str = "img[loading=\"lazy\"]";
pub const STAGED_SOURCE_ATTR: &str = "data-src";

pub struct LazyLoader;

fn promote<E: Element>(image: &E) {
    if let Some(source) = image.attribute(STAGED_SOURCE_ATTR) {
        image.set_attribute("src", &source);
        image.remove_attribute(STAGED_SOURCE_ATTR);
    }
}

impl<P: Page> Effect<P> for LazyLoader {
    fn name(&self) -> &'static str {
        "lazy-loader"
    }

    fn attach(&self, page: &Rc<P>) -> Attachment {
        if page.supports(Capability::NativeLazyLoading) {
            return Attachment::Skipped("native lazy loading");
        }
        if !page.supports(Capability::IntersectionObserver) {
            return Attachment::Skipped("no IntersectionObserver");
        }

        let images = page.query_all(LAZY_IMAGE_SELECTOR);
        if images.is_empty() {
            return Attachment::Skipped("no lazy images");
        }

        let observed = page.observe_intersections(
            &images,
            &ObserverOptions::default(),
            Box::new(|entry| {
                if !entry.is_intersecting {
                    return Watch::Continue;
                }
                promote(&entry.target);
                Watch::Stop
            }),
        );

        match observed {
            Ok(()) => Attachment::Attached,
            Err(err) => {
                log::warn!("lazy image observer unavailable: {err}");
                Attachment::Skipped("intersection observer failed")
            }
        }
    }
}

#[cfg(test)]
#[path = "lazy_loader_test.rs"]
mod tests;
