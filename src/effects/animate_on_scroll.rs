//! Reveal-on-scroll for content blocks.
//!
//! Blocks start faded and shifted down, then settle the first time they
//! enter the viewport. Revealing is one-way: leaving the viewport again does
//! not hide anything.

use std::rc::Rc;

use super::{Attachment, Effect};
use crate::page::{Capability, Element, ObserverOptions, Page, Watch};

pub const REVEAL_SELECTOR: &str = ".project-card, .skill-card, .about-content, .hero-content";
pub const REVEAL_THRESHOLD: f64 = 0.1;
pub const REVEAL_ROOT_MARGIN: &str = "0px 0px -50px 0px";

const HIDDEN_TRANSFORM: &str = "translateY(30px)";
const SETTLED_TRANSFORM: &str = "translateY(0)";
const TRANSITION: &str = "opacity 0.6s ease, transform 0.6s ease";

pub struct AnimateOnScroll;

fn reveal<E: Element>(element: &E) {
    element.set_style("opacity", "1");
    element.set_style("transform", SETTLED_TRANSFORM);
}

fn conceal<E: Element>(element: &E) {
    element.set_style("opacity", "0");
    element.set_style("transform", HIDDEN_TRANSFORM);
    element.set_style("transition", TRANSITION);
}

impl<P: Page> Effect<P> for AnimateOnScroll {
    fn name(&self) -> &'static str {
        "animate-on-scroll"
    }

    fn attach(&self, page: &Rc<P>) -> Attachment {
        let elements = page.query_all(REVEAL_SELECTOR);
        if elements.is_empty() {
            return Attachment::Skipped("nothing to reveal");
        }

        if !page.supports(Capability::IntersectionObserver) {
            for element in &elements {
                element.set_style("opacity", "1");
            }
            return Attachment::Skipped("no IntersectionObserver, content shown immediately");
        }

        for element in &elements {
            conceal(element);
        }

        let options = ObserverOptions { threshold: REVEAL_THRESHOLD, root_margin: REVEAL_ROOT_MARGIN.to_owned() };
        let observed = page.observe_intersections(
            &elements,
            &options,
            Box::new(|entry| {
                if entry.is_intersecting {
                    reveal(&entry.target);
                }
                Watch::Continue
            }),
        );

        if let Err(err) = observed {
            log::warn!("reveal observer unavailable, showing content: {err}");
            for element in &elements {
                reveal(element);
            }
            return Attachment::Skipped("intersection observer failed");
        }

        Attachment::Attached
    }
}

#[cfg(test)]
#[path = "animate_on_scroll_test.rs"]
mod tests;
