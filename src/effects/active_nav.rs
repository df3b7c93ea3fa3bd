//! Highlights the navigation link for the section currently in view.

use std::rc::Rc;

use super::{Attachment, Effect};
use crate::config::Config;
use crate::page::{Element, Page};

pub const SECTION_SELECTOR: &str = "section[id]";
pub const LINK_SELECTOR: &str = ".nav-link";
pub const ACTIVE_CLASS: &str = "active";

pub struct ActiveNavLink {
    config: Rc<Config>,
}

impl ActiveNavLink {
    pub fn new(config: Rc<Config>) -> Self {
        Self { config }
    }
}

/// Vertical extent of a section, as laid out.
#[derive(Clone, Debug, PartialEq)]
pub struct SectionSpan {
    pub id: String,
    pub top: f64,
    pub height: f64,
}

/// Id of the section containing `position`. Later sections win on overlap.
pub fn current_section(spans: &[SectionSpan], position: f64) -> Option<&str> {
    spans
        .iter()
        .rev()
        .find(|span| position >= span.top && position < span.top + span.height)
        .map(|span| span.id.as_str())
}

fn update<P: Page>(page: &P, sections: &[P::Element], links: &[P::Element], lookahead: f64) {
    let spans = sections
        .iter()
        .filter_map(|section| {
            Some(SectionSpan { id: section.attribute("id")?, top: section.offset_top(), height: section.offset_height() })
        })
        .collect::<Vec<_>>();
    let target = current_section(&spans, page.scroll_offset() + lookahead).map(|id| format!("#{id}"));

    for link in links {
        link.remove_class(ACTIVE_CLASS);
        if target.is_some() && link.attribute("href") == target {
            link.add_class(ACTIVE_CLASS);
        }
    }
}

impl<P: Page> Effect<P> for ActiveNavLink {
    fn name(&self) -> &'static str {
        "active-nav-link"
    }

    fn attach(&self, page: &Rc<P>) -> Attachment {
        let sections = page.query_all(SECTION_SELECTOR);
        let links = page.query_all(LINK_SELECTOR);
        if sections.is_empty() || links.is_empty() {
            return Attachment::Skipped("no sections or nav links");
        }

        let lookahead = self.config.active_link_lookahead;
        update(page.as_ref(), &sections, &links, lookahead);

        let scroll_page = Rc::clone(page);
        page.on_scroll(Box::new(move || update(scroll_page.as_ref(), &sections, &links, lookahead)));

        Attachment::Attached
    }
}

#[cfg(test)]
#[path = "active_nav_test.rs"]
mod tests;
