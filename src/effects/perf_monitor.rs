//! Page-load and web-vital timings written to the diagnostic log.
//!
//! Web vitals are best effort: platforms without `PerformanceObserver`, or
//! that reject an entry type, simply produce no vital lines.

use std::rc::Rc;
use std::time::Duration;

use super::{Attachment, Effect};
use crate::page::{Capability, NavigationTiming, Page, VitalEntry, VitalKind};

pub struct PerformanceMonitor;

/// Durations derived from navigation timing, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageMetrics {
    pub page_load_ms: f64,
    pub connect_ms: f64,
    pub render_ms: f64,
}

impl From<NavigationTiming> for PageMetrics {
    fn from(timing: NavigationTiming) -> Self {
        Self {
            page_load_ms: timing.load_event_end - timing.navigation_start,
            connect_ms: timing.response_end - timing.request_start,
            render_ms: timing.dom_complete - timing.dom_loading,
        }
    }
}

/// Largest contentful paint from the newest entry in a batch.
///
/// Cross-origin images report a zero render time, so load time stands in.
pub fn largest_paint_ms(entries: &[VitalEntry]) -> Option<f64> {
    let last = entries.last()?;
    last.render_time.filter(|t| *t != 0.0).or(last.load_time)
}

pub fn input_delay_ms(entry: &VitalEntry) -> Option<f64> {
    entry.processing_start.map(|start| start - entry.start_time)
}

fn log_metrics(metrics: PageMetrics) {
    log::info!("performance metrics");
    log::info!("  page load time: {}ms", metrics.page_load_ms);
    log::info!("  connection time: {}ms", metrics.connect_ms);
    log::info!("  render time: {}ms", metrics.render_ms);
}

fn watch_vitals<P: Page>(page: &P) {
    if !page.supports(Capability::PerformanceObserver) {
        return;
    }

    let lcp = page.observe_vitals(
        VitalKind::LargestContentfulPaint,
        Box::new(|entries| {
            if let Some(ms) = largest_paint_ms(entries) {
                log::info!("LCP: {ms}ms");
            }
        }),
    );
    if let Err(err) = lcp {
        log::debug!("LCP observer not registered: {err}");
    }

    let fid = page.observe_vitals(
        VitalKind::FirstInput,
        Box::new(|entries| {
            for ms in entries.iter().filter_map(input_delay_ms) {
                log::info!("FID: {ms}ms");
            }
        }),
    );
    if let Err(err) = fid {
        log::debug!("FID observer not registered: {err}");
    }
}

impl<P: Page> Effect<P> for PerformanceMonitor {
    fn name(&self) -> &'static str {
        "performance-monitor"
    }

    fn attach(&self, page: &Rc<P>) -> Attachment {
        if !page.supports(Capability::PerformanceTiming) {
            return Attachment::Skipped("no performance timing");
        }

        let load_page = Rc::clone(page);
        page.on_load(Box::new(move || {
            // loadEventEnd is only filled in after the load handlers return.
            let report_page = Rc::clone(&load_page);
            load_page.set_timeout(
                Duration::ZERO,
                Box::new(move || {
                    let Some(timing) = report_page.navigation_timing() else {
                        log::debug!("navigation timing unavailable after load");
                        return;
                    };
                    log_metrics(PageMetrics::from(timing));
                    watch_vitals(report_page.as_ref());
                }),
            );
        }));

        Attachment::Attached
    }
}

#[cfg(test)]
#[path = "perf_monitor_test.rs"]
mod tests;
