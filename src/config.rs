//! Site-wide constants read by the effect controllers.
//!
//! Defaults match the stylesheet the site ships with. A page may override
//! any subset of them with a JSON block:
//!
//! ```html
//! <script id="folio-config" type="application/json">{"scrollThreshold": 400}</script>
//! ```
//!
//! The configuration is built once at boot and shared read-only.

use serde::Deserialize;

use crate::page::{Element, Page};

pub const CONFIG_ELEMENT_ID: &str = "folio-config";

pub const DEFAULT_SCROLL_THRESHOLD: f64 = 300.0;
pub const DEFAULT_NAV_SCROLL_CLASS: &str = "scrolled";
pub const DEFAULT_ANIMATION_DELAY_MS: u32 = 100;
pub const DEFAULT_HEADER_SCROLL_OFFSET: f64 = 50.0;
pub const DEFAULT_ACTIVE_LINK_LOOKAHEAD: f64 = 100.0;
pub const DEFAULT_SUBMIT_DELAY_MS: u32 = 1000;
pub const DEFAULT_NOTIFICATION_DISPLAY_MS: u32 = 5000;
pub const DEFAULT_NOTIFICATION_EXIT_MS: u32 = 300;
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown log level '{0}' (expected error, warn, info, debug or trace)")]
    LogLevel(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// Scroll offset past which the scroll-to-top button shows.
    pub scroll_threshold: f64,
    /// Class added to the header once the page has scrolled.
    pub nav_scroll_class: String,
    /// Stagger delay exposed to stylesheets; no controller reads it.
    pub animation_delay_ms: u32,
    pub header_scroll_offset: f64,
    /// Distance below the scroll offset used to pick the active section.
    pub active_link_lookahead: f64,
    pub submit_delay_ms: u32,
    pub notification_display_ms: u32,
    pub notification_exit_ms: u32,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scroll_threshold: DEFAULT_SCROLL_THRESHOLD,
            nav_scroll_class: DEFAULT_NAV_SCROLL_CLASS.to_owned(),
            animation_delay_ms: DEFAULT_ANIMATION_DELAY_MS,
            header_scroll_offset: DEFAULT_HEADER_SCROLL_OFFSET,
            active_link_lookahead: DEFAULT_ACTIVE_LINK_LOOKAHEAD,
            submit_delay_ms: DEFAULT_SUBMIT_DELAY_MS,
            notification_display_ms: DEFAULT_NOTIFICATION_DISPLAY_MS,
            notification_exit_ms: DEFAULT_NOTIFICATION_EXIT_MS,
            log_level: DEFAULT_LOG_LEVEL.to_owned(),
        }
    }
}

impl Config {
    /// Parse a JSON override block. Missing keys keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.level()?;
        Ok(config)
    }

    /// Build the configuration from the page's override block, if any.
    ///
    /// An absent or blank block yields the defaults.
    pub fn from_page<P: Page>(page: &P) -> Result<Self, ConfigError> {
        let raw = page
            .element_by_id(CONFIG_ELEMENT_ID)
            .and_then(|el| el.text())
            .unwrap_or_default();
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Self::from_json(&raw)
    }

    /// Parsed log level for the console logger.
    pub fn level(&self) -> Result<log::Level, ConfigError> {
        self.log_level
            .parse::<log::Level>()
            .map_err(|_| ConfigError::LogLevel(self.log_level.clone()))
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
