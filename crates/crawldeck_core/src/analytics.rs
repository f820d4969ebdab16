//! Per-row analytics panel. Fetched on demand, never cached: every open
//! starts from `Loading` and issues fresh requests.

use crate::failure::RequestFailure;
use crate::rows::{BrokenLink, LinkStats, UrlId};

pub const STATS_ERROR: &str = "Failed to fetch link statistics.";
pub const BROKEN_LINKS_ERROR: &str = "Failed to fetch broken links.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Panel<T> {
    Loading,
    Failed(String),
    Loaded(T),
}

impl<T> Panel<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Panel::Loading)
    }

    fn resolve(&mut self, result: Result<T, RequestFailure>, error_text: &str) {
        *self = match result {
            Ok(value) => Panel::Loaded(value),
            Err(_) => Panel::Failed(error_text.to_string()),
        };
    }
}

/// Identifies one opening of the panel; replies carry it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PanelKey {
    pub url_id: UrlId,
    pub opened: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsPanel {
    pub key: PanelKey,
    pub url: String,
    pub stats: Panel<LinkStats>,
    pub broken_links: Panel<Vec<BrokenLink>>,
}

impl AnalyticsPanel {
    pub fn open(key: PanelKey, url: impl Into<String>) -> Self {
        Self {
            key,
            url: url.into(),
            stats: Panel::Loading,
            broken_links: Panel::Loading,
        }
    }

    pub fn url_id(&self) -> UrlId {
        self.key.url_id
    }

    /// Returns `false` when the reply belongs to an earlier or different panel.
    pub fn resolve_stats(&mut self, key: PanelKey, result: Result<LinkStats, RequestFailure>) -> bool {
        if key != self.key || !self.stats.is_loading() {
            return false;
        }
        self.stats.resolve(result, STATS_ERROR);
        true
    }

    pub fn resolve_broken_links(
        &mut self,
        key: PanelKey,
        result: Result<Vec<BrokenLink>, RequestFailure>,
    ) -> bool {
        if key != self.key || !self.broken_links.is_loading() {
            return false;
        }
        self.broken_links.resolve(result, BROKEN_LINKS_ERROR);
        true
    }
}
