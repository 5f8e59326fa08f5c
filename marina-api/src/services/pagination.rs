//! Offset pagination shared by every collection listing.
//!
//! The scan window comes from the `limit` and `offset` query parameters
//! (defaults 5 and 0). The envelope echoes the raw parameters, always reports
//! `count: 5`, and always carries a `next` link built by adding the two
//! parameters. A parameter that is absent or not a number shows up as `NaN`
//! in that link.

use serde::Deserialize;
use utoipa::IntoParams;

/// Value of the `count` field in every collection envelope.
pub const PAGE_COUNT: u32 = 5;

/// Scan size used when the request carries no usable `limit`.
pub const DEFAULT_PAGE_LIMIT: usize = 5;

/// Query parameters of a listing. Kept as raw strings so that unparsable
/// values still produce a page (and a `NaN` next link) instead of a 400.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageRequest {
    /// Page size.
    pub limit: Option<String>,
    /// Number of entities to skip.
    pub offset: Option<String>,
}

/// Concrete scan window handed to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: usize,
    pub offset: usize,
}

impl PageRequest {
    pub fn new(limit: Option<u64>, offset: Option<u64>) -> Self {
        Self {
            limit: limit.map(|l| l.to_string()),
            offset: offset.map(|o| o.to_string()),
        }
    }

    pub fn parsed_limit(&self) -> Option<u64> {
        parse_param(self.limit.as_deref())
    }

    pub fn parsed_offset(&self) -> Option<u64> {
        parse_param(self.offset.as_deref())
    }

    /// Window to scan, with the limit capped at `max`.
    pub fn window(&self, max: usize) -> PageWindow {
        let limit = self
            .parsed_limit()
            .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .min(max);
        let offset = self
            .parsed_offset()
            .map(|o| usize::try_from(o).unwrap_or(usize::MAX))
            .unwrap_or(0);
        PageWindow { limit, offset }
    }

    /// Wrap scanned items into the collection envelope for `collection_url`.
    pub fn page<T>(&self, items: Vec<T>, collection_url: &str) -> Page<T> {
        let limit = self.parsed_limit();
        let offset = self.parsed_offset();
        Page {
            items,
            offset,
            limit,
            count: PAGE_COUNT,
            next: next_link(collection_url, limit, offset),
        }
    }
}

fn parse_param(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse().ok())
}

/// `<collection_url>?limit=<L>&offset=<L+O>`, with `NaN` standing in for
/// anything that cannot be computed.
pub fn next_link(collection_url: &str, limit: Option<u64>, offset: Option<u64>) -> String {
    let limit_part = limit.map_or_else(|| "NaN".to_string(), |l| l.to_string());
    let offset_part = match (limit, offset) {
        (Some(l), Some(o)) => l.saturating_add(o).to_string(),
        _ => "NaN".to_string(),
    };
    format!("{}?limit={}&offset={}", collection_url, limit_part, offset_part)
}

/// One page of a listing, ready to be rendered as a collection envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    pub count: u32,
    pub next: String,
}
