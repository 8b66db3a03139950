use crate::query::MAX_LIMIT;
use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self { default_limit: DEFAULT_PAGE_SIZE, max_limit: MAX_PAGE_SIZE }
    }
}

/// Requested page, 1-based, and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: usize,
    pub limit: usize,
}

// Anything that is not a positive integer falls back to the default.
fn positive(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|s| s.trim().parse::<usize>().ok()).filter(|n| *n >= 1).unwrap_or(default)
}

impl PageWindow {
    /// Parses raw `page`/`limit` parameters. The limit is clamped to `limits.max_limit`,
    /// which itself never exceeds [`MAX_LIMIT`].
    #[must_use]
    pub fn from_params(page: Option<&str>, limit: Option<&str>, limits: PageLimits) -> Self {
        let max = limits.max_limit.clamp(1, MAX_LIMIT);
        Self {
            page: positive(page, 1),
            limit: positive(limit, limits.default_limit).min(max),
        }
    }

    #[must_use]
    pub const fn skip(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// Summary returned next to a page of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub pages: usize,
}

impl Pagination {
    #[must_use]
    pub const fn new(window: PageWindow, total: usize) -> Self {
        let pages = if window.limit == 0 { 0 } else { total.div_ceil(window.limit) };
        Self { page: window.page, limit: window.limit, total, pages }
    }
}
