//! Turns raw listing parameters into a store query.

use super::error::UserError;
use super::pagination::{PageLimits, PageWindow};
use crate::query::{Filter, NATURAL_ORDER, SortSpec};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SORT_FIELD: &str = "createdAt";
const SEARCH_FIELDS: [&str; 2] = ["name", "email"];

/// Listing parameters exactly as they arrive in a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
    pub city: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ListQuery {
    pub filter: Filter,
    pub sort: Vec<SortSpec>,
    pub window: PageWindow,
}

fn present(v: Option<&String>) -> Option<&str> {
    v.map(String::as_str).filter(|s| !s.is_empty())
}

impl ListParams {
    /// # Errors
    /// `Validation` when the search text is too large to compile.
    pub fn to_query(&self, limits: PageLimits) -> Result<ListQuery, UserError> {
        Ok(ListQuery {
            filter: build_filter(self)?,
            sort: parse_sort(present(self.sort.as_ref())),
            window: PageWindow::from_params(self.page.as_deref(), self.limit.as_deref(), limits),
        })
    }
}

/// AND of the exact `status` and `address.city` matches and a case-insensitive literal
/// substring match of `search` against name or email.
///
/// # Errors
/// `Validation` when the search pattern exceeds the regex size limit.
pub fn build_filter(params: &ListParams) -> Result<Filter, UserError> {
    let mut clauses = Vec::new();
    if let Some(status) = present(params.status.as_ref()) {
        clauses.push(Filter::eq("status", status));
    }
    if let Some(city) = present(params.city.as_ref()) {
        clauses.push(Filter::eq("address.city", city));
    }
    if let Some(search) = present(params.search.as_ref()) {
        let regex = RegexBuilder::new(&regex::escape(search))
            .case_insensitive(true)
            .build()
            .map_err(|e| UserError::validation("search", e.to_string()))?;
        clauses.push(Filter::Or(
            SEARCH_FIELDS
                .iter()
                .map(|f| Filter::Regex { path: (*f).to_string(), regex: regex.clone() })
                .collect(),
        ));
    }
    Ok(Filter::all(clauses))
}

/// `field:dir[,field:dir...]`; `desc` sorts descending, any other direction ascending.
/// Falls back to newest first when nothing usable is given, with insertion order
/// breaking `createdAt` ties.
#[must_use]
pub fn parse_sort(raw: Option<&str>) -> Vec<SortSpec> {
    let keys: Vec<SortSpec> = raw
        .unwrap_or("")
        .split(',')
        .filter_map(|token| {
            let (field, dir) = token.split_once(':').unwrap_or((token, ""));
            let field = field.trim();
            if field.is_empty() {
                return None;
            }
            Some(if dir.trim() == "desc" { SortSpec::desc(field) } else { SortSpec::asc(field) })
        })
        .collect();
    if keys.is_empty() { default_sort() } else { keys }
}

fn default_sort() -> Vec<SortSpec> {
    vec![SortSpec::desc(DEFAULT_SORT_FIELD), SortSpec::desc(NATURAL_ORDER)]
}
