use bson::Bson;
use regex::Regex;

// Safety limits to prevent resource abuse
pub(crate) const MAX_PATH_DEPTH: usize = 32;
pub(crate) const MAX_SORT_FIELDS: usize = 8;

/// Sort key that orders by insertion sequence instead of a document field.
pub const NATURAL_ORDER: &str = "$natural";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub order: Order,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), order: Order::Asc }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), order: Order::Desc }
    }
}

/// Options for `find_docs`.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub sort: Option<Vec<SortSpec>>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
}

/// Predicate over a document. Paths are dotted (`address.city`).
#[derive(Debug, Clone)]
pub enum Filter {
    True,
    And(Vec<Filter>),
    Or(Vec<Filter>),
    /// Exact match; numbers compare by value across widths.
    Eq { path: String, value: Bson },
    /// Matches string fields only; the pattern is compiled once by whoever builds the filter.
    Regex { path: String, regex: Regex },
}

impl Filter {
    pub fn eq(path: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::Eq { path: path.into(), value: value.into() }
    }

    /// Flattens the common cases: no clauses is `True`, one clause is itself.
    #[must_use]
    pub fn all(mut clauses: Vec<Self>) -> Self {
        match clauses.len() {
            0 => Self::True,
            1 => clauses.pop().unwrap_or(Self::True),
            _ => Self::And(clauses),
        }
    }
}

/// Per-group reducer used by `group_docs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accumulator {
    Count,
    Avg(String),
}

/// Grouping stage: partition by `key`, reduce with `accumulators`, then sort and limit the
/// group documents. Each output document carries the group key under `_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSpec {
    pub key: String,
    pub accumulators: Vec<(String, Accumulator)>,
    pub sort: Option<Vec<SortSpec>>,
    pub limit: Option<usize>,
}

impl GroupSpec {
    pub fn by(key: impl Into<String>) -> Self {
        Self { key: key.into(), accumulators: Vec::new(), sort: None, limit: None }
    }

    #[must_use]
    pub fn with(mut self, output: impl Into<String>, acc: Accumulator) -> Self {
        self.accumulators.push((output.into(), acc));
        self
    }

    #[must_use]
    pub fn sorted(mut self, sort: Vec<SortSpec>) -> Self {
        self.sort = Some(sort);
        self
    }

    #[must_use]
    pub const fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }
}
