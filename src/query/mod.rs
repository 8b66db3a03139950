//! Filter, sort and grouping over a collection's documents.

mod eval;
mod exec;
mod types;

pub use eval::{compare_bson, compare_docs, compare_field, eval_filter, get_path};
pub(crate) use eval::as_f64;
pub use exec::{MAX_LIMIT, count_docs, find_docs, find_one, group_docs};
pub use types::{Accumulator, Filter, FindOptions, GroupSpec, NATURAL_ORDER, Order, SortSpec};
