use crate::collection::Collection;
use crate::document::Document;
use crate::errors::DbError;
use bson::{Bson, Document as BsonDocument};
use std::collections::HashMap;
use std::time::Instant;

use super::eval::{as_f64, compare_docs, compare_field, eval_filter, get_path};
use super::types::{Accumulator, Filter, FindOptions, GroupSpec, MAX_SORT_FIELDS, NATURAL_ORDER, Order, SortSpec};
use std::cmp::Ordering;

/// Upper bound on documents a single `find_docs` call may return.
pub const MAX_LIMIT: usize = 10_000;

fn log_bench(op: &str, col: &Collection, start: Instant, result_count: usize) {
    log::debug!(
        "{{\"bench\":\"query\",\"op\":\"{op}\",\"collection\":\"{}\",\"duration_us\":{},\"result_count\":{result_count}}}",
        col.name(),
        start.elapsed().as_micros(),
    );
}

fn compare_entries(a: (u64, &Document), b: (u64, &Document), sort: &[SortSpec]) -> Ordering {
    sort.iter()
        .take(MAX_SORT_FIELDS)
        .map(|s| {
            if s.field != NATURAL_ORDER {
                return compare_field(&a.1.data, &b.1.data, s);
            }
            let ord = a.0.cmp(&b.0);
            if s.order == Order::Asc { ord } else { ord.reverse() }
        })
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Returns the documents matching `filter`, sorted, then windowed by `skip`/`limit`.
/// Without a sort the collection's insertion order is kept. A `$natural` key sorts by
/// insertion sequence.
pub fn find_docs(col: &Collection, filter: &Filter, opts: &FindOptions) -> Result<Vec<Document>, DbError> {
    let start = Instant::now();
    let state = col.read()?;
    let mut docs: Vec<(u64, &Document)> = state.entries().filter(|(_, d)| eval_filter(&d.data, filter)).collect();
    if let Some(sort) = &opts.sort {
        if sort.len() > MAX_SORT_FIELDS {
            log::warn!("sort spec too long: {}, extra keys ignored", sort.len());
        }
        // stable: equal keys keep insertion order
        docs.sort_by(|a, b| compare_entries(*a, *b, sort));
    }
    let skip = opts.skip.unwrap_or(0);
    let limit = opts.limit.unwrap_or(usize::MAX).min(MAX_LIMIT);
    let out: Vec<Document> = docs.into_iter().skip(skip).take(limit).map(|(_, d)| d.clone()).collect();
    drop(state);
    log_bench("find", col, start, out.len());
    Ok(out)
}

/// Counts matching documents; ignores any window.
pub fn count_docs(col: &Collection, filter: &Filter) -> Result<usize, DbError> {
    let start = Instant::now();
    let n = col.read()?.iter().filter(|d| eval_filter(&d.data, filter)).count();
    log_bench("count", col, start, n);
    Ok(n)
}

pub fn find_one(col: &Collection, filter: &Filter) -> Result<Option<Document>, DbError> {
    Ok(col.read()?.iter().find(|d| eval_filter(&d.data, filter)).cloned())
}

struct Group {
    key: Bson,
    count: i64,
    // per accumulator: (sum, numeric values seen)
    sums: Vec<(f64, u64)>,
}

/// Partitions the matching documents by `spec.key` and reduces each partition.
///
/// Output documents hold the group key under `_id` (null for documents without the key) plus
/// one field per accumulator. `Count` yields an `Int64`; `Avg` yields a `Double`, or null when
/// the group has no numeric value for the field. Groups come out in first-seen order
/// unless `spec.sort` is given, and are truncated to `spec.limit`.
#[allow(clippy::cast_precision_loss)]
pub fn group_docs(col: &Collection, filter: &Filter, spec: &GroupSpec) -> Result<Vec<BsonDocument>, DbError> {
    let start = Instant::now();
    let mut groups: Vec<Group> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();
    {
        let state = col.read()?;
        for doc in state.iter().filter(|d| eval_filter(&d.data, filter)) {
            let key = get_path(&doc.data, &spec.key).cloned().unwrap_or(Bson::Null);
            let slot = *slots.entry(format!("{key:?}")).or_insert_with(|| {
                groups.push(Group { key, count: 0, sums: vec![(0.0, 0); spec.accumulators.len()] });
                groups.len() - 1
            });
            let g = &mut groups[slot];
            g.count += 1;
            for (i, (_, acc)) in spec.accumulators.iter().enumerate() {
                if let Accumulator::Avg(path) = acc
                    && let Some(x) = get_path(&doc.data, path).and_then(as_f64)
                {
                    g.sums[i].0 += x;
                    g.sums[i].1 += 1;
                }
            }
        }
    }

    let mut out: Vec<BsonDocument> = groups
        .into_iter()
        .map(|g| {
            let mut d = BsonDocument::new();
            d.insert("_id", g.key);
            for ((name, acc), (sum, seen)) in spec.accumulators.iter().zip(g.sums) {
                let v = match acc {
                    Accumulator::Count => Bson::Int64(g.count),
                    Accumulator::Avg(_) if seen == 0 => Bson::Null,
                    Accumulator::Avg(_) => Bson::Double(sum / seen as f64),
                };
                d.insert(name.clone(), v);
            }
            d
        })
        .collect();
    if let Some(sort) = &spec.sort {
        out.sort_by(|a, b| compare_docs(a, b, sort));
    }
    if let Some(n) = spec.limit {
        out.truncate(n);
    }
    log_bench("group", col, start, out.len());
    Ok(out)
}
