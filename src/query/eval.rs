use bson::{Bson, Document as BsonDocument};
use std::cmp::Ordering;

use super::types::{Filter, MAX_PATH_DEPTH, MAX_SORT_FIELDS, NATURAL_ORDER, Order, SortSpec};

pub fn eval_filter(doc: &BsonDocument, filter: &Filter) -> bool {
    match filter {
        Filter::True => true,
        Filter::And(fs) => fs.iter().all(|f| eval_filter(doc, f)),
        Filter::Or(fs) => fs.iter().any(|f| eval_filter(doc, f)),
        Filter::Eq { path, value } => get_path(doc, path).is_some_and(|v| values_equal(v, value)),
        Filter::Regex { path, regex } => {
            matches!(get_path(doc, path), Some(Bson::String(s)) if regex.is_match(s))
        }
    }
}

/// Orders two documents on one key. Missing fields sort before present ones. The
/// insertion-order key compares equal here; only the executor knows sequences.
pub fn compare_field(a: &BsonDocument, b: &BsonDocument, s: &SortSpec) -> Ordering {
    if s.field == NATURAL_ORDER {
        return Ordering::Equal;
    }
    let ord = match (get_path(a, &s.field), get_path(b, &s.field)) {
        (Some(x), Some(y)) => compare_bson(x, y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    };
    if s.order == Order::Asc { ord } else { ord.reverse() }
}

/// Orders two documents by `sort`, left to right.
pub fn compare_docs(a: &BsonDocument, b: &BsonDocument, sort: &[SortSpec]) -> Ordering {
    sort.iter()
        .take(MAX_SORT_FIELDS)
        .map(|s| compare_field(a, b, s))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

// Numbers compare by value across Int32/Int64/Double; everything else must match exactly.
fn values_equal(a: &Bson, b: &Bson) -> bool {
    if is_num(a) && is_num(b) {
        return compare_bson(a, b) == Ordering::Equal;
    }
    a == b
}

/// Resolves a dotted path. Returns `None` when any segment is missing or not a subdocument.
pub fn get_path<'a>(doc: &'a BsonDocument, path: &str) -> Option<&'a Bson> {
    if path.is_empty() || path.len() > 1024 {
        return None;
    }
    let mut segs = path.split('.');
    let mut cur = doc.get(segs.next()?)?;
    for (depth, seg) in segs.enumerate() {
        if depth + 1 >= MAX_PATH_DEPTH {
            return None;
        }
        match cur {
            Bson::Document(d) => cur = d.get(seg)?,
            _ => return None,
        }
    }
    Some(cur)
}

fn is_num(x: &Bson) -> bool {
    matches!(x, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_))
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn as_f64(x: &Bson) -> Option<f64> {
    match x {
        Bson::Int32(i) => Some(f64::from(*i)),
        Bson::Int64(i) => Some(*i as f64),
        Bson::Double(f) => Some(*f),
        _ => None,
    }
}

pub fn compare_bson(a: &Bson, b: &Bson) -> Ordering {
    use bson::Bson as T;
    if let (Some(x), Some(y)) = (as_f64(a), as_f64(b)) {
        return x.total_cmp(&y);
    }
    match (a, b) {
        (T::String(x), T::String(y)) => x.cmp(y),
        (T::Boolean(x), T::Boolean(y)) => x.cmp(y),
        (T::DateTime(x), T::DateTime(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(v: &Bson) -> u8 {
    use bson::Bson as T;
    match v {
        T::MinKey => 0,
        T::Null | T::Undefined => 1,
        T::Int32(_) | T::Int64(_) | T::Double(_) | T::Decimal128(_) => 2,
        T::String(_) | T::Symbol(_) => 3,
        T::Document(_) => 4,
        T::Array(_) => 5,
        T::Binary(_) => 6,
        T::ObjectId(_) => 7,
        T::Boolean(_) => 8,
        T::DateTime(_) => 9,
        T::Timestamp(_) => 10,
        T::RegularExpression(_) => 11,
        T::DbPointer(_) | T::JavaScriptCode(_) | T::JavaScriptCodeWithScope(_) => 12,
        T::MaxKey => 255,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn ci(pattern: &str) -> regex::Regex {
        regex::RegexBuilder::new(pattern).case_insensitive(true).build().unwrap()
    }

    #[test]
    fn nested_path_lookup() {
        let d = doc! {"address": {"city": "Boston"}, "age": 30};
        assert_eq!(get_path(&d, "address.city"), Some(&Bson::String("Boston".into())));
        assert!(get_path(&d, "address.zip").is_none());
        assert!(get_path(&d, "age.x").is_none());
        assert!(get_path(&d, "").is_none());
    }

    #[test]
    fn eq_matches_numbers_across_widths() {
        let d = doc! {"age": 30_i64};
        assert!(eval_filter(&d, &Filter::eq("age", 30)));
        assert!(eval_filter(&d, &Filter::eq("age", 30.0)));
        assert!(!eval_filter(&d, &Filter::eq("age", "30")));
    }

    #[test]
    fn or_of_regexes() {
        let f = Filter::Or(vec![
            Filter::Regex { path: "name".into(), regex: ci("jo") },
            Filter::Regex { path: "email".into(), regex: ci("jo") },
        ]);
        assert!(eval_filter(&doc! {"name": "John", "email": "x@y.z"}, &f));
        assert!(eval_filter(&doc! {"name": "Ann", "email": "bjo@x.com"}, &f));
        assert!(!eval_filter(&doc! {"name": "Ann", "email": "ann@x.com"}, &f));
        assert!(!eval_filter(&doc! {"name": 7, "email": Bson::Null}, &f));
    }

    #[test]
    fn multi_key_ordering() {
        let sort = vec![SortSpec::asc("name"), SortSpec::desc("age")];
        let a = doc! {"name": "amy", "age": 20};
        let b = doc! {"name": "amy", "age": 40};
        let c = doc! {"name": "bob", "age": 99};
        assert_eq!(compare_docs(&a, &b, &sort), Ordering::Greater);
        assert_eq!(compare_docs(&b, &c, &sort), Ordering::Less);
        assert_eq!(compare_docs(&a, &a, &sort), Ordering::Equal);
    }

    #[test]
    fn datetimes_order_chronologically() {
        let early = Bson::DateTime(bson::DateTime::from_millis(1_000));
        let late = Bson::DateTime(bson::DateTime::from_millis(2_000));
        assert_eq!(compare_bson(&early, &late), Ordering::Less);
    }
}
