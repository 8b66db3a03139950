use bson::doc;
use userbase::Database;
use userbase::collection::Collection;
use userbase::document::Document;
use userbase::query::{
    Accumulator, Filter, FindOptions, GroupSpec, NATURAL_ORDER, SortSpec, count_docs, find_docs, group_docs,
};
use userbase::users::{ListParams, PageLimits, build_filter, parse_sort};
use std::sync::Arc;

fn people() -> (Database, Arc<Collection>) {
    let db = Database::in_memory();
    let col = db.collection("people").unwrap();
    let rows = [
        ("Bob", "bob@x.io", 40, "Rome", 3),
        ("amy", "amy@x.io", 20, "Oslo", 1),
        ("Amy", "amy2@x.io", 35, "Oslo", 5),
        ("John", "jj@x.io", 28, "Lima", 2),
        ("Zed", "bjo@x.com", 50, "Rome", 4),
    ];
    for (name, email, age, city, created) in rows {
        col.insert_document(Document::new(doc! {
            "name": name,
            "email": email,
            "age": age,
            "address": {"city": city},
            "createdAt": bson::DateTime::from_millis(created * 1000),
        }))
        .unwrap();
    }
    (db, col)
}

fn names(col: &Collection, filter: &Filter, sort: Vec<SortSpec>) -> Vec<String> {
    let opts = FindOptions { sort: Some(sort), ..FindOptions::default() };
    find_docs(col, filter, &opts)
        .unwrap()
        .iter()
        .map(|d| d.data.get_str("name").unwrap().to_string())
        .collect()
}

#[test]
fn default_order_is_newest_first() {
    let (_db, col) = people();
    let sort = parse_sort(None);
    assert_eq!(names(&col, &Filter::True, sort), vec!["Amy", "Zed", "Bob", "John", "amy"]);
}

#[test]
fn name_asc_then_age_desc() {
    let (_db, col) = people();
    let sort = parse_sort(Some("name:asc,age:desc"));
    // byte order: uppercase before lowercase
    assert_eq!(names(&col, &Filter::True, sort), vec!["Amy", "Bob", "John", "Zed", "amy"]);
}

#[test]
fn search_matches_name_or_email() {
    let (_db, col) = people();
    let params = ListParams { search: Some("jo".into()), ..ListParams::default() };
    let f = build_filter(&params).unwrap();
    let mut found = names(&col, &f, vec![SortSpec::asc("name")]);
    found.sort();
    assert_eq!(found, vec!["John", "Zed"]);
}

#[test]
fn list_query_windows_and_counts() {
    let (_db, col) = people();
    let params = ListParams {
        city: Some("Oslo".into()),
        page: Some("2".into()),
        limit: Some("1".into()),
        ..ListParams::default()
    };
    let q = params.to_query(PageLimits::default()).unwrap();
    let opts = FindOptions { sort: Some(q.sort), skip: Some(q.window.skip()), limit: Some(q.window.limit) };
    let page = find_docs(&col, &q.filter, &opts).unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].data.get_str("name").unwrap(), "amy");
    assert_eq!(count_docs(&col, &q.filter).unwrap(), 2);
}

#[test]
fn default_order_breaks_timestamp_ties_newest_first() {
    let (_db, col) = people();
    for name in ["Tie1", "Tie2", "Tie3"] {
        col.insert_document(Document::new(doc! {
            "name": name,
            "createdAt": bson::DateTime::from_millis(9000),
        }))
        .unwrap();
    }
    let sort = parse_sort(None);
    assert_eq!(sort.last(), Some(&SortSpec::desc(NATURAL_ORDER)));
    let found = names(&col, &Filter::True, sort);
    assert_eq!(found[..3], ["Tie3", "Tie2", "Tie1"]);
}

#[test]
fn top_cities_by_count() {
    let (_db, col) = people();
    let spec = GroupSpec::by("address.city")
        .with("count", Accumulator::Count)
        .with("avgAge", Accumulator::Avg("age".into()))
        .sorted(vec![SortSpec::desc("count")])
        .limit(2);
    let rows = group_docs(&col, &Filter::True, &spec).unwrap();
    let cities: Vec<&str> = rows.iter().map(|r| r.get_str("_id").unwrap()).collect();
    assert_eq!(cities, vec!["Rome", "Oslo"]);
    assert!((rows[0].get_f64("avgAge").unwrap() - 45.0).abs() < 1e-9);
}
