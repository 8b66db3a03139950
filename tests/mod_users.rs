use userbase::Database;
use userbase::users::{
    AddressInput, ListParams, NewUser, PageLimits, ServiceSettings, Status, UserError, UserPatch, UserService,
};

fn input(name: &str, email: &str, age: i64, city: &str, status: Status) -> NewUser {
    NewUser {
        name: Some(name.into()),
        email: Some(email.into()),
        age: Some(age),
        address: Some(AddressInput {
            street: Some("12 Main St".into()),
            city: Some(city.into()),
            ..AddressInput::default()
        }),
        status: Some(status),
        ..NewUser::default()
    }
}

async fn seeded() -> UserService {
    let svc = UserService::new(&Database::in_memory(), ServiceSettings::default()).unwrap();
    let rows = [
        ("John Smith", "john@x.io", 30, "Boston", Status::Active),
        ("Jane Doe", "jane@x.io", 40, "Boston", Status::Active),
        ("Alice", "alice@jo.org", 25, "Denver", Status::Inactive),
        ("Bob", "bob@x.io", 60, "Austin", Status::Suspended),
        ("Carl", "carl@x.io", 35, "Miami", Status::Active),
        ("Dana", "dana@x.io", 45, "Seattle", Status::Inactive),
        ("Eve", "eve@x.io", 22, "Denver", Status::Active),
        ("Finn", "finn@x.io", 50, "Tulsa", Status::Active),
        ("Gus", "gus@x.io", 19, "Reno", Status::Active),
    ];
    for (name, email, age, city, status) in rows {
        svc.create_user(input(name, email, age, city, status)).await.unwrap();
    }
    svc
}

fn names(page: &userbase::users::UserPage) -> Vec<&str> {
    page.users.iter().map(|u| u.name.as_str()).collect()
}

#[tokio::test]
async fn sort_by_name_then_age() {
    let svc = seeded().await;
    let params = ListParams { sort: Some("name:asc,age:desc".into()), limit: Some("3".into()), ..ListParams::default() };
    let page = svc.list_users(&params).await.unwrap();
    assert_eq!(names(&page), vec!["Alice", "Bob", "Carl"]);
    assert_eq!(page.pagination.total, 9);
    assert_eq!(page.pagination.pages, 3);
}

#[tokio::test]
async fn search_is_case_insensitive_over_name_and_email() {
    let svc = seeded().await;
    let params = ListParams { search: Some("JO".into()), sort: Some("name:asc".into()), ..ListParams::default() };
    let page = svc.list_users(&params).await.unwrap();
    assert_eq!(names(&page), vec!["Alice", "John Smith"]);
}

#[tokio::test]
async fn search_text_is_literal() {
    let svc = seeded().await;
    let params = ListParams { search: Some(".*".into()), ..ListParams::default() };
    let page = svc.list_users(&params).await.unwrap();
    assert!(page.users.is_empty());
    assert_eq!(page.pagination.total, 0);
    assert_eq!(page.pagination.pages, 0);
}

#[tokio::test]
async fn filters_combine() {
    let svc = seeded().await;
    let params = ListParams {
        status: Some("active".into()),
        city: Some("Boston".into()),
        sort: Some("age:asc".into()),
        ..ListParams::default()
    };
    let page = svc.list_users(&params).await.unwrap();
    assert_eq!(names(&page), vec!["John Smith", "Jane Doe"]);
}

#[tokio::test]
async fn page_past_the_end_is_empty_but_counted() {
    let svc = seeded().await;
    let params = ListParams { page: Some("7".into()), limit: Some("4".into()), ..ListParams::default() };
    let page = svc.list_users(&params).await.unwrap();
    assert!(page.users.is_empty());
    assert_eq!(page.pagination.page, 7);
    assert_eq!(page.pagination.total, 9);
    assert_eq!(page.pagination.pages, 3);
}

#[tokio::test]
async fn oversized_limit_is_clamped() {
    let settings = ServiceSettings { limits: PageLimits { default_limit: 2, max_limit: 4 }, top_cities: 5 };
    let svc = UserService::new(&Database::in_memory(), settings).unwrap();
    for n in 0..6 {
        svc.create_user(input("Someone", &format!("s{n}@x.io"), 30, "Oslo", Status::Active)).await.unwrap();
    }
    let page = svc.list_users(&ListParams::default()).await.unwrap();
    assert_eq!(page.users.len(), 2);
    let params = ListParams { limit: Some("500".into()), ..ListParams::default() };
    let page = svc.list_users(&params).await.unwrap();
    assert_eq!(page.users.len(), 4);
    assert_eq!(page.pagination.limit, 4);
    assert_eq!(page.pagination.pages, 2);
}

#[tokio::test]
async fn stats_summarise_the_collection() {
    let svc = seeded().await;
    let stats = svc.stats().await.unwrap();
    assert_eq!(stats.total_users, 9);
    let statuses: Vec<(&str, u64)> = stats.status_stats.iter().map(|s| (s.status.as_str(), s.count)).collect();
    assert_eq!(statuses, vec![("active", 6), ("inactive", 2), ("suspended", 1)]);
    assert!(stats.top_cities.len() <= 5);
    assert_eq!(stats.top_cities[0].city, "Boston");
    assert_eq!(stats.top_cities[0].count, 2);
    assert_eq!(stats.top_cities[1].city, "Denver");
    // mean of the status means: (196/6 + 35 + 60) / 3
    assert!((stats.average_age - 42.6).abs() < 1e-9);
    assert!((stats.weighted_average_age() - 36.2).abs() < 1e-9);
}

#[tokio::test]
async fn empty_collection_stats() {
    let svc = UserService::new(&Database::in_memory(), ServiceSettings::default()).unwrap();
    let stats = svc.stats().await.unwrap();
    assert_eq!(stats.total_users, 0);
    assert!(stats.status_stats.is_empty());
    assert!(stats.top_cities.is_empty());
    assert!(stats.average_age.abs() < f64::EPSILON);
}

#[tokio::test]
async fn update_to_taken_email_is_rejected() {
    let svc = seeded().await;
    let page = svc.list_users(&ListParams { search: Some("bob@".into()), ..ListParams::default() }).await.unwrap();
    let bob = page.users[0].id.to_string();
    let patch = UserPatch { email: Some("JOHN@x.io".into()), ..UserPatch::default() };
    let err = svc.update_user(&bob, patch).await.unwrap_err();
    assert_eq!(err.to_string(), "Email already in use");

    // same email as before is not a conflict
    let patch = UserPatch { email: Some("bob@x.io".into()), name: Some("Robert".into()), ..UserPatch::default() };
    assert_eq!(svc.update_user(&bob, patch).await.unwrap().name, "Robert");
}

#[tokio::test]
async fn invalid_update_leaves_record_alone() {
    let svc = seeded().await;
    let page = svc.list_users(&ListParams { search: Some("eve@".into()), ..ListParams::default() }).await.unwrap();
    let eve = page.users[0].clone();
    let patch = UserPatch { age: Some(7), ..UserPatch::default() };
    let err = svc.update_user(&eve.id.to_string(), patch).await.unwrap_err();
    let UserError::Validation(details) = err else { panic!("expected validation error") };
    assert_eq!(details[0].field, "age");
    assert_eq!(svc.get_user(&eve.id.to_string()).await.unwrap(), eve);
}

#[tokio::test]
async fn delete_missing_user_is_not_found() {
    let svc = seeded().await;
    let missing = uuid::Uuid::new_v4().to_string();
    assert!(matches!(svc.delete_user(&missing).await, Err(UserError::NotFound { .. })));
    assert!(matches!(svc.delete_user("not-an-id").await, Err(UserError::NotFound { .. })));
    let page = svc.list_users(&ListParams::default()).await.unwrap();
    assert_eq!(page.pagination.total, 9);
}
