//! DataPointStore interface tests.
//!
//! These tests verify the paging contract of the DataPointStore trait.
//! Each storage implementation should run these tests.

use datapoints::query::{
    build_key_query, Cursor, DataPoint, KeyQuery, KeySchema, QueryConfig, QueryRequest,
    RangeFilter, SortDirection,
};
use datapoints::storage::DataPointStore;

fn point(owner: &str, name: &str, created_at: &str, value: f64) -> DataPoint {
    DataPoint {
        name: name.to_string(),
        created_at: created_at.to_string(),
        value,
        owner: Some(owner.to_string()),
    }
}

async fn seed<S: DataPointStore + ?Sized>(store: &S, owner: &str, name: &str, days: u32) {
    let schema = KeySchema::default();
    for day in 1..=days {
        store
            .put(
                &schema,
                &point(owner, name, &format!("2021-01-{:02}", day), f64::from(day)),
            )
            .await
            .expect("put should succeed");
    }
}

fn key_query(request: &QueryRequest) -> KeyQuery {
    build_key_query(&QueryConfig::default(), request).expect("query should build")
}

fn dates(items: &[DataPoint]) -> Vec<String> {
    items.iter().map(|p| p.created_at.clone()).collect()
}

// =============================================================================
// DataPointStore::query tests
// =============================================================================

pub async fn test_query_empty_partition<S: DataPointStore + ?Sized>(store: &S) {
    let output = store
        .query(&key_query(&QueryRequest::new("test_empty", "temp")))
        .await
        .expect("query should succeed");

    assert!(output.items.is_empty(), "empty partition should have no items");
    assert!(output.last_evaluated_key.is_none());
    assert_eq!(output.count, 0);
}

pub async fn test_put_and_query<S: DataPointStore + ?Sized>(store: &S) {
    seed(store, "test_put_query", "temp", 3).await;

    let output = store
        .query(&key_query(&QueryRequest::new("test_put_query", "temp")))
        .await
        .expect("query should succeed");

    assert_eq!(
        dates(&output.items),
        ["2021-01-01", "2021-01-02", "2021-01-03"],
        "items should come back in ascending sort key order"
    );
    assert_eq!(output.items[2].value, 3.0);
    assert_eq!(output.items[0].owner.as_deref(), Some("test_put_query"));
    assert!(output.last_evaluated_key.is_none());
}

pub async fn test_query_descending<S: DataPointStore + ?Sized>(store: &S) {
    seed(store, "test_desc", "temp", 3).await;

    let request =
        QueryRequest::new("test_desc", "temp").with_sort_direction(SortDirection::Descending);
    let output = store.query(&key_query(&request)).await.unwrap();

    assert_eq!(
        dates(&output.items),
        ["2021-01-03", "2021-01-02", "2021-01-01"]
    );
}

pub async fn test_query_sort_filters<S: DataPointStore + ?Sized>(store: &S) {
    seed(store, "test_filters", "temp", 5).await;

    let cases = [
        (RangeFilter::Equals("2021-01-03".into()), vec!["2021-01-03"]),
        (
            RangeFilter::GreaterThan("2021-01-03".into()),
            vec!["2021-01-04", "2021-01-05"],
        ),
        (
            RangeFilter::GreaterThanOrEqual("2021-01-04".into()),
            vec!["2021-01-04", "2021-01-05"],
        ),
        (
            RangeFilter::LessThan("2021-01-02".into()),
            vec!["2021-01-01"],
        ),
        (
            RangeFilter::LessThanOrEqual("2021-01-02".into()),
            vec!["2021-01-01", "2021-01-02"],
        ),
        (
            RangeFilter::Between("2021-01-02".into(), "2021-01-04".into()),
            vec!["2021-01-02", "2021-01-03", "2021-01-04"],
        ),
        (
            RangeFilter::BeginsWith("2021-01-0".into()),
            vec![
                "2021-01-01",
                "2021-01-02",
                "2021-01-03",
                "2021-01-04",
                "2021-01-05",
            ],
        ),
        (RangeFilter::BeginsWith("2021-02".into()), vec![]),
    ];

    for (filter, expected) in cases {
        let operator = filter.operator();
        let request = QueryRequest::new("test_filters", "temp").with_created_at(filter);
        let output = store.query(&key_query(&request)).await.unwrap();
        assert_eq!(dates(&output.items), expected, "filter {}", operator);
    }
}

pub async fn test_query_limit_and_resume<S: DataPointStore + ?Sized>(store: &S) {
    seed(store, "test_resume", "temp", 5).await;

    let mut query = key_query(&QueryRequest::new("test_resume", "temp").with_limit(2));
    let first = store.query(&query).await.unwrap();
    assert_eq!(dates(&first.items), ["2021-01-01", "2021-01-02"]);

    let start = first
        .last_evaluated_key
        .expect("partial page should report a last key");
    assert_eq!(start.get_str("SK"), Some("2021-01-02"));

    query.exclusive_start_key = Some(start);
    let second = store.query(&query).await.unwrap();
    assert_eq!(dates(&second.items), ["2021-01-03", "2021-01-04"]);

    query.exclusive_start_key = second.last_evaluated_key;
    let third = store.query(&query).await.unwrap();
    assert_eq!(dates(&third.items), ["2021-01-05"]);
    assert!(third.last_evaluated_key.is_none(), "last page has no key");
}

pub async fn test_query_resume_descending<S: DataPointStore + ?Sized>(store: &S) {
    seed(store, "test_resume_desc", "temp", 4).await;

    let mut query = key_query(
        &QueryRequest::new("test_resume_desc", "temp")
            .with_limit(3)
            .with_sort_direction(SortDirection::Descending),
    );
    query.exclusive_start_key = Some(
        Cursor::new()
            .with("PK", "test_resume_desc#temp")
            .with("SK", "2021-01-03"),
    );

    let output = store.query(&query).await.unwrap();
    assert_eq!(dates(&output.items), ["2021-01-02", "2021-01-01"]);
    assert!(output.last_evaluated_key.is_none());
}

// =============================================================================
// Isolation tests
// =============================================================================

pub async fn test_owner_isolation<S: DataPointStore + ?Sized>(store: &S) {
    seed(store, "test_iso_owner_a", "temp", 2).await;
    seed(store, "test_iso_owner_b", "temp", 3).await;

    let a = store
        .query(&key_query(&QueryRequest::new("test_iso_owner_a", "temp")))
        .await
        .unwrap();
    let b = store
        .query(&key_query(&QueryRequest::new("test_iso_owner_b", "temp")))
        .await
        .unwrap();

    assert_eq!(a.items.len(), 2, "owner a should see only its items");
    assert_eq!(b.items.len(), 3, "owner b should see only its items");
}

pub async fn test_name_isolation<S: DataPointStore + ?Sized>(store: &S) {
    seed(store, "test_iso_name", "temp", 2).await;
    seed(store, "test_iso_name", "humidity", 4).await;

    let temp = store
        .query(&key_query(&QueryRequest::new("test_iso_name", "temp")))
        .await
        .unwrap();
    assert_eq!(temp.items.len(), 2);
    assert!(temp.items.iter().all(|p| p.name == "temp"));
}

/// Run all DataPointStore interface tests against a store implementation.
#[macro_export]
macro_rules! run_data_point_store_tests {
    ($store:expr) => {
        use $crate::storage::data_point_store_tests::*;

        // query tests
        test_query_empty_partition($store).await;
        println!("  test_query_empty_partition: PASSED");

        test_put_and_query($store).await;
        println!("  test_put_and_query: PASSED");

        test_query_descending($store).await;
        println!("  test_query_descending: PASSED");

        test_query_sort_filters($store).await;
        println!("  test_query_sort_filters: PASSED");

        // paging tests
        test_query_limit_and_resume($store).await;
        println!("  test_query_limit_and_resume: PASSED");

        test_query_resume_descending($store).await;
        println!("  test_query_resume_descending: PASSED");

        // isolation tests
        test_owner_isolation($store).await;
        println!("  test_owner_isolation: PASSED");

        test_name_isolation($store).await;
        println!("  test_name_isolation: PASSED");
    };
}
