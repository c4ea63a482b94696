//! Key-value emulation tests
//!
//! Exercises join, filter and aggregation emulation over an in-memory
//! key-value store seeded with the sample retail records.

use polyquery::enrichment::Enricher;
use polyquery::executor::{execute_key_value, Scalar};
use polyquery::query::{parse_key_value, KeyValueQuery};
use polyquery::schema::Schema;
use polyquery::store::{KeyValueConnector, KvValue, MemoryKeyValueStore};

fn retail_store() -> MemoryKeyValueStore {
    let store = MemoryKeyValueStore::new();
    store
        .hset(
            "customer:1",
            [
                ("customer_id", "1"),
                ("first_name", "John"),
                ("last_name", "Doe"),
                ("email", "john@example.com"),
                ("phone", "555-0100"),
                ("city", "New York"),
                ("credit_limit", "5000.0"),
            ],
        )
        .unwrap();
    store
        .hset(
            "customer:2",
            [
                ("customer_id", "2"),
                ("first_name", "Jane"),
                ("last_name", "Smith"),
                ("email", "jane@example.com"),
                ("phone", "555-0101"),
                ("city", "London"),
                ("credit_limit", "3000.0"),
            ],
        )
        .unwrap();
    store
        .hset(
            "product:1",
            [
                ("product_id", "1"),
                ("name", "Laptop"),
                ("category", "Electronics"),
                ("price", "899.99"),
                ("manufacturer", "TechCorp"),
                ("release_date", "2023-01-15"),
            ],
        )
        .unwrap();
    store
        .hset(
            "product:2",
            [
                ("product_id", "2"),
                ("name", "T-Shirt"),
                ("category", "Clothing"),
                ("price", "19.99"),
                ("manufacturer", "FashionInc"),
                ("release_date", "2022-06-01"),
            ],
        )
        .unwrap();
    store
        .hset(
            "order:1",
            [
                ("order_id", "1"),
                ("customer_id", "1"),
                ("product_id", "1"),
                ("quantity", "2"),
                ("total_price", "1799.98"),
                ("order_date", "2023-03-01"),
                ("status", "Shipped"),
            ],
        )
        .unwrap();
    store
        .hset(
            "order:2",
            [
                ("order_id", "2"),
                ("customer_id", "2"),
                ("product_id", "2"),
                ("quantity", "3"),
                ("total_price", "59.97"),
                ("order_date", "2023-04-10"),
                ("status", "Pending"),
            ],
        )
        .unwrap();
    store
}

// =============================================================================
// JOIN EMULATION
// =============================================================================

#[test]
fn test_order_rows_carry_customer_and_product_fields() {
    let store = retail_store();
    let session = store.connect().unwrap();

    let execution = execute_key_value(session.as_ref(), &KeyValueQuery::new("order:1"), "show order").unwrap();
    let table = execution.table;

    assert_eq!(table.len(), 1);
    assert_eq!(table.get(0, "customer_first_name"), Some(&Scalar::from("John")));
    assert_eq!(table.get(0, "product_name"), Some(&Scalar::from("Laptop")));
    assert_eq!(table.get(0, "total_price"), Some(&Scalar::Float(1799.98)));
    assert_eq!(table.get(0, "quantity"), Some(&Scalar::Int(2)));
}

#[test]
fn test_join_question_scans_orders() {
    let store = retail_store();
    let session = store.connect().unwrap();
    let question = "which customers bought which products";

    let query = Enricher::default().enrich_key_value(KeyValueQuery::new("customer:*"), question, &Schema::new());
    assert_eq!(query.key_pattern, "order:*");
    assert!(query.require_joined);

    let execution = execute_key_value(session.as_ref(), &query, question).unwrap();
    // "which products" projects product names
    assert_eq!(execution.table.columns(), &["product_name".to_string()]);
    assert_eq!(execution.table.get(0, "product_name"), Some(&Scalar::from("Laptop")));
    assert_eq!(execution.table.get(1, "product_name"), Some(&Scalar::from("T-Shirt")));
}

#[test]
fn test_unresolved_reference_dropped_when_joined() {
    let store = retail_store();
    store
        .hset("order:3", [("order_id", "3"), ("customer_id", "99"), ("product_id", "1"), ("total_price", "10")])
        .unwrap();
    let session = store.connect().unwrap();

    let mut query = KeyValueQuery::new("order:*");
    assert_eq!(execute_key_value(session.as_ref(), &query, "orders").unwrap().table.len(), 3);

    query.require_joined = true;
    assert_eq!(execute_key_value(session.as_ref(), &query, "orders").unwrap().table.len(), 2);
}

#[test]
fn test_non_hash_keys_skipped() {
    let store = retail_store();
    store.set("order:latest", KvValue::String("order:2".into())).unwrap();
    store.set("order:queue", KvValue::List(vec!["1".into()])).unwrap();
    let session = store.connect().unwrap();

    let execution = execute_key_value(session.as_ref(), &KeyValueQuery::new("order:*"), "orders").unwrap();
    assert_eq!(execution.table.len(), 2);
    assert_eq!(execution.stats.records_skipped, 2);
}

#[test]
fn test_undecodable_field_kept_as_text() {
    let store = retail_store();
    store
        .hset("product:3", [("product_id", "3"), ("name", "Mystery"), ("price", "call us")])
        .unwrap();
    let session = store.connect().unwrap();

    let execution = execute_key_value(session.as_ref(), &KeyValueQuery::new("product:3"), "product").unwrap();
    assert_eq!(execution.table.get(0, "price"), Some(&Scalar::from("call us")));
    assert_eq!(execution.stats.decode_warnings.len(), 1);
    assert_eq!(execution.stats.decode_warnings[0].field, "price");
}

// =============================================================================
// FILTER EMULATION
// =============================================================================

#[test]
fn test_price_above_every_product_is_empty() {
    let store = retail_store();
    let session = store.connect().unwrap();

    let query = parse_key_value(r#"{"key": "order:*", "price_condition": {"gt": 2000}}"#).unwrap();
    let execution = execute_key_value(session.as_ref(), &query, "orders").unwrap();

    assert!(execution.table.is_empty());
    assert!(execution.stats.predicate_error.is_none());
}

#[test]
fn test_uncoercible_predicate_yields_empty_table() {
    let store = retail_store();
    let session = store.connect().unwrap();

    let query = parse_key_value(r#"{"key": "product:*", "price_condition": {"gt": "expensive"}}"#).unwrap();
    let execution = execute_key_value(session.as_ref(), &query, "products").unwrap();

    assert!(execution.table.is_empty());
    let error = execution.stats.predicate_error.unwrap();
    assert_eq!(error.code(), "NLQ_PREDICATE_REJECTED");
}

#[test]
fn test_uncoercible_stored_value_yields_empty_table() {
    let store = retail_store();
    store
        .hset("product:3", [("product_id", "3"), ("name", "Gift Card"), ("price", "n/a")])
        .unwrap();
    let session = store.connect().unwrap();

    let query = parse_key_value(r#"{"key": "product:*", "price_condition": {"lt": 100}}"#).unwrap();
    let execution = execute_key_value(session.as_ref(), &query, "cheap products").unwrap();

    assert!(execution.table.is_empty());
    assert_eq!(execution.stats.decode_warnings.len(), 1);
    assert_eq!(execution.stats.decode_warnings[0].field, "price");
    let error = execution.stats.predicate_error.unwrap();
    assert_eq!(error.field, "price");
}

#[test]
fn test_generator_noise_keys_do_not_empty_result() {
    let store = retail_store();
    let session = store.connect().unwrap();

    let query = parse_key_value(r#"{"key": "order:*", "operation": "HGETALL", "count": true}"#).unwrap();
    assert_eq!(query.field_conditions.len(), 2);
    let query = Enricher::default().enrich_key_value(query, "list orders", &Schema::new());
    let execution = execute_key_value(session.as_ref(), &query, "list orders").unwrap();

    assert!(query.field_conditions.is_empty());
    assert_eq!(execution.table.len(), 2);
}

#[test]
fn test_filters_compose_with_and() {
    let store = retail_store();
    let session = store.connect().unwrap();
    let question = "orders from customers in London after 2023-01-01";

    let query = Enricher::default().enrich_key_value(KeyValueQuery::new("order:*"), question, &Schema::new());
    let execution = execute_key_value(session.as_ref(), &query, question).unwrap();

    assert_eq!(execution.table.len(), 1);
    assert_eq!(execution.table.get(0, "key"), Some(&Scalar::from("order:2")));
}

#[test]
fn test_category_match_is_case_insensitive() {
    let store = retail_store();
    let session = store.connect().unwrap();

    let query = parse_key_value(r#"{"key": "product:*", "category": "electronics"}"#).unwrap();
    let execution = execute_key_value(session.as_ref(), &query, "products").unwrap();
    assert_eq!(execution.table.len(), 1);
    assert_eq!(execution.table.get(0, "name"), Some(&Scalar::from("Laptop")));
}

#[test]
fn test_generator_field_condition() {
    let store = retail_store();
    let session = store.connect().unwrap();

    let query = parse_key_value(r#"{"key": "order:*", "status": "shipped"}"#).unwrap();
    let execution = execute_key_value(session.as_ref(), &query, "orders").unwrap();
    assert_eq!(execution.table.len(), 1);
    assert_eq!(execution.table.get(0, "order_id"), Some(&Scalar::Int(1)));
}

// =============================================================================
// AGGREGATION EMULATION
// =============================================================================

#[test]
fn test_total_spending_groups_by_customer() {
    let store = MemoryKeyValueStore::new();
    store
        .hset("customer:1", [("customer_id", "1"), ("first_name", "John"), ("last_name", "Doe")])
        .unwrap();
    for (id, total) in [("1", "100"), ("2", "200"), ("3", "300")] {
        store
            .hset(
                &format!("order:{}", id),
                [("order_id", id), ("customer_id", "1"), ("total_price", total)],
            )
            .unwrap();
    }
    let session = store.connect().unwrap();

    let execution =
        execute_key_value(session.as_ref(), &KeyValueQuery::new("order:*"), "show total spending by customer").unwrap();
    let table = execution.table;

    assert_eq!(table.columns(), &["customer_name".to_string(), "total_spending".to_string()]);
    assert_eq!(table.len(), 1);
    assert_eq!(table.get(0, "customer_name"), Some(&Scalar::from("John Doe")));
    assert_eq!(table.get(0, "total_spending"), Some(&Scalar::Float(600.0)));
    assert_eq!(execution.stats.shape, Some("sum_by_customer"));
}

#[test]
fn test_sales_by_category_sorted_descending() {
    let store = retail_store();
    let session = store.connect().unwrap();

    let execution =
        execute_key_value(session.as_ref(), &KeyValueQuery::new("order:*"), "total sales by category").unwrap();
    let table = execution.table;

    assert_eq!(table.get(0, "category"), Some(&Scalar::from("Electronics")));
    assert_eq!(table.get(0, "total_sales"), Some(&Scalar::Float(1799.98)));
    assert_eq!(table.get(1, "category"), Some(&Scalar::from("Clothing")));
}

#[test]
fn test_average_order_value() {
    let store = retail_store();
    let session = store.connect().unwrap();

    let execution =
        execute_key_value(session.as_ref(), &KeyValueQuery::new("order:*"), "what is the average order value").unwrap();
    assert_eq!(execution.table.columns(), &["average_total_price".to_string()]);
    let average = execution.table.get(0, "average_total_price").and_then(Scalar::as_f64).unwrap();
    assert!((average - 929.98).abs() < 0.011);
}

#[test]
fn test_distinct_phone_projection() {
    let store = retail_store();
    let session = store.connect().unwrap();

    let execution =
        execute_key_value(session.as_ref(), &KeyValueQuery::new("order:*"), "phone numbers of buyers").unwrap();
    assert_eq!(execution.table.len(), 2);
    assert_eq!(execution.table.get(0, "phone"), Some(&Scalar::from("555-0100")));
}
