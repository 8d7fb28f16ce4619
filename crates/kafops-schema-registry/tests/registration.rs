// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

// Registration, lookup and retry behavior against the in-memory catalog.

use kafops_core::RetryPolicy;
use kafops_schema_registry::{
    CatalogError, CatalogOp, MemoryCatalog, RegisterStatus, SchemaCatalog, SchemaErrorKind,
    SchemaRegistryClient,
};

const ORDERS_V1: &str = r#"{
  "type": "record",
  "name": "Order",
  "namespace": "shop",
  "fields": [
    {"name": "id", "type": "long"},
    {"name": "amount", "type": "double"}
  ]
}"#;

const ORDERS_V2: &str = r#"{
  "type": "record",
  "name": "Order",
  "namespace": "shop",
  "fields": [
    {"name": "id", "type": "long"},
    {"name": "amount", "type": "double"},
    {"name": "currency", "type": "string", "default": "EUR"}
  ]
}"#;

const ORDERS_REQUIRED_FIELD: &str = r#"{
  "type": "record",
  "name": "Order",
  "namespace": "shop",
  "fields": [
    {"name": "id", "type": "long"},
    {"name": "amount", "type": "double"},
    {"name": "customer", "type": "string"}
  ]
}"#;

fn client() -> SchemaRegistryClient<MemoryCatalog> {
    SchemaRegistryClient::new(MemoryCatalog::new(), "default")
        .with_retry_policy(RetryPolicy::immediate())
}

#[test]
fn test_identical_registration_returns_same_id() {
    let client = client();
    let first = client
        .register_avro_schema(ORDERS_V1, "orders-v1", "BACKWARD")
        .expect("first registration");
    assert_eq!(first.status, RegisterStatus::Created);
    assert_eq!(first.version, 1);

    let second = client
        .register_avro_schema(ORDERS_V1, "orders-v1", "BACKWARD")
        .expect("second registration");
    assert_eq!(second.id, first.id);
    assert_eq!(second.status, RegisterStatus::Unchanged);
    assert_eq!(client.catalog().version_count("default", "orders-v1"), 1);
    assert_eq!(client.catalog().calls(CatalogOp::CreateSchema), 1);
    assert_eq!(client.catalog().calls(CatalogOp::RegisterVersion), 0);
}

#[test]
fn test_changed_definition_adds_version() {
    let client = client();
    client
        .register_avro_schema(ORDERS_V1, "orders", "BACKWARD")
        .unwrap();
    let outcome = client
        .register_avro_schema(ORDERS_V2, "orders", "BACKWARD")
        .unwrap();
    assert_eq!(outcome.status, RegisterStatus::NewVersion);
    assert_eq!(outcome.version, 2);
    assert_eq!(outcome.id, "default/orders");

    assert_eq!(client.get_schema("orders", None).unwrap(), ORDERS_V2);
    assert_eq!(client.get_schema("orders", Some(1)).unwrap(), ORDERS_V1);
}

#[test]
fn test_record_id_matches_registration_id() {
    let client = client();
    let created = client.register_avro_schema(ORDERS_V1, "orders", "BACKWARD").unwrap();
    client.register_avro_schema(ORDERS_V2, "orders", "BACKWARD").unwrap();

    let first = client.get_schema_record("orders", Some(1)).unwrap();
    let latest = client.get_schema_record("orders", None).unwrap();
    assert_eq!(first.id, created.id);
    assert_eq!(latest.id, created.id);
    assert_eq!(first.version_id, "default/orders/v1");
    assert_eq!(latest.version_id, "default/orders/v2");

    let versions = client.get_schema_versions("orders").unwrap();
    assert_eq!(versions[0].version_id, latest.version_id);
}

#[test]
fn test_older_definition_resolves_to_its_version() {
    let client = client();
    client.register_avro_schema(ORDERS_V1, "orders", "BACKWARD").unwrap();
    client.register_avro_schema(ORDERS_V2, "orders", "BACKWARD").unwrap();

    let outcome = client
        .register_avro_schema(ORDERS_V1, "orders", "BACKWARD")
        .unwrap();
    assert_eq!(outcome.status, RegisterStatus::Unchanged);
    assert_eq!(outcome.version, 1);
    assert_eq!(client.catalog().version_count("default", "orders"), 2);
}

#[test]
fn test_catalog_enforces_backward_mode() {
    let client = client();
    client.register_avro_schema(ORDERS_V1, "orders", "BACKWARD").unwrap();

    let err = client
        .register_avro_schema(ORDERS_REQUIRED_FIELD, "orders", "BACKWARD")
        .unwrap_err();
    assert_eq!(err.kind(), SchemaErrorKind::IncompatibleSchema);
    assert_eq!(err.resource(), Some("orders"));
    assert_eq!(client.catalog().calls(CatalogOp::RegisterVersion), 1);
}

#[test]
fn test_none_mode_accepts_anything() {
    let client = client();
    client.register_avro_schema(ORDERS_V1, "orders", "NONE").unwrap();
    let outcome = client
        .register_avro_schema(ORDERS_REQUIRED_FIELD, "orders", "NONE")
        .unwrap();
    assert_eq!(outcome.version, 2);
}

#[test]
fn test_create_race_rereads_schema() {
    let client = client();
    client
        .catalog()
        .create_schema("default", "orders", ORDERS_V1, Default::default())
        .unwrap();
    // Make the first lookup miss so the client takes the create path.
    client.catalog().fail_next(
        CatalogOp::GetVersion,
        CatalogError::NotFound("schema 'orders'".into()),
    );

    let outcome = client
        .register_avro_schema(ORDERS_V1, "orders", "BACKWARD")
        .unwrap();
    assert_eq!(outcome.status, RegisterStatus::Unchanged);
    assert_eq!(outcome.version, 1);
}

#[test]
fn test_get_unknown_schema_and_version() {
    let client = client();
    let err = client.get_schema("missing", None).unwrap_err();
    assert_eq!(err.kind(), SchemaErrorKind::SchemaNotFound);

    client.register_avro_schema(ORDERS_V1, "orders", "BACKWARD").unwrap();
    let err = client.get_schema("orders", Some(7)).unwrap_err();
    assert_eq!(err.kind(), SchemaErrorKind::SchemaNotFound);
}

#[test]
fn test_list_schemas_sorted_and_empty_for_unknown_registry() {
    let client = client();
    assert!(client.list_schemas().unwrap().is_empty());

    for name in ["zeta", "alpha", "mid"] {
        client.register_avro_schema(ORDERS_V1, name, "FULL").unwrap();
    }
    let names: Vec<String> = client
        .list_schemas()
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["alpha", "mid", "zeta"]);

    let summary = &client.list_schemas().unwrap()[0];
    assert_eq!(summary.data_format, "AVRO");
    assert_eq!(summary.latest_version, 1);
    assert_eq!(summary.compatibility.as_str(), "FULL");
}

#[test]
fn test_versions_are_listed_newest_first() {
    let client = client();
    client.register_avro_schema(ORDERS_V1, "orders", "BACKWARD").unwrap();
    client.register_avro_schema(ORDERS_V2, "orders", "BACKWARD").unwrap();

    let versions = client.get_schema_versions("orders").unwrap();
    assert_eq!(versions.iter().map(|v| v.version).collect::<Vec<_>>(), vec![2, 1]);
    assert!(versions[0].created_time.is_some());

    let err = client.get_schema_versions("missing").unwrap_err();
    assert_eq!(err.kind(), SchemaErrorKind::SchemaNotFound);
}

#[test]
fn test_transient_catalog_errors_are_retried() {
    let client = client();
    client.catalog().fail_times(
        CatalogOp::ListSchemas,
        CatalogError::Connection("registry unreachable".into()),
        2,
    );
    assert!(client.list_schemas().unwrap().is_empty());
    assert_eq!(client.catalog().calls(CatalogOp::ListSchemas), 3);
}

#[test]
fn test_retries_exhaust_with_original_error() {
    let client = client();
    client.catalog().fail_times(
        CatalogOp::GetVersion,
        CatalogError::Timeout("30s elapsed".into()),
        3,
    );
    let err = client.get_schema("orders", None).unwrap_err();
    assert_eq!(err.kind(), SchemaErrorKind::Timeout);
    assert_eq!(err.message(), "request timed out: 30s elapsed");
    assert_eq!(client.catalog().calls(CatalogOp::GetVersion), 3);
}
