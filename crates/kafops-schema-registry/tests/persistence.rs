// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

// File-backed catalog survives reopen.

use kafops_core::RetryPolicy;
use kafops_schema_registry::{MemoryCatalog, RegisterStatus, SchemaCatalog, SchemaRegistryClient};

const V1: &str = r#"{"type":"record","name":"Flight","fields":[{"name":"callsign","type":"string"}]}"#;
const V2: &str = r#"{"type":"record","name":"Flight","fields":[
    {"name":"callsign","type":"string"},
    {"name":"altitude","type":["null","double"],"default":null}]}"#;

fn client(dir: &std::path::Path) -> SchemaRegistryClient<MemoryCatalog> {
    SchemaRegistryClient::new(MemoryCatalog::open(Some(dir)).unwrap(), "telemetry")
        .with_retry_policy(RetryPolicy::immediate())
}

#[test]
fn test_reopened_catalog_keeps_versions() {
    let dir = tempfile::tempdir().unwrap();
    {
        let client = client(dir.path());
        client.register_avro_schema(V1, "flights", "FULL").unwrap();
        client.register_avro_schema(V2, "flights", "FULL").unwrap();
    }

    let reopened = client(dir.path());
    let versions = reopened.get_schema_versions("flights").unwrap();
    assert_eq!(versions.iter().map(|v| v.version).collect::<Vec<_>>(), vec![2, 1]);
    assert_eq!(reopened.get_schema("flights", Some(1)).unwrap(), V1);

    let summary = &reopened.list_schemas().unwrap()[0];
    assert_eq!(summary.compatibility.as_str(), "FULL");

    let again = reopened.register_avro_schema(V2, "flights", "FULL").unwrap();
    assert_eq!(again.status, RegisterStatus::Unchanged);
    assert_eq!(again.version, 2);
}

#[test]
fn test_declared_registry_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    MemoryCatalog::open(Some(dir.path()))
        .unwrap()
        .create_registry("empty")
        .unwrap();

    let reopened = MemoryCatalog::open(Some(dir.path())).unwrap();
    assert!(reopened.list_schemas("empty").unwrap().is_empty());
    assert!(reopened.list_schemas("other").is_err());
}
