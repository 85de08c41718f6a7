#![allow(dead_code)]

use anyhow::Result;
use client_usage::RawMonth;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub fn write_json(dir: &Path, filename: &str, value: &Value) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, serde_json::to_string_pretty(value)?)?;
    Ok(file_path)
}

pub fn raw_months(value: Value) -> Vec<RawMonth> {
    serde_json::from_value(value).expect("fixture months decode")
}

/// Three months out of order: one legacy-only, one with both vocabularies, one current-only.
pub fn mixed_schema_months() -> Value {
    json!([
        {
            "timestamp": "2021-05-01T00:00:00Z",
            "counts": {"distinct_entities": 25, "non_entity_tokens": 25, "clients": 50},
            "namespaces": [
                {
                    "namespace_id": "root",
                    "namespace_path": "",
                    "counts": {"distinct_entities": 13, "non_entity_tokens": 7, "clients": 20},
                    "mounts": [
                        {"mount_path": "auth/up2/", "counts": {"distinct_entities": 8, "non_entity_tokens": 0, "clients": 8}},
                        {"mount_path": "auth/up1/", "counts": {"distinct_entities": 0, "non_entity_tokens": 7, "clients": 7}}
                    ]
                },
                {
                    "namespace_id": "s07UR",
                    "namespace_path": "ns1/",
                    "counts": {"distinct_entities": 5, "non_entity_tokens": 5, "clients": 10},
                    "mounts": [
                        {"mount_path": "auth/up1/", "counts": {"distinct_entities": 0, "non_entity_tokens": 5, "clients": 5}},
                        {"mount_path": "auth/up2/", "counts": {"distinct_entities": 5, "non_entity_tokens": 0, "clients": 5}}
                    ]
                }
            ],
            "new_clients": {
                "counts": {"distinct_entities": 3, "non_entity_tokens": 2, "clients": 5},
                "namespaces": [
                    {
                        "namespace_id": "root",
                        "namespace_path": "",
                        "counts": {"distinct_entities": 3, "non_entity_tokens": 2, "clients": 5},
                        "mounts": [
                            {"mount_path": "auth/up2/", "counts": {"distinct_entities": 3, "non_entity_tokens": 0, "clients": 3}},
                            {"mount_path": "auth/up1/", "counts": {"distinct_entities": 0, "non_entity_tokens": 2, "clients": 2}}
                        ]
                    }
                ]
            }
        },
        {
            "timestamp": "2021-10-01T00:00:00Z",
            "counts": {"distinct_entities": 20, "entity_clients": 20, "non_entity_tokens": 20, "non_entity_clients": 20, "clients": 40},
            "namespaces": [
                {
                    "namespace_id": "root",
                    "namespace_path": "",
                    "counts": {"distinct_entities": 8, "entity_clients": 8, "non_entity_tokens": 7, "non_entity_clients": 7, "clients": 15},
                    "mounts": [
                        {"mount_path": "auth/up2/", "counts": {"distinct_entities": 8, "entity_clients": 8, "non_entity_tokens": 0, "non_entity_clients": 0, "clients": 8}},
                        {"mount_path": "auth/up1/", "counts": {"distinct_entities": 0, "entity_clients": 0, "non_entity_tokens": 7, "non_entity_clients": 7, "clients": 7}}
                    ]
                }
            ],
            "new_clients": {
                "counts": {"distinct_entities": 3, "entity_clients": 3, "non_entity_tokens": 2, "non_entity_clients": 2, "clients": 5},
                "namespaces": [
                    {
                        "namespace_id": "root",
                        "namespace_path": "",
                        "counts": {"distinct_entities": 3, "entity_clients": 3, "non_entity_tokens": 2, "non_entity_clients": 2, "clients": 5},
                        "mounts": [
                            {"mount_path": "auth/up2/", "counts": {"entity_clients": 3, "non_entity_clients": 0, "clients": 3}}
                        ]
                    }
                ]
            }
        },
        {
            "timestamp": "2021-09-01T00:00:00Z",
            "counts": {"entity_clients": 17, "non_entity_clients": 18, "clients": 35},
            "namespaces": [
                {
                    "namespace_id": "oImjk",
                    "namespace_path": "ns2/",
                    "counts": {"entity_clients": 5, "non_entity_clients": 5, "clients": 10},
                    "mounts": [
                        {"mount_path": "auth/up1/", "counts": {"entity_clients": 0, "non_entity_clients": 5, "clients": 5}},
                        {"mount_path": "auth/up2/", "counts": {"entity_clients": 5, "non_entity_clients": 0, "clients": 5}}
                    ]
                },
                {
                    "namespace_id": "root",
                    "namespace_path": "",
                    "counts": {"entity_clients": 2, "non_entity_clients": 3, "clients": 5},
                    "mounts": []
                }
            ],
            "new_clients": null
        }
    ])
}

/// Months the backend has no summary for yet.
pub fn empty_months() -> Value {
    json!([
        {"timestamp": "2021-06-01T00:00:00Z", "counts": null, "namespaces": null, "new_clients": null},
        {"timestamp": "2021-07-01T00:00:00Z", "counts": null, "namespaces": null, "new_clients": null}
    ])
}

pub fn version_history() -> Value {
    json!([
        {"version": "1.9.0", "previousVersion": null, "timestampInstalled": "2023-07-02T00:00:00Z"},
        {"version": "1.9.1", "previousVersion": "1.9.0", "timestampInstalled": "2023-08-02T00:00:00Z"},
        {"version": "1.10.1", "previousVersion": "1.9.1", "timestampInstalled": "2023-09-02T00:00:00Z"},
        {"version": "1.14.4", "previousVersion": "1.10.1", "timestampInstalled": "2023-10-02T00:00:00Z"},
        {"version": "1.16.0", "previousVersion": "1.14.4", "timestampInstalled": "2023-11-02T00:00:00Z"}
    ])
}
