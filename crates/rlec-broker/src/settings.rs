// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Translation of plan templates and user parameters into the flat
//! settings payload the cluster API expects.

use serde_json::{Map, Value, json};

use crate::config::{InstanceConfig, PersistencePolicy};

/// Marker parameter selecting the replicated-database flavor.
const CRDB_TYPE: &str = "crdb";

/// A flat settings payload for `/v1/bdbs` create and update requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatabaseSettings {
    map: Map<String, Value>,
    crdb: bool,
}

impl DatabaseSettings {
    /// Expand a plan template into concrete database settings.
    pub fn from_plan(plan: &InstanceConfig) -> Self {
        let mut map = Map::new();
        map.insert("memory_size".to_string(), json!(plan.memory_limit));
        map.insert("replication".to_string(), json!(plan.replication));
        if plan.shard_count > 1 {
            map.insert("shards_count".to_string(), json!(plan.shard_count));
            map.insert("sharding".to_string(), json!(true));
            map.insert("implicit_shard_key".to_string(), json!(true));
            map.insert(
                "shard_key_regex".to_string(),
                json!([
                    { "regex": r".*\{(?<tag>.*)\}.*" },
                    { "regex": r"(?<tag>.*)" },
                ]),
            );
        } else {
            map.insert("sharding".to_string(), json!(false));
            map.insert("implicit_shard_key".to_string(), json!(false));
        }
        map.insert(
            "data_persistence".to_string(),
            json!(plan.persistence.as_str()),
        );
        if plan.persistence == PersistencePolicy::Snapshot {
            if let Some(snapshot) = &plan.snapshot {
                map.insert(
                    "snapshot_policy".to_string(),
                    json!([{ "writes": snapshot.writes, "secs": snapshot.secs }]),
                );
            }
        }
        Self { map, crdb: false }
    }

    /// Overlay user-supplied parameters field by field.
    ///
    /// Unknown keys pass through untouched; the cluster API validates them.
    /// A numeric-string `memory_size` is coerced to a number. A `type` of
    /// `"crdb"` is stripped from the payload and recorded as a routing
    /// flag.
    pub fn apply_parameters(mut self, parameters: &Map<String, Value>) -> Self {
        for (key, value) in parameters {
            match key.as_str() {
                "type" => {
                    if value.as_str() == Some(CRDB_TYPE) {
                        self.crdb = true;
                    }
                }
                "memory_size" => {
                    self.map.insert(key.clone(), coerce_number(value));
                }
                _ => {
                    self.map.insert(key.clone(), value.clone());
                }
            }
        }
        self
    }

    /// Whether the parameters asked for a replicated database.
    pub fn is_crdb(&self) -> bool {
        self.crdb
    }

    /// Look up a translated value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.map.get(key)
    }

    /// The flat settings map sent to the cluster.
    pub fn into_map(self) -> Map<String, Value> {
        self.map
    }
}

/// Accept both `1024` and `"1024"` for numeric fields.
fn coerce_number(value: &Value) -> Value {
    if let Some(s) = value.as_str() {
        if let Ok(n) = s.parse::<i64>() {
            return json!(n);
        }
    }
    value.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SnapshotConfig;

    fn params(raw: Value) -> Map<String, Value> {
        raw.as_object().unwrap().clone()
    }

    #[test]
    fn test_plan_without_sharding() {
        let settings = DatabaseSettings::from_plan(&InstanceConfig {
            memory_limit: 1024,
            replication: true,
            persistence: PersistencePolicy::Disabled,
            ..Default::default()
        });

        assert_eq!(settings.get("memory_size"), Some(&json!(1024)));
        assert_eq!(settings.get("replication"), Some(&json!(true)));
        assert_eq!(settings.get("data_persistence"), Some(&json!("disabled")));
        assert_eq!(settings.get("sharding"), Some(&json!(false)));
        assert_eq!(settings.get("implicit_shard_key"), Some(&json!(false)));
        assert!(settings.get("shard_key_regex").is_none());
        assert!(settings.get("shards_count").is_none());
    }

    #[test]
    fn test_plan_with_sharding() {
        let settings = DatabaseSettings::from_plan(&InstanceConfig {
            memory_limit: 2048,
            shard_count: 2,
            ..Default::default()
        });

        assert_eq!(settings.get("shards_count"), Some(&json!(2)));
        assert_eq!(settings.get("sharding"), Some(&json!(true)));
        assert_eq!(settings.get("implicit_shard_key"), Some(&json!(true)));
        assert_eq!(
            settings.get("shard_key_regex"),
            Some(&json!([
                { "regex": ".*\\{(?<tag>.*)\\}.*" },
                { "regex": "(?<tag>.*)" },
            ]))
        );
    }

    #[test]
    fn test_single_shard_does_not_engage_sharding() {
        let settings = DatabaseSettings::from_plan(&InstanceConfig {
            shard_count: 1,
            ..Default::default()
        });
        assert_eq!(settings.get("sharding"), Some(&json!(false)));
        assert!(settings.get("shards_count").is_none());
    }

    #[test]
    fn test_snapshot_policy() {
        let settings = DatabaseSettings::from_plan(&InstanceConfig {
            persistence: PersistencePolicy::Snapshot,
            snapshot: Some(SnapshotConfig {
                writes: 10,
                secs: 12,
            }),
            ..Default::default()
        });

        assert_eq!(settings.get("data_persistence"), Some(&json!("snapshot")));
        assert_eq!(
            settings.get("snapshot_policy"),
            Some(&json!([{ "writes": 10, "secs": 12 }]))
        );
    }

    #[test]
    fn test_snapshot_policy_requires_snapshot_persistence() {
        let settings = DatabaseSettings::from_plan(&InstanceConfig {
            persistence: PersistencePolicy::Aof,
            snapshot: Some(SnapshotConfig {
                writes: 10,
                secs: 12,
            }),
            ..Default::default()
        });
        assert_eq!(settings.get("data_persistence"), Some(&json!("aof")));
        assert!(settings.get("snapshot_policy").is_none());
    }

    #[test]
    fn test_parameters_override_plan_defaults() {
        let settings = DatabaseSettings::from_plan(&InstanceConfig {
            memory_limit: 1024,
            ..Default::default()
        })
        .apply_parameters(&params(json!({
            "memory_size": 4096,
            "data_persistence": "aof",
        })));

        assert_eq!(settings.get("memory_size"), Some(&json!(4096)));
        assert_eq!(settings.get("data_persistence"), Some(&json!("aof")));
    }

    #[test]
    fn test_memory_size_string_is_coerced() {
        let settings = DatabaseSettings::from_plan(&InstanceConfig::default())
            .apply_parameters(&params(json!({"memory_size": "4096"})));
        assert_eq!(settings.get("memory_size"), Some(&json!(4096)));
    }

    #[test]
    fn test_unknown_parameters_pass_through() {
        let settings = DatabaseSettings::from_plan(&InstanceConfig::default())
            .apply_parameters(&params(json!({"name": "mydb", "oss_cluster": true})));
        assert_eq!(settings.get("name"), Some(&json!("mydb")));
        assert_eq!(settings.get("oss_cluster"), Some(&json!(true)));
    }

    #[test]
    fn test_crdb_type_is_stripped_and_flagged() {
        let settings = DatabaseSettings::from_plan(&InstanceConfig::default())
            .apply_parameters(&params(json!({"type": "crdb", "name": "mydb"})));
        assert!(settings.is_crdb());
        assert!(settings.get("type").is_none());
        assert_eq!(settings.get("name"), Some(&json!("mydb")));
    }

    #[test]
    fn test_other_type_values_are_ignored() {
        let settings = DatabaseSettings::from_plan(&InstanceConfig::default())
            .apply_parameters(&params(json!({"type": "redis"})));
        assert!(!settings.is_crdb());
        assert!(settings.get("type").is_none());
    }
}
