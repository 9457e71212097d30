//! Storage configuration types.

use serde::Deserialize;

/// Storage type discriminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    #[default]
    Dynamo,
    Memory,
}

/// Storage configuration (discriminated union).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage type discriminator.
    #[serde(rename = "type")]
    pub storage_type: StorageType,
    /// DynamoDB-specific configuration.
    pub dynamo: DynamoConfig,
}

/// DynamoDB-specific configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DynamoConfig {
    /// Name of the data point table.
    pub table_name: String,
    /// Endpoint override, e.g. `http://localhost:8000` for DynamoDB Local.
    pub endpoint_url: Option<String>,
}

impl Default for DynamoConfig {
    fn default() -> Self {
        Self {
            table_name: "DataPointTable".to_string(),
            endpoint_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_default() {
        let storage = StorageConfig::default();
        assert_eq!(storage.storage_type, StorageType::Dynamo);
        assert_eq!(storage.dynamo.table_name, "DataPointTable");
        assert!(storage.dynamo.endpoint_url.is_none());
    }

    #[test]
    fn test_storage_config_yaml() {
        let yaml = r#"
type: memory
dynamo:
  table_name: points
  endpoint_url: http://localhost:8000
"#;
        let storage: StorageConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(storage.storage_type, StorageType::Memory);
        assert_eq!(storage.dynamo.table_name, "points");
        assert_eq!(
            storage.dynamo.endpoint_url.as_deref(),
            Some("http://localhost:8000")
        );
    }
}
