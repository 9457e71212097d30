//! Storage implementations.
//!
//! The data point table is an ordered key-value store keyed by
//! `(partition, sort)`. [`DataPointStore`] is the seam the query executor
//! talks to; backends are selected at startup by [`init_storage`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::{StorageConfig, StorageType};
use crate::query::{Cursor, DataPoint, KeyQuery, KeySchema};

pub mod mock;

#[cfg(feature = "dynamo")]
pub mod dynamo;

pub use mock::MockDataPointStore;

#[cfg(feature = "dynamo")]
pub use dynamo::DynamoDataPointStore;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Query failed: {0}")]
    Query(String),

    #[error("Put failed: {0}")]
    Put(String),

    #[error("Invalid exclusive start key: {0}")]
    InvalidStartKey(String),

    #[error("Item is missing attribute '{0}'")]
    MissingAttribute(String),

    #[error("Attribute '{name}' has unsupported type {kind}")]
    UnsupportedAttribute { name: String, kind: String },

    #[error("Attribute '{name}' is not a number: {value}")]
    InvalidNumber { name: String, value: String },
}

/// One page as returned by the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutput {
    /// Matching items in sort-key order.
    pub items: Vec<DataPoint>,
    /// Key of the last item read, present when more results may follow.
    pub last_evaluated_key: Option<Cursor>,
    /// Number of items returned.
    pub count: i32,
    /// Number of items read before the sort condition was applied.
    pub scanned_count: i32,
}

/// Interface to the data point table.
///
/// # Implementations
///
/// - `DynamoDataPointStore`: DynamoDB table
/// - `MockDataPointStore`: In-memory store for local runs and tests
#[async_trait]
pub trait DataPointStore: Send + Sync {
    /// Run a key-range query.
    ///
    /// Reads at most `query.limit` items of one partition, in sort-key order
    /// per `query.scan_index_forward`, starting after
    /// `query.exclusive_start_key` when set.
    async fn query(&self, query: &KeyQuery) -> Result<QueryOutput>;

    /// Write a single data point, replacing any item with the same key.
    async fn put(&self, key_schema: &KeySchema, item: &DataPoint) -> Result<()>;
}

/// Initialize the data point store based on configuration.
pub async fn init_storage(
    config: &StorageConfig,
) -> std::result::Result<Arc<dyn DataPointStore>, Box<dyn std::error::Error + Send + Sync>> {
    info!("Storage: {:?}", config.storage_type);

    match config.storage_type {
        StorageType::Memory => Ok(Arc::new(MockDataPointStore::new())),
        #[cfg(feature = "dynamo")]
        StorageType::Dynamo => {
            let store = DynamoDataPointStore::new(
                config.dynamo.table_name.clone(),
                config.dynamo.endpoint_url.as_deref(),
            )
            .await;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "dynamo"))]
        StorageType::Dynamo => {
            tracing::error!("DynamoDB storage requested but 'dynamo' feature is not enabled");
            Err("DynamoDB feature not enabled".into())
        }
    }
}
