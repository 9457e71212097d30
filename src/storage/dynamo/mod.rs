//! DynamoDB data point store.
//!
//! Table schema:
//! - PK: `{owner}#{name}` (String)
//! - SK: creation timestamp (String)
//! - name, createdAt, owner (String), value (Number)
//!
//! Key attribute names come from [`KeySchema`]; `PK`/`SK` are the defaults.

mod attributes;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::Client;
use tracing::{debug, info};

use self::attributes::{
    cursor_to_key, data_point_to_item, item_to_data_point, key_to_cursor, string_values,
};
use crate::query::{DataPoint, KeyQuery, KeySchema};
use crate::storage::{DataPointStore, QueryOutput, Result, StorageError};

/// DynamoDB implementation of DataPointStore.
pub struct DynamoDataPointStore {
    client: Client,
    table_name: String,
}

impl DynamoDataPointStore {
    /// Create a store from the default AWS configuration chain.
    ///
    /// `endpoint_url` points the client at a local DynamoDB when set.
    pub async fn new(table_name: impl Into<String>, endpoint_url: Option<&str>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

        let client = if let Some(endpoint) = endpoint_url {
            let dynamo_config = aws_sdk_dynamodb::config::Builder::from(&config)
                .endpoint_url(endpoint)
                .build();
            Client::from_conf(dynamo_config)
        } else {
            Client::new(&config)
        };

        Self::with_client(client, table_name)
    }

    /// Create a store around an existing client.
    pub fn with_client(client: Client, table_name: impl Into<String>) -> Self {
        let table_name = table_name.into();
        info!(table = %table_name, "Connected to DynamoDB for data points");
        Self { client, table_name }
    }
}

#[async_trait]
impl DataPointStore for DynamoDataPointStore {
    async fn query(&self, query: &KeyQuery) -> Result<QueryOutput> {
        let result = self
            .client
            .query()
            .table_name(&self.table_name)
            .key_condition_expression(&query.key_condition_expression)
            .set_expression_attribute_names(Some(
                query
                    .expression_attribute_names
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ))
            .set_expression_attribute_values(Some(string_values(
                &query.expression_attribute_values,
            )))
            .scan_index_forward(query.scan_index_forward)
            .limit(query.limit)
            .set_exclusive_start_key(query.exclusive_start_key.as_ref().map(cursor_to_key))
            .send()
            .await
            .map_err(|e| StorageError::Query(DisplayErrorContext(&e).to_string()))?;

        let items = result
            .items
            .unwrap_or_default()
            .iter()
            .map(item_to_data_point)
            .collect::<Result<Vec<_>>>()?;

        let last_evaluated_key = result
            .last_evaluated_key
            .as_ref()
            .filter(|key| !key.is_empty())
            .map(key_to_cursor)
            .transpose()?;

        debug!(
            table = %self.table_name,
            count = result.count,
            scanned_count = result.scanned_count,
            has_more = last_evaluated_key.is_some(),
            "Queried data points from DynamoDB"
        );

        Ok(QueryOutput {
            items,
            last_evaluated_key,
            count: result.count,
            scanned_count: result.scanned_count,
        })
    }

    async fn put(&self, key_schema: &KeySchema, item: &DataPoint) -> Result<()> {
        let attributes = data_point_to_item(key_schema, item)?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(attributes))
            .send()
            .await
            .map_err(|e| StorageError::Put(DisplayErrorContext(&e).to_string()))?;

        debug!(
            table = %self.table_name,
            name = %item.name,
            created_at = %item.created_at,
            "Stored data point in DynamoDB"
        );

        Ok(())
    }
}
