//! In-memory data point store.
//!
//! Evaluates key queries in process over ordered maps, with the same paging
//! contract as the DynamoDB table. Used for local runs (`storage.type: memory`)
//! and tests.

use std::collections::BTreeMap;
use std::ops::Bound;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DataPointStore, QueryOutput, Result, StorageError};
use crate::query::{partition_value, Cursor, DataPoint, KeyQuery, KeySchema};

/// Partition value to (sort value to item).
type Table = BTreeMap<String, BTreeMap<String, DataPoint>>;

/// Mock data point store that keeps items in memory.
#[derive(Default)]
pub struct MockDataPointStore {
    items: RwLock<Table>,
    fail_on_query: RwLock<bool>,
    fail_on_put: RwLock<bool>,
    queries: RwLock<Vec<KeyQuery>>,
}

impl MockDataPointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_query(&self, fail: bool) {
        *self.fail_on_query.write().await = fail;
    }

    pub async fn set_fail_on_put(&self, fail: bool) {
        *self.fail_on_put.write().await = fail;
    }

    /// Queries received so far, oldest first.
    pub async fn received_queries(&self) -> Vec<KeyQuery> {
        self.queries.read().await.clone()
    }

    pub async fn stored_count(&self) -> usize {
        self.items.read().await.values().map(BTreeMap::len).sum()
    }

    /// Resolve the exclusive start key to a sort value within the partition.
    fn start_after<'a>(query: &'a KeyQuery) -> Result<Option<&'a str>> {
        let Some(cursor) = &query.exclusive_start_key else {
            return Ok(None);
        };
        let schema = &query.key_schema;

        match cursor.get_str(&schema.partition_key) {
            Some(pk) if pk == query.partition_value => {}
            Some(pk) => {
                return Err(StorageError::InvalidStartKey(format!(
                    "partition '{}' does not match query partition '{}'",
                    pk, query.partition_value
                )))
            }
            None => {
                return Err(StorageError::InvalidStartKey(format!(
                    "missing string attribute '{}'",
                    schema.partition_key
                )))
            }
        }

        cursor
            .get_str(&schema.sort_key)
            .map(Some)
            .ok_or_else(|| {
                StorageError::InvalidStartKey(format!(
                    "missing string attribute '{}'",
                    schema.sort_key
                ))
            })
    }
}

#[async_trait]
impl DataPointStore for MockDataPointStore {
    async fn query(&self, query: &KeyQuery) -> Result<QueryOutput> {
        self.queries.write().await.push(query.clone());

        if *self.fail_on_query.read().await {
            return Err(StorageError::Query("mock query failure".to_string()));
        }

        let start = Self::start_after(query)?;
        let limit = usize::try_from(query.limit).unwrap_or(0);

        let table = self.items.read().await;
        let Some(partition) = table.get(&query.partition_value) else {
            return Ok(QueryOutput::default());
        };

        let range: Box<dyn Iterator<Item = (&String, &DataPoint)> + Send + '_> =
            match (query.scan_index_forward, start) {
                (true, Some(sk)) => Box::new(
                    partition.range::<str, _>((Bound::Excluded(sk), Bound::Unbounded)),
                ),
                (false, Some(sk)) => Box::new(
                    partition
                        .range::<str, _>((Bound::Unbounded, Bound::Excluded(sk)))
                        .rev(),
                ),
                (true, None) => Box::new(partition.iter()),
                (false, None) => Box::new(partition.iter().rev()),
            };

        let mut matching = range.filter(|(sk, _)| {
            query
                .sort_filter
                .as_ref()
                .map_or(true, |filter| filter.matches(sk))
        });

        let items: Vec<DataPoint> = matching
            .by_ref()
            .take(limit)
            .map(|(_, item)| item.clone())
            .collect();
        let has_more = matching.next().is_some();

        let last_evaluated_key = match items.last() {
            Some(last) if has_more => Some(
                Cursor::new()
                    .with(query.key_schema.partition_key.as_str(), query.partition_value.as_str())
                    .with(query.key_schema.sort_key.as_str(), last.created_at.as_str()),
            ),
            _ => None,
        };

        let count = i32::try_from(items.len()).unwrap_or(i32::MAX);
        Ok(QueryOutput {
            items,
            last_evaluated_key,
            count,
            scanned_count: count,
        })
    }

    async fn put(&self, _key_schema: &KeySchema, item: &DataPoint) -> Result<()> {
        if *self.fail_on_put.read().await {
            return Err(StorageError::Put("mock put failure".to_string()));
        }

        let owner = item
            .owner
            .as_deref()
            .ok_or_else(|| StorageError::MissingAttribute("owner".to_string()))?;

        self.items
            .write()
            .await
            .entry(partition_value(owner, &item.name))
            .or_default()
            .insert(item.created_at.clone(), item.clone());
        Ok(())
    }
}
