//! Query building and paging.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::filter::{self, RangeFilter};
use super::token::{self, Cursor, TokenError};
use super::{Page, QueryRequest, DEFAULT_LIMIT};
use crate::storage::{DataPointStore, StorageError};

/// Placeholder for the partition-key attribute name.
pub const PARTITION_KEY_NAME: &str = "#PK";
/// Placeholder for the partition-key value.
pub const PARTITION_KEY_VALUE: &str = ":PK";

/// Errors that fail a query.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Invalid limit {0}: must be at least 1")]
    InvalidLimit(i32),

    #[error("Backend query failed: {0}")]
    Backend(#[from] StorageError),

    #[error("Failed to encode nextToken: {0}")]
    Token(#[from] TokenError),
}

/// Attribute names of the table's composite key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeySchema {
    /// Partition key attribute, holds `<owner>#<name>`.
    pub partition_key: String,
    /// Sort key attribute, holds the creation timestamp.
    pub sort_key: String,
}

impl Default for KeySchema {
    fn default() -> Self {
        Self {
            partition_key: "PK".to_string(),
            sort_key: "SK".to_string(),
        }
    }
}

/// Query configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Page size when the request does not set one.
    pub default_limit: i32,
    /// Key attribute names.
    pub key_schema: KeySchema,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            key_schema: KeySchema::default(),
        }
    }
}

/// A fully built key-range query.
///
/// Carries the rendered key condition for expression-based stores and the
/// structured partition/sort restriction for stores that evaluate in process.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyQuery {
    #[serde(skip)]
    pub key_schema: KeySchema,
    #[serde(skip)]
    pub partition_value: String,
    #[serde(skip)]
    pub sort_filter: Option<RangeFilter>,
    pub key_condition_expression: String,
    pub expression_attribute_names: BTreeMap<String, String>,
    pub expression_attribute_values: BTreeMap<String, String>,
    pub limit: i32,
    pub scan_index_forward: bool,
    pub exclusive_start_key: Option<Cursor>,
}

/// Accept a decoded cursor only if it names a position in this partition.
///
/// The cursor must carry string values for both key attributes, and its
/// partition value must match the query's.
fn resume_point(
    cursor: Cursor,
    key_schema: &KeySchema,
    partition_value: &str,
) -> Option<Cursor> {
    let reason = match (
        cursor.get_str(&key_schema.partition_key),
        cursor.get_str(&key_schema.sort_key),
    ) {
        (Some(pk), Some(_)) if pk == partition_value => return Some(cursor),
        (Some(_), Some(_)) => "key belongs to another partition",
        _ => "key attributes missing",
    };

    warn!(
        partition = %partition_value,
        reason,
        "Could not parse nextToken, starting from the beginning"
    );
    None
}

/// Build the key-range query for a request.
///
/// A malformed `nextToken`, or one that does not point into this partition,
/// is logged and dropped; the query then starts from the beginning of the
/// partition.
pub fn build_key_query(
    config: &QueryConfig,
    request: &QueryRequest,
) -> Result<KeyQuery, QueryError> {
    let limit = request.limit.unwrap_or(config.default_limit);
    if limit < 1 {
        return Err(QueryError::InvalidLimit(limit));
    }

    let key_schema = config.key_schema.clone();
    let partition_value = request.partition_value();

    let mut names = BTreeMap::from([(
        PARTITION_KEY_NAME.to_string(),
        key_schema.partition_key.clone(),
    )]);
    let mut values = BTreeMap::from([(PARTITION_KEY_VALUE.to_string(), partition_value.clone())]);
    let mut expression = format!("{PARTITION_KEY_NAME} = {PARTITION_KEY_VALUE}");

    if let Some(fragment) = filter::compile(request.created_at.as_ref(), &key_schema.sort_key) {
        names.extend(fragment.names);
        values.extend(fragment.values);
        expression = format!("{} AND {}", expression, fragment.expression);
    }

    let direction = request.sort_direction.unwrap_or_default();
    let exclusive_start_key = token::decode_or_none(request.next_token.as_deref())
        .and_then(|cursor| resume_point(cursor, &key_schema, &partition_value));

    Ok(KeyQuery {
        key_schema,
        partition_value,
        sort_filter: request.created_at.clone(),
        key_condition_expression: expression,
        expression_attribute_names: names,
        expression_attribute_values: values,
        limit,
        scan_index_forward: direction.scan_forward(),
        exclusive_start_key,
    })
}

/// Runs `listDataPoints` requests against an injected store.
pub struct QueryExecutor<S: ?Sized> {
    store: Arc<S>,
    config: QueryConfig,
}

impl<S: DataPointStore + ?Sized> QueryExecutor<S> {
    pub fn new(store: Arc<S>, config: QueryConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Build the key-range query for a request.
    pub fn build_query(&self, request: &QueryRequest) -> Result<KeyQuery, QueryError> {
        build_key_query(&self.config, request)
    }

    /// Fetch one page of data points.
    pub async fn list_data_points(&self, request: &QueryRequest) -> Result<Page, QueryError> {
        let query = self.build_query(request)?;

        debug!(
            params = %serde_json::to_string(&query).unwrap_or_default(),
            "Built key query"
        );

        let output = self.store.query(&query).await.map_err(|e| {
            error!(
                owner = %request.owner,
                name = %request.name,
                error = %e,
                "Data point query failed"
            );
            QueryError::Backend(e)
        })?;

        let next_token = output
            .last_evaluated_key
            .as_ref()
            .map(token::encode)
            .transpose()
            .map_err(|e| {
                error!(error = %e, "Could not encode nextToken");
                QueryError::Token(e)
            })?;

        info!(
            owner = %request.owner,
            name = %request.name,
            count = output.count,
            scanned_count = output.scanned_count,
            has_more = next_token.is_some(),
            "Listed data points"
        );

        Ok(Page {
            items: output.items,
            next_token,
        })
    }
}
