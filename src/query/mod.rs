//! Data point queries.
//!
//! Translates a `listDataPoints` request into a partitioned key-range query,
//! runs it against a [`DataPointStore`](crate::storage::DataPointStore) and
//! pages the result with an opaque continuation token.

pub mod executor;
pub mod filter;
pub mod token;

pub use executor::{
    build_key_query, KeyQuery, KeySchema, QueryConfig, QueryError, QueryExecutor,
};
pub use filter::{compile, ConditionFragment, FilterError, RangeFilter};
pub use token::{Cursor, KeyAttribute, TokenError};

use serde::{Deserialize, Serialize};

/// Page size used when the request does not set `limit`.
pub const DEFAULT_LIMIT: i32 = 100;

/// A single recorded value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPoint {
    pub name: String,
    pub created_at: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

/// Result ordering on the sort key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "ASC")]
    Ascending,
    #[serde(rename = "DESC")]
    Descending,
}

impl SortDirection {
    /// Whether the store should walk the sort key forward.
    pub fn scan_forward(self) -> bool {
        matches!(self, Self::Ascending)
    }
}

/// Arguments of a `listDataPoints` call.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub owner: String,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<RangeFilter>,
    #[serde(default)]
    pub limit: Option<i32>,
    #[serde(default)]
    pub next_token: Option<String>,
    #[serde(default)]
    pub sort_direction: Option<SortDirection>,
}

impl QueryRequest {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_created_at(mut self, filter: RangeFilter) -> Self {
        self.created_at = Some(filter);
        self
    }

    pub fn with_limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_next_token(mut self, token: impl Into<String>) -> Self {
        self.next_token = Some(token.into());
        self
    }

    pub fn with_sort_direction(mut self, direction: SortDirection) -> Self {
        self.sort_direction = Some(direction);
        self
    }

    /// Partition key value: `<owner>#<name>`.
    ///
    /// Owners or names containing `#` are not escaped, so distinct pairs can
    /// collide (`"a#b" + "c"` and `"a" + "b#c"`).
    pub fn partition_value(&self) -> String {
        partition_value(&self.owner, &self.name)
    }
}

/// Compose the partition key value for an owner and series name.
pub fn partition_value(owner: &str, name: &str) -> String {
    format!("{}#{}", owner, name)
}

/// One page of results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub items: Vec<DataPoint>,
    /// Present only when the store reported more results.
    pub next_token: Option<String>,
}
