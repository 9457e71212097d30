//! AppSync direct-Lambda resolver.
//!
//! AppSync invokes the function with the GraphQL field arguments and a
//! selection `info` block naming the field. Only `listDataPoints` is served;
//! other fields resolve to `null`.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::query::{QueryConfig, QueryError, QueryExecutor, QueryRequest};
use crate::storage::DataPointStore;

/// Field name of the paged data point query.
pub const LIST_DATA_POINTS: &str = "listDataPoints";

/// Errors surfaced to the invocation boundary.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("Invalid arguments for {field}: {source}")]
    InvalidArguments {
        field: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Failed to serialize response: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Selection info of the resolved field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverInfo {
    pub field_name: String,
    #[serde(default)]
    pub parent_type_name: Option<String>,
}

/// Direct-Lambda resolver event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolverEvent {
    #[serde(default)]
    pub arguments: Value,
    pub info: ResolverInfo,
}

impl ResolverEvent {
    pub fn new(field_name: impl Into<String>, arguments: Value) -> Self {
        Self {
            arguments,
            info: ResolverInfo {
                field_name: field_name.into(),
                parent_type_name: None,
            },
        }
    }
}

/// Dispatches resolver events to the query executor.
pub struct ResolverHandler<S: ?Sized> {
    executor: QueryExecutor<S>,
}

impl<S: DataPointStore + ?Sized> ResolverHandler<S> {
    pub fn new(store: Arc<S>, config: QueryConfig) -> Self {
        Self {
            executor: QueryExecutor::new(store, config),
        }
    }

    /// Resolve one field.
    pub async fn handle(&self, event: ResolverEvent) -> Result<Value, HandlerError> {
        let field = event.info.field_name.as_str();

        info!(
            field = %field,
            parent = event.info.parent_type_name.as_deref().unwrap_or_default(),
            "Resolving field"
        );

        match field {
            LIST_DATA_POINTS => {
                let request: QueryRequest =
                    serde_json::from_value(event.arguments).map_err(|source| {
                        warn!(field = %field, error = %source, "Rejected arguments");
                        HandlerError::InvalidArguments {
                            field: field.to_string(),
                            source,
                        }
                    })?;

                let page = self.executor.list_data_points(&request).await?;
                serde_json::to_value(page).map_err(HandlerError::Serialize)
            }
            other => {
                warn!(field = %other, "No resolver for field");
                Ok(Value::Null)
            }
        }
    }
}
