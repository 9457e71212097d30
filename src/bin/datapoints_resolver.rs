//! datapoints-resolver: AppSync direct-Lambda resolver
//!
//! Serves the `listDataPoints` field from the data point table.
//!
//! ## Architecture
//! ```text
//! [AppSync] --(Lambda invoke)--> [datapoints-resolver] --(Query)--> [DynamoDB]
//! ```
//!
//! ## Configuration
//! - TABLE: Data point table name (set by the stack)
//! - DATAPOINTS_CONFIG: Path to a YAML config file (optional)
//! - DATAPOINTS__*: Config overrides, e.g. DATAPOINTS__QUERY__DEFAULT_LIMIT
//! - DATAPOINTS_LOG: Log filter (default: info)

use std::sync::Arc;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::info;

use datapoints::config::Config;
use datapoints::handlers::{ResolverEvent, ResolverHandler};
use datapoints::storage::{init_storage, DataPointStore};
use datapoints::utils::bootstrap::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = Config::load(None)?;
    let store = init_storage(&config.storage).await?;
    let handler: Arc<ResolverHandler<dyn DataPointStore>> =
        Arc::new(ResolverHandler::new(store, config.query));

    info!("datapoints-resolver started");

    lambda_runtime::run(service_fn(move |event: LambdaEvent<ResolverEvent>| {
        let handler = Arc::clone(&handler);
        async move {
            let value: Value = handler.handle(event.payload).await?;
            Ok::<Value, Error>(value)
        }
    }))
    .await
}
