//! Datapoints - paged data point queries
//!
//! Resolver for the `listDataPoints` GraphQL field: compiles sort-key range
//! filters into key conditions, queries an ordered key-value table by
//! `<owner>#<name>` partition and pages results with opaque continuation
//! tokens.

pub mod config;
pub mod handlers;
pub mod query;
pub mod storage;
pub mod utils;
