//! Shared storage integration tests.
//!
//! Tests the DataPointStore interface against its implementations.
//! Each implementation module imports these test functions and runs them.

pub mod data_point_store_tests;
