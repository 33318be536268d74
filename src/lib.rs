//! sqlframe - SQL result sets as time-series frames
//!
//! This crate turns columnar SQL query results into typed frames, pivots
//! long results into wide time series and fills time gaps, running the
//! sub-queries of a request concurrently against a shared database pool.

pub mod config;
pub mod frame;
pub mod metrics;
pub mod query;
pub mod sql;
pub mod transform;
