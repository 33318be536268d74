use std::time::Duration;

use thiserror::Error;

use crate::frame::FrameError;
use crate::sql::{DriverError, ScanError};
use crate::transform::{FillError, PivotError};

/// Everything that can fail a single sub-query. Errors never cross
/// sub-query boundaries; each one ends up in its own response.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Invalid query descriptor: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("Connection failed: {0}")]
    Connection(#[source] DriverError),
    #[error("Query execution failed: {0}")]
    Execution(#[source] DriverError),
    #[error("Row scan failed: {0}")]
    Scan(#[from] ScanError),
    #[error("Pivot failed: {0}")]
    Pivot(#[from] PivotError),
    #[error("Invalid fill interval: {0} ms")]
    InvalidInterval(i64),
    #[error("Time gap fill failed: {0}")]
    Fill(FillError),
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),
    #[error("Query cancelled")]
    Cancelled,
    #[error("Query timeout after {0:?}")]
    Timeout(Duration),
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

impl QueryError {
    /// Stable short name used for log fields and metric labels
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::Decode(_) => "decode",
            QueryError::Connection(_) => "connection",
            QueryError::Execution(_) => "execution",
            QueryError::Scan(_) => "scan",
            QueryError::Pivot(_) => "pivot",
            QueryError::InvalidInterval(_) => "invalid_interval",
            QueryError::Fill(_) => "fill",
            QueryError::Frame(_) => "frame",
            QueryError::Cancelled => "cancelled",
            QueryError::Timeout(_) => "timeout",
        }
    }
}

impl From<FillError> for QueryError {
    fn from(err: FillError) -> Self {
        match err {
            FillError::InvalidInterval(ms) => QueryError::InvalidInterval(ms),
            FillError::MissingTimeColumn => QueryError::Pivot(PivotError::MissingTimeColumn),
            FillError::Frame(e) => QueryError::Frame(e),
            other => QueryError::Fill(other),
        }
    }
}
