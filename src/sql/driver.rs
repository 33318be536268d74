use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use thiserror::Error;

/// Error reported by the underlying database driver
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct DriverError(pub String);

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Result type for driver operations
pub type DriverResult<T> = Result<T, DriverError>;

/// Column metadata as reported by the driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    /// Vendor type name, e.g. `TIMESTAMPTZ`
    pub type_name: String,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// A raw value handed over by the driver before it is scanned
#[derive(Debug, Clone, PartialEq)]
pub enum DriverValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    TimeOfDay(NaiveTime),
}

/// A pooled database handle. Pool sizing and lifetime belong to the
/// implementor.
#[async_trait]
pub trait Database: Send + Sync {
    /// Acquires a connection from the pool
    async fn connect(&self) -> DriverResult<Box<dyn Connection>>;
}

/// A single connection checked out of the pool
#[async_trait]
pub trait Connection: Send {
    /// Runs a statement verbatim and returns its result set
    async fn query(&mut self, sql: &str) -> DriverResult<Box<dyn ResultSet>>;
}

/// Rows produced by a statement
#[async_trait]
pub trait ResultSet: Send {
    fn columns(&self) -> &[ColumnMeta];

    /// Fetches the next row, `None` once the result set is drained
    async fn next_row(&mut self) -> DriverResult<Option<Vec<DriverValue>>>;
}
