//! Query module for sqlframe
//! Handles query decoding, execution and response collection.

pub mod dispatcher;
pub mod error;
pub mod health;
pub mod model;
pub mod pipeline;
pub mod response;

pub use dispatcher::QueryDispatcher;
pub use error::{QueryError, QueryResult};
pub use health::{check_health, HealthCheckResult, HealthStatus};
pub use model::{DataQuery, FillMode, Format, QueryRequest, TimeFill, TimeRange};
pub use response::{QueryDataResponse, QueryResponse};
