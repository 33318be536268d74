//! Connectivity probe for a configured database

use serde::Serialize;
use tracing::info;

use crate::frame::{ColumnDescriptor, FieldType, Value};
use crate::sql::{Database, RowScanner};

/// Statement used to probe the server
pub const HEALTH_QUERY: &str = "SELECT version()";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthCheckResult {
    pub status: HealthStatus,
    pub message: String,
}

impl HealthCheckResult {
    fn error(step: &str, message: impl ToString) -> Self {
        let message = message.to_string();
        info!(step, error = %message, "health check failed");
        Self {
            status: HealthStatus::Error,
            message,
        }
    }
}

/// Runs [`HEALTH_QUERY`] and reports the server version on success
pub async fn check_health(db: &dyn Database) -> HealthCheckResult {
    let mut connection = match db.connect().await {
        Ok(connection) => connection,
        Err(e) => return HealthCheckResult::error("connection", e),
    };
    let mut rows = match connection.query(HEALTH_QUERY).await {
        Ok(rows) => rows,
        Err(e) => return HealthCheckResult::error("query", e),
    };

    // Only the first column matters and it is always read as text
    let version_column = rows.columns().first().map(|c| ColumnDescriptor {
        name: c.name.clone(),
        source_type: c.type_name.clone(),
        mapped_type: FieldType::NullableString,
        nullable: true,
    });

    let mut version = String::new();
    match (rows.next_row().await, version_column) {
        (Ok(Some(raw)), Some(column)) => {
            let scanner = RowScanner::new(&[column]);
            match scanner.decode(raw.into_iter().take(1).collect()) {
                Ok(values) => {
                    if let Some(Value::String(v)) = values.into_iter().next() {
                        version = v;
                    }
                }
                Err(e) => return HealthCheckResult::error("scan", e),
            }
        }
        (Err(e), _) => return HealthCheckResult::error("fetch", e),
        _ => {}
    }

    HealthCheckResult {
        status: HealthStatus::Ok,
        message: format!("Successfully connected to {}", version),
    }
}
