use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use super::driver::{
    ColumnMeta, Connection, Database, DriverError, DriverResult, DriverValue, ResultSet,
};

/// A fully materialised result set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryResult {
    pub columns: Vec<ColumnMeta>,
    pub rows: Vec<Vec<DriverValue>>,
}

impl MemoryResult {
    pub fn new(columns: Vec<ColumnMeta>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_row(mut self, row: Vec<DriverValue>) -> Self {
        self.rows.push(row);
        self
    }
}

#[derive(Debug, Clone)]
enum Scripted {
    Rows(MemoryResult),
    Error(String),
}

#[derive(Debug, Default)]
struct State {
    statements: HashMap<String, Scripted>,
    connect_error: Option<String>,
    latency: Option<Duration>,
}

/// An in-process database that answers statements from a fixed script.
///
/// Statements are matched on their exact text. Unknown statements fail
/// the way a server rejects bad SQL. Every executed statement is recorded.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<RwLock<State>>,
    executed: Arc<Mutex<Vec<String>>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the rows returned for a statement
    pub async fn register(&self, sql: impl Into<String>, result: MemoryResult) {
        self.state
            .write()
            .await
            .statements
            .insert(sql.into(), Scripted::Rows(result));
    }

    /// Scripts a server-side failure for a statement
    pub async fn register_error(&self, sql: impl Into<String>, message: impl Into<String>) {
        self.state
            .write()
            .await
            .statements
            .insert(sql.into(), Scripted::Error(message.into()));
    }

    /// Makes every connection attempt fail
    pub async fn fail_connections(&self, message: impl Into<String>) {
        self.state.write().await.connect_error = Some(message.into());
    }

    /// Delays every statement, simulating a network round trip
    pub async fn set_latency(&self, latency: Duration) {
        self.state.write().await.latency = Some(latency);
    }

    /// Statements executed so far, in execution order
    pub async fn executed(&self) -> Vec<String> {
        self.executed.lock().await.clone()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn connect(&self) -> DriverResult<Box<dyn Connection>> {
        if let Some(message) = &self.state.read().await.connect_error {
            return Err(DriverError::new(message.clone()));
        }
        Ok(Box::new(MemoryConnection { db: self.clone() }))
    }
}

struct MemoryConnection {
    db: MemoryDatabase,
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn query(&mut self, sql: &str) -> DriverResult<Box<dyn ResultSet>> {
        self.db.executed.lock().await.push(sql.to_string());

        let (scripted, latency) = {
            let state = self.db.state.read().await;
            (state.statements.get(sql).cloned(), state.latency)
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        match scripted {
            Some(Scripted::Rows(result)) => Ok(Box::new(MemoryRows {
                columns: result.columns,
                rows: result.rows.into_iter(),
            })),
            Some(Scripted::Error(message)) => Err(DriverError::new(message)),
            None => Err(DriverError::new(format!(
                "Syntax error at or near {:?}",
                sql.split_whitespace().next().unwrap_or_default()
            ))),
        }
    }
}

struct MemoryRows {
    columns: Vec<ColumnMeta>,
    rows: std::vec::IntoIter<Vec<DriverValue>>,
}

#[async_trait]
impl ResultSet for MemoryRows {
    fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    async fn next_row(&mut self) -> DriverResult<Option<Vec<DriverValue>>> {
        Ok(self.rows.next())
    }
}
