//! Configuration for query execution

use std::time::Duration;

use serde::Deserialize;

/// Connection pool settings from the datasource JSON. The pool itself is
/// opened and owned by the caller; these values size it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PoolSettings {
    pub max_open_connections: usize,
    #[serde(rename = "maxIdealConnections")]
    pub max_idle_connections: usize,
    /// Minutes an idle connection is kept
    #[serde(rename = "maxConnectionIdealTime")]
    pub max_connection_idle_time: u64,
}

impl PoolSettings {
    pub fn max_idle_time(&self) -> Duration {
        Duration::from_secs(self.max_connection_idle_time * 60)
    }
}

/// Configuration for query execution
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// Maximum number of sub-queries running at once
    pub max_concurrent_queries: usize,
    /// Timeout for a single sub-query
    pub query_timeout: Duration,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_queries: 4,
            query_timeout: Duration::from_secs(30),
        }
    }
}

impl ExecutionConfig {
    /// Bounds concurrency by the pool's open connection limit, when set
    pub fn for_pool(pool: &PoolSettings) -> Self {
        let mut config = Self::default();
        if pool.max_open_connections > 0 {
            config.max_concurrent_queries = pool.max_open_connections;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_settings_from_datasource_json() {
        let settings: PoolSettings = serde_json::from_str(
            r#"{
                "host": "vertica:5433",
                "maxOpenConnections": 8,
                "maxIdealConnections": 2,
                "maxConnectionIdealTime": 5
            }"#,
        )
        .unwrap();
        assert_eq!(settings.max_open_connections, 8);
        assert_eq!(settings.max_idle_connections, 2);
        assert_eq!(settings.max_idle_time(), Duration::from_secs(300));

        let config = ExecutionConfig::for_pool(&settings);
        assert_eq!(config.max_concurrent_queries, 8);
    }

    #[test]
    fn test_unset_pool_keeps_default_concurrency() {
        let config = ExecutionConfig::for_pool(&PoolSettings::default());
        assert_eq!(config.max_concurrent_queries, 4);
        assert_eq!(config.query_timeout, Duration::from_secs(30));
    }
}
