//! Query execution metrics for sqlframe
//!
//! Recorded through the `metrics` facade; the binary installs a Prometheus
//! recorder, library users may install their own.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Installs a Prometheus recorder and returns a handle for rendering it
pub fn init_metrics() -> Result<PrometheusHandle, Box<dyn std::error::Error>> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    Ok(handle)
}

/// Record a sub-query execution
pub fn record_query(duration_ms: f64) {
    histogram!("sqlframe.query.duration_ms").record(duration_ms);
}

/// Record a failed sub-query
pub fn record_query_error(kind: &'static str) {
    counter!("sqlframe.query.errors", "kind" => kind).increment(1);
}

/// Record a sub-query skipped because it is hidden
pub fn record_hidden_query() {
    counter!("sqlframe.query.hidden").increment(1);
}

/// Record rows decoded from a result set
pub fn record_rows_scanned(rows: u64) {
    counter!("sqlframe.scan.rows").increment(rows);
}

/// Record synthetic rows added by the gap filler
pub fn record_gap_fill(rows: u64) {
    counter!("sqlframe.gapfill.rows").increment(rows);
}
