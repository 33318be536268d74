//! Runs one decoded sub-query: execute, scan, build, reshape.

use tracing::debug;

use super::error::{QueryError, QueryResult};
use super::model::{Format, QueryRequest};
use crate::frame::Frame;
use crate::metrics;
use crate::sql::{describe_columns, Database, ResultSet, RowScanner};
use crate::transform::{fill_time_gaps, long_to_wide};

/// Executes the request's SQL on a pooled connection and returns its frames
pub async fn run_query(db: &dyn Database, request: &QueryRequest) -> QueryResult<Vec<Frame>> {
    let mut connection = db.connect().await.map_err(QueryError::Connection)?;
    let mut rows = connection
        .query(&request.sql)
        .await
        .map_err(QueryError::Execution)?;

    let frame = scan_frame(&request.ref_id, rows.as_mut()).await?;
    shape_frame(frame, request)
}

/// Drains a result set into a frame named after the sub-query
pub async fn scan_frame(name: &str, rows: &mut dyn ResultSet) -> QueryResult<Frame> {
    let columns = describe_columns(rows.columns());
    let scanner = RowScanner::new(&columns);
    let mut frame = Frame::from_columns(name, &columns);

    while let Some(raw) = rows.next_row().await.map_err(QueryError::Execution)? {
        frame.append_row(scanner.decode(raw)?)?;
    }

    metrics::record_rows_scanned(frame.rows() as u64);
    debug!(frame = name, columns = columns.len(), rows = frame.rows(), "scanned result set");
    Ok(frame)
}

/// Applies the output format to a scanned frame.
///
/// An empty result becomes a single named frame without fields. Table
/// output is the frame as scanned. Time-series output is pivoted to wide
/// and, when enabled, gap filled.
pub fn shape_frame(frame: Frame, request: &QueryRequest) -> QueryResult<Vec<Frame>> {
    if frame.rows() == 0 {
        return Ok(vec![Frame::new(request.ref_id.clone())]);
    }
    if request.format == Format::Table {
        return Ok(vec![frame]);
    }

    let wide = long_to_wide(frame)?;
    if !request.fill.enabled {
        return Ok(vec![wide]);
    }

    let filled = fill_time_gaps(&wide, &request.time_range, request.interval_ms, &request.fill)?;
    metrics::record_gap_fill(filled.rows().saturating_sub(wide.rows()) as u64);
    Ok(vec![filled])
}
