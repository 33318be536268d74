use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use crate::frame::{FieldType, Frame, FrameError, Value};
use crate::query::model::{TimeFill, TimeRange};

/// Upper bound on synthetic rows for a single frame
const MAX_FILL_ROWS: i64 = 1_000_000;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FillError {
    #[error("Fill interval must be positive, got {0} ms")]
    InvalidInterval(i64),
    #[error("Frame has no time field")]
    MissingTimeColumn,
    #[error("Filling would create {rows} rows, limit is {limit}")]
    TooManyRows { rows: i64, limit: i64 },
    #[error("Timestamp {0} ms is out of range")]
    OutOfRange(i64),
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),
}

/// Result type for gap-fill operations
pub type FillResult<T> = Result<T, FillError>;

/// Inserts one synthetic row per interval boundary of `range` into a wide
/// frame and merges the frame's own rows over them.
///
/// Rows are keyed by Unix second. `from` is truncated down and `to` rounded
/// up to the interval grid, so the grid always covers the whole range; an
/// empty or inverted range produces no synthetic rows. A real row replaces
/// the synthetic row with the same key, and real rows outside the range are
/// kept. Output rows are in ascending time order.
pub fn fill_time_gaps(
    frame: &Frame,
    range: &TimeRange,
    interval_ms: i64,
    fill: &TimeFill,
) -> FillResult<Frame> {
    if interval_ms <= 0 {
        return Err(FillError::InvalidInterval(interval_ms));
    }
    let time_index = frame
        .time_field_index()
        .ok_or(FillError::MissingTimeColumn)?;

    let (start, end) = grid_bounds(range, interval_ms);
    let expected = (end - start) / interval_ms;
    if expected > MAX_FILL_ROWS {
        return Err(FillError::TooManyRows {
            rows: expected,
            limit: MAX_FILL_ROWS,
        });
    }

    let types = frame.field_types();
    let fill_value = fill.static_value();
    let mut rows: BTreeMap<i64, Vec<Value>> = BTreeMap::new();

    let mut boundary = start;
    while boundary < end {
        let time = DateTime::from_timestamp_millis(boundary).ok_or(FillError::OutOfRange(boundary))?;
        rows.insert(time.timestamp(), synthetic_row(&types, time, fill_value));
        boundary = match boundary.checked_add(interval_ms) {
            Some(next) => next,
            None => break,
        };
    }
    let synthetic = rows.len();

    for row in 0..frame.rows() {
        if let (Some(time), Some(values)) = (frame.time_at(time_index, row), frame.row_copy(row)) {
            rows.insert(time.timestamp(), values);
        }
    }

    let mut filled = frame.empty_copy();
    for (_, row) in rows {
        filled.append_row(row)?;
    }

    debug!(
        frame = frame.name(),
        synthetic,
        real = frame.rows(),
        rows = filled.rows(),
        "filled time gaps"
    );
    Ok(filled)
}

/// Interval grid covering `range` in Unix milliseconds, end exclusive
fn grid_bounds(range: &TimeRange, interval_ms: i64) -> (i64, i64) {
    let from = range.from.timestamp_millis();
    let to = range.to.timestamp_millis();
    let start = from - from.rem_euclid(interval_ms);
    if to <= from {
        return (start, start);
    }
    let rem = to.rem_euclid(interval_ms);
    let end = if rem == 0 { to } else { to.saturating_add(interval_ms - rem) };
    (start, end)
}

fn synthetic_row(types: &[FieldType], time: DateTime<Utc>, fill_value: Option<f64>) -> Vec<Value> {
    types
        .iter()
        .map(|&field_type| synthetic_value(field_type, time, fill_value))
        .collect()
}

fn synthetic_value(field_type: FieldType, time: DateTime<Utc>, fill_value: Option<f64>) -> Value {
    if field_type.is_time() {
        return Value::Time(time);
    }
    match fill_value {
        Some(v) if field_type.is_numeric() => cast_fill(field_type, v),
        _ if field_type.is_nullable() => Value::Null,
        _ => field_type.zero_value(),
    }
}

/// Casts the static fill value to the concrete width of a numeric field
fn cast_fill(field_type: FieldType, v: f64) -> Value {
    match field_type.concrete() {
        FieldType::Int8 => Value::Int8(v as i8),
        FieldType::Int16 => Value::Int16(v as i16),
        FieldType::Int32 => Value::Int32(v as i32),
        FieldType::Int64 => Value::Int64(v as i64),
        FieldType::Float32 => Value::Float32(v as f32),
        _ => Value::Float64(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Field;
    use crate::query::model::FillMode;
    use chrono::{Duration, TimeZone};

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, m, s).unwrap()
    }

    fn range(from: DateTime<Utc>, to: DateTime<Utc>) -> TimeRange {
        TimeRange::new(from, to)
    }

    fn static_fill(value: f64) -> TimeFill {
        TimeFill {
            enabled: true,
            mode: FillMode::Static,
            value: Some(value),
        }
    }

    fn null_fill() -> TimeFill {
        TimeFill {
            enabled: true,
            mode: FillMode::Null,
            value: None,
        }
    }

    fn wide_frame(rows: &[(DateTime<Utc>, f64)]) -> Frame {
        let time = Field::with_values(
            "time",
            FieldType::NullableTime,
            rows.iter().map(|(t, _)| Value::Time(*t)).collect(),
        )
        .unwrap();
        let value = Field::with_values(
            "value",
            FieldType::NullableFloat64,
            rows.iter().map(|(_, v)| Value::Float64(*v)).collect(),
        )
        .unwrap();
        Frame::with_fields("A", vec![time, value]).unwrap()
    }

    fn times(frame: &Frame) -> Vec<DateTime<Utc>> {
        (0..frame.rows()).filter_map(|r| frame.time_at(0, r)).collect()
    }

    #[test]
    fn test_static_fill_around_real_row() {
        let frame = wide_frame(&[(at(0, 1, 0), 5.0)]);
        let filled = fill_time_gaps(&frame, &range(at(0, 0, 0), at(0, 3, 0)), 60_000, &static_fill(0.0)).unwrap();

        assert_eq!(filled.name(), "A");
        assert_eq!(times(&filled), vec![at(0, 0, 0), at(0, 1, 0), at(0, 2, 0)]);
        assert_eq!(
            filled.fields()[1].values(),
            &[Value::Float64(0.0), Value::Float64(5.0), Value::Float64(0.0)]
        );
    }

    #[test]
    fn test_null_fill() {
        let frame = wide_frame(&[(at(0, 1, 0), 5.0)]);
        let filled = fill_time_gaps(&frame, &range(at(0, 0, 0), at(0, 3, 0)), 60_000, &null_fill()).unwrap();
        assert_eq!(
            filled.fields()[1].values(),
            &[Value::Null, Value::Float64(5.0), Value::Null]
        );
    }

    #[test]
    fn test_static_mode_without_value_fills_null() {
        let fill = TimeFill {
            enabled: true,
            mode: FillMode::Static,
            value: None,
        };
        let frame = wide_frame(&[]);
        let filled = fill_time_gaps(&frame, &range(at(0, 0, 0), at(0, 2, 0)), 60_000, &fill).unwrap();
        assert_eq!(filled.fields()[1].values(), &[Value::Null, Value::Null]);
    }

    #[test]
    fn test_real_data_wins_within_the_same_second() {
        let real = at(0, 1, 0) + Duration::milliseconds(400);
        let frame = wide_frame(&[(real, 7.0)]);
        let filled = fill_time_gaps(&frame, &range(at(0, 0, 0), at(0, 2, 0)), 60_000, &static_fill(-1.0)).unwrap();
        assert_eq!(times(&filled), vec![at(0, 0, 0), real]);
        assert_eq!(filled.fields()[1].values(), &[Value::Float64(-1.0), Value::Float64(7.0)]);
    }

    #[test]
    fn test_out_of_range_rows_are_kept() {
        let frame = wide_frame(&[(at(0, 10, 0), 1.0), (at(0, 0, 30), 2.0)]);
        let filled = fill_time_gaps(&frame, &range(at(0, 0, 0), at(0, 2, 0)), 60_000, &null_fill()).unwrap();
        assert_eq!(
            times(&filled),
            vec![at(0, 0, 0), at(0, 0, 30), at(0, 1, 0), at(0, 10, 0)]
        );
    }

    #[test]
    fn test_empty_range_adds_no_rows() {
        let empty = wide_frame(&[]);
        let filled = fill_time_gaps(&empty, &range(at(0, 1, 0), at(0, 1, 0)), 60_000, &static_fill(0.0)).unwrap();
        assert_eq!(filled.rows(), 0);

        // Unaligned but empty: still nothing synthetic
        let filled = fill_time_gaps(&empty, &range(at(0, 1, 30), at(0, 1, 30)), 60_000, &static_fill(0.0)).unwrap();
        assert_eq!(filled.rows(), 0);

        let one = wide_frame(&[(at(0, 1, 0), 3.0)]);
        let filled = fill_time_gaps(&one, &range(at(0, 1, 0), at(0, 1, 0)), 60_000, &static_fill(0.0)).unwrap();
        assert_eq!(filled.rows(), 1);
    }

    #[test]
    fn test_non_positive_interval() {
        let frame = wide_frame(&[]);
        let r = range(at(0, 0, 0), at(0, 3, 0));
        assert_eq!(fill_time_gaps(&frame, &r, 0, &null_fill()), Err(FillError::InvalidInterval(0)));
        assert_eq!(fill_time_gaps(&frame, &r, -5, &null_fill()), Err(FillError::InvalidInterval(-5)));
    }

    #[test]
    fn test_unaligned_range_is_covered() {
        let frame = wide_frame(&[]);
        let filled = fill_time_gaps(&frame, &range(at(0, 0, 30), at(0, 1, 40)), 60_000, &null_fill()).unwrap();
        assert_eq!(times(&filled), vec![at(0, 0, 0), at(0, 1, 0)]);
    }

    #[test]
    fn test_row_count_and_uniqueness() {
        let frame = wide_frame(&[(at(0, 7, 0), 1.0), (at(0, 7, 0) + Duration::seconds(1), 2.0)]);
        let from = at(0, 0, 0);
        let to = at(1, 0, 0);
        for interval_ms in [1_000i64, 7_000, 60_000, 90_000, 3_600_000, 5_400_000] {
            let filled = fill_time_gaps(&frame, &range(from, to), interval_ms, &null_fill()).unwrap();
            let span = (to - from).num_milliseconds();
            let minimum = (span + interval_ms - 1) / interval_ms;
            assert!(filled.rows() as i64 >= minimum, "interval {}", interval_ms);

            let ts = times(&filled);
            assert!(ts.windows(2).all(|w| w[0].timestamp() < w[1].timestamp()), "interval {}", interval_ms);
        }
    }

    #[test]
    fn test_fill_casts_and_non_numeric_columns() {
        let t = at(0, 0, 0);
        let fields = vec![
            Field::new("time", FieldType::Time),
            Field::new("small", FieldType::NullableInt8),
            Field::new("count", FieldType::Int32),
            Field::new("ratio", FieldType::NullableFloat32),
            Field::new("host", FieldType::NullableString),
            Field::new("up", FieldType::Bool),
        ];
        let frame = Frame::with_fields("A", fields).unwrap();
        let filled = fill_time_gaps(&frame, &range(t, at(0, 1, 0)), 60_000, &static_fill(2.75)).unwrap();
        assert_eq!(
            filled.row_copy(0).unwrap(),
            vec![
                Value::Time(t),
                Value::Int8(2),
                Value::Int32(2),
                Value::Float32(2.75),
                Value::Null,
                Value::Bool(false),
            ]
        );
    }

    #[test]
    fn test_missing_time_column() {
        let frame = Frame::with_fields("A", vec![Field::new("v", FieldType::NullableFloat64)]).unwrap();
        assert_eq!(
            fill_time_gaps(&frame, &range(at(0, 0, 0), at(0, 1, 0)), 60_000, &null_fill()),
            Err(FillError::MissingTimeColumn)
        );
    }

    #[test]
    fn test_too_many_rows() {
        let frame = wide_frame(&[]);
        let r = range(at(0, 0, 0), Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        assert!(matches!(
            fill_time_gaps(&frame, &r, 1_000, &null_fill()),
            Err(FillError::TooManyRows { .. })
        ));
    }
}
