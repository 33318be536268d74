use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;
use tracing::debug;

use crate::frame::{Field, Frame, FrameError, TimeSeriesType, Value};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PivotError {
    #[error("Frame has no time field")]
    MissingTimeColumn,
    #[error("Row {row} has a null timestamp")]
    NullTimestamp { row: usize },
    #[error("Duplicate sample for series {series:?} at {time}")]
    DuplicateSample { series: String, time: String },
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),
}

/// Result type for pivot operations
pub type PivotResult<T> = Result<T, PivotError>;

/// Separator between label values when a series key spans several factors
const KEY_SEPARATOR: &str = ", ";

/// Converts a long frame into a wide one.
///
/// The non-time, non-numeric fields of each row form the series key. Every
/// distinct key becomes one output field per numeric input field, holding
/// the key's samples at their timestamps and null elsewhere. Output rows are
/// the distinct input timestamps in ascending order. A wide frame whose
/// timestamps are already strictly ascending is returned unchanged; any
/// other wide frame is sorted and merged like a long one with an empty key.
pub fn long_to_wide(frame: Frame) -> PivotResult<Frame> {
    let schema = frame.time_series_schema();
    let time_index = match (schema.kind, schema.time_index) {
        (TimeSeriesType::Wide, Some(i)) if is_strictly_ascending(&frame, i) => return Ok(frame),
        (_, Some(i)) => i,
        (_, None) => return Err(PivotError::MissingTimeColumn),
    };

    let fields = frame.fields();
    let factor_names: Vec<&str> = schema
        .factor_indices
        .iter()
        .map(|&i| fields[i].name())
        .collect();

    let mut times = BTreeSet::new();
    // series key -> timestamp -> one value per numeric input field.
    // Null factors stay None so they never collide with empty strings.
    let mut series: BTreeMap<Vec<Option<String>>, HashMap<DateTime<Utc>, Vec<Value>>> = BTreeMap::new();

    for row in 0..frame.rows() {
        let time = frame
            .time_at(time_index, row)
            .ok_or(PivotError::NullTimestamp { row })?;
        let key: Vec<Option<String>> = schema
            .factor_indices
            .iter()
            .map(|&i| {
                let value = &fields[i].values()[row];
                (!value.is_null()).then(|| value.to_string())
            })
            .collect();
        let values: Vec<Value> = schema
            .value_indices
            .iter()
            .map(|&i| fields[i].values()[row].clone())
            .collect();

        let samples = series.entry(key.clone()).or_default();
        if samples.insert(time, values).is_some() {
            return Err(PivotError::DuplicateSample {
                series: display_key(&key).join(KEY_SEPARATOR),
                time: time.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            });
        }
        times.insert(time);
    }

    let times: Vec<DateTime<Utc>> = times.into_iter().collect();
    let time_field = &fields[time_index];
    let mut output = Vec::with_capacity(1 + series.len() * schema.value_indices.len());
    output.push(Field::with_values(
        time_field.name(),
        time_field.field_type(),
        times.iter().copied().map(Value::Time).collect(),
    )?);

    for (key, samples) in &series {
        let key = display_key(key);
        let labels: BTreeMap<String, String> = factor_names
            .iter()
            .zip(&key)
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        for (slot, &value_index) in schema.value_indices.iter().enumerate() {
            let source = &fields[value_index];
            let values = times
                .iter()
                .map(|t| samples.get(t).map_or(Value::Null, |v| v[slot].clone()))
                .collect();
            let name = field_name(&key, source.name(), schema.value_indices.len());
            output.push(
                Field::with_values(name, source.field_type().nullable(), values)?
                    .with_labels(labels.clone()),
            );
        }
    }

    debug!(
        frame = frame.name(),
        series = series.len(),
        rows = times.len(),
        "pivoted long frame to wide"
    );
    Frame::with_fields(frame.name(), output).map_err(PivotError::from)
}

fn is_strictly_ascending(frame: &Frame, time_index: usize) -> bool {
    let mut previous = None;
    for row in 0..frame.rows() {
        match frame.time_at(time_index, row) {
            Some(time) if previous.map_or(true, |p| p < time) => previous = Some(time),
            _ => return false,
        }
    }
    true
}

/// Label rendering of a series key; null factors render empty
fn display_key(key: &[Option<String>]) -> Vec<String> {
    key.iter().map(|v| v.clone().unwrap_or_default()).collect()
}

/// Names an output field after its series key. With several value fields
/// the source field name is prefixed so the outputs stay distinct.
fn field_name(key: &[String], value_name: &str, value_fields: usize) -> String {
    let key = key.join(KEY_SEPARATOR);
    match (key.is_empty(), value_fields) {
        (true, _) => value_name.to_string(),
        (false, 1) => key,
        (false, _) => format!("{} {}", value_name, key),
    }
}
