use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use thiserror::Error;

use crate::frame::{ColumnDescriptor, FieldType, Value};

use super::driver::DriverValue;

/// Errors raised while decoding a driver row
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScanError {
    #[error("Row has {actual} values, expected {expected}")]
    ColumnCount { expected: usize, actual: usize },
    #[error("Cannot scan column {column}: {reason}")]
    Convert { column: String, reason: String },
}

/// Result type for scan operations
pub type ScanResult<T> = Result<T, ScanError>;

/// Destination storage for one column of one row. Each slot is wide enough
/// for every frame type that maps onto it.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Bool(Option<bool>),
    Int64(Option<i64>),
    Float64(Option<f64>),
    String(Option<String>),
    Time(Option<DateTime<Utc>>),
}

impl Slot {
    /// Allocates an empty slot for a frame type
    pub fn for_type(field_type: FieldType) -> Self {
        match field_type.concrete() {
            FieldType::Bool => Slot::Bool(None),
            FieldType::Int8 | FieldType::Int16 | FieldType::Int32 | FieldType::Int64 => {
                Slot::Int64(None)
            }
            FieldType::Float32 | FieldType::Float64 => Slot::Float64(None),
            FieldType::Time => Slot::Time(None),
            _ => Slot::String(None),
        }
    }

    /// Decodes a driver value into the slot. Null leaves the slot empty.
    pub fn fill(&mut self, raw: DriverValue) -> Result<(), String> {
        if raw == DriverValue::Null {
            return Ok(());
        }
        match self {
            Slot::Bool(dest) => *dest = Some(to_bool(raw)?),
            Slot::Int64(dest) => *dest = Some(to_i64(raw)?),
            Slot::Float64(dest) => *dest = Some(to_f64(raw)?),
            Slot::String(dest) => *dest = Some(to_string(raw)),
            Slot::Time(dest) => *dest = Some(to_time(raw)?),
        }
        Ok(())
    }

    /// Converts the slot into a value of the given frame type
    pub fn into_value(self, field_type: FieldType) -> Result<Value, String> {
        let value = match self {
            Slot::Bool(v) => v.map(Value::Bool),
            Slot::Int64(v) => v.map(|v| narrow_int(v, field_type)).transpose()?,
            Slot::Float64(v) => v.map(|v| match field_type.concrete() {
                FieldType::Float32 => Value::Float32(v as f32),
                _ => Value::Float64(v),
            }),
            Slot::String(v) => v.map(Value::String),
            Slot::Time(v) => v.map(Value::Time),
        };
        match value {
            Some(v) => Ok(v),
            None if field_type.is_nullable() => Ok(Value::Null),
            None => Err(format!("null value in non-nullable {} column", field_type)),
        }
    }
}

fn narrow_int(v: i64, field_type: FieldType) -> Result<Value, String> {
    let out_of_range = |_| format!("{} out of range for {}", v, field_type);
    Ok(match field_type.concrete() {
        FieldType::Int8 => Value::Int8(i8::try_from(v).map_err(out_of_range)?),
        FieldType::Int16 => Value::Int16(i16::try_from(v).map_err(out_of_range)?),
        FieldType::Int32 => Value::Int32(i32::try_from(v).map_err(out_of_range)?),
        _ => Value::Int64(v),
    })
}

fn to_bool(raw: DriverValue) -> Result<bool, String> {
    match raw {
        DriverValue::Bool(b) => Ok(b),
        DriverValue::Int(i) => Ok(i != 0),
        DriverValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "t" | "true" | "1" => Ok(true),
            "f" | "false" | "0" => Ok(false),
            _ => Err(format!("invalid bool {:?}", s)),
        },
        other => Err(format!("cannot convert {:?} to bool", other)),
    }
}

fn to_i64(raw: DriverValue) -> Result<i64, String> {
    match raw {
        DriverValue::Int(i) => Ok(i),
        // 2^63 is exact in f64; anything at or above it does not fit
        DriverValue::Float(f) if f.fract() == 0.0 && f >= -(2f64.powi(63)) && f < 2f64.powi(63) => {
            Ok(f as i64)
        }
        DriverValue::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| format!("invalid integer {:?}: {}", s, e)),
        DriverValue::Bytes(b) => to_i64(DriverValue::Text(String::from_utf8_lossy(&b).into_owned())),
        other => Err(format!("cannot convert {:?} to int64", other)),
    }
}

fn to_f64(raw: DriverValue) -> Result<f64, String> {
    match raw {
        DriverValue::Float(f) => Ok(f),
        DriverValue::Int(i) => Ok(i as f64),
        DriverValue::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid float {:?}: {}", s, e)),
        DriverValue::Bytes(b) => to_f64(DriverValue::Text(String::from_utf8_lossy(&b).into_owned())),
        other => Err(format!("cannot convert {:?} to float64", other)),
    }
}

fn to_string(raw: DriverValue) -> String {
    match raw {
        DriverValue::Null => String::new(),
        DriverValue::Bool(b) => b.to_string(),
        DriverValue::Int(i) => i.to_string(),
        DriverValue::Float(f) => f.to_string(),
        DriverValue::Text(s) => s,
        DriverValue::Bytes(b) => String::from_utf8_lossy(&b).into_owned(),
        DriverValue::Timestamp(t) => t.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        DriverValue::Date(d) => d.to_string(),
        DriverValue::TimeOfDay(t) => t.to_string(),
    }
}

fn to_time(raw: DriverValue) -> Result<DateTime<Utc>, String> {
    match raw {
        DriverValue::Timestamp(t) => Ok(t),
        DriverValue::Date(d) => Ok(d.and_time(NaiveTime::MIN).and_utc()),
        // Times of day are anchored on the Unix epoch date
        DriverValue::TimeOfDay(t) => Ok(DateTime::<Utc>::default().date_naive().and_time(t).and_utc()),
        DriverValue::Text(s) => parse_time(&s),
        other => Err(format!("cannot convert {:?} to time", other)),
    }
}

/// Parses RFC 3339 or `YYYY-MM-DD HH:MM:SS[.fff]` (taken as UTC)
pub(crate) fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(t.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d.and_time(NaiveTime::MIN).and_utc());
    }
    Err(format!("invalid timestamp {:?}", s))
}

/// Decodes driver rows into frame values for a fixed set of columns
#[derive(Debug, Clone)]
pub struct RowScanner {
    columns: Vec<(String, FieldType)>,
}

impl RowScanner {
    pub fn new(columns: &[ColumnDescriptor]) -> Self {
        Self {
            columns: columns
                .iter()
                .map(|c| (c.name.clone(), c.mapped_type))
                .collect(),
        }
    }

    /// Allocates one empty slot per column
    pub fn allocate_row(&self) -> Vec<Slot> {
        self.columns.iter().map(|(_, t)| Slot::for_type(*t)).collect()
    }

    /// Decodes a full row. Any column failing aborts the whole row.
    pub fn decode(&self, raw: Vec<DriverValue>) -> ScanResult<Vec<Value>> {
        if raw.len() != self.columns.len() {
            return Err(ScanError::ColumnCount {
                expected: self.columns.len(),
                actual: raw.len(),
            });
        }

        let slots = self.allocate_row();
        let mut row = Vec::with_capacity(slots.len());
        for ((mut slot, value), (name, field_type)) in slots.into_iter().zip(raw).zip(&self.columns) {
            let convert = |reason| ScanError::Convert {
                column: name.clone(),
                reason,
            };
            slot.fill(value).map_err(convert)?;
            row.push(slot.into_value(*field_type).map_err(convert)?);
        }
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn scanner(types: &[FieldType]) -> RowScanner {
        let columns: Vec<ColumnDescriptor> = types
            .iter()
            .enumerate()
            .map(|(i, t)| ColumnDescriptor {
                name: format!("c{}", i),
                source_type: String::new(),
                mapped_type: *t,
                nullable: t.is_nullable(),
            })
            .collect();
        RowScanner::new(&columns)
    }

    #[test]
    fn test_allocate_row() {
        let scanner = scanner(&[
            FieldType::NullableBool,
            FieldType::NullableInt64,
            FieldType::NullableFloat64,
            FieldType::NullableString,
            FieldType::NullableTime,
        ]);
        assert_eq!(
            scanner.allocate_row(),
            vec![
                Slot::Bool(None),
                Slot::Int64(None),
                Slot::Float64(None),
                Slot::String(None),
                Slot::Time(None),
            ]
        );
    }

    #[test]
    fn test_decode_row() {
        let scanner = scanner(&[
            FieldType::NullableTime,
            FieldType::NullableString,
            FieldType::NullableFloat64,
            FieldType::NullableInt64,
        ]);
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let row = scanner
            .decode(vec![
                DriverValue::Timestamp(t),
                DriverValue::Text("node01".to_string()),
                DriverValue::Int(3),
                DriverValue::Null,
            ])
            .unwrap();
        assert_eq!(
            row,
            vec![
                Value::Time(t),
                Value::String("node01".to_string()),
                Value::Float64(3.0),
                Value::Null,
            ]
        );
    }

    #[test]
    fn test_decode_conversions() {
        let scanner = scanner(&[
            FieldType::NullableBool,
            FieldType::NullableInt64,
            FieldType::NullableString,
            FieldType::NullableTime,
            FieldType::NullableTime,
        ]);
        let row = scanner
            .decode(vec![
                DriverValue::Text("t".to_string()),
                DriverValue::Text(" 42 ".to_string()),
                DriverValue::Bytes(b"\x01raw".to_vec()),
                DriverValue::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()),
                DriverValue::Text("2024-02-29 08:15:00".to_string()),
            ])
            .unwrap();
        assert_eq!(row[0], Value::Bool(true));
        assert_eq!(row[1], Value::Int64(42));
        assert_eq!(row[2], Value::String("\u{1}raw".to_string()));
        assert_eq!(row[3], Value::Time(Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap()));
        assert_eq!(row[4], Value::Time(Utc.with_ymd_and_hms(2024, 2, 29, 8, 15, 0).unwrap()));
    }

    #[test]
    fn test_decode_failure_aborts_row() {
        let scanner = scanner(&[FieldType::NullableString, FieldType::NullableInt64]);
        let err = scanner
            .decode(vec![
                DriverValue::Text("ok".to_string()),
                DriverValue::Text("not a number".to_string()),
            ])
            .unwrap_err();
        assert!(matches!(err, ScanError::Convert { ref column, .. } if column == "c1"));
    }

    #[test]
    fn test_decode_wrong_width() {
        let scanner = scanner(&[FieldType::NullableString]);
        assert_eq!(
            scanner.decode(vec![]),
            Err(ScanError::ColumnCount { expected: 1, actual: 0 })
        );
    }

    #[test]
    fn test_narrow_types() {
        let scanner = scanner(&[FieldType::Int8, FieldType::Float32]);
        let row = scanner
            .decode(vec![DriverValue::Int(7), DriverValue::Float(0.5)])
            .unwrap();
        assert_eq!(row, vec![Value::Int8(7), Value::Float32(0.5)]);

        assert!(scanner
            .decode(vec![DriverValue::Int(300), DriverValue::Float(0.5)])
            .is_err());
        // Whole floats outside the int64 range are rejected, not saturated
        assert!(matches!(
            scanner.decode(vec![DriverValue::Float(1e20), DriverValue::Float(0.5)]),
            Err(ScanError::Convert { ref column, .. }) if column == "c0"
        ));
        // Null cannot land in a non-nullable column
        assert!(scanner
            .decode(vec![DriverValue::Null, DriverValue::Float(0.5)])
            .is_err());
    }
}
