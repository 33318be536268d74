use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use super::field_type::FieldType;
use super::schema::TimeSeriesSchema;
use super::value::Value;

/// Errors raised when a frame's shape invariants would be broken
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("Row has {actual} values but frame {frame} has {expected} fields")]
    RowLength {
        frame: String,
        expected: usize,
        actual: usize,
    },
    #[error("Field {field} of type {expected} cannot hold a {actual} value")]
    TypeMismatch {
        field: String,
        expected: FieldType,
        actual: &'static str,
    },
    #[error("Field {field} has {actual} rows, expected {expected}")]
    FieldLength {
        field: String,
        expected: usize,
        actual: usize,
    },
}

/// Result type for frame operations
pub type FrameResult<T> = Result<T, FrameError>;

/// Describes one result-set column and the frame type it maps to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub source_type: String,
    pub mapped_type: FieldType,
    pub nullable: bool,
}

/// A named, typed column of values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    name: String,
    #[serde(rename = "type")]
    field_type: FieldType,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    labels: BTreeMap<String, String>,
    values: Vec<Value>,
}

impl Field {
    /// Creates an empty field
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            labels: BTreeMap::new(),
            values: Vec::new(),
        }
    }

    /// Creates a field from existing values, checking each against the type
    pub fn with_values(
        name: impl Into<String>,
        field_type: FieldType,
        values: Vec<Value>,
    ) -> FrameResult<Self> {
        let mut field = Self::new(name, field_type);
        for value in &values {
            field.check(value)?;
        }
        field.values = values;
        Ok(field)
    }

    pub fn with_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn at(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Appends a value after checking it against the field type
    pub fn push(&mut self, value: Value) -> FrameResult<()> {
        self.check(&value)?;
        self.values.push(value);
        Ok(())
    }

    fn check(&self, value: &Value) -> FrameResult<()> {
        if self.field_type.accepts(value) {
            Ok(())
        } else {
            Err(FrameError::TypeMismatch {
                field: self.name.clone(),
                expected: self.field_type,
                actual: value.kind(),
            })
        }
    }

    fn empty_copy(&self) -> Self {
        Self {
            name: self.name.clone(),
            field_type: self.field_type,
            labels: self.labels.clone(),
            values: Vec::new(),
        }
    }
}

/// A column-oriented table of equally long fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    name: String,
    fields: Vec<Field>,
}

impl Frame {
    /// Creates a frame with no fields
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Creates an empty frame with one field per column descriptor
    pub fn from_columns(name: impl Into<String>, columns: &[ColumnDescriptor]) -> Self {
        Self {
            name: name.into(),
            fields: columns
                .iter()
                .map(|column| Field::new(column.name.clone(), column.mapped_type))
                .collect(),
        }
    }

    /// Creates a frame from prebuilt fields, which must all have the same length
    pub fn with_fields(name: impl Into<String>, fields: Vec<Field>) -> FrameResult<Self> {
        if let Some(first) = fields.first() {
            let expected = first.len();
            if let Some(field) = fields.iter().find(|f| f.len() != expected) {
                return Err(FrameError::FieldLength {
                    field: field.name.clone(),
                    expected,
                    actual: field.len(),
                });
            }
        }
        Ok(Self {
            name: name.into(),
            fields,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    pub fn field_types(&self) -> Vec<FieldType> {
        self.fields.iter().map(Field::field_type).collect()
    }

    /// Number of rows; every field has exactly this many values
    pub fn rows(&self) -> usize {
        self.fields.first().map_or(0, Field::len)
    }

    /// Appends one row. The row is checked in full before any field is
    /// touched, so a rejected row leaves the frame unchanged.
    pub fn append_row(&mut self, row: Vec<Value>) -> FrameResult<()> {
        if row.len() != self.fields.len() {
            return Err(FrameError::RowLength {
                frame: self.name.clone(),
                expected: self.fields.len(),
                actual: row.len(),
            });
        }
        for (field, value) in self.fields.iter().zip(&row) {
            field.check(value)?;
        }
        for (field, value) in self.fields.iter_mut().zip(row) {
            field.values.push(value);
        }
        Ok(())
    }

    /// Same name and schema, zero rows
    pub fn empty_copy(&self) -> Self {
        Self {
            name: self.name.clone(),
            fields: self.fields.iter().map(Field::empty_copy).collect(),
        }
    }

    /// Copies the values of one row in field order
    pub fn row_copy(&self, row: usize) -> Option<Vec<Value>> {
        if row >= self.rows() {
            return None;
        }
        Some(self.fields.iter().map(|f| f.values[row].clone()).collect())
    }

    pub fn value_at(&self, field: usize, row: usize) -> Option<&Value> {
        self.fields.get(field)?.at(row)
    }

    /// Returns the value only when it is not null
    pub fn concrete_at(&self, field: usize, row: usize) -> Option<&Value> {
        self.value_at(field, row).filter(|v| !v.is_null())
    }

    /// Returns the timestamp stored at a time field position
    pub fn time_at(&self, field: usize, row: usize) -> Option<DateTime<Utc>> {
        self.concrete_at(field, row).and_then(Value::as_time)
    }

    /// Index of the first Time or NullableTime field
    pub fn time_field_index(&self) -> Option<usize> {
        self.fields.iter().position(|f| f.field_type.is_time())
    }

    /// Classifies the frame layout for time-series handling
    pub fn time_series_schema(&self) -> TimeSeriesSchema {
        TimeSeriesSchema::classify(&self.field_types())
    }
}
