use std::fmt;

use serde::Serialize;

use super::value::Value;

/// The closed set of column types a frame can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    Bool,
    NullableBool,
    Int8,
    NullableInt8,
    Int16,
    NullableInt16,
    Int32,
    NullableInt32,
    Int64,
    NullableInt64,
    Float32,
    NullableFloat32,
    Float64,
    NullableFloat64,
    String,
    NullableString,
    Time,
    NullableTime,
}

impl FieldType {
    /// Returns true if the field accepts null values
    pub fn is_nullable(self) -> bool {
        matches!(
            self,
            FieldType::NullableBool
                | FieldType::NullableInt8
                | FieldType::NullableInt16
                | FieldType::NullableInt32
                | FieldType::NullableInt64
                | FieldType::NullableFloat32
                | FieldType::NullableFloat64
                | FieldType::NullableString
                | FieldType::NullableTime
        )
    }

    /// Returns the nullable variant of this type
    pub fn nullable(self) -> FieldType {
        match self {
            FieldType::Bool => FieldType::NullableBool,
            FieldType::Int8 => FieldType::NullableInt8,
            FieldType::Int16 => FieldType::NullableInt16,
            FieldType::Int32 => FieldType::NullableInt32,
            FieldType::Int64 => FieldType::NullableInt64,
            FieldType::Float32 => FieldType::NullableFloat32,
            FieldType::Float64 => FieldType::NullableFloat64,
            FieldType::String => FieldType::NullableString,
            FieldType::Time => FieldType::NullableTime,
            nullable => nullable,
        }
    }

    /// Returns the non-nullable variant of this type
    pub fn concrete(self) -> FieldType {
        match self {
            FieldType::NullableBool => FieldType::Bool,
            FieldType::NullableInt8 => FieldType::Int8,
            FieldType::NullableInt16 => FieldType::Int16,
            FieldType::NullableInt32 => FieldType::Int32,
            FieldType::NullableInt64 => FieldType::Int64,
            FieldType::NullableFloat32 => FieldType::Float32,
            FieldType::NullableFloat64 => FieldType::Float64,
            FieldType::NullableString => FieldType::String,
            FieldType::NullableTime => FieldType::Time,
            concrete => concrete,
        }
    }

    pub fn is_time(self) -> bool {
        self.concrete() == FieldType::Time
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self.concrete(),
            FieldType::Int8
                | FieldType::Int16
                | FieldType::Int32
                | FieldType::Int64
                | FieldType::Float32
                | FieldType::Float64
        )
    }

    /// Checks whether a value may be stored in a field of this type
    pub fn accepts(self, value: &Value) -> bool {
        match value {
            Value::Null => self.is_nullable(),
            Value::Bool(_) => self.concrete() == FieldType::Bool,
            Value::Int8(_) => self.concrete() == FieldType::Int8,
            Value::Int16(_) => self.concrete() == FieldType::Int16,
            Value::Int32(_) => self.concrete() == FieldType::Int32,
            Value::Int64(_) => self.concrete() == FieldType::Int64,
            Value::Float32(_) => self.concrete() == FieldType::Float32,
            Value::Float64(_) => self.concrete() == FieldType::Float64,
            Value::String(_) => self.concrete() == FieldType::String,
            Value::Time(_) => self.concrete() == FieldType::Time,
        }
    }

    /// Zero value for the concrete type, used where a non-nullable field
    /// needs a placeholder
    pub fn zero_value(self) -> Value {
        match self.concrete() {
            FieldType::Bool => Value::Bool(false),
            FieldType::Int8 => Value::Int8(0),
            FieldType::Int16 => Value::Int16(0),
            FieldType::Int32 => Value::Int32(0),
            FieldType::Int64 => Value::Int64(0),
            FieldType::Float32 => Value::Float32(0.0),
            FieldType::Float64 => Value::Float64(0.0),
            FieldType::String => Value::String(String::new()),
            _ => Value::Time(chrono::DateTime::<chrono::Utc>::default()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Bool => "bool",
            FieldType::NullableBool => "nullable_bool",
            FieldType::Int8 => "int8",
            FieldType::NullableInt8 => "nullable_int8",
            FieldType::Int16 => "int16",
            FieldType::NullableInt16 => "nullable_int16",
            FieldType::Int32 => "int32",
            FieldType::NullableInt32 => "nullable_int32",
            FieldType::Int64 => "int64",
            FieldType::NullableInt64 => "nullable_int64",
            FieldType::Float32 => "float32",
            FieldType::NullableFloat32 => "nullable_float32",
            FieldType::Float64 => "float64",
            FieldType::NullableFloat64 => "nullable_float64",
            FieldType::String => "string",
            FieldType::NullableString => "nullable_string",
            FieldType::Time => "time",
            FieldType::NullableTime => "nullable_time",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
