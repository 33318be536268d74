//! Frame module for sqlframe
//! Typed, column-oriented tables that query results are collected into.

pub mod field_type;
pub mod schema;
pub mod table;
pub mod value;

pub use field_type::FieldType;
pub use schema::{TimeSeriesSchema, TimeSeriesType};
pub use table::{ColumnDescriptor, Field, Frame, FrameError, FrameResult};
pub use value::Value;
