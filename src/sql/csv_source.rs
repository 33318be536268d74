//! Loads a result set from CSV so recorded query output can be replayed.
//!
//! Header cells are `name:TYPE` where TYPE is a vendor type name
//! (`ts:TIMESTAMP`, `host:VARCHAR`, `cpu:FLOAT`). A bare `name` is VARCHAR.
//! Empty cells are NULL.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use thiserror::Error;

use crate::frame::FieldType;

use super::driver::{ColumnMeta, DriverValue};
use super::memory::MemoryResult;
use super::scanner::parse_time;
use super::type_map::map_type;

#[derive(Error, Debug)]
pub enum CsvLoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Record {record} has {actual} cells, header has {expected}")]
    Width {
        record: usize,
        expected: usize,
        actual: usize,
    },
}

pub fn load_csv_path(path: impl AsRef<Path>) -> Result<MemoryResult, CsvLoadError> {
    load_csv(File::open(path)?)
}

pub fn load_csv<R: Read>(reader: R) -> Result<MemoryResult, CsvLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns: Vec<ColumnMeta> = reader
        .headers()?
        .iter()
        .map(|cell| match cell.split_once(':') {
            Some((name, type_name)) => ColumnMeta::new(name.trim(), type_name.trim()),
            None => ColumnMeta::new(cell, "VARCHAR"),
        })
        .collect();
    let types: Vec<FieldType> = columns.iter().map(|c| map_type(&c.type_name)).collect();

    let mut result = MemoryResult::new(columns);
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != types.len() {
            return Err(CsvLoadError::Width {
                record: i + 1,
                expected: types.len(),
                actual: record.len(),
            });
        }
        let row = record
            .iter()
            .zip(&types)
            .map(|(cell, field_type)| parse_cell(cell, *field_type))
            .collect();
        result.rows.push(row);
    }
    Ok(result)
}

/// Produces the value a driver would hand over for a cell. Cells that do
/// not parse as their declared type are passed on as text and left for the
/// scanner to reject.
fn parse_cell(cell: &str, field_type: FieldType) -> DriverValue {
    if cell.is_empty() {
        return DriverValue::Null;
    }
    let text = || DriverValue::Text(cell.to_string());
    match field_type.concrete() {
        FieldType::Bool => match cell.to_ascii_lowercase().as_str() {
            "t" | "true" => DriverValue::Bool(true),
            "f" | "false" => DriverValue::Bool(false),
            _ => text(),
        },
        FieldType::Int64 => cell.parse().map(DriverValue::Int).unwrap_or_else(|_| text()),
        FieldType::Float64 => cell.parse().map(DriverValue::Float).unwrap_or_else(|_| text()),
        FieldType::Time => parse_time(cell)
            .map(DriverValue::Timestamp)
            .unwrap_or_else(|_| text()),
        _ => text(),
    }
}
