//! SQL module for sqlframe
//! Driver seam, vendor type mapping and row decoding.

pub mod csv_source;
pub mod driver;
pub mod memory;
pub mod scanner;
pub mod type_map;

pub use driver::{
    ColumnMeta, Connection, Database, DriverError, DriverResult, DriverValue, ResultSet,
};
pub use memory::{MemoryDatabase, MemoryResult};
pub use scanner::{RowScanner, ScanError, Slot};
pub use type_map::{describe_columns, map_type};
