//! Transform module for sqlframe
//! Reshapes scanned frames for time-series display.

pub mod gapfill;
pub mod pivot;

pub use gapfill::{fill_time_gaps, FillError};
pub use pivot::{long_to_wide, PivotError};
