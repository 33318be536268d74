use super::field_type::FieldType;

/// Shape of a frame from the point of view of time-series display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSeriesType {
    /// No time field
    Not,
    /// One row per (time, label combination)
    Long,
    /// One row per time, one field per series
    Wide,
}

/// Result of classifying a frame's field layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSeriesSchema {
    pub kind: TimeSeriesType,
    pub time_index: Option<usize>,
    /// Numeric fields holding sample values
    pub value_indices: Vec<usize>,
    /// Every other non-time field, whose values identify a series
    pub factor_indices: Vec<usize>,
}

impl TimeSeriesSchema {
    /// Pure classification over field types. The first time field is the
    /// time index; numeric fields are values and anything else is a factor.
    /// A frame with factors is long, a frame without is already wide.
    pub fn classify(types: &[FieldType]) -> Self {
        let time_index = types.iter().position(|t| t.is_time());
        let mut value_indices = Vec::new();
        let mut factor_indices = Vec::new();

        for (i, field_type) in types.iter().enumerate() {
            if Some(i) == time_index {
                continue;
            }
            if field_type.is_numeric() {
                value_indices.push(i);
            } else {
                factor_indices.push(i);
            }
        }

        let kind = match time_index {
            None => TimeSeriesType::Not,
            Some(_) if factor_indices.is_empty() => TimeSeriesType::Wide,
            Some(_) => TimeSeriesType::Long,
        };

        Self {
            kind,
            time_index,
            value_indices,
            factor_indices,
        }
    }

    pub fn is_wide(&self) -> bool {
        self.kind == TimeSeriesType::Wide
    }
}
