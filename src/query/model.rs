use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{QueryError, QueryResult};

/// Absolute time span a query is evaluated over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }
}

/// A sub-query as handed over by the caller: its id, its serialized
/// descriptor, and the dashboard time range
#[derive(Debug, Clone)]
pub struct DataQuery {
    pub ref_id: String,
    pub json: serde_json::Value,
    pub time_range: TimeRange,
}

impl DataQuery {
    pub fn new(ref_id: impl Into<String>, json: serde_json::Value, time_range: TimeRange) -> Self {
        Self {
            ref_id: ref_id.into(),
            json,
            time_range,
        }
    }

    /// The caller's ref id, or the descriptor's own `refId` when the caller
    /// left it empty. Responses and frames are both keyed by this.
    pub fn resolved_ref_id(&self) -> String {
        if !self.ref_id.is_empty() {
            return self.ref_id.clone();
        }
        self.json
            .get("refId")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string()
    }
}

/// Serialized per-query descriptor
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryModel {
    pub query_string: String,
    pub query_templated: String,
    pub hide: bool,
    pub ref_id: Option<String>,
    pub time_fill_enabled: bool,
    pub time_fill_mode: String,
    pub time_fill_static_value: Option<f64>,
    pub format: String,
    pub interval_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    TimeSeries,
    Table,
}

impl Format {
    /// `"Time Series"` selects time-series output, anything else is a table
    pub fn parse(format: &str) -> Self {
        let normalized: String = format
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        if normalized == "timeseries" {
            Format::TimeSeries
        } else {
            Format::Table
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    Null,
    Static,
}

impl FillMode {
    pub fn parse(mode: &str) -> Self {
        if mode.trim().eq_ignore_ascii_case("static") {
            FillMode::Static
        } else {
            FillMode::Null
        }
    }
}

/// Gap-fill policy for time-series output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeFill {
    pub enabled: bool,
    pub mode: FillMode,
    pub value: Option<f64>,
}

impl TimeFill {
    /// The value synthetic numeric cells take, if any
    pub fn static_value(&self) -> Option<f64> {
        match self.mode {
            FillMode::Static => self.value,
            FillMode::Null => None,
        }
    }
}

/// A decoded sub-query, read-only for the duration of its execution
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub ref_id: String,
    pub sql: String,
    pub time_range: TimeRange,
    pub interval_ms: i64,
    pub hide: bool,
    pub format: Format,
    pub fill: TimeFill,
}

impl QueryRequest {
    /// Decodes the descriptor of a sub-query. The caller's `ref_id` wins
    /// over the one embedded in the JSON.
    pub fn decode(query: &DataQuery) -> QueryResult<Self> {
        let model: QueryModel =
            serde_json::from_value(query.json.clone()).map_err(QueryError::Decode)?;
        Ok(Self::from_model(query, model))
    }

    fn from_model(query: &DataQuery, model: QueryModel) -> Self {
        let ref_id = if query.ref_id.is_empty() {
            model.ref_id.unwrap_or_default()
        } else {
            query.ref_id.clone()
        };
        let sql = if model.query_templated.trim().is_empty() {
            model.query_string
        } else {
            model.query_templated
        };

        Self {
            ref_id,
            sql,
            time_range: query.time_range,
            interval_ms: model.interval_ms,
            hide: model.hide,
            format: Format::parse(&model.format),
            fill: TimeFill {
                enabled: model.time_fill_enabled,
                mode: FillMode::parse(&model.time_fill_mode),
                value: model.time_fill_static_value,
            },
        }
    }
}
