use std::env;
use std::fs;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value as Json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

use sqlframe::config::PoolSettings;
use sqlframe::metrics;
use sqlframe::query::{DataQuery, QueryDispatcher, QueryRequest, TimeRange};
use sqlframe::sql::csv_source::load_csv_path;
use sqlframe::sql::MemoryDatabase;

const USAGE: &str = "usage: sqlframe <result.csv> <query.json> [from] [to]";

/// Replays a recorded result set through the query pipeline and prints the
/// response map as JSON. The query file holds one descriptor or an array of
/// them; every descriptor's SQL is answered with the CSV rows. Pool
/// settings are read from the datasource JSON named by SQLFRAME_DATASOURCE.
#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    let level = env::var("SQLFRAME_LOG")
        .ok()
        .and_then(|l| l.parse::<Level>().ok())
        .unwrap_or(Level::INFO);
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .init();

    // Initialize metrics
    let metrics_handle = match metrics::init_metrics() {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("Failed to initialize metrics: {}", e);
            None
        }
    };

    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 2 {
        eprintln!("{}", USAGE);
        return ExitCode::from(2);
    }

    let code = match run(&args).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    };

    if let Some(handle) = metrics_handle {
        debug!(snapshot = %handle.render(), "metrics");
    }
    code
}

async fn run(args: &[String]) -> Result<String, Box<dyn std::error::Error>> {
    let result = load_csv_path(&args[0])?;
    let descriptors = match serde_json::from_str::<Json>(&fs::read_to_string(&args[1])?)? {
        Json::Array(items) => items,
        single => vec![single],
    };
    let time_range = parse_range(args.get(2), args.get(3))?;

    let db = MemoryDatabase::new();
    let mut queries = Vec::with_capacity(descriptors.len());
    for (i, json) in descriptors.into_iter().enumerate() {
        let ref_id = json
            .get("refId")
            .and_then(Json::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| ((b'A' + (i % 26) as u8) as char).to_string());
        let query = DataQuery::new(ref_id, json, time_range);
        // Descriptors that fail to decode still go through the dispatcher
        // so the error shows up in the output
        if let Ok(request) = QueryRequest::decode(&query) {
            db.register(request.sql, result.clone()).await;
        }
        queries.push(query);
    }

    info!(
        queries = queries.len(),
        rows = result.rows.len(),
        from = %time_range.from,
        to = %time_range.to,
        "replaying result set"
    );
    let pool = match env::var("SQLFRAME_DATASOURCE") {
        Ok(path) => serde_json::from_str::<PoolSettings>(&fs::read_to_string(path)?)?,
        Err(_) => PoolSettings::default(),
    };
    let dispatcher = QueryDispatcher::for_pool(Arc::new(db), &pool);
    let response = dispatcher.query_data(queries, &CancellationToken::new()).await;
    Ok(serde_json::to_string_pretty(&response)?)
}

/// Defaults to the hour before now
fn parse_range(from: Option<&String>, to: Option<&String>) -> Result<TimeRange, chrono::ParseError> {
    let parse = |s: &String| DateTime::parse_from_rfc3339(s).map(|t| t.with_timezone(&Utc));
    let to = match to {
        Some(s) => parse(s)?,
        None => Utc::now(),
    };
    let from = match from {
        Some(s) => parse(s)?,
        None => to - Duration::hours(1),
    };
    Ok(TimeRange::new(from, to))
}
