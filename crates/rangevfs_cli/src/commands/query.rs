//! Query command implementation.

use crate::target;
use rangevfs_core::RangeSource;
use rangevfs_sqlite::{Connection, EngineVfs, Value};
use serde::Serialize;
use std::sync::Arc;

/// Rows returned by a query.
#[derive(Debug, Serialize)]
pub struct QueryOutput {
    /// Target URL or path.
    pub target: String,
    /// Column names.
    pub columns: Vec<String>,
    /// Rows, one JSON value per column. Blobs are hex encoded.
    pub rows: Vec<Vec<serde_json::Value>>,
}

/// Parses a `--param` argument into a bind value.
///
/// Integers and reals bind as numbers, `null` binds NULL, anything else
/// binds as text.
pub fn parse_param(raw: &str) -> Value {
    if raw.eq_ignore_ascii_case("null") {
        Value::Null
    } else if let Ok(int) = raw.parse::<i64>() {
        Value::Integer(int)
    } else if let Ok(real) = raw.parse::<f64>() {
        Value::Real(real)
    } else {
        Value::Text(raw.to_string())
    }
}

fn to_json(value: Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(int) => int.into(),
        Value::Real(real) => real.into(),
        Value::Text(text) => text.into(),
        Value::Blob(blob) => blob.iter().map(|b| format!("{b:02x}")).collect::<String>().into(),
    }
}

/// Runs `sql` against the target without printing the rows.
pub fn collect(
    target_path: &str,
    source: Arc<dyn RangeSource>,
    sql: &str,
    params: &[String],
) -> Result<QueryOutput, Box<dyn std::error::Error>> {
    let registry = target::registry(source)?;
    let conn = Connection::open_with(target_path, EngineVfs::register(registry)?)?;

    let params: Vec<Value> = params.iter().map(|raw| parse_param(raw)).collect();
    let result = conn.query(sql, &params)?;

    Ok(QueryOutput {
        target: target_path.to_string(),
        columns: result.columns,
        rows: result
            .rows
            .into_iter()
            .map(|row| row.into_iter().map(to_json).collect())
            .collect(),
    })
}

/// Runs the query command.
pub fn run(
    target_path: &str,
    source: Arc<dyn RangeSource>,
    sql: &str,
    params: &[String],
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = collect(target_path, source, sql, params)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        _ => {
            println!("{}", output.columns.join(" | "));
            for row in &output.rows {
                let cells: Vec<String> = row
                    .iter()
                    .map(|cell| match cell {
                        serde_json::Value::String(text) => text.clone(),
                        other => other.to_string(),
                    })
                    .collect();
                println!("{}", cells.join(" | "));
            }
            println!("({} rows)", output.rows.len());
        }
    }

    Ok(())
}
