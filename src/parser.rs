//! Parser for the tabular text returned by the `/api/v2/query` endpoint.
//!
//! A response is a sequence of segments separated by a blank line (`\r\n\r\n`).
//! Each segment is read as CSV (quoted cells may contain commas) and starts
//! with a header row, followed by data rows that carry an empty leading field:
//!
//! ```text
//! ,result,table,_time,_value,host
//! ,_result,0,2020-01-01T00:00:00Z,12.34,server1
//! ,_result,0,2020-01-01T00:00:10Z,12.5,server1
//! ```
//!
//! Only `_value` (float) and `_start`, `_stop`, `_time` (RFC3339) are typed;
//! every other column is kept as a string.

use chrono::DateTime;
use csv::{ReaderBuilder, StringRecord, Trim};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::{Row, Table};
use crate::value::Value;

/// How malformed numbers and dates are handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Malformed values become NaN / invalid dates; parsing never fails.
    #[default]
    Lenient,
    /// Malformed values, or rows wider than their header, fail the parse.
    Strict,
}

/// Parse a full query response into one [`Table`] per segment.
///
/// In [`ParseMode::Lenient`] this never returns an error.
pub fn parse_tables(text: &str, mode: ParseMode) -> Result<Vec<Table>> {
    let mut tables = Vec::new();

    for segment in split_segments(text) {
        let joined = segment.join("\n");
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .trim(Trim::Fields)
            .flexible(true)
            .from_reader(joined.as_bytes());
        let mut records = reader.records();

        let header = match records.next() {
            Some(Ok(header)) => header,
            Some(Err(e)) => {
                if mode == ParseMode::Strict {
                    return Err(csv_error(e));
                }
                warn!(error = %e, "unreadable segment header, skipping segment");
                continue;
            }
            None => continue,
        };

        let columns: Vec<String> = header
            .iter()
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect();
        let mut table = Table::new(columns);

        for record in records {
            let record = match record {
                Ok(record) => record,
                Err(e) if mode == ParseMode::Strict => return Err(csv_error(e)),
                Err(e) => {
                    warn!(error = %e, "unreadable row, skipping");
                    continue;
                }
            };
            let row = parse_row(&record, &table.columns, mode)?;
            table.rows.push(row);
        }

        tables.push(table);
    }

    debug!(
        tables = tables.len(),
        rows = tables.iter().map(|t| t.rows.len()).sum::<usize>(),
        "parsed query response"
    );
    Ok(tables)
}

/// Group lines into blank-line-delimited segments, dropping empty ones.
fn split_segments(text: &str) -> Vec<Vec<&str>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();

    for line in text.lines() {
        if line.is_empty() {
            if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }

    segments
}

fn csv_error(e: csv::Error) -> Error {
    Error::Parse {
        message: format!("CSV error: {}", e),
    }
}

fn parse_row(record: &StringRecord, columns: &[String], mode: ParseMode) -> Result<Row> {
    let mut tokens: Vec<&str> = record.iter().collect();
    // Data rows carry an empty leading cell.
    if tokens.first() == Some(&"") {
        tokens.remove(0);
    }

    if tokens.len() > columns.len() {
        if mode == ParseMode::Strict {
            return Err(Error::Parse {
                message: format!(
                    "row has {} cells but header has {} columns",
                    tokens.len(),
                    columns.len()
                ),
            });
        }
        warn!(
            expected = columns.len(),
            actual = tokens.len(),
            "dropping cells beyond header width"
        );
    }

    let mut row = Row::new();
    for (column, token) in columns.iter().zip(tokens) {
        row.push(column.as_str(), parse_value(token, column, mode)?);
    }
    Ok(row)
}

/// Convert one token according to its column name.
fn parse_value(token: &str, column: &str, mode: ParseMode) -> Result<Value> {
    match column {
        "_value" => match token.trim().parse::<f64>() {
            Ok(v) => Ok(Value::Double(OrderedFloat::from(v))),
            Err(e) if mode == ParseMode::Strict => Err(Error::Parse {
                message: format!("Invalid number '{}' for column '{}': {}", token, column, e),
            }),
            Err(_) => {
                warn!(column, token, "number did not parse, storing NaN");
                Ok(Value::Double(OrderedFloat::from(f64::NAN)))
            }
        },
        "_start" | "_stop" | "_time" => match DateTime::parse_from_rfc3339(token.trim()) {
            Ok(t) => Ok(Value::Time(Some(t))),
            Err(e) if mode == ParseMode::Strict => Err(Error::Parse {
                message: format!(
                    "Invalid RFC3339 timestamp '{}' for column '{}': {}",
                    token, column, e
                ),
            }),
            Err(_) => {
                warn!(column, token, "timestamp did not parse, storing invalid date");
                Ok(Value::Time(None))
            }
        },
        _ => Ok(Value::String(token.to_string())),
    }
}
