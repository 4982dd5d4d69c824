//! # influxdb-http
//!
//! Minimal async client for the InfluxDB 2.x HTTP API: token authentication,
//! queries returning tabular results, and writes encoded as line protocol.
//!
//! Every call is a single request/response round trip. There is no batching,
//! no retry and no streaming; the client only holds its configuration.
//!
//! ## Quick Start
//!
//! ```ignore
//! use influxdb_http::{Client, ClientConfig, Point, Precision, QuerySpec, WriteSpec};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("localhost", "my-token")
//!         .with_protocol("http")
//!         .with_port(8086);
//!     let client = Client::new(config)?;
//!
//!     let point = Point::new("myMeasurement")
//!         .add_tag("tagname1", "myTagvalue1")
//!         .add_field("fieldname1", 12.34)
//!         .add_field("fieldname2", "string")
//!         .timestamp(1_577_836_800_000);
//!     client
//!         .write(
//!             &WriteSpec::new("my-bucket").org("my-org").precision(Precision::Milliseconds),
//!             &[point],
//!         )
//!         .await?;
//!
//!     let tables = client
//!         .query_tables(
//!             &QuerySpec::new().org("my-org"),
//!             r#"from(bucket: "my-bucket") |> range(start: -1h)"#,
//!         )
//!         .await?;
//!
//!     for row in tables.iter().flat_map(|t| &t.rows) {
//!         println!("{:?} {:?}", row.time(), row.value());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Parsing
//!
//! Query responses are split into one [`Table`] per blank-line-delimited
//! segment. `_value` is parsed as a float and `_start`, `_stop`, `_time` as
//! RFC3339 timestamps; everything else stays a string. By default malformed
//! values become NaN or an invalid date; set [`ParseMode::Strict`] to fail
//! instead.

pub mod client;
pub mod config;
pub mod error;
pub mod parser;
pub mod point;
pub mod types;
pub mod value;

// Re-export main types at crate root
pub use client::{
    ApiRequest, Client, Precision, QueryOutput, QuerySpec, RequestBody, ResponseBody,
    ResponseKind, WriteSpec,
};
pub use config::{ClientConfig, Protocol, TransportOptions};
pub use error::{Error, Result};
pub use parser::{ParseMode, parse_tables};
pub use point::{FieldValue, Point, Timestamp, to_line_protocol};
pub use types::{Row, Table};
pub use value::Value;

pub use reqwest::Method;
