//! Integration tests for influxdb-http.
//!
//! These tests require a running InfluxDB instance.
//! Start one with: `docker-compose up -d`
//!
//! Run tests with: `cargo test --test integration`

use std::time::Duration;

use influxdb_http::{Client, ClientConfig, Error, Point, Precision, QuerySpec, WriteSpec};

// Test configuration - matches docker-compose.yml
const INFLUXDB_HOST: &str = "localhost";
const INFLUXDB_PORT: u32 = 8086;
const INFLUXDB_ORG: &str = "test-org";
const INFLUXDB_TOKEN: &str = "test-token-for-development-only";
const INFLUXDB_BUCKET: &str = "test-bucket";

/// Helper to check if InfluxDB is available
async fn influxdb_available() -> bool {
    let client = reqwest::Client::new();
    client
        .get(format!("http://{}:{}/health", INFLUXDB_HOST, INFLUXDB_PORT))
        .timeout(Duration::from_secs(2))
        .send()
        .await
        .map(|r| r.status().is_success())
        .unwrap_or(false)
}

fn client() -> Client {
    Client::new(
        ClientConfig::new(INFLUXDB_HOST, INFLUXDB_TOKEN)
            .with_protocol("http")
            .with_port(INFLUXDB_PORT),
    )
    .unwrap()
}

/// Generate N points, one second apart, starting 2023-11-14.
fn generate_points(measurement: &str, count: usize) -> Vec<Point> {
    let base_ts = 1700000000000i64;

    (0..count)
        .map(|i| {
            Point::new(measurement)
                .add_tag("host", format!("server{}", i % 10))
                .add_tag("region", "us-east")
                .add_field("value", (i % 100) as f64 + 0.5)
                .add_field("label", format!("sample-{}", i))
                .timestamp(base_ts + i as i64 * 1000)
        })
        .collect()
}

fn write_spec() -> WriteSpec {
    WriteSpec::new(INFLUXDB_BUCKET)
        .org(INFLUXDB_ORG)
        .precision(Precision::Milliseconds)
}

fn range_query(measurement: &str) -> String {
    format!(
        r#"from(bucket: "{}")
           |> range(start: 2023-01-01T00:00:00Z)
           |> filter(fn: (r) => r._measurement == "{}" and r._field == "value")"#,
        INFLUXDB_BUCKET, measurement
    )
}

#[tokio::test]
async fn test_write_then_query() {
    if !influxdb_available().await {
        eprintln!("Skipping test: InfluxDB not available");
        return;
    }

    let client = client();
    client
        .write(&write_spec(), &generate_points("it_write_query", 20))
        .await
        .unwrap();

    // Wait for data to be queryable
    tokio::time::sleep(Duration::from_millis(500)).await;

    let tables = client
        .query_tables(
            &QuerySpec::new().org(INFLUXDB_ORG),
            &range_query("it_write_query"),
        )
        .await
        .unwrap();

    // One table per host tag
    assert_eq!(tables.len(), 10);
    let rows: Vec<_> = tables.iter().flat_map(|t| &t.rows).collect();
    assert_eq!(rows.len(), 20);
    for row in rows {
        assert!(row.time().is_some());
        assert!(row.value().is_some_and(|v| !v.is_nan()));
        assert_eq!(row.measurement(), Some("it_write_query"));
    }
}

#[tokio::test]
async fn test_query_csv_passthrough() {
    if !influxdb_available().await {
        eprintln!("Skipping test: InfluxDB not available");
        return;
    }

    let client = client();
    client
        .write(&write_spec(), &generate_points("it_csv", 3))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    let text = client
        .query(
            &QuerySpec::new().org(INFLUXDB_ORG).csv(true),
            &range_query("it_csv"),
        )
        .await
        .unwrap()
        .into_csv()
        .unwrap();

    assert!(text.contains("_value"));
    assert!(text.contains("it_csv"));
}

#[tokio::test]
async fn test_empty_result() {
    if !influxdb_available().await {
        eprintln!("Skipping test: InfluxDB not available");
        return;
    }

    let tables = client()
        .query_tables(
            &QuerySpec::new().org(INFLUXDB_ORG),
            &range_query("nonexistent"),
        )
        .await
        .unwrap();

    assert!(tables.iter().all(|t| t.rows.is_empty()));
}

#[tokio::test]
async fn test_bad_token_is_rejected() {
    if !influxdb_available().await {
        eprintln!("Skipping test: InfluxDB not available");
        return;
    }

    let client = Client::new(
        ClientConfig::new(INFLUXDB_HOST, "wrong-token")
            .with_protocol("http")
            .with_port(INFLUXDB_PORT),
    )
    .unwrap();

    let err = client
        .query(&QuerySpec::new().org(INFLUXDB_ORG), &range_query("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Http { status: 401, .. }), "{:?}", err);
}

#[tokio::test]
async fn test_invalid_line_is_rejected() {
    if !influxdb_available().await {
        eprintln!("Skipping test: InfluxDB not available");
        return;
    }

    // Unescaped space in the measurement breaks the line.
    let point = Point::new("bad measurement").add_field("value", 1);
    let err = client().write(&write_spec(), &[point]).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
}
