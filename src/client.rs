//! InfluxDB 2.x HTTP client.
//!
//! This module provides the main `Client` type for querying and writing data
//! against an InfluxDB 2.x server, plus the option types its methods take.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::parser::{ParseMode, parse_tables};
use crate::point::{Point, to_line_protocol};
use crate::types::Table;

/// InfluxDB 2.x client.
///
/// Holds only immutable configuration, so it is cheap to clone and safe to
/// share between tasks. Every method issues exactly one HTTP request.
///
/// # Example
///
/// ```ignore
/// use influxdb_http::{Client, ClientConfig, Point, Precision, QuerySpec, WriteSpec};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = Client::new(ClientConfig::new("localhost", "my-token").with_port(8086))?;
///
///     client
///         .write(
///             &WriteSpec::new("sensors").org("my-org").precision(Precision::Milliseconds),
///             &[Point::new("temperature").add_tag("room", "kitchen").add_field("value", 21.5)],
///         )
///         .await?;
///
///     let tables = client
///         .query_tables(
///             &QuerySpec::new().org("my-org"),
///             r#"from(bucket: "sensors") |> range(start: -1h)"#,
///         )
///         .await?;
///     println!("{} tables", tables.len());
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    token: String,
    parse_mode: ParseMode,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("parse_mode", &self.parse_mode)
            .finish_non_exhaustive()
    }
}

/// Query payload for the InfluxDB API.
#[derive(Debug, Serialize)]
struct QueryPayload<'a> {
    query: &'a str,
}

/// Target organization and output mode of a query.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// Organization name, sent as `org`.
    pub org: Option<String>,
    /// Organization ID, sent as `orgID`.
    pub org_id: Option<String>,
    /// Return the raw response text instead of parsed tables.
    #[serde(default)]
    pub csv: bool,
}

impl QuerySpec {
    /// Empty spec: no org, parsed output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the organization name.
    pub fn org(mut self, org: impl Into<String>) -> Self {
        self.org = Some(org.into());
        self
    }

    /// Set the organization ID.
    pub fn org_id(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    /// Request the raw response text instead of parsed tables.
    pub fn csv(mut self, csv: bool) -> Self {
        self.csv = csv;
        self
    }
}

/// Result of [`Client::query`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryOutput {
    /// Raw response body, returned when [`QuerySpec::csv`] is set.
    Csv(String),
    /// Parsed response, one table per segment.
    Tables(Vec<Table>),
}

impl QueryOutput {
    /// The raw text, if this is a `Csv` result.
    pub fn into_csv(self) -> Option<String> {
        match self {
            QueryOutput::Csv(text) => Some(text),
            QueryOutput::Tables(_) => None,
        }
    }

    /// The parsed tables, if this is a `Tables` result.
    pub fn into_tables(self) -> Option<Vec<Table>> {
        match self {
            QueryOutput::Tables(tables) => Some(tables),
            QueryOutput::Csv(_) => None,
        }
    }
}

/// Timestamp unit of written points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precision {
    #[serde(rename = "ns")]
    Nanoseconds,
    #[serde(rename = "us")]
    Microseconds,
    #[serde(rename = "ms")]
    Milliseconds,
    #[serde(rename = "s")]
    Seconds,
}

impl Precision {
    /// Value of the `precision` URL parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Precision::Nanoseconds => "ns",
            Precision::Microseconds => "us",
            Precision::Milliseconds => "ms",
            Precision::Seconds => "s",
        }
    }
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination of a write.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSpec {
    /// Organization name, sent as `org`.
    pub org: Option<String>,
    /// Organization ID, sent as `orgID`.
    pub org_id: Option<String>,
    /// Target bucket.
    pub bucket: String,
    /// Timestamp unit; the server defaults to nanoseconds.
    pub precision: Option<Precision>,
}

impl WriteSpec {
    /// Write to `bucket`, with no org and server-default precision.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    /// Set the organization name.
    pub fn org(mut self, org: impl Into<String>) -> Self {
        self.org = Some(org.into());
        self
    }

    /// Set the organization ID.
    pub fn org_id(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    /// Set the timestamp unit.
    pub fn precision(mut self, precision: Precision) -> Self {
        self.precision = Some(precision);
        self
    }
}

/// Body of an [`ApiRequest`].
#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    /// Serialized as JSON, sent as `application/json`.
    Json(serde_json::Value),
    /// Sent verbatim as `text/plain; charset=utf-8`.
    Text(String),
}

/// How a successful response body is read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResponseKind {
    #[default]
    Text,
    Binary,
}

/// A decoded response body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseBody {
    Text(String),
    Binary(Vec<u8>),
}

impl ResponseBody {
    /// Body as text; binary bodies are decoded lossily.
    pub fn into_text(self) -> String {
        match self {
            ResponseBody::Text(text) => text,
            ResponseBody::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// Body as raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            ResponseBody::Text(text) => text.into_bytes(),
            ResponseBody::Binary(bytes) => bytes,
        }
    }
}

/// A request against `/api/v2`.
///
/// Used internally by [`Client::query`] and [`Client::write`]; also usable
/// with [`Client::execute`] for endpoints this crate does not wrap.
#[derive(Clone, Debug)]
pub struct ApiRequest<'a> {
    method: Method,
    route: &'a str,
    params: Vec<(&'a str, Option<&'a str>)>,
    body: RequestBody,
    response: ResponseKind,
}

impl<'a> ApiRequest<'a> {
    /// `route` is relative to `/api/v2` and starts with `/`.
    pub fn new(method: Method, route: &'a str) -> Self {
        Self {
            method,
            route,
            params: Vec::new(),
            body: RequestBody::Text(String::new()),
            response: ResponseKind::Text,
        }
    }

    /// Add a query parameter. `None` values are left out of the URL.
    pub fn param(mut self, key: &'a str, value: Option<&'a str>) -> Self {
        self.params.push((key, value));
        self
    }

    /// Send `body` as JSON.
    pub fn json_body(mut self, body: serde_json::Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    /// Send `body` as plain text.
    pub fn text_body(mut self, body: impl Into<String>) -> Self {
        self.body = RequestBody::Text(body.into());
        self
    }

    /// Choose how the response body is read.
    pub fn response(mut self, kind: ResponseKind) -> Self {
        self.response = kind;
        self
    }
}

impl Client {
    /// Create a new InfluxDB client.
    ///
    /// Validates the configuration and builds the HTTP client; performs no I/O.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the host or token is empty, the protocol is not
    /// `http`/`https`, the port is outside 1-65535, or a transport option is
    /// invalid.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let (protocol, port) = config.resolve()?;

        let base = format!("{}://{}:{}/", protocol, config.host, port);
        let base_url = Url::parse(&base)
            .map_err(|e| Error::config(format!("Invalid host `{}`: {}", config.host, e)))?;
        // A host carrying a path, credentials, query or fragment would move
        // the port out of the authority.
        if base_url.cannot_be_a_base()
            || base_url.host_str().is_none()
            || base_url.path() != "/"
            || base_url.port_or_known_default() != Some(port)
            || !base_url.username().is_empty()
            || base_url.password().is_some()
            || base_url.query().is_some()
            || base_url.fragment().is_some()
        {
            return Err(Error::config(format!(
                "Invalid host `{}`: expected a bare host name or address",
                config.host
            )));
        }

        let http = config.transport.build_http_client()?;

        debug!(url = %base_url, "created InfluxDB client");

        Ok(Self {
            http,
            base_url,
            token: config.token,
            parse_mode: config.parse_mode,
        })
    }

    /// Get the server URL (scheme, host and port).
    pub fn url(&self) -> &Url {
        &self.base_url
    }

    /// Build the full URL for an API route, leaving out `None` parameters.
    fn endpoint(&self, route: &str, params: &[(&str, Option<&str>)]) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(&format!("/api/v2{}", route));

        let present: Vec<(&str, &str)> = params
            .iter()
            .filter_map(|(key, value)| value.map(|v| (*key, v)))
            .collect();
        if !present.is_empty() {
            url.query_pairs_mut().extend_pairs(present);
        }

        url
    }

    fn build_request(&self, request: ApiRequest<'_>) -> Result<reqwest::Request> {
        let url = self.endpoint(request.route, &request.params);

        let (content_type, body) = match request.body {
            RequestBody::Json(value) => ("application/json", serde_json::to_string(&value)?),
            RequestBody::Text(text) => ("text/plain; charset=utf-8", text),
        };

        let request = self
            .http
            .request(request.method, url)
            .header(AUTHORIZATION, format!("Token {}", self.token))
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .build()?;

        Ok(request)
    }

    /// Send a request and decode the response.
    ///
    /// # Errors
    ///
    /// [`Error::Http`] with the status, URL and body text for any non-2xx
    /// response; [`Error::Transport`] if no response could be read.
    pub async fn execute(&self, request: ApiRequest<'_>) -> Result<ResponseBody> {
        let kind = request.response;
        let request = self.build_request(request)?;

        debug!(
            method = %request.method(),
            url = %request.url(),
            body_len = request.body().and_then(|b| b.as_bytes()).map_or(0, <[u8]>::len),
            "sending request"
        );

        let response = self.http.execute(request).await?;
        let status = response.status();

        if !status.is_success() {
            let url = response.url().to_string();
            let body = response.text().await.unwrap_or_else(|e| {
                warn!(error = %e, "failed to read error response body");
                String::new()
            });
            warn!(status = status.as_u16(), %url, "InfluxDB request failed");
            return Err(Error::Http {
                status: status.as_u16(),
                url,
                body,
            });
        }

        match kind {
            ResponseKind::Text => Ok(ResponseBody::Text(response.text().await?)),
            ResponseKind::Binary => Ok(ResponseBody::Binary(response.bytes().await?.to_vec())),
        }
    }

    async fn query_text(&self, spec: &QuerySpec, query: &str) -> Result<String> {
        let body = serde_json::to_value(QueryPayload { query })?;
        let request = ApiRequest::new(Method::POST, "/query")
            .param("org", spec.org.as_deref())
            .param("orgID", spec.org_id.as_deref())
            .json_body(body);

        Ok(self.execute(request).await?.into_text())
    }

    /// Execute a query.
    ///
    /// Returns the raw response text when `spec.csv` is set, otherwise the
    /// parsed tables.
    pub async fn query(&self, spec: &QuerySpec, query: &str) -> Result<QueryOutput> {
        let text = self.query_text(spec, query).await?;
        if spec.csv {
            Ok(QueryOutput::Csv(text))
        } else {
            Ok(QueryOutput::Tables(parse_tables(&text, self.parse_mode)?))
        }
    }

    /// Execute a query and return the response text unmodified, ignoring `spec.csv`.
    pub async fn query_csv(&self, spec: &QuerySpec, query: &str) -> Result<String> {
        self.query_text(spec, query).await
    }

    /// Execute a query and parse the response, ignoring `spec.csv`.
    pub async fn query_tables(&self, spec: &QuerySpec, query: &str) -> Result<Vec<Table>> {
        let text = self.query_text(spec, query).await?;
        parse_tables(&text, self.parse_mode)
    }

    /// Write points to a bucket.
    ///
    /// Points are encoded as line protocol, one line per point. Returns the
    /// response body, which is empty on success.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPoint`] if a point has no fields; nothing is sent in
    /// that case.
    pub async fn write(&self, spec: &WriteSpec, points: &[Point]) -> Result<String> {
        let body = to_line_protocol(points)?;
        let precision = spec.precision.map(Precision::as_str);

        let request = ApiRequest::new(Method::POST, "/write")
            .param("org", spec.org.as_deref())
            .param("orgID", spec.org_id.as_deref())
            .param("bucket", Some(spec.bucket.as_str()))
            .param("precision", precision)
            .text_body(body);

        debug!(points = points.len(), bucket = %spec.bucket, "writing points");
        Ok(self.execute(request).await?.into_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransportOptions;

    fn client() -> Client {
        Client::new(ClientConfig::new("localhost", "my-token")).unwrap()
    }

    fn body_text(request: &reqwest::Request) -> String {
        let bytes = request.body().and_then(|b| b.as_bytes()).unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<Client>();
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        assert!(Client::new(ClientConfig::new("", "t")).is_err());
        assert!(Client::new(ClientConfig::new("h", "t").with_protocol("ftp")).is_err());
        assert!(Client::new(ClientConfig::new("h", "t").with_port(0)).is_err());
        assert!(Client::new(ClientConfig::new("h", "t").with_port(65536)).is_err());
        assert!(Client::new(ClientConfig::new("h", "")).is_err());
        assert!(Client::new(ClientConfig::new("bad host", "t")).is_err());
    }

    #[test]
    fn test_new_rejects_host_that_hides_the_port() {
        let hosts = [
            "example.com/db",
            "user@example.com",
            "user:pass@example.com",
            "example.com?x=1",
            "example.com#frag",
            "example.com:9999",
        ];
        for host in hosts {
            let result = Client::new(ClientConfig::new(host, "t").with_port(8086));
            assert!(
                matches!(result, Err(Error::Config { .. })),
                "host `{}` was accepted",
                host
            );
        }

        let client = Client::new(ClientConfig::new("example.com", "t").with_port(8086)).unwrap();
        assert_eq!(client.url().port_or_known_default(), Some(8086));
    }

    #[test]
    fn test_url_includes_non_default_port() {
        let client = Client::new(
            ClientConfig::new("influx.local", "t")
                .with_protocol("http")
                .with_port(8086),
        )
        .unwrap();
        assert_eq!(client.url().as_str(), "http://influx.local:8086/");
        assert_eq!(client.url().port_or_known_default(), Some(8086));
    }

    #[test]
    fn test_default_ports() {
        let https = client();
        assert_eq!(https.url().scheme(), "https");
        assert_eq!(https.url().port_or_known_default(), Some(443));

        let http = Client::new(ClientConfig::new("localhost", "t").with_protocol("http")).unwrap();
        assert_eq!(http.url().port_or_known_default(), Some(80));
    }

    #[test]
    fn test_query_request_shape() {
        let client = client();
        let body = serde_json::to_value(QueryPayload { query: "buckets()" }).unwrap();
        let request = ApiRequest::new(Method::POST, "/query")
            .param("org", Some("my org"))
            .param("orgID", None)
            .json_body(body);
        let request = client.build_request(request).unwrap();

        assert_eq!(request.method(), &Method::POST);
        assert_eq!(
            request.url().as_str(),
            "https://localhost/api/v2/query?org=my+org"
        );
        assert_eq!(request.headers()[AUTHORIZATION], "Token my-token");
        assert_eq!(request.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(body_text(&request), r#"{"query":"buckets()"}"#);
    }

    #[test]
    fn test_write_request_shape() {
        let client = client();
        let request = ApiRequest::new(Method::POST, "/write")
            .param("org", Some("a"))
            .param("orgID", None)
            .param("bucket", Some("b"))
            .param("precision", Some("ms"))
            .text_body("m f=1");
        let request = client.build_request(request).unwrap();

        assert_eq!(
            request.url().as_str(),
            "https://localhost/api/v2/write?org=a&bucket=b&precision=ms"
        );
        assert_eq!(
            request.headers()[CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(body_text(&request), "m f=1");
    }

    #[test]
    fn test_no_params_no_query_string() {
        let request = client()
            .build_request(ApiRequest::new(Method::GET, "/buckets").param("org", None))
            .unwrap();
        assert_eq!(request.url().as_str(), "https://localhost/api/v2/buckets");
        assert_eq!(request.url().query(), None);
    }

    #[test]
    fn test_params_are_encoded() {
        let request = client()
            .build_request(ApiRequest::new(Method::POST, "/write").param("bucket", Some("a&b=c")))
            .unwrap();
        assert_eq!(request.url().query(), Some("bucket=a%26b%3Dc"));
    }

    #[test]
    fn test_extra_headers_are_applied_by_client() {
        let config = ClientConfig::new("localhost", "t")
            .with_transport(TransportOptions::default().with_header("X-Request-Source", "tests"));
        assert!(Client::new(config).is_ok());

        let config = ClientConfig::new("localhost", "t")
            .with_transport(TransportOptions::default().with_header("Authorization", "Token x"));
        assert!(matches!(Client::new(config), Err(Error::Config { .. })));
    }

    #[test]
    fn test_query_output_accessors() {
        assert_eq!(QueryOutput::Csv("x".into()).into_csv(), Some("x".to_string()));
        assert_eq!(QueryOutput::Csv("x".into()).into_tables(), None);
        assert_eq!(QueryOutput::Tables(vec![]).into_tables(), Some(vec![]));
    }

    #[test]
    fn test_response_body_conversions() {
        assert_eq!(ResponseBody::Binary(b"abc".to_vec()).into_text(), "abc");
        assert_eq!(ResponseBody::Text("abc".into()).into_bytes(), b"abc".to_vec());
    }

    #[test]
    fn test_spec_builders() {
        let spec = WriteSpec::new("b").org("o").precision(Precision::Seconds);
        assert_eq!(spec.bucket, "b");
        assert_eq!(spec.org.as_deref(), Some("o"));
        assert_eq!(spec.precision.map(Precision::as_str), Some("s"));

        let spec = QuerySpec::new().org_id("0123").csv(true);
        assert_eq!(spec.org_id.as_deref(), Some("0123"));
        assert!(spec.csv);
    }

    #[test]
    fn test_debug_hides_token() {
        assert!(!format!("{:?}", client()).contains("my-token"));
    }
}
