//! Client configuration.
//!
//! [`ClientConfig`] can be built in code, deserialized from an application
//! config file, or loaded from `INFLUXDB_*` environment variables. It is only
//! validated when handed to [`Client::new`](crate::Client::new).

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::parser::ParseMode;

/// URL scheme used to reach the server.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    #[default]
    Https,
}

impl Protocol {
    /// Port used when none is configured.
    pub fn default_port(self) -> u16 {
        match self {
            Protocol::Http => 80,
            Protocol::Https => 443,
        }
    }

    /// URL scheme string.
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        match input {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            _ => Err(Error::config(format!(
                "`protocol` should be `http` or `https`, got `{}`",
                input
            ))),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Connection settings for a [`Client`](crate::Client).
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server host name or address, without scheme or port.
    pub host: String,

    /// `http` or `https`. Defaults to `https`.
    #[serde(default)]
    pub protocol: Option<String>,

    /// Server port, 1-65535. Defaults to 443 for https and 80 for http.
    #[serde(default)]
    pub port: Option<u32>,

    /// API token sent as `Authorization: Token <token>`.
    pub token: String,

    /// HTTP transport settings.
    #[serde(default)]
    pub transport: TransportOptions,

    /// How query responses with malformed values are handled.
    #[serde(default)]
    pub parse_mode: ParseMode,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host", &self.host)
            .field("protocol", &self.protocol)
            .field("port", &self.port)
            .field("token", &"<redacted>")
            .field("transport", &self.transport)
            .field("parse_mode", &self.parse_mode)
            .finish()
    }
}

impl ClientConfig {
    /// Config for `host` authenticated with `token`; everything else defaulted.
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            token: token.into(),
            ..Default::default()
        }
    }

    /// Set the protocol (`http` or `https`).
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    /// Set the server port.
    pub fn with_port(mut self, port: u32) -> Self {
        self.port = Some(port);
        self
    }

    /// Replace the transport settings.
    pub fn with_transport(mut self, transport: TransportOptions) -> Self {
        self.transport = transport;
        self
    }

    /// Set how malformed query values are handled.
    pub fn with_parse_mode(mut self, parse_mode: ParseMode) -> Self {
        self.parse_mode = parse_mode;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Reads `INFLUXDB_HOST`, `INFLUXDB_PROTOCOL`, `INFLUXDB_PORT`,
    /// `INFLUXDB_TOKEN` and `INFLUXDB_TIMEOUT_MS`. Missing host or token are
    /// left empty and rejected later by [`Client::new`](crate::Client::new).
    pub fn from_env() -> Result<Self> {
        let mut config = Self {
            host: env::var("INFLUXDB_HOST").unwrap_or_default(),
            token: env::var("INFLUXDB_TOKEN").unwrap_or_default(),
            ..Default::default()
        };

        if let Ok(protocol) = env::var("INFLUXDB_PROTOCOL") {
            config.protocol = Some(protocol);
        }

        if let Ok(port) = env::var("INFLUXDB_PORT") {
            let port = port
                .parse()
                .map_err(|e| Error::config(format!("Invalid INFLUXDB_PORT `{}`: {}", port, e)))?;
            config.port = Some(port);
        }

        if let Ok(timeout) = env::var("INFLUXDB_TIMEOUT_MS") {
            let timeout = timeout.parse().map_err(|e| {
                Error::config(format!("Invalid INFLUXDB_TIMEOUT_MS `{}`: {}", timeout, e))
            })?;
            config.transport.timeout_ms = Some(timeout);
        }

        Ok(config)
    }

    /// Check every setting and apply protocol and port defaults.
    pub(crate) fn resolve(&self) -> Result<(Protocol, u16)> {
        if self.host.is_empty() {
            return Err(Error::config("`host` is required"));
        }

        let protocol = match self.protocol.as_deref() {
            Some(p) => p.parse()?,
            None => Protocol::default(),
        };

        let port = match self.port {
            Some(p) if (1..=65535).contains(&p) => p as u16,
            Some(p) => {
                return Err(Error::config(format!(
                    "`port` should be between 1 and 65535, got {}",
                    p
                )));
            }
            None => protocol.default_port(),
        };

        if self.token.is_empty() {
            return Err(Error::config("`token` is required"));
        }

        Ok((protocol, port))
    }
}

/// Settings applied to the underlying HTTP client.
///
/// Extra headers are sent with every request but may not replace
/// `Authorization` or `Content-Type`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TransportOptions {
    /// Total request timeout in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Connection timeout in milliseconds.
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,

    /// Extra headers added to every request.
    #[serde(default)]
    pub headers: Vec<(String, String)>,

    /// Proxy URL for all requests.
    #[serde(default)]
    pub proxy: Option<String>,

    /// Skip TLS certificate verification.
    #[serde(default)]
    pub accept_invalid_certs: bool,

    /// Custom `User-Agent`.
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl TransportOptions {
    /// Set the total request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Add a header sent with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Route all requests through `proxy`.
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::config(format!("Invalid header name `{}`: {}", name, e)))?;
            if name == AUTHORIZATION || name == CONTENT_TYPE {
                return Err(Error::config(format!(
                    "header `{}` is managed by the client and cannot be overridden",
                    name
                )));
            }
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::config(format!("Invalid value for header `{}`: {}", name, e)))?;
            headers.append(name, value);
        }
        Ok(headers)
    }

    /// Build the pooled HTTP client these options describe.
    pub(crate) fn build_http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder().default_headers(self.default_headers()?);

        if let Some(ms) = self.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = self.connect_timeout_ms {
            builder = builder.connect_timeout(Duration::from_millis(ms));
        }
        if let Some(proxy) = &self.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| Error::config(format!("Invalid proxy `{}`: {}", proxy, e)))?;
            builder = builder.proxy(proxy);
        }
        if self.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }

        builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))
    }
}
