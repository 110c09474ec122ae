// HTTP transport
//
// One endpoint, one TLS setting, one `reqwest::Client`. Every call takes
// a `RequestSpec` (path, query, payload, headers, response format) and
// returns a `Reply` carrying the status, any `Set-Cookie` values, and the
// body either raw or parsed as JSON.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Method;
use reqwest::header::SET_COOKIE;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::headers::HeaderSet;

/// TLS verification mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsMode {
    /// Verify the peer against the system certificate store.
    #[default]
    System,
    /// Verify the peer against a custom CA certificate (PEM file).
    CustomCa(PathBuf),
    /// Accept any certificate (self-signed Security Center installs).
    DangerAcceptInvalid,
}

impl TlsMode {
    /// Map the classic `ssl_verify_peer` flag onto a mode.
    pub fn from_verify_peer(verify: bool) -> Self {
        if verify {
            Self::System
        } else {
            Self::DangerAcceptInvalid
        }
    }

    pub fn verifies_peer(&self) -> bool {
        !matches!(self, Self::DangerAcceptInvalid)
    }

    /// Configure certificate handling on a client builder.
    fn configure(
        &self,
        builder: reqwest::ClientBuilder,
    ) -> Result<reqwest::ClientBuilder, Error> {
        Ok(match self {
            Self::System => builder,
            Self::CustomCa(path) => builder.add_root_certificate(read_ca(path)?),
            Self::DangerAcceptInvalid => builder.danger_accept_invalid_certs(true),
        })
    }
}

fn read_ca(path: &Path) -> Result<reqwest::Certificate, Error> {
    let pem = std::fs::read(path)
        .map_err(|e| Error::Tls(format!("cannot read CA file {}: {e}", path.display())))?;
    reqwest::Certificate::from_pem(&pem)
        .map_err(|e| Error::Tls(format!("{} is not a PEM certificate: {e}", path.display())))
}

/// Transport tuning used to build the underlying `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Per-request timeout. `None` keeps reqwest's default (no timeout).
    pub timeout: Option<Duration>,
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    ///
    /// Idle connections are not pooled: each exchange opens a fresh
    /// connection to the endpoint.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder().pool_max_idle_per_host(0);

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        self.tls
            .configure(builder)?
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

/// How the response body should be handed back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Body returned as received.
    #[default]
    Raw,
    /// Body parsed as JSON, falling back to raw text if it does not parse.
    Json,
}

/// A single request against the configured endpoint.
#[derive(Debug, Clone, Default)]
pub struct RequestSpec<'a> {
    pub path: String,
    pub query: Option<String>,
    pub payload: Option<Value>,
    pub headers: Option<&'a HeaderSet>,
    pub format: ResponseFormat,
}

impl<'a> RequestSpec<'a> {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn headers(mut self, headers: &'a HeaderSet) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn json(mut self) -> Self {
        self.format = ResponseFormat::Json;
        self
    }
}

/// Response body, raw or parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Raw(String),
    Json(Value),
}

impl Body {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(v) => Some(v),
            Self::Raw(_) => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            Self::Json(v) => Some(v),
            Self::Raw(_) => None,
        }
    }

    /// Body as text (JSON is re-serialized).
    pub fn text(&self) -> String {
        match self {
            Self::Raw(s) => s.clone(),
            Self::Json(v) => v.to_string(),
        }
    }
}

/// Outcome of one HTTP exchange.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: reqwest::StatusCode,
    /// Raw `Set-Cookie` header values, in the order received.
    pub cookies: Vec<String>,
    pub body: Body,
}

impl Reply {
    pub fn is_ok(&self) -> bool {
        self.status == reqwest::StatusCode::OK
    }
}

/// HTTP transport bound to one Security Center endpoint.
pub struct Transport {
    http: reqwest::Client,
    base_url: Url,
    tls: TlsMode,
}

impl Transport {
    /// Validate `uri` and build the HTTP client.
    ///
    /// The URI must carry a scheme and be usable as a base for request
    /// paths; anything else fails with [`Error::InvalidEndpoint`].
    pub fn new(uri: &str, config: &TransportConfig) -> Result<Self, Error> {
        let base_url = parse_endpoint(uri)?;
        let http = config.build_client()?;
        Ok(Self {
            http,
            base_url,
            tls: config.tls.clone(),
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages TLS and timeouts).
    pub fn with_client(uri: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: parse_endpoint(uri)?,
            tls: TlsMode::System,
        })
    }

    /// The normalized endpoint URI.
    pub fn url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn verifies_peer(&self) -> bool {
        self.tls.verifies_peer()
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub async fn get(&self, spec: RequestSpec<'_>) -> Result<Reply, Error> {
        self.request(Method::GET, spec).await
    }

    pub async fn post(&self, spec: RequestSpec<'_>) -> Result<Reply, Error> {
        self.request(Method::POST, spec).await
    }

    pub async fn put(&self, spec: RequestSpec<'_>) -> Result<Reply, Error> {
        self.request(Method::PUT, spec).await
    }

    pub async fn delete(&self, spec: RequestSpec<'_>) -> Result<Reply, Error> {
        self.request(Method::DELETE, spec).await
    }

    /// Perform one exchange.
    pub async fn request(&self, method: Method, spec: RequestSpec<'_>) -> Result<Reply, Error> {
        let mut url = self.url_for(&spec.path)?;
        if let Some(query) = spec.query.as_deref() {
            url.set_query(Some(query));
        }

        let body = match &spec.payload {
            Some(payload) => serde_json::to_vec(payload)?,
            None => Vec::new(),
        };
        let headers = match spec.headers {
            Some(set) => set.to_header_map()?,
            None => reqwest::header::HeaderMap::new(),
        };

        debug!("{method} {url}");

        let resp = self
            .http
            .request(method, url)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        let cookies = resp
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(String::from)
            .collect();
        let text = resp.text().await?;
        trace!(%status, bytes = text.len(), "response received");

        let body = match spec.format {
            ResponseFormat::Raw => Body::Raw(text),
            ResponseFormat::Json => parse_json_body(text),
        };

        Ok(Reply {
            status,
            cookies,
            body,
        })
    }

    fn url_for(&self, path: &str) -> Result<Url, Error> {
        self.base_url.join(path).map_err(|_| Error::InvalidEndpoint {
            uri: format!("{}{path}", self.base_url),
        })
    }
}

fn parse_endpoint(uri: &str) -> Result<Url, Error> {
    let invalid = || Error::InvalidEndpoint {
        uri: uri.to_owned(),
    };
    let url = Url::parse(uri).map_err(|_| invalid())?;
    if url.scheme().is_empty() || url.cannot_be_a_base() {
        return Err(invalid());
    }
    Ok(url)
}

/// An empty body reads as JSON `null`; anything unparsable stays raw.
fn parse_json_body(text: String) -> Body {
    if text.trim().is_empty() {
        return Body::Json(Value::Null);
    }
    match serde_json::from_str(&text) {
        Ok(value) => Body::Json(value),
        Err(e) => {
            trace!("response is not JSON ({e}), returning raw body");
            Body::Raw(text)
        }
    }
}
