use thiserror::Error;

/// Top-level error type for the `tenablesc-api` crate.
///
/// Configuration and authentication failures are terminal; only
/// [`Transport`](Self::Transport) errors caused by connection problems or
/// timeouts are worth retrying (see [`Error::is_transient`]).
#[derive(Debug, Error)]
pub enum Error {
    // ── Configuration ───────────────────────────────────────────────
    /// Base URI could not be parsed or has no scheme.
    #[error("Invalid endpoint URI: {uri:?}")]
    InvalidEndpoint { uri: String },

    /// A header value contains bytes that cannot be sent over HTTP.
    #[error("Invalid value for header {name}")]
    InvalidHeader { name: String },

    /// TLS setup or HTTP client construction failed.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Session ─────────────────────────────────────────────────────
    /// A login was attempted while a session is already established.
    #[error("Session already established")]
    SessionAlreadyEstablished,

    /// The login endpoint answered with a non-success status.
    #[error("Unable to authenticate (HTTP {status}): {body}")]
    AuthenticationFailed { status: u16, body: String },

    /// The server-issued `X-Securitycenter` token is not a 10-digit number.
    #[error("Security Center token does not match the expected pattern: {token:?}")]
    TokenFormatInvalid { token: String },

    /// An operation that needs a session was called without one.
    #[error("There is no session established")]
    NoActiveSession,

    /// The status probe rejected a previously established session.
    #[error("Established session is not valid (HTTP {status}): {body}")]
    SessionInvalidated { status: u16, body: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, TLS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Request payload could not be encoded as JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // ── Resources ───────────────────────────────────────────────────
    /// A resource call expected a JSON document but got something else.
    #[error("Expected a JSON response from {path}, got: {body}")]
    UnexpectedBody { path: String, body: String },

    /// No usable query carries the requested name.
    #[error("No query named {name:?}")]
    QueryNotFound { name: String },
}

impl Error {
    /// Returns `true` if this error came out of the login/validation flow.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed { .. }
                | Self::TokenFormatInvalid { .. }
                | Self::SessionInvalidated { .. }
                | Self::NoActiveSession
        )
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}
