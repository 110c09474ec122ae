//! Connection settings for `tenablesc-api` clients.
//!
//! Settings are layered with figment: built-in defaults, then an optional
//! TOML file, then `TENABLESC_*` environment variables. The result is
//! validated and turned into a [`tenablesc_api::ClientConfig`] with the
//! password and secret key wrapped as secrets.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use tenablesc_api::{ClientConfig, DEFAULT_URI, LogoutPolicy, TlsMode};

/// Prefix for environment overrides (`TENABLESC_URI`, `TENABLESC_ACCESS_KEY`, ...).
pub const ENV_PREFIX: &str = "TENABLESC_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Settings ────────────────────────────────────────────────────────

/// Flat connection settings, as read from TOML / environment.
#[derive(Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Security Center base URI.
    #[serde(default = "default_uri")]
    pub uri: String,

    /// Verify the server certificate.
    #[serde(default = "default_verify")]
    pub ssl_verify_peer: bool,

    /// PEM file with a custom CA; implies peer verification.
    pub ca_cert: Option<PathBuf>,

    pub username: Option<String>,
    pub password: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,

    /// Request timeout in seconds. Unset keeps the HTTP client default.
    pub timeout: Option<u64>,

    /// Also drop credential headers on logout.
    #[serde(default)]
    pub scrub_headers_on_logout: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            ssl_verify_peer: default_verify(),
            ca_cert: None,
            username: None,
            password: None,
            access_key: None,
            secret_key: None,
            timeout: None,
            scrub_headers_on_logout: false,
        }
    }
}

fn default_uri() -> String {
    DEFAULT_URI.into()
}
fn default_verify() -> bool {
    true
}

fn redact(value: Option<&String>) -> Option<&'static str> {
    value.map(|_| "[REDACTED]")
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("uri", &self.uri)
            .field("ssl_verify_peer", &self.ssl_verify_peer)
            .field("ca_cert", &self.ca_cert)
            .field("username", &self.username)
            .field("password", &redact(self.password.as_ref()))
            .field("access_key", &self.access_key)
            .field("secret_key", &redact(self.secret_key.as_ref()))
            .field("timeout", &self.timeout)
            .field("scrub_headers_on_logout", &self.scrub_headers_on_logout)
            .finish()
    }
}

impl Settings {
    /// Check the values that can be checked without talking to a server.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let has_scheme = Url::parse(&self.uri).is_ok_and(|u| !u.cannot_be_a_base());
        if !has_scheme {
            return Err(ConfigError::Validation {
                field: "uri".into(),
                reason: format!("{:?} is not an absolute URI with a scheme", self.uri),
            });
        }
        if self.timeout == Some(0) {
            return Err(ConfigError::Validation {
                field: "timeout".into(),
                reason: "must be at least one second".into(),
            });
        }
        if self.ca_cert.is_some() && !self.ssl_verify_peer {
            return Err(ConfigError::Validation {
                field: "ca_cert".into(),
                reason: "a custom CA requires ssl_verify_peer = true".into(),
            });
        }
        Ok(())
    }

    fn tls(&self) -> TlsMode {
        match &self.ca_cert {
            Some(path) => TlsMode::CustomCa(path.clone()),
            None => TlsMode::from_verify_peer(self.ssl_verify_peer),
        }
    }

    /// Validate and convert into a client config.
    pub fn into_client_config(self) -> Result<ClientConfig, ConfigError> {
        self.validate()?;
        let tls = self.tls();
        Ok(ClientConfig {
            uri: self.uri,
            tls,
            timeout: self.timeout.map(Duration::from_secs),
            username: self.username,
            password: self.password.map(SecretString::from),
            access_key: self.access_key,
            secret_key: self.secret_key.map(SecretString::from),
            logout_policy: if self.scrub_headers_on_logout {
                LogoutPolicy::ScrubHeaders
            } else {
                LogoutPolicy::KeepHeaders
            },
        })
    }
}

// ── Loading ─────────────────────────────────────────────────────────

/// The figment used by [`load_settings`]: defaults, optional TOML file,
/// then environment.
pub fn build_figment(path: Option<&Path>) -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(Settings::default()));
    if let Some(path) = path {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(Env::prefixed(ENV_PREFIX))
}

/// Load settings from defaults, the optional TOML file, and the environment.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let settings: Settings = build_figment(path).extract()?;
    Ok(settings)
}

/// Load, validate, and convert in one step.
pub fn load_client_config(path: Option<&Path>) -> Result<ClientConfig, ConfigError> {
    load_settings(path)?.into_client_config()
}
