// Request header state
//
// The header set is created once per client with the library defaults and
// then mutated only by the session flows (login installs credential
// headers, validation failure removes them). Every request reads it.

use std::collections::HashMap;
use std::fmt;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::Error;

pub const USER_AGENT: &str = "User-Agent";
pub const CONTENT_TYPE: &str = "Content-Type";
/// Session cookie installed by credential login.
pub const COOKIE: &str = "Cookie";
/// Numeric token installed by credential login.
pub const SECURITY_TOKEN: &str = "X-Securitycenter";
/// Composite access/secret key header installed by key login.
pub const API_KEY: &str = "x-apikey";

/// Every header that carries credential material.
pub const CREDENTIAL_HEADERS: [&str; 3] = [API_KEY, COOKIE, SECURITY_TOKEN];

/// Library identifier sent as `User-Agent`.
pub const DEFAULT_USER_AGENT: &str = "TenablescClient::Request - rubygems.org tenablesc_client";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A single header value.
///
/// Everything is text except an `X-Securitycenter` token the server
/// issued as a JSON number, which stays numeric here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderField {
    Text(String),
    Number(u64),
}

impl HeaderField {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<String> for HeaderField {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for HeaderField {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<u64> for HeaderField {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

impl PartialEq<&str> for HeaderField {
    fn eq(&self, other: &&str) -> bool {
        self.as_text() == Some(*other)
    }
}

impl PartialEq<u64> for HeaderField {
    fn eq(&self, other: &u64) -> bool {
        self.as_number() == Some(*other)
    }
}

/// Case-sensitive map from header name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: HashMap<String, HeaderField>,
}

impl HeaderSet {
    /// An empty set (no defaults).
    pub fn new() -> Self {
        Self::default()
    }

    /// The set every client starts with: `User-Agent` and `Content-Type`.
    pub fn with_defaults() -> Self {
        let mut set = Self::new();
        set.insert(USER_AGENT, DEFAULT_USER_AGENT);
        set.insert(CONTENT_TYPE, JSON_CONTENT_TYPE);
        set
    }

    pub fn get(&self, name: &str) -> Option<&HeaderField> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderField)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<HeaderField>) {
        self.entries.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<HeaderField> {
        self.entries.remove(name)
    }

    /// A copy of this set with the named headers left out.
    pub fn without(&self, names: &[&str]) -> Self {
        let entries = self
            .entries
            .iter()
            .filter(|(k, _)| !names.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self { entries }
    }

    /// Drop every credential header (cookie, token, api key).
    pub(crate) fn clear_credentials(&mut self) {
        for name in CREDENTIAL_HEADERS {
            self.entries.remove(name);
        }
    }

    /// Convert into a `reqwest` header map for the wire.
    ///
    /// Credential headers are marked sensitive so they never show up in
    /// `Debug` output of the request.
    pub fn to_header_map(&self) -> Result<HeaderMap, Error> {
        let mut map = HeaderMap::with_capacity(self.entries.len());
        for (name, field) in &self.entries {
            let invalid = || Error::InvalidHeader { name: name.clone() };
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
            let mut value = HeaderValue::from_str(&field.to_string()).map_err(|_| invalid())?;
            if CREDENTIAL_HEADERS.contains(&name.as_str()) {
                value.set_sensitive(true);
            }
            map.insert(header_name, value);
        }
        Ok(map)
    }
}
