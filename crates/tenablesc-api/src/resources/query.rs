// Saved queries and query-driven vulnerability analysis.

use std::fmt;

use reqwest::Method;
use serde_json::{Value, json};
use tracing::debug;
use url::form_urlencoded;

use super::{fetch_response, loose_string};
use crate::error::Error;
use crate::requester::Requester;
use crate::transport::RequestSpec;

const QUERY_PATH: &str = "/rest/query";
const ANALYSIS_PATH: &str = "/rest/analysis";

pub const DEFAULT_START_OFFSET: u64 = 0;
pub const DEFAULT_END_OFFSET: u64 = 50;

/// Vulnerability data source for analysis requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SourceType {
    /// Current vulnerabilities.
    #[default]
    Cumulative,
    /// Mitigated vulnerabilities.
    Patched,
}

impl SourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cumulative => "cumulative",
            Self::Patched => "patched",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query endpoints.
pub struct Queries<'a, R: ?Sized> {
    requester: &'a R,
}

impl<'a, R: Requester + ?Sized> Queries<'a, R> {
    pub fn new(requester: &'a R) -> Self {
        Self { requester }
    }

    /// List queries.
    ///
    /// `GET /rest/query` -- the `response` object holds `usable` and
    /// `manageable` arrays.
    pub async fn list(&self) -> Result<Value, Error> {
        debug!("listing queries");
        fetch_response(self.requester, Method::GET, RequestSpec::new(QUERY_PATH)).await
    }

    /// Id of the first usable query called `name`.
    pub async fn id_by_name(&self, name: &str) -> Result<Option<String>, Error> {
        let queries = self.list().await?;
        Ok(queries
            .get("usable")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .find(|q| q.get("name").and_then(Value::as_str) == Some(name))
            .and_then(|q| q.get("id"))
            .and_then(loose_string))
    }

    /// Query definition.
    ///
    /// `GET /rest/query/{id}`
    pub async fn info(&self, id: &str) -> Result<Value, Error> {
        let encoded: String = form_urlencoded::byte_serialize(id.as_bytes()).collect();
        debug!(id, "fetching query");
        fetch_response(
            self.requester,
            Method::GET,
            RequestSpec::new(format!("{QUERY_PATH}/{encoded}")),
        )
        .await
    }

    /// Run the saved query called `name` through the analysis endpoint.
    ///
    /// Looks the query up by name, copies its `name`, `tool`, `type`, and
    /// `filters`, and posts them to `/rest/analysis` with the requested
    /// offset window and source type.
    pub async fn vulns_by_name(
        &self,
        name: &str,
        start_offset: u64,
        end_offset: u64,
        source: SourceType,
    ) -> Result<Value, Error> {
        let id = self
            .id_by_name(name)
            .await?
            .ok_or_else(|| Error::QueryNotFound { name: name.into() })?;
        let info = self.info(&id).await?;

        let field = |key: &str| info.get(key).cloned().unwrap_or(Value::Null);
        let payload = json!({
            "query": {
                "name": field("name"),
                "tool": field("tool"),
                "type": field("type"),
                "filters": field("filters"),
                "sourceType": source.as_str(),
                "startOffset": start_offset,
                "endOffset": end_offset,
            },
            "type": field("type"),
            "sourceType": source.as_str(),
        });

        debug!(name, id = %id, start_offset, end_offset, %source, "running query analysis");
        fetch_response(
            self.requester,
            Method::POST,
            RequestSpec::new(ANALYSIS_PATH).payload(payload),
        )
        .await
    }
}
