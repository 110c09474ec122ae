// Host asset lookups and per-asset vulnerability analysis.

use reqwest::Method;
use serde_json::{Value, json};
use tracing::debug;
use url::form_urlencoded;

use super::query::SourceType;
use super::{fetch_response, loose_string, loose_u64};
use crate::error::Error;
use crate::requester::Requester;
use crate::transport::RequestSpec;

const SEARCH_PATH: &str = "/rest/search/hostAsset";
const DETAILS_PATH: &str = "/rest/search/hostAsset/details";
const ANALYSIS_PATH: &str = "/rest/analysis";

pub const DEFAULT_SEARCH_LIMIT: u32 = 20;
pub const DEFAULT_VULN_LIMIT: u64 = 10;

/// Asset endpoints.
pub struct Assets<'a, R: ?Sized> {
    requester: &'a R,
}

impl<'a, R: Requester + ?Sized> Assets<'a, R> {
    pub fn new(requester: &'a R) -> Self {
        Self { requester }
    }

    /// Search host assets by IP address.
    ///
    /// `GET /rest/search/hostAsset?type=ipAddress&query={ip}&limit={limit}`
    ///
    /// Returns the `response` object (`count` + `results`).
    pub async fn search_by_ip(&self, ip: &str, limit: u32) -> Result<Value, Error> {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("type", "ipAddress")
            .append_pair("query", ip)
            .append_pair("limit", &limit.to_string())
            .finish();
        debug!(ip, limit, "searching host assets");
        fetch_response(
            self.requester,
            Method::GET,
            RequestSpec::new(SEARCH_PATH).query(query),
        )
        .await
    }

    /// Asset details by host UUID.
    ///
    /// `GET /rest/search/hostAsset/details?hostUUID={uuid}&saveHistory=true`
    pub async fn info_by_uuid(&self, uuid: &str) -> Result<Value, Error> {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("hostUUID", uuid)
            .append_pair("saveHistory", "true")
            .finish();
        debug!(uuid, "fetching asset details");
        fetch_response(
            self.requester,
            Method::GET,
            RequestSpec::new(DETAILS_PATH).query(query),
        )
        .await
    }

    /// Asset details by IP address.
    ///
    /// Searches first; when the search is empty its (empty) result is
    /// returned as is. Otherwise the details of the first result whose
    /// `ipAddress` contains `ip` are returned. If no result matches, the
    /// search's `results` array comes back instead.
    pub async fn info_by_ip(&self, ip: &str) -> Result<Value, Error> {
        let mut found = self.search_by_ip(ip, DEFAULT_SEARCH_LIMIT).await?;
        let count = found.get("count").and_then(loose_u64).unwrap_or(0);
        if count == 0 {
            return Ok(found);
        }

        let uuid = found
            .get("results")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .find(|host| {
                host.get("ipAddress")
                    .and_then(Value::as_str)
                    .is_some_and(|addr| addr.contains(ip))
            })
            .and_then(|host| host.get("uuid"))
            .and_then(loose_string);

        match uuid {
            Some(uuid) => self.info_by_uuid(&uuid).await,
            None => {
                debug!(ip, "no search result matches, returning results");
                Ok(found.get_mut("results").map(Value::take).unwrap_or_default())
            }
        }
    }

    /// Vulnerability details for one IP address.
    ///
    /// `POST /rest/analysis` with a `vulndetails` query filtered on `ip`.
    /// `offset` and `limit` are passed through as the start offset and the
    /// window size.
    pub async fn vulns_by_ip(
        &self,
        ip: &str,
        offset: u64,
        limit: u64,
        source: SourceType,
    ) -> Result<Value, Error> {
        let source = source.as_str();
        let payload = json!({
            "query": {
                "tool": "vulndetails",
                "type": "vuln",
                "filters": [
                    { "filterName": "ip", "operator": "=", "value": ip }
                ],
                "sourceType": source,
                "startOffset": offset,
                "endOffset": offset.saturating_add(limit),
            },
            "type": "vuln",
            "sourceType": source,
        });
        debug!(ip, offset, limit, source, "fetching vulnerabilities by asset");
        fetch_response(
            self.requester,
            Method::POST,
            RequestSpec::new(ANALYSIS_PATH).payload(payload),
        )
        .await
    }
}
