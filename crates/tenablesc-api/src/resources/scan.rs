use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use super::fetch_response;
use crate::error::Error;
use crate::requester::Requester;
use crate::transport::RequestSpec;

const SCAN_RESULT_PATH: &str = "/rest/scanResult";

/// Scan result endpoints.
pub struct Scans<'a, R: ?Sized> {
    requester: &'a R,
}

impl<'a, R: Requester + ?Sized> Scans<'a, R> {
    pub fn new(requester: &'a R) -> Self {
        Self { requester }
    }

    /// List scan results.
    ///
    /// `GET /rest/scanResult`
    pub async fn list(&self) -> Result<Value, Error> {
        debug!("listing scan results");
        fetch_response(
            self.requester,
            Method::GET,
            RequestSpec::new(SCAN_RESULT_PATH),
        )
        .await
    }
}
