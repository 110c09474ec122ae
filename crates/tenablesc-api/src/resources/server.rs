// Server and scanner status.

use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use super::fetch_json;
use crate::error::Error;
use crate::requester::Requester;
use crate::session::STATUS_PATH;
use crate::transport::RequestSpec;

/// Status endpoints.
pub struct Server<'a, R: ?Sized> {
    requester: &'a R,
}

impl<'a, R: Requester + ?Sized> Server<'a, R> {
    pub fn new(requester: &'a R) -> Self {
        Self { requester }
    }

    /// Full status document.
    ///
    /// `GET /rest/status` -- unlike the other helpers this returns the
    /// whole envelope, not just `response`.
    pub async fn status(&self) -> Result<Value, Error> {
        debug!("fetching server status");
        fetch_json(self.requester, Method::GET, RequestSpec::new(STATUS_PATH)).await
    }

    /// Scan zone status (`response.zones` of the status document).
    pub async fn scanner_status(&self) -> Result<Value, Error> {
        let mut status = self.status().await?;
        Ok(status
            .pointer_mut("/response/zones")
            .map(Value::take)
            .unwrap_or_default())
    }
}
