// Resource query helpers
//
// Thin path/payload builders over `Requester`. Security Center wraps
// every answer as `{"type": ..., "response": ..., "error_code": ...}`;
// the helpers hand back the `response` member.

pub mod asset;
pub mod query;
pub mod scan;
pub mod server;

pub use asset::Assets;
pub use query::{Queries, SourceType};
pub use scan::Scans;
pub use server::Server;

use reqwest::Method;
use serde_json::Value;

use crate::error::Error;
use crate::requester::Requester;
use crate::transport::{Body, RequestSpec};

/// Send `spec` with the requester's live headers and return the parsed
/// JSON document.
pub(crate) async fn fetch_json<R: Requester + ?Sized>(
    requester: &R,
    method: Method,
    spec: RequestSpec<'_>,
) -> Result<Value, Error> {
    let path = spec.path.clone();
    let reply = requester
        .request(method, spec.headers(requester.headers()).json())
        .await?;
    match reply.body {
        Body::Json(value) => Ok(value),
        Body::Raw(body) => Err(Error::UnexpectedBody { path, body }),
    }
}

/// Like [`fetch_json`], keeping only the `response` member (`null` when
/// absent).
pub(crate) async fn fetch_response<R: Requester + ?Sized>(
    requester: &R,
    method: Method,
    spec: RequestSpec<'_>,
) -> Result<Value, Error> {
    let mut doc = fetch_json(requester, method, spec).await?;
    Ok(doc
        .get_mut("response")
        .map(Value::take)
        .unwrap_or_default())
}

/// Security Center encodes most counters and ids as strings.
pub(crate) fn loose_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

pub(crate) fn loose_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
