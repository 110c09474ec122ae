// Request capability consumed by the resource layer
//
// Resource helpers only need to issue requests and read the live header
// set; they depend on this trait instead of on the concrete client.

use std::future::Future;

use reqwest::Method;

use crate::error::Error;
use crate::headers::HeaderSet;
use crate::transport::{Reply, RequestSpec};

/// Something that can issue HTTP requests against Security Center and
/// exposes the header set describing the current session.
pub trait Requester {
    /// Headers reflecting the live session state.
    fn headers(&self) -> &HeaderSet;

    /// Perform one exchange.
    fn request(
        &self,
        method: Method,
        spec: RequestSpec<'_>,
    ) -> impl Future<Output = Result<Reply, Error>> + Send;

    fn get(&self, spec: RequestSpec<'_>) -> impl Future<Output = Result<Reply, Error>> + Send {
        self.request(Method::GET, spec)
    }

    fn post(&self, spec: RequestSpec<'_>) -> impl Future<Output = Result<Reply, Error>> + Send {
        self.request(Method::POST, spec)
    }

    fn put(&self, spec: RequestSpec<'_>) -> impl Future<Output = Result<Reply, Error>> + Send {
        self.request(Method::PUT, spec)
    }

    fn delete(&self, spec: RequestSpec<'_>) -> impl Future<Output = Result<Reply, Error>> + Send {
        self.request(Method::DELETE, spec)
    }
}
