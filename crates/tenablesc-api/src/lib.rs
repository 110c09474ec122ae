// tenablesc-api: Async Rust client for the Tenable Security Center REST API

pub mod client;
pub mod error;
pub mod headers;
pub mod requester;
pub mod resources;
pub mod session;
pub mod transport;

pub use client::{ClientConfig, DEFAULT_URI, TenablescClient};
pub use error::Error;
pub use headers::{HeaderField, HeaderSet};
pub use requester::Requester;
pub use resources::{Assets, Queries, Scans, Server, SourceType};
pub use session::{LogoutPolicy, Session};
pub use transport::{Body, Reply, RequestSpec, ResponseFormat, TlsMode, Transport, TransportConfig};
