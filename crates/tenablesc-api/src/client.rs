// Security Center client
//
// Owns the transport and the session. Construction authenticates right
// away: API keys first, then username/password if no session exists yet.

use std::future::Future;
use std::time::Duration;

use reqwest::Method;
use secrecy::SecretString;
use tracing::debug;

use crate::error::Error;
use crate::headers::HeaderSet;
use crate::requester::Requester;
use crate::resources::{Assets, Queries, Scans, Server};
use crate::session::{LogoutPolicy, Session};
use crate::transport::{Reply, RequestSpec, TlsMode, Transport, TransportConfig};

pub const DEFAULT_URI: &str = "https://localhost:1443/";

/// Everything needed to build a [`TenablescClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Security Center base URI.
    pub uri: String,
    pub tls: TlsMode,
    pub timeout: Option<Duration>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub access_key: Option<String>,
    pub secret_key: Option<SecretString>,
    pub logout_policy: LogoutPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.into(),
            tls: TlsMode::System,
            timeout: None,
            username: None,
            password: None,
            access_key: None,
            secret_key: None,
            logout_policy: LogoutPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Self::default()
        }
    }

    /// `false` accepts self-signed certificates.
    pub fn ssl_verify_peer(mut self, verify: bool) -> Self {
        self.tls = TlsMode::from_verify_peer(verify);
        self
    }

    pub fn tls(mut self, tls: TlsMode) -> Self {
        self.tls = tls;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn credentials(mut self, username: impl Into<String>, password: SecretString) -> Self {
        self.username = Some(username.into());
        self.password = Some(password);
        self
    }

    pub fn api_keys(mut self, access_key: impl Into<String>, secret_key: SecretString) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key);
        self
    }

    pub fn logout_policy(mut self, policy: LogoutPolicy) -> Self {
        self.logout_policy = policy;
        self
    }

    fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
        }
    }
}

/// Async client for the Tenable Security Center REST API.
///
/// Session-changing calls take `&mut self`; resource queries take `&self`.
/// Wrap the client in a lock to share it between tasks.
pub struct TenablescClient {
    transport: Transport,
    session: Session,
}

impl TenablescClient {
    /// Build the transport from `config` and authenticate.
    ///
    /// With no credentials configured this succeeds with an unauthenticated
    /// client. If credentials are configured and the login fails, the error
    /// is returned.
    pub async fn connect(config: ClientConfig) -> Result<Self, Error> {
        let transport = Transport::new(&config.uri, &config.transport_config())?;
        Self::connect_with_transport(transport, &config).await
    }

    /// Authenticate over an already-built transport. Only the credential
    /// and logout settings of `config` are used.
    pub async fn connect_with_transport(
        transport: Transport,
        config: &ClientConfig,
    ) -> Result<Self, Error> {
        let mut client = Self {
            transport,
            session: Session::new(config.logout_policy),
        };

        client
            .authenticate_with_keys(config.access_key.as_deref(), config.secret_key.as_ref())
            .await?;
        if !client.has_session() {
            client
                .authenticate_with_credentials(config.username.as_deref(), config.password.as_ref())
                .await?;
        }

        debug!(
            url = client.transport.url(),
            established = client.has_session(),
            "client ready"
        );
        Ok(client)
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// Whether an authenticated session is established.
    pub fn has_session(&self) -> bool {
        self.session.is_established()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// The normalized endpoint URI.
    pub fn url(&self) -> &str {
        self.transport.url()
    }

    // ── Session lifecycle ────────────────────────────────────────────

    pub async fn authenticate_with_credentials(
        &mut self,
        username: Option<&str>,
        password: Option<&SecretString>,
    ) -> Result<(), Error> {
        self.session
            .authenticate_with_credentials(&self.transport, username, password)
            .await
    }

    pub async fn authenticate_with_keys(
        &mut self,
        access_key: Option<&str>,
        secret_key: Option<&SecretString>,
    ) -> Result<(), Error> {
        self.session
            .authenticate_with_keys(&self.transport, access_key, secret_key)
            .await
    }

    /// Re-run the status probe against the current session.
    pub async fn validate(&mut self) -> Result<(), Error> {
        self.session.validate(&self.transport).await
    }

    /// End the session. Always leaves the client unauthenticated.
    pub async fn logout(&mut self) {
        self.session.destroy(&self.transport).await;
    }

    // ── Resources ────────────────────────────────────────────────────

    pub fn assets(&self) -> Assets<'_, Self> {
        Assets::new(self)
    }

    pub fn queries(&self) -> Queries<'_, Self> {
        Queries::new(self)
    }

    pub fn scans(&self) -> Scans<'_, Self> {
        Scans::new(self)
    }

    pub fn server(&self) -> Server<'_, Self> {
        Server::new(self)
    }
}

impl Requester for TenablescClient {
    fn headers(&self) -> &HeaderSet {
        self.session.headers()
    }

    fn request(
        &self,
        method: Method,
        spec: RequestSpec<'_>,
    ) -> impl Future<Output = Result<Reply, Error>> + Send {
        self.transport.request(method, spec)
    }
}
