// Session authentication
//
// Two mutually exclusive strategies: username/password login against
// `/rest/token` (session cookie + `X-Securitycenter` token) or a
// static `x-apikey` header built from an access/secret key pair. Either
// way the new session is confirmed with a `/rest/status` probe before the
// caller gets control back.

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::Error;
use crate::headers::{
    API_KEY, COOKIE, CREDENTIAL_HEADERS, HeaderField, HeaderSet, SECURITY_TOKEN,
};
use crate::transport::{RequestSpec, Transport};

pub const TOKEN_PATH: &str = "/rest/token";
pub const STATUS_PATH: &str = "/rest/status";
/// Marker identifying the session cookie among `Set-Cookie` values.
pub const SESSION_COOKIE_MARKER: &str = "TNS_SESSIONID";

const TOKEN_DIGITS: usize = 10;

/// What `logout` does with the credential headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogoutPolicy {
    /// Clear only the established flag; cookie/token/api-key headers stay
    /// in the header set and ride along on later requests.
    #[default]
    KeepHeaders,
    /// Also remove the credential headers.
    ScrubHeaders,
}

/// Authenticated context: the live header set plus the established flag.
///
/// Mutating operations take `&mut self`; share a session between tasks
/// only behind a lock.
#[derive(Debug, Clone)]
pub struct Session {
    headers: HeaderSet,
    established: bool,
    logout_policy: LogoutPolicy,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(LogoutPolicy::default())
    }
}

impl Session {
    /// A fresh, unauthenticated session carrying the default headers.
    pub fn new(logout_policy: LogoutPolicy) -> Self {
        Self {
            headers: HeaderSet::with_defaults(),
            established: false,
            logout_policy,
        }
    }

    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    pub fn is_established(&self) -> bool {
        self.established
    }

    pub fn logout_policy(&self) -> LogoutPolicy {
        self.logout_policy
    }

    // ── Login ────────────────────────────────────────────────────────

    /// Log in with a username and password.
    ///
    /// Returns `Ok(())` without doing anything if either credential is
    /// missing. On success the session cookie and `X-Securitycenter` token
    /// are installed and the session is validated.
    pub async fn authenticate_with_credentials(
        &mut self,
        transport: &Transport,
        username: Option<&str>,
        password: Option<&SecretString>,
    ) -> Result<(), Error> {
        let (Some(username), Some(password)) = (username, password) else {
            return Ok(());
        };
        if self.established {
            return Err(Error::SessionAlreadyEstablished);
        }

        debug!(username, "logging in at {TOKEN_PATH}");

        // Stale credentials never reach the login call.
        let login_headers = self.headers.without(&CREDENTIAL_HEADERS);
        let payload = json!({
            "username": username,
            "password": password.expose_secret(),
        });
        let reply = transport
            .post(
                RequestSpec::new(TOKEN_PATH)
                    .payload(payload)
                    .headers(&login_headers),
            )
            .await?;

        if !reply.is_ok() {
            return Err(Error::AuthenticationFailed {
                status: reply.status.as_u16(),
                body: reply.body.text(),
            });
        }

        let token = extract_token(&reply.body.text())?;
        let cookie = session_cookie(&reply.cookies);

        self.headers.remove(API_KEY);
        self.headers.insert(COOKIE, cookie);
        self.headers.insert(SECURITY_TOKEN, token);
        self.established = true;
        debug!("login accepted, validating session");

        self.confirm(transport).await
    }

    /// Authenticate with an API key pair.
    ///
    /// Returns `Ok(())` without doing anything if either key is missing.
    pub async fn authenticate_with_keys(
        &mut self,
        transport: &Transport,
        access_key: Option<&str>,
        secret_key: Option<&SecretString>,
    ) -> Result<(), Error> {
        let (Some(access_key), Some(secret_key)) = (access_key, secret_key) else {
            return Ok(());
        };
        if self.established {
            return Err(Error::SessionAlreadyEstablished);
        }

        debug!("installing API key header");
        self.headers.remove(COOKIE);
        self.headers.remove(SECURITY_TOKEN);
        self.headers.insert(
            API_KEY,
            format!(
                "accesskey={access_key}; secretkey={};",
                secret_key.expose_secret()
            ),
        );
        self.established = true;

        self.confirm(transport).await
    }

    /// Alias of [`authenticate_with_credentials`](Self::authenticate_with_credentials).
    pub async fn session_create_userpass(
        &mut self,
        transport: &Transport,
        username: Option<&str>,
        password: Option<&SecretString>,
    ) -> Result<(), Error> {
        self.authenticate_with_credentials(transport, username, password)
            .await
    }

    /// Alias of [`authenticate_with_keys`](Self::authenticate_with_keys).
    pub async fn session_create_keys(
        &mut self,
        transport: &Transport,
        access_key: Option<&str>,
        secret_key: Option<&SecretString>,
    ) -> Result<(), Error> {
        self.authenticate_with_keys(transport, access_key, secret_key)
            .await
    }

    // ── Validation ───────────────────────────────────────────────────

    /// Probe `/rest/status` with the current headers.
    ///
    /// A non-200 answer tears the session down: the credential headers are
    /// removed, the flag is cleared, and `SessionInvalidated` is returned.
    pub async fn validate(&mut self, transport: &Transport) -> Result<(), Error> {
        if !self.established {
            return Err(Error::NoActiveSession);
        }

        let reply = transport
            .get(RequestSpec::new(STATUS_PATH).headers(&self.headers))
            .await?;

        if !reply.is_ok() {
            warn!(status = %reply.status, "session rejected by status probe");
            self.headers.clear_credentials();
            self.established = false;
            return Err(Error::SessionInvalidated {
                status: reply.status.as_u16(),
                body: reply.body.text(),
            });
        }

        debug!("session validated");
        Ok(())
    }

    /// Validate a freshly installed session, reverting to unauthenticated
    /// on any failure. The probe's error is returned as is.
    async fn confirm(&mut self, transport: &Transport) -> Result<(), Error> {
        let result = self.validate(transport).await;
        if result.is_err() {
            self.headers.clear_credentials();
            self.established = false;
        }
        result
    }

    /// Alias of [`validate`](Self::validate).
    pub async fn check_session(&mut self, transport: &Transport) -> Result<(), Error> {
        self.validate(transport).await
    }

    // ── Logout ───────────────────────────────────────────────────────

    /// End the session with `DELETE /rest/token`.
    ///
    /// Best-effort: the server's answer (or a transport failure) is logged
    /// and ignored, and the established flag is always cleared. Credential
    /// headers are removed only under [`LogoutPolicy::ScrubHeaders`].
    pub async fn destroy(&mut self, transport: &Transport) {
        debug!("logging out at {TOKEN_PATH}");

        match transport
            .delete(RequestSpec::new(TOKEN_PATH).headers(&self.headers))
            .await
        {
            Ok(reply) if reply.is_ok() => debug!("logout complete"),
            Ok(reply) => warn!(status = %reply.status, "logout not acknowledged"),
            Err(e) => warn!("logout request failed: {e}"),
        }

        self.established = false;
        if self.logout_policy == LogoutPolicy::ScrubHeaders {
            self.headers.clear_credentials();
        }
    }

    /// Alias of [`destroy`](Self::destroy).
    pub async fn logout(&mut self, transport: &Transport) {
        self.destroy(transport).await;
    }
}

/// Pull `response.token` out of the login body and check its shape.
///
/// The token must start with ten digits. A JSON number stays numeric; a
/// string is kept verbatim so leading zeros survive on the wire.
fn extract_token(body: &str) -> Result<HeaderField, Error> {
    let token = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|doc| match doc.pointer("/response/token") {
            Some(Value::Number(n)) => Some(
                n.as_u64()
                    .map_or_else(|| HeaderField::from(n.to_string()), HeaderField::from),
            ),
            Some(Value::String(s)) => Some(HeaderField::from(s.as_str())),
            _ => None,
        });
    let Some(token) = token else {
        return Err(Error::TokenFormatInvalid {
            token: String::new(),
        });
    };

    let text = token.to_string();
    let leading_digits = text.bytes().take_while(u8::is_ascii_digit).count();
    if leading_digits < TOKEN_DIGITS {
        return Err(Error::TokenFormatInvalid { token: text });
    }
    Ok(token)
}

/// First `Set-Cookie` whose name/value pair mentions the session marker,
/// trimmed to that pair. Empty when nothing matches.
fn session_cookie(cookies: &[String]) -> String {
    cookies
        .iter()
        .filter_map(|c| c.split(';').next())
        .map(str::trim)
        .find(|pair| pair.contains(SESSION_COOKIE_MARKER))
        .unwrap_or_default()
        .to_owned()
}
