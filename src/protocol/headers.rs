//! Header rendering for the handshake request.
//!
//! [`basic_auth_value`] is the only place credentials are turned into a
//! header value. The returned value is flagged sensitive so it is redacted
//! from `Debug` output; it must never be passed to a log macro.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use http::header::{HeaderMap, HeaderValue, USER_AGENT};
use url::Url;

use super::constants::headers;
use crate::client::{ClientIdentity, Credentials};
use crate::error::{ConfigurationError, ConnectError};

/// Render `Authorization: Basic base64(username:password)`.
///
/// # Examples
///
/// ```
/// use fluidinfo_stream::client::Credentials;
/// use fluidinfo_stream::protocol::basic_auth_value;
///
/// let value = basic_auth_value(&Credentials::new("alice", "secret")).unwrap();
/// assert!(value.is_sensitive());
/// ```
pub fn basic_auth_value(credentials: &Credentials) -> Result<HeaderValue, ConnectError> {
    let raw = format!("{}:{}", credentials.username(), credentials.password());
    let mut value = HeaderValue::from_str(&format!("Basic {}", STANDARD.encode(raw)))
        .map_err(|_| ConnectError::WriteFailed("unencodable authorization header".into()))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Client identification headers sent on every handshake.
pub fn client_headers(identity: &ClientIdentity) -> Result<HeaderMap, ConnectError> {
    let mut map = HeaderMap::with_capacity(4);
    let pairs = [
        (USER_AGENT, identity.user_agent.as_str()),
        (headers::CLIENT.clone(), identity.client.as_str()),
        (headers::CLIENT_URL.clone(), identity.client_url.as_str()),
        (headers::VERSION.clone(), identity.version.as_str()),
    ];
    for (name, value) in pairs {
        let value = HeaderValue::from_str(value).map_err(|_| {
            ConnectError::WriteFailed(format!("invalid value for header {}", name))
        })?;
        map.insert(name, value);
    }
    Ok(map)
}

/// Append `path` to the base address.
///
/// The base's own path is preserved, so `http://host/api` + `/tags` yields
/// `http://host/api/tags`. Exactly one `/` separates the two parts.
///
/// # Examples
///
/// ```
/// use fluidinfo_stream::protocol::join_target;
///
/// let url = join_target("http://sandbox.fluidinfo.com/", "records/feed").unwrap();
/// assert_eq!(url.as_str(), "http://sandbox.fluidinfo.com/records/feed");
/// ```
pub fn join_target(base: &str, path: &str) -> Result<Url, ConfigurationError> {
    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    let url = Url::parse(&joined)
        .map_err(|e| ConfigurationError::InvalidTarget(format!("{}: {}", joined, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigurationError::InvalidTarget(format!(
            "unsupported scheme '{}'",
            other
        ))),
    }
}
