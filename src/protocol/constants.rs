//! Protocol constants shared by the handshake and the session defaults.

use std::time::Duration;

/// Sandbox instance, used unless the main instance is selected.
pub const SANDBOX_URL: &str = "http://sandbox.fluidinfo.com";

/// Main (production) instance.
pub const MAIN_URL: &str = "http://fluiddb.fluidinfo.com";

/// Content type for JSON request bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Wait between reconnect attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Default client name sent in `X-Fluidinfo-Client`.
pub const DEFAULT_CLIENT: &str = "fluidinfo-stream";

/// Default client URL sent in `X-Fluidinfo-Client-URL`.
pub const DEFAULT_CLIENT_URL: &str = "https://github.com/micrypt/fluidinfo-stream";

/// Default user agent.
pub const DEFAULT_USER_AGENT: &str = concat!("fluidinfo-stream/", env!("CARGO_PKG_VERSION"));

/// Header names used on the wire.
pub mod headers {
    use http::HeaderName;

    /// Client name.
    pub static CLIENT: HeaderName = HeaderName::from_static("x-fluidinfo-client");
    /// Client home page.
    pub static CLIENT_URL: HeaderName = HeaderName::from_static("x-fluidinfo-client-url");
    /// Client version.
    pub static VERSION: HeaderName = HeaderName::from_static("x-fluidinfo-version");
    /// Error class attached to rejected responses.
    pub static ERROR_CLASS: HeaderName = HeaderName::from_static("x-fluidinfo-error-class");
    /// Request id attached to every response.
    pub static REQUEST_ID: HeaderName = HeaderName::from_static("x-fluidinfo-request-id");
}
