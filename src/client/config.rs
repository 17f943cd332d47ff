//! Session configuration.
//!
//! A [`ClientConfig`] is fixed when the client is built. There is no
//! in-place credential rotation; build a new client instead.

use std::fmt;
use std::time::Duration;

use crate::client::utils::exponential_backoff;
use crate::error::ConfigurationError;
use crate::protocol::constants::{
    DEFAULT_CLIENT, DEFAULT_CLIENT_URL, DEFAULT_RETRY_INTERVAL, DEFAULT_USER_AGENT, MAIN_URL,
    SANDBOX_URL,
};

/// Username and password for HTTP Basic authentication.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Create credentials from an identity and secret.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The identity half.
    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }

    /// Fails with `MissingCredentials` when either half is empty.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(ConfigurationError::MissingCredentials);
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Strings identifying this client to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    /// Sent as `X-Fluidinfo-Client`.
    pub client: String,
    /// Sent as `X-Fluidinfo-Client-URL`.
    pub client_url: String,
    /// Sent as `X-Fluidinfo-Version`.
    pub version: String,
    /// Sent as `User-Agent`.
    pub user_agent: String,
}

impl Default for ClientIdentity {
    fn default() -> Self {
        ClientIdentity {
            client: DEFAULT_CLIENT.to_string(),
            client_url: DEFAULT_CLIENT_URL.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Wait schedule between reconnect attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Same wait before every attempt.
    Fixed(Duration),
    /// Doubling wait starting at `base`, capped at `max`.
    Exponential {
        /// Wait before the first attempt.
        base: Duration,
        /// Upper bound on any single wait.
        max: Duration,
    },
}

impl RetryPolicy {
    /// Wait before reconnect attempt number `attempt` (zero-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            RetryPolicy::Fixed(interval) => interval,
            RetryPolicy::Exponential { base, max } => {
                let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
                exponential_backoff(attempt, base_ms).min(max)
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::Fixed(DEFAULT_RETRY_INTERVAL)
    }
}

/// Configuration for a [`FluidinfoClient`](crate::client::FluidinfoClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Basic-auth credentials, checked before every handshake.
    pub credentials: Credentials,
    /// Base address every stream path is appended to.
    pub base_url: String,
    /// Client identification headers.
    pub identity: ClientIdentity,
    /// Wait schedule for the reconnect loop.
    pub retry: RetryPolicy,
    /// Capacity of the bounded output channel.
    pub channel_capacity: usize,
    /// Dial timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Silence on a live stream longer than this counts as a read error.
    pub idle_timeout_ms: Option<u64>,
    /// Lines longer than this are dropped.
    pub max_line_bytes: usize,
    /// Log reconnect failures.
    pub enable_logging: bool,
}

impl ClientConfig {
    /// Sandbox configuration for the given credentials.
    pub fn new(credentials: Credentials) -> Self {
        ClientConfig {
            credentials,
            ..Default::default()
        }
    }

    /// Point at the main instance instead of the sandbox.
    pub fn main_instance(mut self) -> Self {
        self.base_url = MAIN_URL.to_string();
        self
    }

    pub(crate) fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub(crate) fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            credentials: Credentials::default(),
            base_url: SANDBOX_URL.to_string(),
            identity: ClientIdentity::default(),
            retry: RetryPolicy::default(),
            channel_capacity: 100,
            connect_timeout_ms: 10_000,
            idle_timeout_ms: None,
            max_line_bytes: 1024 * 1024,
            enable_logging: true,
        }
    }
}
