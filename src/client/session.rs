//! The session manager: `FluidinfoClient`.
//!
//! Holds credentials and target configuration, creates and replaces
//! connections, and owns the one output channel every reader writes to.
//!
//! # Examples
//!
//! ## Streaming a feed
//!
//! ```ignore
//! use fluidinfo_stream::{ClientConfig, Credentials, FluidinfoClient, StreamRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = FluidinfoClient::new(ClientConfig::new(Credentials::new("alice", "secret")));
//!     client.start_stream(StreamRequest::get("/records/feed")).await?;
//!
//!     let records = client.records();
//!     while let Some(envelope) = records.recv().await {
//!         println!("{}: {:?}", envelope.record().id(), envelope.record().tags());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Stopping
//!
//! ```ignore
//! client.stop();
//! // buffered records are still available until the channel is closed
//! client.close_records().await;
//! while let Some(envelope) = client.records().recv().await {
//!     println!("late: {}", envelope.record().id());
//! }
//! ```

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::client::config::ClientConfig;
use crate::client::connection::{self, Connection, ConnectionHandle, ResponseMetadata};
use crate::client::reader::StreamReader;
use crate::client::state::{SessionDiagnostics, SessionState, SessionStats};
use crate::client::subscription::Records;
use crate::error::Result;
use crate::protocol::join_target;
use crate::types::{Envelope, StreamRequest};

/// Everything needed to (re)open a connection for this session.
#[derive(Clone)]
pub(crate) struct Dialer {
    http: reqwest::Client,
    pub(crate) config: Arc<ClientConfig>,
    pub(crate) state: Arc<SessionState>,
}

impl Dialer {
    pub(crate) fn new(http: reqwest::Client, config: ClientConfig) -> Self {
        Dialer {
            http,
            config: Arc::new(config),
            state: Arc::new(SessionState::new()),
        }
    }

    /// Validate configuration, then perform one handshake.
    ///
    /// Credentials are checked before every attempt; a failed check makes no
    /// network call.
    pub(crate) async fn dial(
        &self,
        request: &StreamRequest,
    ) -> Result<(Connection, ResponseMetadata)> {
        self.config.credentials.validate()?;
        let target = join_target(&self.config.base_url, &request.path)?;
        let id = self.state.next_connection_id();
        SessionStats::bump(&self.state.stats.connect_attempts);

        let opened = connection::open(
            &self.http,
            id,
            target,
            request,
            &self.config.credentials,
            &self.config.identity,
        )
        .await?;
        Ok(opened)
    }
}

/// Persistent streaming session against a Fluidinfo instance.
///
/// # Features
///
/// - One live connection at a time; starting a new stream supersedes the old
/// - Transparent reconnects that keep the same output channel
/// - Malformed and blank lines dropped without interrupting the stream
/// - Coarse, connection-scoped cancellation through [`stop`](Self::stop)
#[derive(Clone)]
pub struct FluidinfoClient {
    dialer: Dialer,
    output: mpsc::Sender<Envelope>,
    records: Records,
}

impl FluidinfoClient {
    /// Create a client. No network activity happens until a stream starts.
    pub fn new(config: ClientConfig) -> Self {
        let client = match reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "failed to build HTTP client, falling back to defaults without connect timeout"
                );
                reqwest::Client::default()
            }
        };
        Self::with_http_client(config, client)
    }

    /// Create a client on top of an existing `reqwest::Client`.
    pub fn with_http_client(config: ClientConfig, client: reqwest::Client) -> Self {
        let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
        FluidinfoClient {
            dialer: Dialer::new(client, config),
            output: tx,
            records: Records::new(rx),
        }
    }

    /// Open a stream and start the background reader.
    ///
    /// Blocks only for the handshake. On success any previously live
    /// connection is closed and its reader stops. On failure the previous
    /// connection, if any, is left untouched.
    ///
    /// # Errors
    ///
    /// - `Configuration(MissingCredentials)` when credentials are empty; no
    ///   connection is attempted
    /// - `Configuration(InvalidTarget)` when base address and path do not
    ///   form a URL
    /// - `Connect(..)` when the handshake fails or is rejected
    pub async fn start_stream(&self, request: StreamRequest) -> Result<ResponseMetadata> {
        let (conn, metadata) = self.dialer.dial(&request).await?;
        tracing::info!(
            connection = conn.id(),
            target = %conn.target(),
            method = %request.method,
            "stream started"
        );

        self.dialer.state.install(conn.handle());
        let reader = StreamReader::new(conn, self.dialer.clone(), self.output.clone());
        tokio::spawn(reader.run());
        Ok(metadata)
    }

    /// The output channel. The same channel is returned for the lifetime of
    /// the client, across every reconnect and restart.
    pub fn records(&self) -> Records {
        self.records.clone()
    }

    /// Close the live connection, if any. Idempotent and never fails.
    ///
    /// The reader stops without reconnecting. The output channel stays open
    /// so buffered records can still be drained.
    pub fn stop(&self) {
        if let Some(id) = self.dialer.state.stop() {
            tracing::info!(connection = id, "stream stopped");
        }
    }

    /// Close the output channel. Buffered records remain readable; a running
    /// reader stops at its next delivery.
    pub async fn close_records(&self) {
        self.records.close().await;
    }

    /// Whether a live connection exists.
    pub fn is_streaming(&self) -> bool {
        self.dialer.state.live_connection().is_some()
    }

    /// Handle of the live connection, if any.
    pub fn live_connection(&self) -> Option<ConnectionHandle> {
        self.dialer.state.live_connection()
    }

    /// Snapshot of session state and counters.
    pub fn diagnostics(&self) -> SessionDiagnostics {
        self.dialer.state.diagnostics()
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.dialer.config
    }
}
