//! Persistent streaming session client.
//!
//! This module opens a long-lived HTTP request against a Fluidinfo instance,
//! authenticates once per connection, and turns the newline-delimited JSON
//! response body into a feed of decoded records. When the transport fails,
//! a background reader reconnects to the same target and keeps writing to the
//! same output channel.
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── session      - FluidinfoClient: start / records / stop
//! ├── connection   - One handshake and its response body
//! ├── reader       - Background read, decode, dispatch and reconnect loop
//! ├── state        - Live-connection slot, reader state, counters
//! ├── parser       - Incremental newline framing
//! ├── decoder      - Line to envelope decoding
//! ├── subscription - Consumer handle for the output channel
//! ├── config       - Client configuration
//! └── utils        - Utility functions
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`FluidinfoClient`] | Session manager |
//! | [`Connection`] | One live streaming exchange |
//! | [`FrameDecoder`] | Line to [`Envelope`](crate::Envelope) decoder |
//! | [`LineParser`] | Streaming newline splitter |
//! | [`Records`] | Output channel handle |
//! | [`ClientConfig`] | Client configuration options |
//!
//! # Examples
//!
//! ## Creating a Client
//!
//! ```
//! use fluidinfo_stream::client::{ClientConfig, Credentials, FluidinfoClient, RetryPolicy};
//! use std::time::Duration;
//!
//! let config = ClientConfig {
//!     retry: RetryPolicy::Fixed(Duration::from_secs(2)),
//!     channel_capacity: 500,
//!     ..ClientConfig::new(Credentials::new("alice", "secret"))
//! };
//! let client = FluidinfoClient::new(config);
//! assert!(!client.is_streaming());
//! ```
//!
//! ## Decoding Lines
//!
//! ```
//! use fluidinfo_stream::client::{FrameDecoder, Line, LineParser};
//!
//! let mut parser = LineParser::new(1024);
//! let lines = parser.feed(b"{\"id\":\"1\",\"tags\":{}}\n\n");
//! assert_eq!(lines.len(), 2);
//!
//! let decoded: Vec<_> = lines
//!     .into_iter()
//!     .filter_map(|line| match line {
//!         Line::Complete(bytes) => FrameDecoder::decode(&bytes).ok().flatten(),
//!         Line::Oversized => None,
//!     })
//!     .collect();
//! assert_eq!(decoded.len(), 1);
//! ```

mod config;
mod connection;
mod decoder;
mod parser;
mod reader;
mod session;
mod state;
mod subscription;
mod utils;

pub use config::{ClientConfig, ClientIdentity, Credentials, RetryPolicy};
pub use connection::{open, Connection, ConnectionHandle, ResponseMetadata};
pub use decoder::FrameDecoder;
pub use parser::{Line, LineParser, ParseState};
pub use session::FluidinfoClient;
pub use state::{ReaderState, SessionDiagnostics};
pub use subscription::{RecordStream, Records};
pub use utils::*;
