#![warn(missing_docs)]

//! # fluidinfo-stream: persistent streaming sessions for Fluidinfo
//!
//! A client for the Fluidinfo tag service that keeps a single long-lived HTTP
//! request open, parses its body as newline-delimited JSON records, and keeps
//! delivering those records across network failures by transparently
//! re-establishing the connection.
//!
//! ## Overview
//!
//! - **Connection** - one handshake (Basic auth, client identification
//!   headers, optional body) and the response body it produced
//! - **Stream Reader** - background task that reads lines, decodes records,
//!   and reconnects on read failure
//! - **Session Manager** ([`FluidinfoClient`]) - owns configuration, the live
//!   connection slot, and the output channel
//! - **Frame Decoder** - turns one line into one [`Envelope`]
//!
//! From the consumer's point of view the feed is continuous: the output
//! channel returned by [`FluidinfoClient::records`] never changes, and
//! transport failures appear only as a pause between records.
//!
//! ## Key Features
//!
//! - **At most one live connection**: starting a stream closes the previous one
//! - **Indefinite reconnects**: fixed-interval retries (5 s by default) until
//!   [`FluidinfoClient::stop`] is called
//! - **Drop-and-continue decoding**: blank keep-alive lines are skipped and
//!   malformed lines are logged and dropped
//! - **Backpressure**: the output channel is bounded; a slow consumer pauses
//!   the reader instead of growing memory
//!
//! ## Client Usage
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
//!         let record = envelope.record();
//!         println!("{} important={}", record.id(), record.has_tag("important"));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Structure
//!
//! - **[types]** - Records, envelopes, and stream requests
//! - **[error]** - Error types and result handling
//! - **[client]** - Session manager, connection, reader, decoding
//! - **[protocol]** - Header names, content types, default endpoints

pub mod client;
pub mod error;
pub mod protocol;
pub mod types;

pub use client::{ClientConfig, ClientIdentity, Credentials, FluidinfoClient, Records, RetryPolicy};
pub use error::{ConfigurationError, ConnectError, FluidinfoError, Result};
pub use types::{Envelope, Record, Segment, StreamRequest, TagValue};
