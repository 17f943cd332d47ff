//! A single streaming HTTP exchange.
//!
//! A [`Connection`] owns one in-flight response body. It is created by
//! [`open`], read by exactly one stream reader, and released when it is
//! superseded or when the session stops.
//!
//! # Staleness
//!
//! Every connection carries a [`ConnectionHandle`]. Closing the handle marks
//! the connection stale; a reader blocked on the body wakes immediately,
//! drops the transport and stops instead of reconnecting. The session keeps a
//! clone of the handle for the live connection so it can close it from any
//! task.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use tokio::sync::watch;
use url::Url;

use crate::client::{ClientIdentity, Credentials};
use crate::error::ConnectError;
use crate::protocol::{basic_auth_value, client_headers, constants::headers};
use crate::types::StreamRequest;

/// Shared staleness flag for one connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: u64,
    stale: Arc<watch::Sender<bool>>,
}

impl ConnectionHandle {
    pub(crate) fn new(id: u64) -> Self {
        let (tx, _rx) = watch::channel(false);
        ConnectionHandle {
            id,
            stale: Arc::new(tx),
        }
    }

    /// Session-unique connection id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the owner has closed this connection.
    pub fn is_stale(&self) -> bool {
        *self.stale.borrow()
    }

    /// Mark the connection stale. Idempotent.
    pub fn close(&self) {
        self.stale.send_replace(true);
    }

    /// Resolves once the connection is marked stale.
    pub async fn closed(&self) {
        let mut rx = self.stale.subscribe();
        // The sender lives in `self`, so this only returns once stale.
        let _ = rx.wait_for(|stale| *stale).await;
    }
}

/// Status and headers of a successful handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMetadata {
    /// HTTP status code.
    pub status: u16,
    /// Response headers; names lowercased, non-UTF-8 values skipped.
    pub headers: BTreeMap<String, String>,
}

impl ResponseMetadata {
    fn from_response(response: &reqwest::Response) -> Self {
        let mut headers = BTreeMap::new();
        for (k, v) in response.headers() {
            if let Ok(val) = v.to_str() {
                headers.insert(k.as_str().to_string(), val.to_string());
            }
        }
        ResponseMetadata {
            status: response.status().as_u16(),
            headers,
        }
    }

    /// The service-assigned request id, when present.
    pub fn request_id(&self) -> Option<&str> {
        self.headers
            .get(headers::REQUEST_ID.as_str())
            .map(String::as_str)
    }
}

/// Result of one read from the response body.
#[derive(Debug)]
pub(crate) enum ReadOutcome {
    /// A chunk of body bytes.
    Chunk(Bytes),
    /// The connection was marked stale.
    Stale,
    /// The server finished the body.
    Eof,
    /// The transport failed or went idle.
    Failed(String),
}

/// One live streaming exchange.
pub struct Connection {
    handle: ConnectionHandle,
    request: StreamRequest,
    target: Url,
    body: BoxStream<'static, reqwest::Result<Bytes>>,
}

/// Perform the handshake for `request` against `target`.
///
/// Sends the request with Basic authentication, client identification
/// headers and, when the request has a body, its content type. Only a 2xx
/// response yields a connection; any other status drops the response,
/// closing the transport, and returns [`ConnectError::Rejected`].
pub async fn open(
    http: &reqwest::Client,
    id: u64,
    target: Url,
    request: &StreamRequest,
    credentials: &Credentials,
    identity: &ClientIdentity,
) -> Result<(Connection, ResponseMetadata), ConnectError> {
    let mut builder = http
        .request(request.method.clone(), target.clone())
        .header(AUTHORIZATION, basic_auth_value(credentials)?)
        .headers(client_headers(identity)?);

    if let Some(body) = &request.body {
        builder = builder
            .header(CONTENT_TYPE, request.content_type.as_str())
            .body(body.clone());
    }

    let response = builder.send().await?;
    let metadata = ResponseMetadata::from_response(&response);

    if !response.status().is_success() {
        tracing::debug!(
            connection = id,
            target = %target,
            status = metadata.status,
            error_class = metadata.headers.get(headers::ERROR_CLASS.as_str()).map(String::as_str),
            request_id = metadata.request_id(),
            "handshake rejected"
        );
        return Err(ConnectError::Rejected(metadata.status));
    }

    tracing::debug!(
        connection = id,
        target = %target,
        status = metadata.status,
        "stream opened"
    );

    let connection = Connection {
        handle: ConnectionHandle::new(id),
        request: request.clone(),
        target,
        body: response.bytes_stream().boxed(),
    };
    Ok((connection, metadata))
}

impl Connection {
    /// Session-unique connection id.
    pub fn id(&self) -> u64 {
        self.handle.id()
    }

    /// A clone of this connection's staleness handle.
    pub fn handle(&self) -> ConnectionHandle {
        self.handle.clone()
    }

    /// Whether the owner has closed this connection.
    pub fn is_stale(&self) -> bool {
        self.handle.is_stale()
    }

    /// The request this connection was opened for.
    pub fn request(&self) -> &StreamRequest {
        &self.request
    }

    /// Absolute target this connection was opened against.
    pub fn target(&self) -> &Url {
        &self.target
    }

    /// Mark stale and release the transport. Idempotent.
    pub fn close(&mut self) {
        self.handle.close();
        self.release();
    }

    fn release(&mut self) {
        self.body = stream::empty().boxed();
    }

    /// Wait for the next body chunk.
    ///
    /// Returns early with `Stale` when the handle is closed while waiting, and
    /// with `Failed` when `idle` elapses without data.
    pub(crate) async fn read_chunk(&mut self, idle: Option<Duration>) -> ReadOutcome {
        if self.is_stale() {
            self.release();
            return ReadOutcome::Stale;
        }

        let handle = self.handle.clone();
        let outcome = tokio::select! {
            _ = handle.closed() => ReadOutcome::Stale,
            item = with_idle_timeout(idle, self.body.next()) => match item {
                Some(Some(Ok(chunk))) => ReadOutcome::Chunk(chunk),
                Some(Some(Err(e))) => ReadOutcome::Failed(e.to_string()),
                Some(None) => ReadOutcome::Eof,
                None => ReadOutcome::Failed("idle timeout".to_string()),
            },
        };

        if !matches!(outcome, ReadOutcome::Chunk(_)) {
            self.release();
        }
        outcome
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.handle.id())
            .field("stale", &self.handle.is_stale())
            .field("method", &self.request.method)
            .field("target", &self.target.as_str())
            .finish()
    }
}

/// `None` when `idle` elapses first.
async fn with_idle_timeout<F: Future>(idle: Option<Duration>, fut: F) -> Option<F::Output> {
    match idle {
        Some(limit) => tokio::time::timeout(limit, fut).await.ok(),
        None => Some(fut.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfig;
    use tokio_test::assert_ok;

    fn target(server: &mockito::Server, path: &str) -> Url {
        Url::parse(&format!("{}{}", server.url(), path)).unwrap()
    }

    #[test]
    fn test_handle_close_is_idempotent() {
        let handle = ConnectionHandle::new(3);
        assert!(!handle.is_stale());
        handle.close();
        handle.close();
        assert!(handle.is_stale());
        assert!(handle.clone().is_stale());
    }

    #[tokio::test]
    async fn test_closed_resolves_after_close() {
        let handle = ConnectionHandle::new(1);
        let waiter = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.closed().await })
        };
        handle.close();
        assert_ok!(tokio::time::timeout(Duration::from_secs(1), waiter).await);
    }

    #[tokio::test]
    async fn test_open_sends_auth_and_identity_headers() {
        let mut server = mockito::Server::new_async().await;
        let identity = ClientIdentity::default();
        let mock = server
            .mock("GET", "/records/feed")
            .match_header("authorization", "Basic YWxpY2U6c2VjcmV0")
            .match_header("x-fluidinfo-client", identity.client.as_str())
            .match_header("x-fluidinfo-client-url", identity.client_url.as_str())
            .match_header("x-fluidinfo-version", identity.version.as_str())
            .match_header("user-agent", identity.user_agent.as_str())
            .with_status(200)
            .with_header("x-fluidinfo-request-id", "req-1")
            .with_body("{\"id\":\"1\"}\n")
            .create_async()
            .await;

        let (mut conn, meta) = open(
            &reqwest::Client::new(),
            1,
            target(&server, "/records/feed"),
            &StreamRequest::get("/records/feed"),
            &Credentials::new("alice", "secret"),
            &identity,
        )
        .await
        .unwrap();

        assert_eq!(meta.status, 200);
        assert_eq!(meta.request_id(), Some("req-1"));
        assert_eq!(conn.id(), 1);
        assert!(!conn.is_stale());
        match conn.read_chunk(None).await {
            ReadOutcome::Chunk(chunk) => assert!(chunk.starts_with(b"{\"id\"")),
            other => panic!("unexpected read outcome: {:?}", other),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_open_sends_body_with_content_type() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/values")
            .match_header("content-type", "application/json")
            .match_body(r#"{"query":"has alice/rating"}"#)
            .with_status(201)
            .create_async()
            .await;

        let result = open(
            &reqwest::Client::new(),
            1,
            target(&server, "/values"),
            &StreamRequest::post("/values", r#"{"query":"has alice/rating"}"#),
            &Credentials::new("alice", "secret"),
            &ClientIdentity::default(),
        )
        .await;

        assert_eq!(assert_ok!(result).1.status, 201);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_open_rejected_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/records/feed")
            .with_status(401)
            .with_header("x-fluidinfo-error-class", "TPasswordIncorrect")
            .create_async()
            .await;

        let err = open(
            &reqwest::Client::new(),
            1,
            target(&server, "/records/feed"),
            &StreamRequest::get("/records/feed"),
            &Credentials::new("alice", "wrong"),
            &ClientIdentity::default(),
        )
        .await
        .unwrap_err();

        assert_eq!(err, ConnectError::Rejected(401));
    }

    #[tokio::test]
    async fn test_open_dial_failed() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = ClientConfig::default();
        let err = open(
            &reqwest::Client::new(),
            1,
            Url::parse(&format!("http://{}/records/feed", addr)).unwrap(),
            &StreamRequest::get("/records/feed"),
            &Credentials::new("alice", "secret"),
            &config.identity,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ConnectError::DialFailed(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_read_after_close_is_stale() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/feed")
            .with_status(200)
            .with_body("{\"id\":\"1\"}\n")
            .create_async()
            .await;

        let (mut conn, _) = open(
            &reqwest::Client::new(),
            9,
            target(&server, "/feed"),
            &StreamRequest::get("/feed"),
            &Credentials::new("alice", "secret"),
            &ClientIdentity::default(),
        )
        .await
        .unwrap();

        conn.close();
        conn.close();
        assert!(conn.is_stale());
        assert!(matches!(conn.read_chunk(None).await, ReadOutcome::Stale));
    }
}
