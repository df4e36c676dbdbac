//! WebSocket connection task and handle.
//!
//! Each connection is one task on the [`EventLoop`]. The task dials the
//! server, runs the session, and reports what happens through four
//! [`Callbacks`]. Other threads address the task through a cloneable
//! [`ConnectionHandle`].
//!
//! # Lifecycle
//!
//! ```text
//! Connecting ──handshake ok──► Open ──close sent/received──► Closing ──► Closed
//!     │                         │                                          ▲
//!     └── error / timeout / ────┴── transport error ───────────────────────┘
//!         cancelled
//! ```
//!
//! Exactly one of `on_fail` or `on_close` fires per connection, as the last
//! callback. `on_open` fires at most once, before any `on_message`.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::result::Result as StdResult;
use std::sync::Arc;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep_until, timeout};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::{Request, Response};
use tokio_tungstenite::tungstenite::http::HeaderMap;
use tokio_tungstenite::tungstenite::http::header::SERVER;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{
    Connector, MaybeTlsStream, WebSocketStream, connect_async_tls_with_config,
};
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::ConnectionId;
use crate::protocol::close::{self, CloseInfo};
use crate::protocol::Payload;

use super::event_loop::EventLoop;
use super::options::TransportOptions;
use super::tls::SecureTransportFactory;

// ============================================================================
// Types
// ============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWrite = SplitSink<WsStream, Message>;

/// Called when the opening handshake succeeds, with the peer's `Server`
/// header.
pub type OpenHandler = Box<dyn Fn(Option<String>) + Send + Sync>;

/// Called when the connection fails, with the peer's `Server` header (if a
/// response was received) and the error text.
pub type FailHandler = Box<dyn Fn(Option<String>, String) + Send + Sync>;

/// Called when the connection closes, with the remote close code and reason.
pub type CloseHandler = Box<dyn Fn(CloseInfo) + Send + Sync>;

/// Called for each received text or binary message.
pub type MessageHandler = Box<dyn Fn(Payload) + Send + Sync>;

// ============================================================================
// LinkState
// ============================================================================

/// Transport-level state of a connection.
///
/// Decides synchronously whether a send or close request is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Opening handshake in progress.
    Connecting,
    /// Handshake complete, data may flow.
    Open,
    /// Close frame sent or received.
    Closing,
    /// Task finished.
    Closed,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Target
// ============================================================================

/// A validated connection target.
#[derive(Debug)]
pub struct Target {
    /// Parsed URL.
    url: Url,
    /// Handshake request built from the URL.
    request: Request,
}

impl Target {
    /// Validates `uri` and builds the handshake request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUri`] if the URI does not parse, uses a scheme
    /// other than `ws`/`wss`, or has no host.
    pub fn parse(uri: &str) -> Result<Self> {
        let url = Url::parse(uri.trim()).map_err(|e| Error::invalid_uri(uri, e.to_string()))?;

        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(Error::invalid_uri(
                    uri,
                    format!("unsupported scheme '{other}', expected ws or wss"),
                ));
            }
        }

        if url.host_str().is_none_or(str::is_empty) {
            return Err(Error::invalid_uri(uri, "missing host"));
        }

        if url.port_or_known_default().is_none() {
            return Err(Error::invalid_uri(uri, "missing port"));
        }

        let request = url
            .as_str()
            .into_client_request()
            .map_err(|e| Error::invalid_uri(uri, e.to_string()))?;

        Ok(Self { url, request })
    }

    /// Returns `true` for `wss://` targets.
    #[inline]
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.url.scheme() == "wss"
    }

    /// Returns the parsed URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }
}

// ============================================================================
// Callbacks
// ============================================================================

/// The four event slots of a connection.
///
/// Every handler runs on the event loop thread. Unset slots ignore their
/// event.
#[derive(Default)]
pub struct Callbacks {
    on_open: Option<OpenHandler>,
    on_fail: Option<FailHandler>,
    on_close: Option<CloseHandler>,
    on_message: Option<MessageHandler>,
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_open", &self.on_open.is_some())
            .field("on_fail", &self.on_fail.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_message", &self.on_message.is_some())
            .finish()
    }
}

impl Callbacks {
    /// Creates callbacks with every slot empty.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the open handler.
    #[must_use]
    pub fn on_open(mut self, handler: impl Fn(Option<String>) + Send + Sync + 'static) -> Self {
        self.on_open = Some(Box::new(handler));
        self
    }

    /// Sets the fail handler.
    #[must_use]
    pub fn on_fail(
        mut self,
        handler: impl Fn(Option<String>, String) + Send + Sync + 'static,
    ) -> Self {
        self.on_fail = Some(Box::new(handler));
        self
    }

    /// Sets the close handler.
    #[must_use]
    pub fn on_close(mut self, handler: impl Fn(CloseInfo) + Send + Sync + 'static) -> Self {
        self.on_close = Some(Box::new(handler));
        self
    }

    /// Sets the message handler.
    #[must_use]
    pub fn on_message(mut self, handler: impl Fn(Payload) + Send + Sync + 'static) -> Self {
        self.on_message = Some(Box::new(handler));
        self
    }

    fn emit_open(&self, peer: Option<String>) {
        if let Some(handler) = &self.on_open {
            handler(peer);
        }
    }

    fn emit_fail(&self, peer: Option<String>, reason: String) {
        if let Some(handler) = &self.on_fail {
            handler(peer, reason);
        }
    }

    fn emit_close(&self, info: CloseInfo) {
        if let Some(handler) = &self.on_close {
            handler(info);
        }
    }

    fn emit_message(&self, payload: Payload) {
        if let Some(handler) = &self.on_message {
            handler(payload);
        }
    }
}

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the connection task.
#[derive(Debug)]
enum ConnectionCommand {
    /// Send a text frame.
    Send(String),
    /// Start the closing handshake, or cancel a pending handshake.
    Close { code: u16, reason: String },
}

// ============================================================================
// ConnectionHandle
// ============================================================================

/// Cloneable reference to a connection task.
///
/// Remains safe to use after the connection ends: requests are then
/// rejected with an error.
#[derive(Clone)]
pub struct ConnectionHandle {
    /// Channel for sending commands to the task.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// Link state (shared with the task).
    state: Arc<Mutex<LinkState>>,
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl ConnectionHandle {
    /// Returns the current link state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> LinkState {
        *self.state.lock()
    }

    /// Queues a text frame.
    ///
    /// Success means the frame was handed to the connection task, not that
    /// it reached the peer.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] unless the link is open
    /// - [`Error::ConnectionClosed`] if the task is gone
    pub fn send_text(&self, text: &str) -> Result<()> {
        let state = self.state.lock();
        if *state != LinkState::Open {
            return Err(Error::invalid_state("send", *state));
        }

        self.command_tx
            .send(ConnectionCommand::Send(text.to_owned()))
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Requests closure with `code` and `reason`.
    ///
    /// On an open link this starts the closing handshake; during the opening
    /// handshake it cancels the attempt, which then fails.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidCloseCode`] / [`Error::InvalidArgument`] if the code
    ///   or reason cannot be sent
    /// - [`Error::InvalidState`] if the link is already closing or closed
    /// - [`Error::ConnectionClosed`] if the task is gone
    pub fn close(&self, code: u16, reason: &str) -> Result<()> {
        close::validate(code, reason)?;

        let mut state = self.state.lock();
        if !matches!(*state, LinkState::Connecting | LinkState::Open) {
            return Err(Error::invalid_state("close", *state));
        }

        self.command_tx
            .send(ConnectionCommand::Close {
                code,
                reason: reason.to_owned(),
            })
            .map_err(|_| Error::ConnectionClosed)?;

        *state = LinkState::Closing;
        Ok(())
    }
}

// ============================================================================
// PendingConnection
// ============================================================================

/// A connection that has a handle but whose task is not running yet.
///
/// Splitting creation from start lets the owner store the handle before
/// binding callbacks that refer to it.
pub struct PendingConnection {
    target: Target,
    command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
    state: Arc<Mutex<LinkState>>,
}

impl PendingConnection {
    /// Creates the handle/task pair for `target`.
    #[must_use]
    pub fn new(target: Target) -> (ConnectionHandle, Self) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(LinkState::Connecting));

        let handle = ConnectionHandle {
            command_tx,
            state: Arc::clone(&state),
        };

        (
            handle,
            Self {
                target,
                command_rx,
                state,
            },
        )
    }

    /// Schedules the connection task on `event_loop`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EventLoopStopped`] if the loop no longer accepts work.
    /// No callback fires in that case.
    pub fn start(
        self,
        event_loop: &EventLoop,
        id: ConnectionId,
        callbacks: Callbacks,
        options: TransportOptions,
        security: Arc<dyn SecureTransportFactory>,
    ) -> Result<()> {
        let session = Session {
            id,
            target: self.target,
            options,
            security,
            callbacks,
            command_rx: self.command_rx,
            state: self.state,
            stop_rx: event_loop.stop_signal(),
        };

        event_loop.spawn(session.run())?;
        debug!(%id, "Connection scheduled");
        Ok(())
    }
}

// ============================================================================
// Session
// ============================================================================

/// How a session ended.
enum Outcome {
    Closed(CloseInfo),
    Failed(String),
}

/// State owned by the connection task.
struct Session {
    id: ConnectionId,
    target: Target,
    options: TransportOptions,
    security: Arc<dyn SecureTransportFactory>,
    callbacks: Callbacks,
    command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
    state: Arc<Mutex<LinkState>>,
    stop_rx: watch::Receiver<bool>,
}

impl Session {
    /// Task body: handshake, then the session loop.
    async fn run(mut self) {
        let id = self.id;

        let stream = match self.handshake().await {
            Ok((stream, peer)) => {
                {
                    let mut state = self.state.lock();
                    // A close request may have raced the handshake; keep Closing
                    if *state == LinkState::Connecting {
                        *state = LinkState::Open;
                    }
                }
                info!(%id, url = %self.target.url, "Connection open");
                self.callbacks.emit_open(peer);
                stream
            }
            Err((peer, reason)) => {
                *self.state.lock() = LinkState::Closed;
                warn!(%id, %reason, "Connection failed");
                self.callbacks.emit_fail(peer, reason);
                return;
            }
        };

        let outcome = self.session_loop(stream).await;
        *self.state.lock() = LinkState::Closed;

        match outcome {
            Outcome::Closed(info) => {
                info!(%id, code = info.code, reason = %info.reason, "Connection closed");
                self.callbacks.emit_close(info);
            }
            Outcome::Failed(reason) => {
                warn!(%id, %reason, "Connection failed");
                self.callbacks.emit_fail(None, reason);
            }
        }
    }

    /// Runs the opening handshake, racing it against close requests.
    ///
    /// On failure returns the peer `Server` header (if any) and the error text.
    async fn handshake(&mut self) -> StdResult<(WsStream, Option<String>), (Option<String>, String)> {
        let connector = if self.target.is_secure() {
            match self.security.create() {
                Ok(config) => Connector::Rustls(config),
                Err(e) => {
                    error!(id = %self.id, error = %e, "TLS context creation failed");
                    return Err((None, e.to_string()));
                }
            }
        } else {
            Connector::Plain
        };

        let open_timeout = self.options.open_handshake_timeout;
        let request = clone_request(&self.target.request);
        let connect = timeout(
            open_timeout,
            connect_async_tls_with_config(
                request,
                Some(self.options.to_ws_config()),
                self.options.disable_nagle,
                Some(connector),
            ),
        );
        tokio::pin!(connect);

        let result = loop {
            tokio::select! {
                result = &mut connect => break result,

                command = self.command_rx.recv() => match command {
                    Some(ConnectionCommand::Close { code, .. }) => {
                        debug!(id = %self.id, code, "Handshake cancelled by close request");
                        return Err((None, "connection attempt cancelled".to_owned()));
                    }
                    Some(ConnectionCommand::Send(_)) => {
                        trace!(id = %self.id, "Dropping send issued before open");
                    }
                    None => {
                        return Err((None, "connection handle dropped".to_owned()));
                    }
                },
            }
        };

        match result {
            Ok(Ok((stream, response))) => Ok((stream, server_header(&response))),
            Ok(Err(WsError::Http(response))) => {
                let peer = server_header_from(response.headers());
                Err((peer, WsError::Http(response).to_string()))
            }
            Ok(Err(e)) => Err((None, e.to_string())),
            Err(_) => Err((
                None,
                format!("handshake timeout after {}ms", open_timeout.as_millis()),
            )),
        }
    }

    /// Pumps frames and commands until the connection ends.
    async fn session_loop(&mut self, stream: WsStream) -> Outcome {
        let id = self.id;
        let (mut ws_write, mut ws_read) = stream.split();

        let mut remote_close: Option<CloseInfo> = None;
        let mut close_deadline: Option<Instant> = None;
        let mut stop_seen = *self.stop_rx.borrow();

        if stop_seen {
            debug!(%id, "Opened after stop request, closing");
            if let Err(reason) = self.begin_close(&mut ws_write, close::GOING_AWAY, "").await {
                return Outcome::Failed(reason);
            }
            close_deadline = Some(Instant::now() + self.options.close_handshake_timeout);
        }

        loop {
            tokio::select! {
                // Incoming frames
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Close(frame))) => {
                            let info = frame
                                .map(|f| CloseInfo::new(u16::from(f.code), f.reason.to_string()))
                                .unwrap_or_else(|| CloseInfo::new(1005, String::new()));
                            debug!(%id, code = info.code, "Close frame received");
                            remote_close = Some(info);
                            *self.state.lock() = LinkState::Closing;
                            close_deadline.get_or_insert_with(|| {
                                Instant::now() + self.options.close_handshake_timeout
                            });
                        }

                        Some(Ok(message)) => {
                            if let Some(payload) = Payload::from_message(message) {
                                trace!(%id, len = payload.len(), text = payload.is_text(), "Message received");
                                self.callbacks.emit_message(payload);
                            }
                        }

                        Some(Err(e)) => {
                            if is_orderly_end(&e) || remote_close.is_some() || close_deadline.is_some() {
                                debug!(%id, error = %e, "Stream ended");
                                break;
                            }
                            return Outcome::Failed(e.to_string());
                        }

                        None => {
                            debug!(%id, "WebSocket stream ended");
                            break;
                        }
                    }
                }

                // Requests from the owning thread
                command = self.command_rx.recv(), if close_deadline.is_none() => {
                    match command {
                        Some(ConnectionCommand::Send(text)) => {
                            if let Err(e) = ws_write.send(Message::text(text)).await {
                                return Outcome::Failed(e.to_string());
                            }
                            trace!(%id, "Text frame sent");
                        }

                        Some(ConnectionCommand::Close { code, reason }) => {
                            if let Err(reason) = self.begin_close(&mut ws_write, code, &reason).await {
                                return Outcome::Failed(reason);
                            }
                            close_deadline = Some(Instant::now() + self.options.close_handshake_timeout);
                        }

                        None => {
                            debug!(%id, "Connection handle dropped, closing");
                            if let Err(reason) = self.begin_close(&mut ws_write, close::GOING_AWAY, "").await {
                                return Outcome::Failed(reason);
                            }
                            close_deadline = Some(Instant::now() + self.options.close_handshake_timeout);
                        }
                    }
                }

                // Event loop shutting down
                changed = self.stop_rx.changed(), if !stop_seen => {
                    stop_seen = true;
                    if changed.is_ok() && close_deadline.is_none() {
                        debug!(%id, "Stop requested, closing");
                        if let Err(reason) = self.begin_close(&mut ws_write, close::GOING_AWAY, "").await {
                            return Outcome::Failed(reason);
                        }
                        close_deadline = Some(Instant::now() + self.options.close_handshake_timeout);
                    }
                }

                // Peer never finished the closing handshake
                _ = sleep_until(close_deadline.unwrap_or_else(Instant::now)), if close_deadline.is_some() => {
                    warn!(%id, "Closing handshake timed out");
                    remote_close = None;
                    break;
                }
            }
        }

        Outcome::Closed(remote_close.unwrap_or_else(CloseInfo::abnormal))
    }

    /// Sends a close frame and marks the link as closing.
    async fn begin_close(&self, ws_write: &mut WsWrite, code: u16, reason: &str) -> StdResult<(), String> {
        *self.state.lock() = LinkState::Closing;

        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: reason.to_owned().into(),
        };

        match ws_write.send(Message::Close(Some(frame))).await {
            Ok(()) => {
                debug!(id = %self.id, code, "Close frame sent");
                Ok(())
            }
            // The peer closed first; our reply is already queued
            Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(e.to_string()),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Returns `true` for errors that only mean the stream is over.
fn is_orderly_end(err: &WsError) -> bool {
    use tokio_tungstenite::tungstenite::error::ProtocolError;

    matches!(
        err,
        WsError::ConnectionClosed
            | WsError::AlreadyClosed
            | WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake)
    )
}

/// Extracts the `Server` header from a handshake response.
fn server_header(response: &Response) -> Option<String> {
    server_header_from(response.headers())
}

fn server_header_from(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SERVER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

/// Copies a handshake request (`http::Request` is not `Clone`).
fn clone_request(request: &Request) -> Request {
    let mut copy = Request::new(());
    *copy.method_mut() = request.method().clone();
    *copy.uri_mut() = request.uri().clone();
    *copy.version_mut() = request.version();
    *copy.headers_mut() = request.headers().clone();
    copy
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::mpsc as std_mpsc;
    use std::time::Duration;

    use crate::test_support::{EchoServer, SilentServer};
    use crate::transport::event_loop::DEFAULT_THREAD_NAME;
    use crate::transport::tls::DefaultSecureTransport;

    const WAIT: Duration = Duration::from_secs(5);

    #[derive(Debug, PartialEq)]
    enum Seen {
        Open(Option<String>),
        Fail(Option<String>, String),
        Close(CloseInfo),
        Message(Payload),
    }

    fn recording_callbacks() -> (Callbacks, std_mpsc::Receiver<Seen>) {
        let (tx, rx) = std_mpsc::channel();
        let (open_tx, fail_tx, close_tx, msg_tx) = (tx.clone(), tx.clone(), tx.clone(), tx);

        let callbacks = Callbacks::new()
            .on_open(move |peer| {
                let _ = open_tx.send(Seen::Open(peer));
            })
            .on_fail(move |peer, reason| {
                let _ = fail_tx.send(Seen::Fail(peer, reason));
            })
            .on_close(move |info| {
                let _ = close_tx.send(Seen::Close(info));
            })
            .on_message(move |payload| {
                let _ = msg_tx.send(Seen::Message(payload));
            });

        (callbacks, rx)
    }

    fn start(
        event_loop: &EventLoop,
        uri: &str,
        options: TransportOptions,
    ) -> (ConnectionHandle, std_mpsc::Receiver<Seen>) {
        let target = Target::parse(uri).expect("valid uri");
        let (handle, pending) = PendingConnection::new(target);
        let (callbacks, rx) = recording_callbacks();
        pending
            .start(
                event_loop,
                ConnectionId::new(0),
                callbacks,
                options,
                Arc::new(DefaultSecureTransport::default()),
            )
            .expect("start");
        (handle, rx)
    }

    #[test]
    fn test_target_accepts_ws_and_wss() {
        let plain = Target::parse("ws://127.0.0.1:9001/echo").expect("ws");
        assert!(!plain.is_secure());
        assert_eq!(plain.url().port(), Some(9001));

        let secure = Target::parse("wss://example.test/echo").expect("wss");
        assert!(secure.is_secure());
        assert_eq!(secure.url().port_or_known_default(), Some(443));
    }

    #[test]
    fn test_target_rejects_bad_uris() {
        for uri in ["", "not a uri", "http://example.test/", "ftp://example.test", "ws://"] {
            let err = Target::parse(uri).unwrap_err();
            assert!(matches!(err, Error::InvalidUri { .. }), "{uri}: {err}");
        }
    }

    #[test]
    fn test_link_state_display() {
        assert_eq!(LinkState::Connecting.to_string(), "connecting");
        assert_eq!(LinkState::Closed.to_string(), "closed");
    }

    #[test]
    fn test_clone_request_keeps_headers() {
        let target = Target::parse("ws://127.0.0.1:9/").expect("uri");
        let copy = clone_request(&target.request);
        assert_eq!(copy.uri(), target.request.uri());
        assert_eq!(copy.headers(), target.request.headers());
    }

    #[test]
    fn test_open_echo_close() {
        let server = EchoServer::start();
        let event_loop = EventLoop::start(DEFAULT_THREAD_NAME).expect("loop");
        let (handle, events) = start(&event_loop, &server.url(), TransportOptions::new());

        assert!(matches!(handle.send_text("early"), Err(Error::InvalidState { .. })));

        let opened = events.recv_timeout(WAIT).expect("open");
        assert_eq!(opened, Seen::Open(Some(EchoServer::SERVER_NAME.to_owned())));
        assert_eq!(handle.state(), LinkState::Open);

        handle.send_text("ping").expect("send");
        assert_eq!(
            events.recv_timeout(WAIT).expect("echo"),
            Seen::Message(Payload::Text("ping".into()))
        );

        handle.close(close::NORMAL, "done").expect("close");
        assert_eq!(handle.state(), LinkState::Closing);
        assert!(matches!(handle.close(close::NORMAL, ""), Err(Error::InvalidState { .. })));

        match events.recv_timeout(WAIT).expect("close") {
            Seen::Close(info) => assert_eq!(info.code, close::NORMAL),
            other => panic!("expected close, got {other:?}"),
        }
        assert_eq!(handle.state(), LinkState::Closed);

        event_loop.request_stop();
        event_loop.join().expect("join");
    }

    #[test]
    fn test_handshake_timeout_fails() {
        let server = SilentServer::start();
        let event_loop = EventLoop::start(DEFAULT_THREAD_NAME).expect("loop");
        let options = TransportOptions::new().with_open_handshake_timeout(Duration::from_millis(100));
        let (handle, events) = start(&event_loop, &server.url(), options);

        assert_eq!(
            events.recv_timeout(WAIT).expect("fail"),
            Seen::Fail(None, "handshake timeout after 100ms".into())
        );
        assert_eq!(handle.state(), LinkState::Closed);
        assert!(matches!(handle.send_text("x"), Err(Error::InvalidState { .. })));

        event_loop.request_stop();
        event_loop.join().expect("join");
    }

    #[test]
    fn test_close_while_connecting_cancels() {
        let server = SilentServer::start();
        let event_loop = EventLoop::start(DEFAULT_THREAD_NAME).expect("loop");
        let (handle, events) = start(&event_loop, &server.url(), TransportOptions::new());

        handle.close(close::NORMAL, "").expect("cancel");

        assert_eq!(
            events.recv_timeout(WAIT).expect("fail"),
            Seen::Fail(None, "connection attempt cancelled".into())
        );

        event_loop.request_stop();
        event_loop.join().expect("join");
    }

    #[test]
    fn test_rejected_upgrade_reports_server_header() {
        let server = EchoServer::start();
        let event_loop = EventLoop::start(DEFAULT_THREAD_NAME).expect("loop");
        let (_handle, events) = start(&event_loop, &server.rejecting_url(), TransportOptions::new());

        match events.recv_timeout(WAIT).expect("fail") {
            Seen::Fail(peer, reason) => {
                assert_eq!(peer.as_deref(), Some(EchoServer::SERVER_NAME));
                assert!(reason.contains("403"), "{reason}");
            }
            other => panic!("expected fail, got {other:?}"),
        }

        event_loop.request_stop();
        event_loop.join().expect("join");
    }

    #[test]
    fn test_tls_setup_failure_reports_fail() {
        let event_loop = EventLoop::start(DEFAULT_THREAD_NAME).expect("loop");
        let target = Target::parse("wss://127.0.0.1:9/").expect("uri");
        let (_handle, pending) = PendingConnection::new(target);
        let (callbacks, events) = recording_callbacks();
        let refusing = || -> Result<Arc<rustls::ClientConfig>> { Err(Error::tls("refused")) };

        pending
            .start(
                &event_loop,
                ConnectionId::new(3),
                callbacks,
                TransportOptions::new(),
                Arc::new(refusing),
            )
            .expect("start");

        assert_eq!(
            events.recv_timeout(WAIT).expect("fail"),
            Seen::Fail(None, "TLS setup failed: refused".into())
        );

        event_loop.request_stop();
        event_loop.join().expect("join");
    }

    #[test]
    fn test_stop_closes_open_connection() {
        let server = EchoServer::start();
        let event_loop = EventLoop::start(DEFAULT_THREAD_NAME).expect("loop");
        let (_handle, events) = start(&event_loop, &server.url(), TransportOptions::new());

        assert!(matches!(events.recv_timeout(WAIT), Ok(Seen::Open(_))));

        event_loop.request_stop();
        event_loop.join().expect("join");

        match events.recv_timeout(WAIT).expect("close") {
            Seen::Close(info) => assert_eq!(info.code, close::GOING_AWAY),
            other => panic!("expected close, got {other:?}"),
        }
    }
}
