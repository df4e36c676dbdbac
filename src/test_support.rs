//! Local WebSocket servers for tests.

// ============================================================================
// Imports
// ============================================================================

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener as StdTcpListener, TcpStream as StdTcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::header::SERVER;
use tokio_tungstenite::tungstenite::http::{HeaderValue, StatusCode};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

// ============================================================================
// Helpers
// ============================================================================

/// Polls `condition` until it holds or `limit` elapses.
pub fn wait_for(limit: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}

fn bind_local() -> StdTcpListener {
    StdTcpListener::bind("127.0.0.1:0").expect("bind test listener")
}

// ============================================================================
// EchoServer
// ============================================================================

/// Echo server on its own thread.
///
/// - Text and binary frames are echoed
/// - `close-me` makes the server close with 4000 "requested"
/// - `binary-dead` is answered with the binary frame `DE AD`
/// - Upgrades to [`REJECT_PATH`](Self::REJECT_PATH) get a 403
pub struct EchoServer {
    addr: SocketAddr,
    received_closes: Arc<Mutex<Vec<u16>>>,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl EchoServer {
    /// Value of the `Server` header on every response.
    pub const SERVER_NAME: &'static str = "echo-test/1.0";

    /// Path whose upgrade requests are refused.
    pub const REJECT_PATH: &'static str = "/reject";

    /// Close code the server uses for `close-me`.
    pub const REQUESTED_CLOSE_CODE: u16 = 4000;

    pub fn start() -> Self {
        Self::with_upgrade_delay(Duration::ZERO)
    }

    /// Like [`start`](Self::start), but every upgrade is answered only
    /// after `delay`.
    pub fn with_upgrade_delay(delay: Duration) -> Self {
        let listener = bind_local();
        listener.set_nonblocking(true).expect("nonblocking listener");
        let addr = listener.local_addr().expect("listener addr");

        let received_closes = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let closes = Arc::clone(&received_closes);
        let thread = thread::Builder::new()
            .name("echo-server".into())
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("server runtime");

                runtime.block_on(async move {
                    let listener = TcpListener::from_std(listener).expect("tokio listener");
                    loop {
                        tokio::select! {
                            _ = &mut shutdown_rx => break,
                            accepted = listener.accept() => {
                                if let Ok((stream, _)) = accepted {
                                    tokio::spawn(serve(stream, delay, Arc::clone(&closes)));
                                }
                            }
                        }
                    }
                });
            })
            .expect("spawn echo server");

        Self {
            addr,
            received_closes,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        }
    }

    pub fn url(&self) -> String {
        format!("ws://{}/echo", self.addr)
    }

    pub fn rejecting_url(&self) -> String {
        format!("ws://{}{}", self.addr, Self::REJECT_PATH)
    }

    /// Close codes received from clients so far.
    pub fn received_closes(&self) -> Vec<u16> {
        self.received_closes.lock().clone()
    }
}

impl Drop for EchoServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

async fn serve(stream: TcpStream, delay: Duration, closes: Arc<Mutex<Vec<u16>>>) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let callback = |request: &Request, mut response: Response| -> Result<Response, ErrorResponse> {
        let server = HeaderValue::from_static(EchoServer::SERVER_NAME);

        if request.uri().path() == EchoServer::REJECT_PATH {
            let mut refusal = ErrorResponse::new(Some("rejected".to_owned()));
            *refusal.status_mut() = StatusCode::FORBIDDEN;
            refusal.headers_mut().insert(SERVER, server);
            return Err(refusal);
        }

        response.headers_mut().insert(SERVER, server);
        Ok(response)
    };

    let Ok(mut ws) = accept_hdr_async(stream, callback).await else {
        return;
    };

    while let Some(Ok(message)) = ws.next().await {
        match message {
            Message::Text(text) if text.as_str() == "close-me" => {
                let frame = CloseFrame {
                    code: CloseCode::from(EchoServer::REQUESTED_CLOSE_CODE),
                    reason: "requested".into(),
                };
                let _ = ws.close(Some(frame)).await;
            }
            Message::Text(text) if text.as_str() == "binary-dead" => {
                let _ = ws.send(Message::binary(vec![0xDE, 0xAD])).await;
            }
            Message::Text(_) | Message::Binary(_) => {
                let _ = ws.send(message).await;
            }
            Message::Close(frame) => {
                let code = frame.map_or(1005, |f| u16::from(f.code));
                closes.lock().push(code);
            }
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
        }
    }
}

// ============================================================================
// SilentServer
// ============================================================================

/// Accepts TCP connections and never answers the upgrade request.
pub struct SilentServer {
    addr: SocketAddr,
    stopping: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl SilentServer {
    pub fn start() -> Self {
        let listener = bind_local();
        let addr = listener.local_addr().expect("listener addr");
        let stopping = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&stopping);
        let thread = thread::Builder::new()
            .name("silent-server".into())
            .spawn(move || {
                let mut held = Vec::new();
                for stream in listener.incoming() {
                    if flag.load(Ordering::SeqCst) {
                        break;
                    }
                    match stream {
                        Ok(stream) => held.push(stream),
                        Err(e) if e.kind() == ErrorKind::Interrupted => {}
                        Err(_) => break,
                    }
                }
            })
            .expect("spawn silent server");

        Self {
            addr,
            stopping,
            thread: Some(thread),
        }
    }

    pub fn url(&self) -> String {
        format!("ws://{}/", self.addr)
    }
}

impl Drop for SilentServer {
    fn drop(&mut self) {
        self.stopping.store(true, Ordering::SeqCst);
        // Wake the blocking accept
        let _ = StdTcpStream::connect(self.addr);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
