use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

use rawhttp::config::{Config, ServeMode};
use rawhttp::http::connection::{Connection, ConnectionHandler, Responder};
use rawhttp::http::framer::{FramingError, RequestFramer};
use rawhttp::server::listener;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::{TcpListener, TcpStream};

/// Delivers one request, rejects every write and records shutdown.
struct UnwritableStream {
    request: Option<Vec<u8>>,
    shut_down: Arc<AtomicBool>,
}

impl UnwritableStream {
    fn new(request: &[u8]) -> (Self, Arc<AtomicBool>) {
        let shut_down = Arc::new(AtomicBool::new(false));
        let stream = Self {
            request: Some(request.to_vec()),
            shut_down: shut_down.clone(),
        };
        (stream, shut_down)
    }
}

impl AsyncRead for UnwritableStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if let Some(data) = self.request.take() {
            let n = data.len().min(buf.remaining());
            buf.put_slice(&data[..n]);
        }
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for UnwritableStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.shut_down.store(true, Ordering::SeqCst);
        Poll::Ready(Ok(()))
    }
}

fn ack_handler() -> Arc<ConnectionHandler> {
    Arc::new(ConnectionHandler::new(RequestFramer::default(), Responder::Ack))
}

async fn exchange(handler: Arc<ConnectionHandler>, request: &[u8]) -> String {
    let (mut client, server) = tokio::io::duplex(8192);
    client.write_all(request).await.unwrap();

    let task = tokio::spawn(async move { Connection::new(server, handler).run().await });

    let mut out = Vec::new();
    client.read_to_end(&mut out).await.unwrap();
    task.await.unwrap().unwrap();

    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn test_handle_once_returns_request() {
    let handler = ack_handler();
    let mut src: &[u8] = b"POST /form HTTP/1.1\r\nContent-Length: 3\r\n\r\na=1";

    let req = handler.handle_once(&mut src).await.unwrap();
    assert_eq!(req.path, "/form");
    assert_eq!(req.body.as_deref(), Some(&b"a=1"[..]));
}

#[tokio::test]
async fn test_handle_once_returns_framing_error() {
    let handler = ack_handler();
    let mut src: &[u8] = b"GET /x HTTP/1.1\r\nPartialHeaders";

    let res = handler.handle_once(&mut src).await;
    assert!(matches!(res, Err(FramingError::UnterminatedHeaders)));
}

#[tokio::test]
async fn test_ack_mode_replies_ok() {
    let out = exchange(ack_handler(), b"GET /anything HTTP/1.1\r\nHost: a\r\n\r\n").await;

    assert_eq!(
        out,
        "HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
    );
}

#[tokio::test]
async fn test_framing_error_replies_bad_request() {
    for request in [
        &b"BREW /pot HTTP/1.1\r\n\r\n"[..],
        &b"GET nope HTTP/1.1\r\n\r\n"[..],
        &b"no line terminator"[..],
        &b"POST /x HTTP/1.1\r\nContent-Length: abc\r\n\r\n"[..],
    ] {
        let out = exchange(ack_handler(), request).await;
        assert_eq!(
            out,
            "HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
        );
    }
}

#[tokio::test]
async fn test_static_mode_unlisted_path_is_not_found() {
    let cfg = Config::default();
    let handler = Arc::new(ConnectionHandler::from_config(&cfg));

    let out = exchange(handler, b"GET /not-listed HTTP/1.1\r\n\r\n").await;
    assert!(out.starts_with("HTTP/1.1 404 Not Found\r\n"));
}

#[tokio::test]
async fn test_server_over_tcp() {
    let mut cfg = Config::default();
    cfg.server.mode = ServeMode::Ack;
    cfg.server.workers = 2;

    let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = tcp.local_addr().unwrap();
    let server = tokio::spawn(async move { listener::serve(tcp, &cfg).await });

    for _ in 0..3 {
        let mut client = TcpStream::connect(addr).await.unwrap();
        client
            .write_all(b"POST /x HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello")
            .await
            .unwrap();

        let mut out = String::new();
        client.read_to_string(&mut out).await.unwrap();
        assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(out.contains("Connection: close\r\n"));
    }

    server.abort();
}

#[tokio::test]
async fn test_failed_write_still_shuts_down() {
    let (mut stream, shut_down) = UnwritableStream::new(b"GET /x HTTP/1.1\r\n\r\n");

    let res = Connection::new(&mut stream, ack_handler()).run().await;

    assert!(res.is_err());
    assert!(shut_down.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_failed_bad_request_write_is_not_an_error() {
    let (mut stream, shut_down) = UnwritableStream::new(b"BREW /pot HTTP/1.1\r\n\r\n");

    let res = Connection::new(&mut stream, ack_handler()).run().await;

    assert!(res.is_ok());
    assert!(shut_down.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_server_survives_abandoned_connections() {
    let mut cfg = Config::default();
    cfg.server.mode = ServeMode::Ack;
    cfg.server.workers = 1;

    let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = tcp.local_addr().unwrap();
    let server = tokio::spawn(async move { listener::serve(tcp, &cfg).await });

    // Connects and leaves without sending anything.
    drop(TcpStream::connect(addr).await.unwrap());

    // Sends half a request line and leaves.
    let mut partial = TcpStream::connect(addr).await.unwrap();
    partial.write_all(b"GET /ha").await.unwrap();
    drop(partial);

    let mut client = TcpStream::connect(addr).await.unwrap();
    client.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();

    let mut out = String::new();
    client.read_to_string(&mut out).await.unwrap();
    assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(!server.is_finished());

    server.abort();
}
