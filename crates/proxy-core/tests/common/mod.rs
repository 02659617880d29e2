//! In-process origin server for proxy tests.

#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// A running origin that counts the requests it receives.
pub struct TestOrigin {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl TestOrigin {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Start an origin on an ephemeral port. It lives until the test runtime stops.
pub async fn spawn_origin() -> TestOrigin {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind origin");
    let addr = listener.local_addr().expect("origin addr");
    let hits = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&hits);
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let counter = Arc::clone(&counter);
            tokio::spawn(async move {
                let service = service_fn(move |request: Request<Incoming>| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async move { Ok::<_, Infallible>(respond(request).await) }
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });

    TestOrigin { addr, hits }
}

/// An address nothing is listening on.
pub async fn unreachable_origin() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{}", addr)
}

/// An origin that promises `content-length: 10`, sends three bytes and hangs up.
pub async fn truncating_origin() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let _ = stream
                    .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 10\r\n\r\nabc")
                    .await;
                let _ = stream.shutdown().await;
            });
        }
    });
    format!("http://{}", addr)
}

async fn respond(request: Request<Incoming>) -> Response<Full<Bytes>> {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let query = request.uri().query().unwrap_or_default().to_string();
    let host = request
        .headers()
        .get("host")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let hits_header = request
        .headers()
        .get("x-test")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = request.into_body().collect().await.map(|b| b.to_bytes()).unwrap_or_default();

    let builder = Response::builder();
    let response = match path.as_str() {
        "/foo" => builder
            .header("content-type", "text/plain")
            .body(if method == Method::HEAD { Bytes::new() } else { Bytes::from_static(b"hello") }),
        "/echo" => builder
            .header("x-echo-method", method.as_str())
            .header("x-echo-test", hits_header)
            .body(body),
        "/query" => builder.body(Bytes::from(query)),
        "/host" => builder.body(Bytes::from(host)),
        "/missing" => builder
            .status(StatusCode::NOT_FOUND)
            .body(Bytes::from_static(b"not here")),
        "/cookies" => builder
            .header("set-cookie", "a=1")
            .header("set-cookie", "b=2")
            .body(Bytes::from_static(b"cookies")),
        "/spoof" => builder
            .header("x-cache", "HIT")
            .body(Bytes::from_static(b"spoof")),
        _ => builder
            .status(StatusCode::NOT_FOUND)
            .body(Bytes::new()),
    };

    response.map(|r| r.map(Full::new)).expect("valid response")
}
