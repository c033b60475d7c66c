//! Shared utilities for integration tests.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use bytes::Bytes;
use http_body_util::{BodyExt, Empty, Full};
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::{TokioExecutor, TokioIo};
use tokio::net::TcpListener;

use h2_pool::net::ProxyBody;

/// Serve HTTP/2 (prior knowledge) on `listener`, answering every request
/// with `200 ok`.
pub fn serve_h2(listener: TcpListener) {
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let service = service_fn(|_req: Request<hyper::body::Incoming>| async {
                    Ok::<_, Infallible>(Response::new(Full::new(Bytes::from_static(b"ok"))))
                });
                let _ = hyper::server::conn::http2::Builder::new(TokioExecutor::new())
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });
}

/// Start an HTTP/2 backend on an ephemeral loopback port.
pub async fn start_h2_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    serve_h2(listener);
    addr
}

/// Start a backend on every address `host` resolves to, sharing one port.
///
/// Returns `None` when one of the addresses cannot be bound (e.g. no IPv6).
#[allow(dead_code)]
pub async fn start_h2_backends_for(host: &str) -> Option<u16> {
    let first = TcpListener::bind("127.0.0.1:0").await.ok()?;
    let port = first.local_addr().ok()?.port();

    let mut ips: Vec<IpAddr> = tokio::net::lookup_host((host, port))
        .await
        .ok()?
        .map(|a| a.ip())
        .collect();
    ips.sort();
    ips.dedup();

    let mut listeners = vec![first];
    for ip in ips.into_iter().filter(|ip| *ip != IpAddr::from([127, 0, 0, 1])) {
        listeners.push(TcpListener::bind(SocketAddr::new(ip, port)).await.ok()?);
    }
    for listener in listeners {
        serve_h2(listener);
    }
    Some(port)
}

/// An empty request body.
pub fn empty_body() -> ProxyBody {
    Empty::<Bytes>::new().map_err(|never| match never {}).boxed()
}
