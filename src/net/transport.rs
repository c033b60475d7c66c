//! HTTP/2 transport to backends.
//!
//! # Responsibilities
//! - Dial a backend address over TCP
//! - Perform the HTTP/2 (prior knowledge) handshake
//! - Drive the connection in a background task
//! - Close a connection on eviction

use std::time::Duration;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use http_body_util::combinators::BoxBody;
use hyper::client::conn::http2;
use hyper_util::rt::{TokioExecutor, TokioIo};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

/// Body type carried over backend connections.
pub type ProxyBody = BoxBody<Bytes, hyper::Error>;

/// Errors raised while dialing or closing a backend connection.
#[derive(Debug, Error)]
pub enum TransportError {
    /// TCP connect failed.
    #[error("connect failed: {0}")]
    Connect(#[from] std::io::Error),

    /// Dial + handshake did not finish in time.
    #[error("connect timed out after {0:?}")]
    Timeout(Duration),

    /// HTTP/2 handshake failed.
    #[error("HTTP/2 handshake failed: {0}")]
    Handshake(#[from] hyper::Error),

    /// The connection was already closed.
    #[error("connection already closed")]
    Closed,
}

/// Capability the pool uses to open and close backend connections.
pub trait Transport: Send + Sync + 'static {
    /// A single multiplexed connection.
    type Handle: Send + Sync + 'static;

    /// Open a connection to `address` ("host:port").
    fn dial<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Result<Self::Handle, TransportError>>;

    /// Close a connection previously returned by [`Transport::dial`].
    fn close(&self, handle: &Self::Handle) -> Result<(), TransportError>;
}

/// An established HTTP/2 client connection.
#[derive(Debug)]
pub struct Http2Connection {
    address: String,
    sender: http2::SendRequest<ProxyBody>,
    driver: JoinHandle<()>,
}

impl Http2Connection {
    /// Backend address this connection was dialed to.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// A request sender for this connection.
    ///
    /// Senders are cheap to clone; every clone multiplexes over the same
    /// connection.
    pub fn sender(&self) -> http2::SendRequest<ProxyBody> {
        self.sender.clone()
    }

    /// Whether the underlying connection has gone away.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed() || self.driver.is_finished()
    }
}

/// Plain-text HTTP/2 transport backed by Tokio.
#[derive(Debug, Clone, Default)]
pub struct Http2Transport {
    /// Bound on dial + handshake. `None` waits as long as the OS does.
    connect_timeout: Option<Duration>,
}

impl Http2Transport {
    pub fn new(connect_timeout: Option<Duration>) -> Self {
        Self { connect_timeout }
    }

    async fn open(address: &str) -> Result<Http2Connection, TransportError> {
        let stream = TcpStream::connect(address).await?;
        stream.set_nodelay(true)?;

        let (sender, conn) = http2::Builder::new(TokioExecutor::new())
            .handshake(TokioIo::new(stream))
            .await?;

        let peer = address.to_string();
        let driver = tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!(address = %peer, error = %e, "HTTP/2 connection terminated");
            }
        });

        Ok(Http2Connection {
            address: address.to_string(),
            sender,
            driver,
        })
    }
}

impl Transport for Http2Transport {
    type Handle = Http2Connection;

    fn dial<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Result<Self::Handle, TransportError>> {
        Box::pin(async move {
            let conn = match self.connect_timeout {
                Some(limit) => tokio::time::timeout(limit, Self::open(address))
                    .await
                    .map_err(|_| TransportError::Timeout(limit))??,
                None => Self::open(address).await?,
            };
            tracing::debug!(address = %address, "HTTP/2 connection established");
            Ok(conn)
        })
    }

    fn close(&self, handle: &Http2Connection) -> Result<(), TransportError> {
        if handle.driver.is_finished() {
            return Err(TransportError::Closed);
        }
        handle.driver.abort();
        Ok(())
    }
}
