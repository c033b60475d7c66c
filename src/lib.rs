//! HTTP/2 backend connection pool for a reverse proxy.
//!
//! Keeps one multiplexed connection per backend address, picks among them
//! with a configurable balancer and follows DNS changes at runtime.

pub mod config;
pub mod lifecycle;
pub mod load_balancer;
pub mod net;
pub mod observability;
pub mod pool;
pub mod resolver;

#[cfg(test)]
mod test_support;

pub use config::schema::ProxyConfig;
pub use lifecycle::Shutdown;
pub use pool::{ConnectionPool, PoolError};
