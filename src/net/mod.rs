//! Backend network layer.
//!
//! # Data Flow
//! ```text
//! Resolved backend address ("host:port")
//!     → transport.rs (TCP dial + HTTP/2 handshake)
//!     → connection.rs (record in the connection set)
//!     → Handed to the load balancer for selection
//!
//! Connection States:
//!     Inactive → Active/Unconnected → Active/Connected → Removed (handle closed)
//! ```
//!
//! # Design Decisions
//! - One multiplexed HTTP/2 connection per backend address
//! - Handles are shared (`Arc`); the pool owns them until removal
//! - Transport is a trait so the pool can run against fakes in tests

pub mod connection;
pub mod transport;

pub use connection::{Connection, ConnectionSet};
pub use transport::{Http2Connection, Http2Transport, ProxyBody, Transport, TransportError};
