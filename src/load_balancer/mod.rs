//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! acquire() on the pool (pool lock held)
//!     → LoadBalancer::pick over the connection set
//!         - none.rs (first eligible connection)
//!         - round_robin.rs (rotate through positions)
//!         - random.rs (uniform samples)
//!     → Return an eligible connection or nothing
//!
//! Any mutation of the connection set (pool lock held)
//!     → LoadBalancer::rebuild (re-tune internal state)
//! ```
//!
//! # Design Decisions
//! - Strategies only ever see the set under the pool lock
//! - Bounded retries: a pick gives up after `MAX_RETRIES` misses
//! - Unknown algorithm names fall back to `None` instead of failing

use std::fmt;
use std::str::FromStr;

use crate::net::connection::Connection;

pub mod none;
pub mod random;
pub mod round_robin;

pub use none::NoBalancer;
pub use random::RandomBalancer;
pub use round_robin::RoundRobin;

/// Maximum number of attempts to find an eligible connection in one pick.
pub const MAX_RETRIES: usize = 10;

/// Selection strategy over a connection set.
pub trait LoadBalancer<H>: Send + Sync + fmt::Debug {
    /// Return an active, connected record, or `None` if none was found.
    fn pick<'a>(&self, connections: &'a [Connection<H>]) -> Option<&'a Connection<H>>;

    /// Called after every mutation of the set.
    fn rebuild(&self, connections: &[Connection<H>]);
}

/// Supported balancing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    #[default]
    None,
    RoundRobin,
    Random,
}

impl Algorithm {
    /// Parse a configured name, falling back to [`Algorithm::None`].
    pub fn from_config(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            tracing::warn!(balancer = %name, fallback = %Algorithm::None, "Invalid balancer, using default");
            Algorithm::None
        })
    }

    /// Build a fresh balancer for this algorithm.
    pub fn build<H: 'static>(self) -> Box<dyn LoadBalancer<H>> {
        match self {
            Algorithm::None => Box::new(NoBalancer),
            Algorithm::RoundRobin => Box::new(RoundRobin::new()),
            Algorithm::Random => Box::new(RandomBalancer),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Algorithm::None => "none",
            Algorithm::RoundRobin => "round_robin",
            Algorithm::Random => "random",
        })
    }
}

/// Error for an unrecognised algorithm name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown balancing algorithm: {0:?}")]
pub struct UnknownAlgorithm(pub String);

impl FromStr for Algorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Algorithm::None),
            "round_robin" => Ok(Algorithm::RoundRobin),
            "random" => Ok(Algorithm::Random),
            other => Err(UnknownAlgorithm(other.to_string())),
        }
    }
}
