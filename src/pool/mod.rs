//! Backend connection pool.
//!
//! # Data Flow
//! ```text
//! Construction:
//!     literal IP → one record, NoBalancer, no resolver
//!     domain     → Resolver::resolve → one record per address
//!     → connect_all (fail fast) → spawn reconciler
//!
//! Serving (pool lock held):
//!     acquire()           → LoadBalancer::pick → shared handle
//!     report_broken(h)    → remove record → close handle → rebuild
//!
//! Reconciler (reconciler.rs):
//!     resolver change → reconcile → connect_pending (skip failures) → rebuild
//!     shutdown        → close all → close resolver → exit
//! ```
//!
//! # Design Decisions
//! - One async mutex serializes every pick, mutation and rebuild
//! - Handles are not locked while in use; HTTP/2 multiplexes internally
//! - Startup connect failures are fatal; refresh connect failures are not
//! - After shutdown, `acquire` reports `PoolError::Closed`

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use crate::config::ProxyConfig;
use crate::load_balancer::{Algorithm, LoadBalancer};
use crate::net::connection::{close_handle, Connection, ConnectionSet};
use crate::net::transport::Transport;
use crate::observability::metrics;
use crate::resolver::{Lookup, Resolver, SystemLookup};

pub mod error;
mod reconciler;

pub use error::PoolError;

/// Live set of multiplexed connections to one target.
pub struct ConnectionPool<T: Transport> {
    shared: Arc<Shared<T>>,
    closed: watch::Receiver<bool>,
}

pub(crate) struct Shared<T: Transport> {
    transport: T,
    /// "host:port" as configured, used for logs and metric labels.
    target: String,
    target_port: u16,
    domain_based: bool,
    state: Mutex<PoolState<T::Handle>>,
}

struct PoolState<H> {
    connections: ConnectionSet<H>,
    balancer: Box<dyn LoadBalancer<H>>,
    closed: bool,
}

impl<T: Transport> std::fmt::Debug for ConnectionPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("target", &self.shared.target)
            .field("domain_based", &self.shared.domain_based)
            .field("closed", &*self.closed.borrow())
            .finish()
    }
}

impl<T: Transport> ConnectionPool<T> {
    /// Build the pool and connect to every backend.
    ///
    /// The pool closes once `shutdown` reads `true` or its sender is dropped,
    /// including when it had already fired before this call.
    pub async fn connect(
        config: &ProxyConfig,
        transport: T,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self, PoolError> {
        Self::connect_with_lookup(config, transport, Arc::new(SystemLookup), shutdown).await
    }

    /// Like [`ConnectionPool::connect`], resolving domains through `lookup`.
    pub async fn connect_with_lookup(
        config: &ProxyConfig,
        transport: T,
        lookup: Arc<dyn Lookup>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self, PoolError> {
        let resolver = Resolver::with_lookup(config.dns.refresh_rate(), config.dns.need_refresh, lookup);
        Self::connect_with_resolver(config, transport, resolver, shutdown).await
    }

    /// Build the pool with a ready-made resolver.
    ///
    /// The resolver is only used when the target host is a domain name.
    pub async fn connect_with_resolver(
        config: &ProxyConfig,
        transport: T,
        mut resolver: Resolver,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self, PoolError> {
        let host = config.target_host.as_str();
        let port = config.target_port;
        let target = format!("{host}:{port}");

        let mut connections = ConnectionSet::new();
        let (algorithm, resolver) = match host.parse::<IpAddr>() {
            Ok(ip) => {
                connections.add(Connection::new(SocketAddr::new(ip, port).to_string()));
                (Algorithm::None, None)
            }
            Err(_) => {
                let algorithm = Algorithm::from_config(&config.dns.balancer);
                let addresses = resolver
                    .resolve(host, port)
                    .await
                    .map_err(|source| PoolError::Resolve {
                        host: host.to_string(),
                        source,
                    })?;
                if addresses.is_empty() {
                    tracing::warn!(upstream = %target, "Target host resolved to no addresses");
                }
                for address in addresses {
                    connections.add(Connection::new(address));
                }
                (algorithm, Some(resolver))
            }
        };

        if let Err((address, source)) = connections.connect_all(&transport).await {
            metrics::record_connect_failures(&target, "startup", 1);
            connections.close_all(&transport);
            if let Some(mut resolver) = resolver {
                resolver.close();
            }
            return Err(PoolError::Connect { address, source });
        }

        let domain_based = resolver.is_some();
        tracing::info!(
            upstream = %target,
            balancer = %algorithm,
            domain_based,
            connections = connections.len(),
            "Connection pool ready"
        );
        metrics::record_pool_size(&target, connections.len(), connections.eligible_count());

        let shared = Arc::new(Shared {
            transport,
            target,
            target_port: port,
            domain_based,
            state: Mutex::new(PoolState {
                connections,
                balancer: algorithm.build(),
                closed: false,
            }),
        });

        let (closed_tx, closed_rx) = watch::channel(false);
        tokio::spawn(reconciler::run(shared.clone(), resolver, shutdown, closed_tx));

        Ok(Self {
            shared,
            closed: closed_rx,
        })
    }

    /// Pick a connection for one request.
    pub async fn acquire(&self) -> Result<Arc<T::Handle>, PoolError> {
        let state = self.shared.state.lock().await;
        if state.closed {
            return Err(PoolError::Closed);
        }

        let handle = state
            .balancer
            .pick(state.connections.as_slice())
            .and_then(Connection::handle)
            .cloned();

        handle.ok_or_else(|| {
            metrics::record_acquire_failure(&self.shared.target);
            tracing::debug!(
                upstream = %self.shared.target,
                connections = state.connections.len(),
                "No eligible connection found"
            );
            PoolError::NoActiveConnections
        })
    }

    /// Evict the connection owning `handle` and close it.
    ///
    /// Unknown handles (already evicted or reconciled away) are ignored.
    pub async fn report_broken(&self, handle: &Arc<T::Handle>) {
        let mut guard = self.shared.state.lock().await;
        let state = &mut *guard;
        if state.closed {
            return;
        }

        let Some(index) = state.connections.position_of_handle(handle) else {
            tracing::debug!(upstream = %self.shared.target, "Broken connection already evicted");
            return;
        };
        let address = state.connections.as_slice()[index].address().to_string();

        if let Some(mut conn) = state.connections.remove_by_address(&address) {
            if let Some(owned) = conn.take_handle() {
                close_handle(&self.shared.transport, &address, &owned);
            }
        }
        state.balancer.rebuild(state.connections.as_slice());

        tracing::warn!(
            upstream = %self.shared.target,
            address = %address,
            remaining = state.connections.len(),
            "Evicted broken connection"
        );
        metrics::record_eviction(&self.shared.target);
        self.shared.record_size(state);
    }

    /// Wait until the pool has shut down.
    pub async fn wait_closed(&self) {
        let mut closed = self.closed.clone();
        let _ = closed.wait_for(|closed| *closed).await;
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Number of records currently in the set.
    pub async fn len(&self) -> usize {
        self.shared.state.lock().await.connections.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Addresses currently in the set, in set order.
    pub async fn addresses(&self) -> Vec<String> {
        let state = self.shared.state.lock().await;
        state.connections.iter().map(|c| c.address().to_string()).collect()
    }

    pub fn target_port(&self) -> u16 {
        self.shared.target_port
    }

    pub fn is_domain_based(&self) -> bool {
        self.shared.domain_based
    }

    pub fn transport(&self) -> &T {
        &self.shared.transport
    }
}

impl<T: Transport> Shared<T> {
    fn record_size(&self, state: &PoolState<T::Handle>) {
        metrics::record_pool_size(
            &self.target,
            state.connections.len(),
            state.connections.eligible_count(),
        );
    }
}
