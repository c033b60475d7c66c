//! Backend connection records and the operations over a set of them.
//!
//! # Responsibilities
//! - Represent one backend address and its (optional) live handle
//! - Keep addresses unique within a set
//! - Connect pending records, either fail-fast or best-effort
//! - Reconcile the set against a freshly resolved address list
//! - Hand removed records back to the caller so their handles get closed

use std::collections::HashSet;
use std::sync::Arc;

use crate::net::transport::{Transport, TransportError};

/// One backend address and its connection.
///
/// A record is "connected" exactly when it holds a handle.
#[derive(Debug)]
pub struct Connection<H> {
    address: String,
    handle: Option<Arc<H>>,
    active: bool,
}

impl<H> Connection<H> {
    /// A record for `address` that is eligible for connecting.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            handle: None,
            active: true,
        }
    }

    /// A record that will be skipped by connect passes and pickers.
    pub fn inactive(address: impl Into<String>) -> Self {
        Self {
            active: false,
            ..Self::new(address)
        }
    }

    /// A record that already owns a live handle.
    pub fn with_handle(address: impl Into<String>, handle: H) -> Self {
        Self {
            handle: Some(Arc::new(handle)),
            ..Self::new(address)
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn handle(&self) -> Option<&Arc<H>> {
        self.handle.as_ref()
    }

    pub fn take_handle(&mut self) -> Option<Arc<H>> {
        self.handle.take()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// Active and connected: the only records a balancer may return.
    pub fn is_eligible(&self) -> bool {
        self.active && self.is_connected()
    }

    fn is_pending(&self) -> bool {
        self.active && !self.is_connected()
    }
}

/// Ordered collection of connections with unique addresses.
#[derive(Debug)]
pub struct ConnectionSet<H> {
    connections: Vec<Connection<H>>,
}

impl<H> Default for ConnectionSet<H> {
    fn default() -> Self {
        Self {
            connections: Vec::new(),
        }
    }
}

impl<H> ConnectionSet<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn as_slice(&self) -> &[Connection<H>] {
        &self.connections
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection<H>> {
        self.connections.iter()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Connection<H>> {
        self.connections.get_mut(index)
    }

    pub fn contains(&self, address: &str) -> bool {
        self.connections.iter().any(|c| c.address == address)
    }

    /// Number of records a balancer could currently return.
    pub fn eligible_count(&self) -> usize {
        self.connections.iter().filter(|c| c.is_eligible()).count()
    }

    /// Append `candidate` unless its address is empty or already present.
    ///
    /// Returns whether the record was added.
    pub fn add(&mut self, candidate: Connection<H>) -> bool {
        if candidate.address.is_empty() || self.contains(&candidate.address) {
            return false;
        }
        self.connections.push(candidate);
        true
    }

    /// Index of the record holding exactly this handle.
    pub fn position_of_handle(&self, handle: &Arc<H>) -> Option<usize> {
        self.connections
            .iter()
            .position(|c| c.handle.as_ref().is_some_and(|h| Arc::ptr_eq(h, handle)))
    }

    /// Remove the record for `address` by swapping in the last record.
    pub fn remove_by_address(&mut self, address: &str) -> Option<Connection<H>> {
        let index = self.connections.iter().position(|c| c.address == address)?;
        Some(self.connections.swap_remove(index))
    }

    /// Bring the set in line with `fresh` addresses.
    ///
    /// Records whose address vanished are removed and returned; new
    /// addresses are appended as active, unconnected records. Records present
    /// on both sides keep their handle and position.
    pub fn reconcile<S: AsRef<str>>(&mut self, fresh: &[S]) -> Vec<Connection<H>> {
        let wanted: HashSet<&str> = fresh.iter().map(AsRef::as_ref).collect();

        let (kept, removed): (Vec<_>, Vec<_>) = std::mem::take(&mut self.connections)
            .into_iter()
            .partition(|c| wanted.contains(c.address.as_str()));
        self.connections = kept;

        for address in fresh {
            self.add(Connection::new(address.as_ref()));
        }

        removed
    }

    /// Close every handle and empty the set. Close failures are logged only.
    pub fn close_all<T>(&mut self, transport: &T)
    where
        T: Transport<Handle = H>,
    {
        for mut conn in self.connections.drain(..) {
            if let Some(handle) = conn.take_handle() {
                close_handle(transport, &conn.address, &handle);
            }
        }
    }
}

impl<H: Send + Sync + 'static> ConnectionSet<H> {
    /// Dial every active, unconnected record.
    ///
    /// Stops at the first failure. Records connected before the failure keep
    /// their handles.
    pub async fn connect_all<T>(&mut self, transport: &T) -> Result<(), (String, TransportError)>
    where
        T: Transport<Handle = H>,
    {
        for conn in self.connections.iter_mut().filter(|c| c.is_pending()) {
            match transport.dial(&conn.address).await {
                Ok(handle) => conn.handle = Some(Arc::new(handle)),
                Err(e) => return Err((conn.address.clone(), e)),
            }
        }
        Ok(())
    }

    /// Dial every active, unconnected record, skipping failures.
    ///
    /// Failed records stay pending so a later pass retries them. Returns the
    /// number of failures.
    pub async fn connect_pending<T>(&mut self, transport: &T) -> usize
    where
        T: Transport<Handle = H>,
    {
        let mut failures = 0;
        for conn in self.connections.iter_mut().filter(|c| c.is_pending()) {
            match transport.dial(&conn.address).await {
                Ok(handle) => conn.handle = Some(Arc::new(handle)),
                Err(e) => {
                    failures += 1;
                    tracing::warn!(address = %conn.address, error = %e, "Failed to connect to backend, skipping");
                }
            }
        }
        failures
    }
}

/// Close a single handle, logging instead of propagating failure.
pub fn close_handle<T: Transport>(transport: &T, address: &str, handle: &T::Handle) {
    if let Err(e) = transport.close(handle) {
        tracing::warn!(address = %address, error = %e, "Error closing backend connection");
    }
}
