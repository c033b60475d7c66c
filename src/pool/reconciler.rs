//! Background task keeping the pool in line with DNS.
//!
//! One task per pool, parked on either the shutdown signal or a resolver
//! change. Static pools have no resolver and only wait for shutdown.

use std::sync::Arc;

use tokio::sync::watch;

use crate::net::connection::close_handle;
use crate::lifecycle::shutdown::wait_for_shutdown;
use crate::net::transport::Transport;
use crate::observability::metrics;
use crate::pool::Shared;
use crate::resolver::Resolver;

pub(crate) async fn run<T: Transport>(
    shared: Arc<Shared<T>>,
    mut resolver: Option<Resolver>,
    mut shutdown: watch::Receiver<bool>,
    closed: watch::Sender<bool>,
) {
    loop {
        tokio::select! {
            _ = wait_for_shutdown(&mut shutdown) => break,
            _ = next_change(&mut resolver) => {
                let fresh = resolver
                    .as_ref()
                    .map(Resolver::current_addresses)
                    .unwrap_or_default();
                shared.refresh(&fresh).await;
            }
        }
    }

    shared.close().await;
    if let Some(resolver) = resolver.as_mut() {
        resolver.close();
    }
    let _ = closed.send(true);
}

async fn next_change(resolver: &mut Option<Resolver>) {
    match resolver {
        Some(resolver) => resolver.changed().await,
        None => std::future::pending().await,
    }
}

impl<T: Transport> Shared<T> {
    /// Reconcile against `fresh` and connect whatever is new.
    ///
    /// Connect failures are logged and the record stays pending for the next
    /// change.
    async fn refresh(&self, fresh: &[String]) {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        if state.closed {
            return;
        }

        let removed = state.connections.reconcile(fresh);
        let removed_count = removed.len();
        for mut conn in removed {
            if let Some(handle) = conn.take_handle() {
                close_handle(&self.transport, conn.address(), &handle);
            }
        }

        let failures = state.connections.connect_pending(&self.transport).await;
        state.balancer.rebuild(state.connections.as_slice());

        tracing::info!(
            upstream = %self.target,
            removed = removed_count,
            failed = failures,
            connections = state.connections.len(),
            eligible = state.connections.eligible_count(),
            "Connections refreshed"
        );
        metrics::record_refresh(&self.target);
        metrics::record_connect_failures(&self.target, "refresh", failures);
        self.record_size(state);
    }

    /// Close every connection and refuse further use.
    async fn close(&self) {
        let mut state = self.state.lock().await;
        if state.closed {
            return;
        }
        state.closed = true;

        let count = state.connections.len();
        state.connections.close_all(&self.transport);
        tracing::info!(upstream = %self.target, closed = count, "Connection pool shut down");
        metrics::record_pool_size(&self.target, 0, 0);
    }
}
