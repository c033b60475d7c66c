//! DNS resolution for domain-based targets.
//!
//! # Data Flow
//! ```text
//! Pool construction:
//!     resolve(host, port) → initial address list (awaited)
//!     → background watch task (when refresh is enabled)
//!
//! Every refresh interval:
//!     Lookup → sort + dedup → compare with last result
//!     → publish on the watch channel only when different
//!
//! Pool reconciliation task:
//!     changed().await → current_addresses() → reconcile
//! ```
//!
//! # Design Decisions
//! - Lookup is a trait so tests can script DNS answers
//! - Refresh lookup failures keep the previous address set
//! - With refresh disabled the initial answer is static and
//!   `changed()` never completes

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Source of address records for a host.
pub trait Lookup: Send + Sync + 'static {
    /// Resolve `host` and return every address as "ip:port".
    fn lookup<'a>(&'a self, host: &'a str, port: u16) -> BoxFuture<'a, io::Result<Vec<String>>>;
}

/// Lookup through the operating system resolver.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLookup;

impl Lookup for SystemLookup {
    fn lookup<'a>(&'a self, host: &'a str, port: u16) -> BoxFuture<'a, io::Result<Vec<String>>> {
        Box::pin(async move {
            let addrs = tokio::net::lookup_host((host, port)).await?;
            Ok(addrs.map(|a: SocketAddr| a.to_string()).collect())
        })
    }
}

/// Watches a domain and reports when its address set changes.
pub struct Resolver {
    refresh_rate: Duration,
    need_refresh: bool,
    lookup: Arc<dyn Lookup>,
    addresses: Option<watch::Receiver<Vec<String>>>,
    watch_task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("refresh_rate", &self.refresh_rate)
            .field("need_refresh", &self.need_refresh)
            .field("watching", &self.watch_task.is_some())
            .finish()
    }
}

impl Resolver {
    /// A resolver backed by the system lookup.
    pub fn new(refresh_rate: Duration, need_refresh: bool) -> Self {
        Self::with_lookup(refresh_rate, need_refresh, Arc::new(SystemLookup))
    }

    pub fn with_lookup(refresh_rate: Duration, need_refresh: bool, lookup: Arc<dyn Lookup>) -> Self {
        Self {
            refresh_rate,
            need_refresh,
            lookup,
            addresses: None,
            watch_task: None,
        }
    }

    /// Resolve `host` once and, if enabled, start watching it.
    pub async fn resolve(&mut self, host: &str, port: u16) -> io::Result<Vec<String>> {
        let initial = normalize(self.lookup.lookup(host, port).await?);
        tracing::info!(host = %host, addresses = ?initial, "Resolved target host");

        let (tx, rx) = watch::channel(initial.clone());
        self.addresses = Some(rx);

        if self.need_refresh && !self.refresh_rate.is_zero() {
            self.close();
            self.watch_task = Some(tokio::spawn(watch_host(
                self.lookup.clone(),
                host.to_string(),
                port,
                self.refresh_rate,
                tx,
            )));
        }

        Ok(initial)
    }

    /// Latest resolved address set.
    pub fn current_addresses(&self) -> Vec<String> {
        self.addresses
            .as_ref()
            .map(|rx| rx.borrow().clone())
            .unwrap_or_default()
    }

    /// Wait until a refresh produced a different address set.
    ///
    /// Never completes when nothing is being watched.
    pub async fn changed(&mut self) {
        if let Some(rx) = self.addresses.as_mut() {
            if rx.changed().await.is_ok() {
                return;
            }
        }
        // Nothing watched, or the watch task ended.
        std::future::pending::<()>().await;
    }

    /// Stop watching. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(task) = self.watch_task.take() {
            task.abort();
            tracing::debug!("Resolver watch stopped");
        }
    }
}

impl Drop for Resolver {
    fn drop(&mut self) {
        self.close();
    }
}

async fn watch_host(
    lookup: Arc<dyn Lookup>,
    host: String,
    port: u16,
    refresh_rate: Duration,
    tx: watch::Sender<Vec<String>>,
) {
    let mut ticker = tokio::time::interval(refresh_rate);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // First tick completes immediately; the initial answer is already known.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if tx.is_closed() {
            break;
        }

        let fresh = match lookup.lookup(&host, port).await {
            Ok(addrs) => normalize(addrs),
            Err(e) => {
                tracing::warn!(host = %host, error = %e, "DNS refresh failed, keeping previous addresses");
                continue;
            }
        };

        tx.send_if_modified(|current| {
            if *current == fresh {
                return false;
            }
            tracing::info!(host = %host, previous = ?current, addresses = ?fresh, "Target host addresses changed");
            *current = fresh;
            true
        });
    }
}

fn normalize(mut addrs: Vec<String>) -> Vec<String> {
    addrs.sort();
    addrs.dedup();
    addrs
}
