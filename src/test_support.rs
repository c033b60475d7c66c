//! In-memory transport and lookup doubles for unit tests.

use std::collections::HashSet;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;

use crate::load_balancer::{LoadBalancer, NoBalancer};
use crate::net::connection::Connection;
use crate::net::transport::{Transport, TransportError};
use crate::resolver::Lookup;

/// Stand-in for a multiplexed connection.
#[derive(Debug)]
pub struct FakeHandle {
    pub address: String,
    closed: AtomicBool,
}

impl FakeHandle {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Transport that only reaches the addresses it was told about.
///
/// Clones share state, so a test can keep observing a transport it handed
/// to a pool.
#[derive(Debug, Default, Clone)]
pub struct FakeTransport {
    inner: Arc<FakeTransportState>,
}

#[derive(Debug, Default)]
pub struct FakeTransportState {
    reachable: Mutex<HashSet<String>>,
    dials: Mutex<Vec<String>>,
    close_attempts: AtomicUsize,
}

impl std::ops::Deref for FakeTransport {
    type Target = FakeTransportState;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl FakeTransport {
    pub fn new<'a>(reachable: impl IntoIterator<Item = &'a str>) -> Self {
        let transport = Self::default();
        for address in reachable {
            transport.set_reachable(address, true);
        }
        transport
    }

    pub fn set_reachable(&self, address: &str, reachable: bool) {
        let mut set = self.reachable.lock().unwrap();
        if reachable {
            set.insert(address.to_string());
        } else {
            set.remove(address);
        }
    }

    pub fn dials(&self) -> Vec<String> {
        self.dials.lock().unwrap().clone()
    }

    pub fn close_attempts(&self) -> usize {
        self.close_attempts.load(Ordering::SeqCst)
    }
}

impl Transport for FakeTransport {
    type Handle = FakeHandle;

    fn dial<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Result<FakeHandle, TransportError>> {
        Box::pin(async move {
            self.dials.lock().unwrap().push(address.to_string());
            if self.reachable.lock().unwrap().contains(address) {
                Ok(FakeHandle::new(address))
            } else {
                Err(TransportError::Connect(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    format!("{address} refused"),
                )))
            }
        })
    }

    fn close(&self, handle: &FakeHandle) -> Result<(), TransportError> {
        self.close_attempts.fetch_add(1, Ordering::SeqCst);
        if handle.closed.swap(true, Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        Ok(())
    }
}

/// Lookup whose answer the test controls.
#[derive(Debug, Default)]
pub struct ScriptedLookup {
    answer: Mutex<Option<Vec<String>>>,
    calls: AtomicUsize,
}

impl ScriptedLookup {
    pub fn new(addresses: &[&str]) -> Self {
        let lookup = Self::default();
        lookup.set(addresses);
        lookup
    }

    pub fn set(&self, addresses: &[&str]) {
        *self.answer.lock().unwrap() = Some(addresses.iter().map(|a| a.to_string()).collect());
    }

    /// Make every following lookup fail.
    pub fn fail(&self) {
        *self.answer.lock().unwrap() = None;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Lookup for ScriptedLookup {
    fn lookup<'a>(&'a self, host: &'a str, _port: u16) -> BoxFuture<'a, io::Result<Vec<String>>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no records for {host}")))
        })
    }
}

/// First-eligible balancer that counts `rebuild` calls.
///
/// Clones share the counter, so a test can keep one after boxing another
/// into a pool.
#[derive(Debug, Default, Clone)]
pub struct RecordingBalancer {
    rebuilds: Arc<AtomicUsize>,
}

impl RecordingBalancer {
    pub fn rebuilds(&self) -> usize {
        self.rebuilds.load(Ordering::SeqCst)
    }
}

impl<H> LoadBalancer<H> for RecordingBalancer {
    fn pick<'a>(&self, connections: &'a [Connection<H>]) -> Option<&'a Connection<H>> {
        NoBalancer.pick(connections)
    }

    fn rebuild(&self, _connections: &[Connection<H>]) {
        self.rebuilds.fetch_add(1, Ordering::SeqCst);
    }
}
