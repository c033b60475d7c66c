//! Round-robin load balancing strategy.

use std::sync::{Mutex, PoisonError};

use rand::Rng;

use crate::load_balancer::{LoadBalancer, MAX_RETRIES};
use crate::net::connection::Connection;

/// Round-robin selector.
///
/// Keeps a cursor into the set behind its own lock. The cursor moves on every
/// attempt, hit or miss, so consecutive picks rotate through all positions.
#[derive(Debug, Default)]
pub struct RoundRobin {
    next: Mutex<usize>,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    fn cursor(&self) -> std::sync::MutexGuard<'_, usize> {
        self.next.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<H> LoadBalancer<H> for RoundRobin {
    fn pick<'a>(&self, connections: &'a [Connection<H>]) -> Option<&'a Connection<H>> {
        let len = connections.len();
        if len == 0 {
            return None;
        }

        let mut next = self.cursor();
        for _ in 0..MAX_RETRIES {
            let index = *next % len;
            *next = (index + 1) % len;
            let conn = &connections[index];
            if conn.is_eligible() {
                return Some(conn);
            }
        }
        None
    }

    /// Reseed the cursor at a random position after membership changes.
    fn rebuild(&self, connections: &[Connection<H>]) {
        if connections.is_empty() {
            return;
        }
        *self.cursor() = rand::thread_rng().gen_range(0..connections.len());
    }
}
