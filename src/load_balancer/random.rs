//! Random load balancing strategy.

use rand::Rng;

use crate::load_balancer::{LoadBalancer, MAX_RETRIES};
use crate::net::connection::Connection;

/// Samples uniformly random positions until one is eligible.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomBalancer;

impl RandomBalancer {
    fn pick_with<'a, H>(
        connections: &'a [Connection<H>],
        mut sample: impl FnMut(usize) -> usize,
    ) -> Option<&'a Connection<H>> {
        if connections.is_empty() {
            return None;
        }
        (0..MAX_RETRIES)
            .map(|_| &connections[sample(connections.len())])
            .find(|c| c.is_eligible())
    }
}

impl<H> LoadBalancer<H> for RandomBalancer {
    fn pick<'a>(&self, connections: &'a [Connection<H>]) -> Option<&'a Connection<H>> {
        let mut rng = rand::thread_rng();
        Self::pick_with(connections, |len| rng.gen_range(0..len))
    }

    fn rebuild(&self, _connections: &[Connection<H>]) {}
}
