//! No balancing: always the first eligible connection.

use crate::load_balancer::LoadBalancer;
use crate::net::connection::Connection;

/// Picks the lowest-index active, connected record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBalancer;

impl<H> LoadBalancer<H> for NoBalancer {
    fn pick<'a>(&self, connections: &'a [Connection<H>]) -> Option<&'a Connection<H>> {
        connections.iter().find(|c| c.is_eligible())
    }

    fn rebuild(&self, _connections: &[Connection<H>]) {}
}
