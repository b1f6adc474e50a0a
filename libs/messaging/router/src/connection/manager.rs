//! Connection registry
//!
//! Bookkeeping for every live connection: identifier allocation on accept,
//! counts, lookup by id. Registration also publishes the connection in the
//! routing table; unregistration withdraws it from both.

use std::net::SocketAddr;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use super::{Connection, ConnectionLimits};
use crate::ids::IdAllocator;
use crate::routing::RoutingTable;
use crate::types::{PeerId, PeerType};
use crate::RouterResult;

#[derive(Debug)]
pub struct ConnectionManager {
    connections: DashMap<PeerId, Arc<Connection>>,
    ids: IdAllocator,
    routing: Arc<RoutingTable>,
    limits: ConnectionLimits,
}

impl ConnectionManager {
    pub fn new(routing: Arc<RoutingTable>, ids: IdAllocator, limits: ConnectionLimits) -> Self {
        Self {
            connections: DashMap::new(),
            ids,
            routing,
            limits,
        }
    }

    /// Allocate an id for a freshly accepted peer and make it routable
    pub fn register(&self, peer_type: PeerType, peer_addr: SocketAddr) -> RouterResult<Arc<Connection>> {
        let id = self.ids.allocate(peer_type)?;
        let connection = Arc::new(Connection::new(id.clone(), peer_type, peer_addr, self.limits));

        self.connections.insert(id.clone(), connection.clone());
        self.routing.add_route(connection.clone());

        info!(id = %id, peer = %peer_addr, "📡 {} connected", peer_type);
        Ok(connection)
    }

    /// Withdraw a connection from the registry and the routing table
    pub fn unregister(&self, id: &str) -> Option<Arc<Connection>> {
        self.routing.remove_route(id);
        let removed = self.connections.remove(id).map(|(_, conn)| conn);
        if let Some(conn) = &removed {
            info!(
                id = %id,
                peer = %conn.peer_addr(),
                uptime_ms = conn.connected_at().elapsed().as_millis() as u64,
                "{} disconnected",
                conn.peer_type()
            );
        } else {
            debug!(id = %id, "Unregister for unknown connection");
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<Arc<Connection>> {
        self.connections.get(id).map(|entry| entry.value().clone())
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn count_by_type(&self, peer_type: PeerType) -> usize {
        self.connections
            .iter()
            .filter(|entry| entry.value().peer_type() == peer_type)
            .count()
    }

    pub fn connections(&self) -> Vec<Arc<Connection>> {
        self.connections.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn routing(&self) -> &Arc<RoutingTable> {
        &self.routing
    }

    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }
}
