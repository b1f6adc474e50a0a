//! Routing registry: peer identifier → live connection
//!
//! The single source of truth for whether a destination is reachable. The
//! reactor adds and removes entries; pipeline workers only read.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::connection::Connection;
use crate::types::PeerId;

#[derive(Debug, Default)]
pub struct RoutingTable {
    routes: DashMap<PeerId, Arc<Connection>>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route; an existing route for the same id is replaced
    pub fn add_route(&self, connection: Arc<Connection>) {
        let id = connection.id().clone();
        if self.routes.insert(id.clone(), connection).is_some() {
            warn!(id = %id, "Replaced existing route");
        } else {
            debug!(id = %id, "Route added");
        }
    }

    pub fn remove_route(&self, id: &str) -> Option<Arc<Connection>> {
        let removed = self.routes.remove(id).map(|(_, conn)| conn);
        if removed.is_some() {
            debug!(id = %id, "Route removed");
        }
        removed
    }

    pub fn find_route(&self, id: &str) -> Option<Arc<Connection>> {
        self.routes.get(id).map(|entry| entry.value().clone())
    }

    pub fn has_route(&self, id: &str) -> bool {
        self.routes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn route_ids(&self) -> Vec<PeerId> {
        self.routes.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn clear(&self) {
        self.routes.clear();
    }
}
