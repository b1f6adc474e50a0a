//! Sequential, type-prefixed peer identifiers
//!
//! One counter per peer type, starting at 1. The identifier is the type
//! prefix followed by the counter zero-padded to five digits, so the first
//! broker is `100001` and the first market `200001`.

use std::sync::atomic::{AtomicU32, Ordering};

use router_config::ids::{COUNTER_WIDTH, MAX_ID_CEILING};

use crate::types::{PeerId, PeerType};
use crate::{RouterError, RouterResult};

#[derive(Debug)]
pub struct IdAllocator {
    broker: AtomicU32,
    market: AtomicU32,
    ceiling: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new(MAX_ID_CEILING)
    }
}

impl IdAllocator {
    /// `ceiling` is clamped to what fits in the counter width
    pub fn new(ceiling: u32) -> Self {
        Self {
            broker: AtomicU32::new(0),
            market: AtomicU32::new(0),
            ceiling: ceiling.min(MAX_ID_CEILING),
        }
    }

    fn counter(&self, peer_type: PeerType) -> &AtomicU32 {
        match peer_type {
            PeerType::Broker => &self.broker,
            PeerType::Market => &self.market,
        }
    }

    /// Next identifier for `peer_type`; fails once the ceiling is reached.
    /// The counter never moves past the ceiling.
    pub fn allocate(&self, peer_type: PeerType) -> RouterResult<PeerId> {
        let ceiling = self.ceiling;
        let previous = self
            .counter(peer_type)
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < ceiling).then_some(n + 1)
            })
            .map_err(|_| RouterError::IdSpaceExhausted { peer_type, ceiling })?;

        Ok(PeerId::new(format!(
            "{}{:0width$}",
            peer_type.id_prefix(),
            previous + 1,
            width = COUNTER_WIDTH
        )))
    }

    /// Identifiers handed out so far for `peer_type`
    pub fn current_count(&self, peer_type: PeerType) -> u32 {
        self.counter(peer_type).load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.broker.store(0, Ordering::SeqCst);
        self.market.store(0, Ordering::SeqCst);
    }

    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }
}
