//! Time-gated cache of pending orders.
//!
//! The frame loop asks [`OrderCache::needs_refresh`] before hitting the
//! network; the cache itself never performs I/O. Validation happens at
//! install time so the matcher only ever sees well-formed records.

use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

use stitch_proto::{PendingOrder, WireOrder};

#[derive(Debug)]
pub struct OrderCache {
    orders: Vec<PendingOrder>,
    last_refresh: Option<OffsetDateTime>,
    refresh_interval: Duration,
}

impl OrderCache {
    pub fn new(refresh_interval: Duration) -> Self {
        Self { orders: Vec::new(), last_refresh: None, refresh_interval }
    }

    pub fn orders(&self) -> &[PendingOrder] {
        &self.orders
    }

    /// True when the cache has never been filled or the refresh interval
    /// has elapsed since the last fill.
    pub fn needs_refresh(&self, now: OffsetDateTime) -> bool {
        match self.last_refresh {
            None => true,
            Some(at) => now - at >= self.refresh_interval,
        }
    }

    /// Replace the cached list with a freshly fetched one. Records that fail
    /// validation are logged and dropped; one bad record never discards the
    /// rest of the batch.
    pub fn install(&mut self, wire: Vec<WireOrder>, now: OffsetDateTime) {
        let total = wire.len();
        let mut accepted = Vec::with_capacity(total);
        for record in wire {
            match PendingOrder::from_wire(record) {
                Ok(order) => accepted.push(order),
                Err(err) => warn!(%err, "dropping malformed order record"),
            }
        }
        debug!(accepted = accepted.len(), total, "order cache refreshed");
        self.orders = accepted;
        self.last_refresh = Some(now);
    }

    /// Mark the cache stale so the next frame refetches regardless of the
    /// interval. Called after an order is matched and uploaded, since its
    /// item should vanish from the pending list.
    pub fn force_stale(&mut self) {
        self.last_refresh = None;
    }
}
