//! In-memory snapshot of active endpoints.
//!
//! # Responsibilities
//! - Reload active endpoint definitions from the store once per cycle
//! - Serve lock-free reads of the latest snapshot
//!
//! # Design Decisions
//! - Snapshot swapped atomically (`ArcSwap`); readers never block a refresh
//! - A failed refresh keeps the previous snapshot

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::model::Endpoint;
use crate::observability::metrics;
use crate::store::{Store, StoreResult};

pub struct EndpointRegistry {
    snapshot: ArcSwap<Vec<Endpoint>>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Replace the snapshot with the store's current active endpoints.
    pub async fn refresh(&self, store: &dyn Store) -> StoreResult<usize> {
        let active = store.list_active_endpoints().await?;
        let count = active.len();
        self.replace(active);
        Ok(count)
    }

    pub fn replace(&self, endpoints: Vec<Endpoint>) {
        metrics::set_active_endpoints(endpoints.len());
        self.snapshot.store(Arc::new(endpoints));
    }

    pub fn snapshot(&self) -> Arc<Vec<Endpoint>> {
        self.snapshot.load_full()
    }

    pub fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EndpointRegistry {
    fn default() -> Self {
        Self::new()
    }
}
