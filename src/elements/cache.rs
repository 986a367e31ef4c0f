use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::watch;
use utoipa::ToSchema;

use crate::elements::OrbitalElementSet;

/// One published element set. Never mutated after publication.
#[derive(Debug)]
pub struct ElementSnapshot {
    pub elements: OrbitalElementSet,
    pub fetched_at: DateTime<Utc>,
}

/// How trustworthy the element set behind an answer is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Freshness {
    pub epoch: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
    pub age_seconds: i64,
    /// Set once the last successful fetch is older than the configured limit.
    pub stale: bool,
}

impl ElementSnapshot {
    pub fn freshness(&self, now: DateTime<Utc>, max_age: Duration) -> Freshness {
        let age = now - self.fetched_at;
        Freshness {
            epoch: self.elements.epoch(),
            fetched_at: self.fetched_at,
            age_seconds: age.num_seconds(),
            stale: age > max_age,
        }
    }
}

/// Single-writer slot holding the current snapshot. Readers clone the `Arc`
/// and keep working on it even if a refresh publishes a newer one meanwhile.
#[derive(Clone)]
pub struct ElementCache {
    slot: Arc<watch::Sender<Option<Arc<ElementSnapshot>>>>,
    max_age: Duration,
}

impl ElementCache {
    pub fn new(max_age: Duration) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            slot: Arc::new(tx),
            max_age,
        }
    }

    pub fn publish(
        &self,
        elements: OrbitalElementSet,
        fetched_at: DateTime<Utc>,
    ) -> Arc<ElementSnapshot> {
        let snapshot = Arc::new(ElementSnapshot {
            elements,
            fetched_at,
        });
        self.slot.send_replace(Some(Arc::clone(&snapshot)));
        snapshot
    }

    pub fn current(&self) -> Option<Arc<ElementSnapshot>> {
        self.slot.borrow().clone()
    }

    #[cfg(test)]
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<ElementSnapshot>>> {
        self.slot.subscribe()
    }

    pub fn freshness(&self, snapshot: &ElementSnapshot, now: DateTime<Utc>) -> Freshness {
        snapshot.freshness(now, self.max_age)
    }
}
