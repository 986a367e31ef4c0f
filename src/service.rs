use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::abort::Cancellation;
use crate::elements::{ElementCache, ElementSnapshot, Freshness};
use crate::predict::{
    find_passes, orbit_metrics, ObserverSite, OrbitMetrics, PassEvent, PredictError,
    PropagationResult, Propagator, SearchOptions,
};

#[derive(Debug, Clone, Copy)]
pub struct ServiceSettings {
    pub freshness_horizon: Duration,
    pub search: SearchOptions,
    pub metrics_delta: Duration,
    pub search_timeout: std::time::Duration,
}

/// A computed value together with the freshness of the elements behind it.
#[derive(Debug, Clone)]
pub struct Answer<T> {
    pub value: T,
    pub freshness: Freshness,
}

#[derive(Debug, Clone)]
pub struct StatusReport {
    pub name: Option<String>,
    pub norad_id: u64,
    pub position: PropagationResult,
    pub metrics: OrbitMetrics,
}

#[derive(Debug, Clone)]
pub struct PassQuery {
    pub observer: ObserverSite,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub min_elevation_deg: f64,
}

/// Read side of the tracker. Each query pins the snapshot current when it
/// starts, so a concurrent refresh never mixes two element sets in one answer.
#[derive(Clone)]
pub struct IssService {
    cache: ElementCache,
    propagator: Propagator,
    search: SearchOptions,
    metrics_delta: Duration,
    search_timeout: std::time::Duration,
}

impl IssService {
    pub fn new(cache: ElementCache, settings: ServiceSettings) -> Self {
        Self {
            cache,
            propagator: Propagator::new(settings.freshness_horizon),
            search: settings.search,
            metrics_delta: settings.metrics_delta,
            search_timeout: settings.search_timeout,
        }
    }

    fn snapshot(&self) -> Result<Arc<ElementSnapshot>, PredictError> {
        self.cache.current().ok_or(PredictError::ElementsUnavailable)
    }

    /// Identity, position and motion at `at`, all from the same element set.
    pub fn status(
        &self,
        at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Answer<StatusReport>, PredictError> {
        let snapshot = self.snapshot()?;
        let elements = &snapshot.elements;
        let value = StatusReport {
            name: elements.name().map(str::to_string),
            norad_id: elements.norad_id(),
            position: self.propagator.propagate(elements, at)?,
            metrics: orbit_metrics(&self.propagator, elements, at, self.metrics_delta)?,
        };
        Ok(Answer {
            value,
            freshness: self.cache.freshness(&snapshot, now),
        })
    }

    pub fn current_position(
        &self,
        at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Answer<PropagationResult>, PredictError> {
        let snapshot = self.snapshot()?;
        let value = self.propagator.propagate(&snapshot.elements, at)?;
        Ok(Answer {
            value,
            freshness: self.cache.freshness(&snapshot, now),
        })
    }

    pub fn velocity_and_period(
        &self,
        at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Answer<OrbitMetrics>, PredictError> {
        let snapshot = self.snapshot()?;
        let value = orbit_metrics(&self.propagator, &snapshot.elements, at, self.metrics_delta)?;
        Ok(Answer {
            value,
            freshness: self.cache.freshness(&snapshot, now),
        })
    }

    /// Blocking pass search. Runs until done, failed or `cancel` fires.
    pub fn upcoming_passes(
        &self,
        query: &PassQuery,
        now: DateTime<Utc>,
        cancel: &Cancellation,
    ) -> Result<Answer<Vec<PassEvent>>, PredictError> {
        let snapshot = self.snapshot()?;
        let value = find_passes(
            &self.propagator,
            &snapshot.elements,
            &query.observer,
            query.start,
            query.end,
            query.min_elevation_deg,
            &self.search,
            cancel,
        )?;
        Ok(Answer {
            value,
            freshness: self.cache.freshness(&snapshot, now),
        })
    }

    /// Pass search on the blocking pool, bounded by the configured timeout.
    /// Dropping the returned future cancels the search.
    pub async fn search_passes(
        &self,
        query: PassQuery,
    ) -> Result<Answer<Vec<PassEvent>>, PredictError> {
        let cancel = Cancellation::with_timeout(self.search_timeout);
        let _guard = cancel.guard();
        let service = self.clone();

        let started = std::time::Instant::now();
        let result = tokio::task::spawn_blocking(move || {
            service.upcoming_passes(&query, Utc::now(), &cancel)
        })
        .await
        .map_err(|e| PredictError::Task(e.to_string()))?;

        match &result {
            Ok(answer) => log::debug!(
                "Pass search found {} passes in {:?}",
                answer.value.len(),
                started.elapsed()
            ),
            Err(PredictError::Cancelled) => log::warn!(
                "Pass search cancelled after {:?} (timeout {:?})",
                started.elapsed(),
                self.search_timeout
            ),
            Err(_) => {}
        }
        result
    }
}
