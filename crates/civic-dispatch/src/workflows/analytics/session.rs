use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use super::aggregator::{aggregate_until, AggregationError};
use super::filter::ReportFilter;
use super::views::AggregationSnapshot;
use crate::workflows::reports::Report;

/// Handle for one issued aggregation request.
#[derive(Debug, Clone)]
pub struct AggregationTicket {
    generation: u64,
    cancelled: Arc<AtomicBool>,
}

impl AggregationTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

struct Published {
    generation: u64,
    snapshot: Arc<AggregationSnapshot>,
}

/// Serialises dashboard refreshes: issuing a request cancels the one in
/// flight, and a result is only published if nothing newer was issued.
#[derive(Default)]
pub struct AggregationSession {
    issued: AtomicU64,
    in_flight: Mutex<Option<Arc<AtomicBool>>>,
    published: Mutex<Option<Published>>,
}

impl AggregationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> AggregationTicket {
        let generation = self.issued.fetch_add(1, Ordering::AcqRel) + 1;
        let cancelled = Arc::new(AtomicBool::new(false));
        let previous = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(cancelled.clone());
        if let Some(previous) = previous {
            previous.store(true, Ordering::Release);
        }
        AggregationTicket {
            generation,
            cancelled,
        }
    }

    /// Publishes `result` for `ticket` unless a newer request superseded it.
    pub fn complete(
        &self,
        ticket: &AggregationTicket,
        result: Result<AggregationSnapshot, AggregationError>,
    ) -> Result<Arc<AggregationSnapshot>, AggregationError> {
        if ticket.is_cancelled() {
            debug!(generation = ticket.generation, "stale aggregation discarded");
            return Err(AggregationError::Cancelled);
        }
        let snapshot = Arc::new(result?);

        let mut published = self
            .published
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = published.as_ref() {
            if current.generation > ticket.generation {
                debug!(generation = ticket.generation, "stale aggregation discarded");
                return Err(AggregationError::Cancelled);
            }
        }
        *published = Some(Published {
            generation: ticket.generation,
            snapshot: snapshot.clone(),
        });
        Ok(snapshot)
    }

    pub fn latest(&self) -> Option<Arc<AggregationSnapshot>> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|current| current.snapshot.clone())
    }

    /// Issues a request and runs the pass on the blocking pool.
    pub async fn run(
        &self,
        reports: Arc<Vec<Report>>,
        filter: ReportFilter,
    ) -> Result<Arc<AggregationSnapshot>, AggregationError> {
        let ticket = self.issue();
        let cancelled = ticket.cancelled.clone();
        let result = tokio::task::spawn_blocking(move || {
            aggregate_until(&reports, &filter, &|| cancelled.load(Ordering::Acquire))
        })
        .await
        .map_err(|err| AggregationError::Worker(err.to_string()))?;
        self.complete(&ticket, result)
    }
}
