use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::aggregator::{AggregationError, RegionalAggregator};
use super::filter::ReportFilter;
use super::pagination::{PageView, Paginator};
use super::session::AggregationSession;
use super::views::{AggregationSnapshot, CityGroup};
use crate::workflows::reports::ReportStore;

/// Published snapshot with the current page of city groups.
#[derive(Debug, Clone)]
pub struct DashboardPage {
    pub snapshot: Arc<AggregationSnapshot>,
    pub page: PageView<CityGroup>,
}

/// Stateful dashboard: filter, page cursor and the latest published snapshot.
pub struct DashboardView<S> {
    aggregator: RegionalAggregator<S>,
    session: AggregationSession,
    paginator: Mutex<Paginator>,
}

impl<S> DashboardView<S>
where
    S: ReportStore + 'static,
{
    pub fn new(aggregator: RegionalAggregator<S>, page_size: usize) -> Self {
        Self {
            aggregator,
            session: AggregationSession::new(),
            paginator: Mutex::new(Paginator::new(page_size)),
        }
    }

    fn paginator(&self) -> MutexGuard<'_, Paginator> {
        self.paginator.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn filter(&self) -> ReportFilter {
        self.paginator().filter().clone()
    }

    /// Returns true when the filter changed, which also resets the page to 1.
    pub fn set_filter(&self, filter: ReportFilter) -> bool {
        self.paginator().apply_filter(filter)
    }

    pub fn go_to_page(&self, page: usize) {
        self.paginator().go_to(page);
    }

    pub fn page_number(&self) -> usize {
        self.paginator().page()
    }

    /// Re-reads the store and recomputes; superseded refreshes return `Cancelled`.
    pub async fn refresh(&self) -> Result<DashboardPage, AggregationError> {
        let filter = self.filter();
        let reports = Arc::new(self.aggregator.fetch()?);
        let snapshot = self.session.run(reports, filter).await?;
        Ok(self.page_of(snapshot))
    }

    /// Re-pages the latest published snapshot without recomputing it.
    pub fn current(&self) -> Option<DashboardPage> {
        self.session.latest().map(|snapshot| self.page_of(snapshot))
    }

    fn page_of(&self, snapshot: Arc<AggregationSnapshot>) -> DashboardPage {
        let page = self.paginator().slice(&snapshot.groups);
        DashboardPage { snapshot, page }
    }
}
