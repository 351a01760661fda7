//! Regional analytics over the report set: filtering, grouping, rankings and
//! the paginated dashboard built on top of them.

pub mod aggregator;
pub mod dashboard;
pub mod filter;
pub mod pagination;
pub mod router;
pub mod session;
pub mod views;

#[cfg(test)]
mod tests;

pub use aggregator::{aggregate, aggregate_until, AggregationError, RegionalAggregator};
pub use dashboard::{DashboardPage, DashboardView};
pub use filter::{FilterError, FilterParams, ReportFilter, ResolutionFilter, ALL};
pub use pagination::{PageView, Paginator};
pub use router::{analytics_router, AnalyticsRoutes, RegionsQuery};
pub use session::{AggregationSession, AggregationTicket};
pub use views::{AggregationSnapshot, CityGroup, RankedAreas, Rankings, RegionBucket, RANKING_SIZE};
