use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::aggregator::RegionalAggregator;
use super::filter::{FilterParams, ReportFilter};
use super::pagination::Paginator;
use crate::workflows::reports::ReportStore;

pub struct AnalyticsRoutes<S> {
    aggregator: RegionalAggregator<S>,
    page_size: usize,
}

impl<S> AnalyticsRoutes<S> {
    pub fn new(aggregator: RegionalAggregator<S>, page_size: usize) -> Self {
        Self {
            aggregator,
            page_size,
        }
    }
}

/// Router builder for the public regional dashboard.
pub fn analytics_router<S>(routes: Arc<AnalyticsRoutes<S>>) -> Router
where
    S: ReportStore + 'static,
{
    Router::new()
        .route("/api/v1/analytics/regions", get(regions_handler::<S>))
        .with_state(routes)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegionsQuery {
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
}

pub(crate) async fn regions_handler<S>(
    State(routes): State<Arc<AnalyticsRoutes<S>>>,
    Query(query): Query<RegionsQuery>,
) -> Response
where
    S: ReportStore + 'static,
{
    let params = FilterParams {
        resolution: query.resolution,
        status: query.status,
        city: query.city,
        district: query.district,
        province: query.province,
        q: query.q,
    };
    let filter = match ReportFilter::try_from(params) {
        Ok(filter) => filter,
        Err(err) => {
            let payload = json!({ "success": false, "error": err.to_string() });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    match routes.aggregator.aggregate(&filter) {
        Ok(snapshot) => {
            let mut paginator = Paginator::new(routes.page_size);
            paginator.go_to(query.page.unwrap_or(1));
            let page = paginator.slice(&snapshot.groups);
            let payload = json!({ "success": true, "snapshot": snapshot, "page": page });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => {
            let payload = json!({ "success": false, "error": err.to_string() });
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
        }
    }
}
