use crate::infra::{AppState, Platform};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Extension;
use axum::Json;
use civic_dispatch::workflows::analytics::{analytics_router, AnalyticsRoutes};
use civic_dispatch::workflows::offices::office_router;
use civic_dispatch::workflows::reports::{report_router, ReportRoutes};
use serde_json::json;
use std::sync::Arc;

/// Office, report and analytics APIs plus the operational endpoints.
pub(crate) fn with_platform_routes(platform: &Platform) -> axum::Router {
    let reports = ReportRoutes::new(
        platform.intake(),
        platform.lifecycle(),
        platform.dashboard.report_list_limit,
    );
    let analytics = AnalyticsRoutes::new(platform.aggregator(), platform.dashboard.page_size);

    office_router(platform.resolver.clone())
        .merge(report_router(Arc::new(reports)))
        .merge(analytics_router(Arc::new(analytics)))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
