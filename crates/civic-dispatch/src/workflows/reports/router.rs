use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::dispatcher::DispatchError;
use super::domain::{OfficeRef, ReportId, ReportStatus, Reporter, ResolutionStatus};
use super::intake::{IntakeError, ReportIntake, ReportSubmission};
use super::lifecycle::{CommentInput, LifecycleError, ReportLifecycle};
use super::location::Location;
use super::repository::{PhotoStore, PhotoUpload, ReportStore, StoreError};
use super::transport::MailTransport;
use crate::workflows::offices::ContactEnricher;

/// Services backing the report endpoints.
pub struct ReportRoutes<S, T, P, E> {
    intake: ReportIntake<S, T, P, E>,
    lifecycle: ReportLifecycle<S>,
    default_list_limit: usize,
}

impl<S, T, P, E> ReportRoutes<S, T, P, E> {
    pub fn new(
        intake: ReportIntake<S, T, P, E>,
        lifecycle: ReportLifecycle<S>,
        default_list_limit: usize,
    ) -> Self {
        Self {
            intake,
            lifecycle,
            default_list_limit,
        }
    }
}

/// Router builder for report submission, listing and administration.
pub fn report_router<S, T, P, E>(routes: Arc<ReportRoutes<S, T, P, E>>) -> Router
where
    S: ReportStore + 'static,
    T: MailTransport + 'static,
    P: PhotoStore + 'static,
    E: ContactEnricher + 'static,
{
    Router::new()
        .route(
            "/api/v1/reports",
            post(submit_handler::<S, T, P, E>).get(list_handler::<S, T, P, E>),
        )
        .route(
            "/api/v1/reports/:report_id/comments",
            post(comment_handler::<S, T, P, E>),
        )
        .route(
            "/api/v1/reports/:report_id/status",
            post(status_handler::<S, T, P, E>),
        )
        .with_state(routes)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Administrative update; at least one of the two fields must be present.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdateRequest {
    pub actor: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub resolution_status: Option<ResolutionStatus>,
}

pub(crate) async fn submit_handler<S, T, P, E>(
    State(routes): State<Arc<ReportRoutes<S, T, P, E>>>,
    multipart: Multipart,
) -> Response
where
    S: ReportStore + 'static,
    T: MailTransport + 'static,
    P: PhotoStore + 'static,
    E: ContactEnricher + 'static,
{
    let submission = match read_submission(multipart).await {
        Ok(submission) => submission,
        Err(message) => return failure(StatusCode::BAD_REQUEST, message),
    };

    match routes.intake.submit(submission).await {
        Ok(receipt) => {
            let payload = json!({ "success": true, "data": receipt });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(err) => {
            let status = match &err {
                IntakeError::Dispatch(
                    DispatchError::InvalidInput(_) | DispatchError::NoRecipientsSelected,
                ) => StatusCode::BAD_REQUEST,
                IntakeError::Dispatch(DispatchError::StoreUnavailable(_))
                | IntakeError::PhotoUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            };
            failure(status, err.to_string())
        }
    }
}

pub(crate) async fn list_handler<S, T, P, E>(
    State(routes): State<Arc<ReportRoutes<S, T, P, E>>>,
    Query(query): Query<ListQuery>,
) -> Response
where
    S: ReportStore + 'static,
    T: MailTransport + 'static,
    P: PhotoStore + 'static,
    E: ContactEnricher + 'static,
{
    let limit = query.limit.unwrap_or(routes.default_list_limit);
    match routes.lifecycle.list(limit) {
        Ok(reports) => {
            let payload = json!({ "success": true, "reports": reports });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => lifecycle_failure(err),
    }
}

pub(crate) async fn comment_handler<S, T, P, E>(
    State(routes): State<Arc<ReportRoutes<S, T, P, E>>>,
    Path(report_id): Path<String>,
    axum::Json(input): axum::Json<CommentInput>,
) -> Response
where
    S: ReportStore + 'static,
    T: MailTransport + 'static,
    P: PhotoStore + 'static,
    E: ContactEnricher + 'static,
{
    match routes
        .lifecycle
        .append_comment(&ReportId(report_id), input)
    {
        Ok(comments) => {
            let payload = json!({ "success": true, "comments": comments });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(err) => lifecycle_failure(err),
    }
}

pub(crate) async fn status_handler<S, T, P, E>(
    State(routes): State<Arc<ReportRoutes<S, T, P, E>>>,
    Path(report_id): Path<String>,
    axum::Json(request): axum::Json<StatusUpdateRequest>,
) -> Response
where
    S: ReportStore + 'static,
    T: MailTransport + 'static,
    P: PhotoStore + 'static,
    E: ContactEnricher + 'static,
{
    let id = ReportId(report_id);
    let status = match request.status.as_deref().map(ReportStatus::parse) {
        None => None,
        Some(Some(status)) => Some(status),
        Some(None) => {
            return failure(
                StatusCode::BAD_REQUEST,
                format!(
                    "unknown status '{}'",
                    request.status.as_deref().unwrap_or_default()
                ),
            )
        }
    };
    if status.is_none() && request.resolution_status.is_none() {
        return failure(
            StatusCode::BAD_REQUEST,
            "either status or resolution_status is required".to_string(),
        );
    }

    let mut latest = None;
    if let Some(status) = status {
        match routes.lifecycle.update_status(&id, &request.actor, status) {
            Ok(report) => latest = Some(report),
            Err(LifecycleError::Unchanged) => {}
            Err(err) => return lifecycle_failure(err),
        }
    }
    if let Some(stage) = request.resolution_status {
        match routes
            .lifecycle
            .update_resolution_status(&id, &request.actor, stage)
        {
            Ok(report) => latest = Some(report),
            Err(LifecycleError::Unchanged) => {}
            Err(err) => return lifecycle_failure(err),
        }
    }

    match latest {
        Some(report) => {
            let payload = json!({ "success": true, "report": report });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        None => lifecycle_failure(LifecycleError::Unchanged),
    }
}

async fn read_submission(mut multipart: Multipart) -> Result<ReportSubmission, String> {
    let mut description = String::new();
    let mut location: Option<Location> = None;
    let mut offices: Vec<OfficeRef> = Vec::new();
    let mut reporter = Reporter::default();
    let mut photo = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| format!("malformed multipart body: {err}"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "photo" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .or_else(|| {
                        file_name.as_deref().and_then(|file| {
                            mime_guess::from_path(file).first_raw().map(str::to_string)
                        })
                    })
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| format!("unreadable photo: {err}"))?;
                // Forms with no file chosen still send an empty part.
                if bytes.is_empty() {
                    continue;
                }
                if !content_type.starts_with("image/") {
                    return Err(format!("photo must be an image, got {content_type}"));
                }
                photo = Some(PhotoUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "description" => description = read_text(field).await?,
            "location" => {
                let raw = read_text(field).await?;
                let parsed = serde_json::from_str::<Location>(&raw)
                    .map_err(|err| format!("invalid location: {err}"))?;
                location = Some(parsed);
            }
            "offices" => {
                let raw = read_text(field).await?;
                offices = serde_json::from_str::<Vec<OfficeRef>>(&raw)
                    .map_err(|err| format!("invalid offices: {err}"))?;
            }
            "reporter_name" => reporter.name = read_text(field).await?.trim().to_string(),
            "reporter_email" => reporter.email = read_text(field).await?.trim().to_string(),
            _ => {}
        }
    }

    let location = location.ok_or_else(|| "location is required".to_string())?;
    Ok(ReportSubmission {
        description,
        location,
        offices,
        reporter,
        photo,
    })
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, String> {
    let name = field.name().unwrap_or_default().to_string();
    field
        .text()
        .await
        .map_err(|err| format!("unreadable field {name}: {err}"))
}

fn lifecycle_failure(err: LifecycleError) -> Response {
    let status = match &err {
        LifecycleError::NotFound(_) | LifecycleError::Store(StoreError::NotFound) => {
            StatusCode::NOT_FOUND
        }
        LifecycleError::MissingActor | LifecycleError::Comment(_) => StatusCode::BAD_REQUEST,
        LifecycleError::Unchanged => StatusCode::CONFLICT,
        LifecycleError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    failure(status, err.to_string())
}

fn failure(status: StatusCode, message: String) -> Response {
    let payload = json!({ "success": false, "error": message });
    (status, axum::Json(payload)).into_response()
}
