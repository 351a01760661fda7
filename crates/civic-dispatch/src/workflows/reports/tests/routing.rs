use super::common::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::reports::lifecycle::ReportLifecycle;
use crate::workflows::reports::router::{report_router, ReportRoutes};

const BOUNDARY: &str = "civic-test-boundary";

struct Part<'a> {
    name: &'a str,
    file: Option<(&'a str, &'a str)>,
    body: Vec<u8>,
}

fn text_part<'a>(name: &'a str, value: &str) -> Part<'a> {
    Part {
        name,
        file: None,
        body: value.as_bytes().to_vec(),
    }
}

fn multipart_request(parts: Vec<Part<'_>>) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part.file {
            Some((file_name, content_type)) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        part.name, file_name, content_type
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                        part.name
                    )
                    .as_bytes(),
                );
            }
        }
        body.extend_from_slice(&part.body);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::post("/api/v1/reports")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request builds")
}

fn json_request(path: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::to_vec(&body).expect("serialize request"),
        ))
        .expect("request builds")
}

fn router() -> (Router, Arc<MemoryStore>) {
    let harness = build_intake(vec![kandy_office()]);
    let store = harness.store.clone();
    let routes = ReportRoutes::new(harness.intake, ReportLifecycle::new(store.clone()), 100);
    (report_router(Arc::new(routes)), store)
}

fn submission_parts<'a>() -> Vec<Part<'a>> {
    vec![
        Part {
            name: "photo",
            file: Some(("drain.jpg", "image/jpeg")),
            body: vec![0xFF, 0xD8, 0xFF, 0xE0],
        },
        text_part("description", "Blocked drain flooding the street"),
        text_part(
            "location",
            r#"{"latitude": 7.2955, "longitude": 80.6356, "address": "Peradeniya Road"}"#,
        ),
        text_part(
            "offices",
            r#"[{"type": "Divisional Secretariat", "name": "Kandy DS", "email": "dskandy@ds.gov.lk"},
                {"type": "Pradeshiya Sabha", "name": "Kotmale PS", "email": "Not available"}]"#,
        ),
        text_part("reporter_name", "Kamala"),
        text_part("reporter_email", "kamala@example.lk"),
    ]
}

async fn submit_one(router: &Router) -> String {
    let response = router
        .clone()
        .oneshot(multipart_request(submission_parts()))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    payload["data"]["reportId"]
        .as_str()
        .expect("report id")
        .to_string()
}

#[tokio::test]
async fn multipart_submission_is_created_with_delivery_summary() {
    let (router, store) = router();

    let response = router
        .oneshot(multipart_request(submission_parts()))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], true);
    let data = &payload["data"];
    assert_eq!(data["totalEmails"], 2);
    assert_eq!(data["successfulEmails"], 1);
    assert_eq!(data["failedEmails"], 1);
    assert_eq!(data["photoUrl"], "https://photos.test/1.jpg");
    assert_eq!(data["emailsSent"][0]["status"], "success");
    assert_eq!(data["emailsSent"][1]["status"], "failure");

    let stored = store.all();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].reporter.name, "Kamala");
    assert_eq!(stored[0].location.city, "Kandy");
}

#[tokio::test]
async fn submission_without_offices_is_a_bad_request() {
    let (router, store) = router();
    let parts: Vec<Part<'_>> = submission_parts()
        .into_iter()
        .filter(|part| part.name != "offices")
        .collect();

    let response = router
        .oneshot(multipart_request(parts))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], false);
    assert!(store.all().is_empty());
}

#[tokio::test]
async fn non_image_uploads_are_rejected() {
    let (router, _) = router();
    let mut parts = submission_parts();
    parts[0] = Part {
        name: "photo",
        file: Some(("notes.txt", "text/plain")),
        body: b"not an image".to_vec(),
    };

    let response = router
        .oneshot(multipart_request(parts))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_file_input_is_treated_as_no_photo() {
    let (router, store) = router();
    let mut parts = submission_parts();
    parts[0] = Part {
        name: "photo",
        file: Some(("", "application/octet-stream")),
        body: Vec::new(),
    };

    let response = router
        .oneshot(multipart_request(parts))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert!(payload["data"]["photoUrl"].is_null());
    let stored = store.all();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].photo_url.is_none());
}

#[tokio::test]
async fn listing_honours_the_limit() {
    let (router, _) = router();
    submit_one(&router).await;
    let latest = submit_one(&router).await;

    let response = router
        .oneshot(
            Request::get("/api/v1/reports?limit=1")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let reports = payload["reports"].as_array().expect("reports array");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["id"], latest.as_str());
}

#[tokio::test]
async fn comments_route_appends_and_validates() {
    let (router, _) = router();
    let id = submit_one(&router).await;

    let response = router
        .clone()
        .oneshot(json_request(
            &format!("/api/v1/reports/{id}/comments"),
            json!({ "name": "Ravi", "email": "ravi@example.lk", "text": "Same on my lane" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["comments"][0]["text"], "Same on my lane");
    assert!(payload["comments"][0]["createdAt"].is_string());

    let response = router
        .clone()
        .oneshot(json_request(
            &format!("/api/v1/reports/{id}/comments"),
            json!({ "name": "Ravi", "email": "ravi", "text": "Same" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = router
        .oneshot(json_request(
            "/api/v1/reports/rpt-missing/comments",
            json!({ "name": "Ravi", "email": "ravi@example.lk", "text": "Same" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn status_route_applies_both_lifecycles() {
    let (router, _) = router();
    let id = submit_one(&router).await;
    let path = format!("/api/v1/reports/{id}/status");

    let response = router
        .clone()
        .oneshot(json_request(
            &path,
            json!({ "actor": "officer", "status": "in-progress", "resolution_status": "arranging" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["report"]["status"], "in-progress");
    assert_eq!(payload["report"]["resolutionStatus"], "arranging");
    assert_eq!(
        payload["report"]["adminActions"]
            .as_array()
            .map(Vec::len),
        Some(2)
    );

    let response = router
        .clone()
        .oneshot(json_request(
            &path,
            json!({ "actor": "officer", "status": "in-progress" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = router
        .clone()
        .oneshot(json_request(
            &path,
            json!({ "actor": "officer", "status": "closed" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = router
        .oneshot(json_request(&path, json!({ "actor": "officer" })))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
