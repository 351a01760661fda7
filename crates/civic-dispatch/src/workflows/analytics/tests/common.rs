use std::sync::Mutex;

use axum::response::Response;
use chrono::{Duration, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::reports::{
    Location, LocationInput, Report, ReportId, ReportStatus, ReportStore, Reporter,
    ResolutionStatus, StoreError,
};

pub(super) struct ReportBuilder {
    report: Report,
}

pub(super) fn report(id: &str, city: &str) -> ReportBuilder {
    ReportBuilder {
        report: Report {
            id: ReportId(id.to_string()),
            description: format!("issue {id}"),
            photo_url: None,
            location: Location::from(LocationInput {
                lat: 7.0,
                lng: 80.0,
                address: Some(format!("{id} street")),
                city: Some(city.to_string()),
                district: Some(city.to_string()),
                province: Some("Western".to_string()),
            }),
            reporter: Reporter {
                name: "Citizen".to_string(),
                email: "citizen@example.lk".to_string(),
            },
            offices: Vec::new(),
            emails_sent: Vec::new(),
            status: ReportStatus::Submitted,
            resolution_status: None,
            admin_actions: Vec::new(),
            public_comments: Vec::new(),
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
        },
    }
}

impl ReportBuilder {
    pub(super) fn district(mut self, district: &str) -> Self {
        self.report.location.district = district.to_string();
        self
    }

    pub(super) fn province(mut self, province: &str) -> Self {
        self.report.location.province = province.to_string();
        self
    }

    pub(super) fn status(mut self, status: ReportStatus) -> Self {
        self.report.status = status;
        self
    }

    pub(super) fn resolution(mut self, stage: ResolutionStatus) -> Self {
        self.report.resolution_status = Some(stage);
        self
    }

    pub(super) fn reporter(mut self, name: &str, email: &str) -> Self {
        self.report.reporter = Reporter {
            name: name.to_string(),
            email: email.to_string(),
        };
        self
    }

    pub(super) fn description(mut self, description: &str) -> Self {
        self.report.description = description.to_string();
        self
    }

    pub(super) fn minutes_later(mut self, minutes: i64) -> Self {
        self.report.created_at += Duration::minutes(minutes);
        self
    }

    pub(super) fn build(self) -> Report {
        self.report
    }
}

/// Three Colombo reports (one resolved) and one active Kandy report.
pub(super) fn colombo_kandy() -> Vec<Report> {
    vec![
        report("c1", "Colombo").build(),
        report("c2", "Colombo").minutes_later(5).build(),
        report("c3", "Colombo")
            .status(ReportStatus::Resolved)
            .build(),
        report("k1", "Kandy").province("Central").build(),
    ]
}

/// Fixed report set standing in for the document store.
#[derive(Default)]
pub(super) struct FixedStore {
    reports: Mutex<Vec<Report>>,
}

impl FixedStore {
    pub(super) fn with(reports: Vec<Report>) -> Self {
        Self {
            reports: Mutex::new(reports),
        }
    }

    pub(super) fn push(&self, report: Report) {
        self.reports.lock().expect("store mutex poisoned").push(report);
    }
}

impl ReportStore for FixedStore {
    fn insert(&self, report: Report) -> Result<Report, StoreError> {
        self.push(report.clone());
        Ok(report)
    }

    fn update(&self, _report: Report) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("read-only fixture".to_string()))
    }

    fn fetch(&self, id: &ReportId) -> Result<Option<Report>, StoreError> {
        let guard = self.reports.lock().expect("store mutex poisoned");
        Ok(guard.iter().find(|report| &report.id == id).cloned())
    }

    fn list(&self, limit: usize) -> Result<Vec<Report>, StoreError> {
        let guard = self.reports.lock().expect("store mutex poisoned");
        Ok(guard.iter().take(limit).cloned().collect())
    }
}

pub(super) fn names(buckets: &[crate::workflows::analytics::RegionBucket]) -> Vec<&str> {
    buckets.iter().map(|bucket| bucket.name.as_str()).collect()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
