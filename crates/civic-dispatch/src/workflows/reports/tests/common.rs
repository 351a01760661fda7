use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::config::{DispatchConfig, ResolverConfig};
use crate::workflows::offices::{
    ContactDetails, Coordinates, GeoResolver, NoEnrichment, Office, OfficeId, OfficeKind,
    OfficeRegistry,
};
use crate::workflows::reports::dispatcher::{NewReport, ReportDispatcher};
use crate::workflows::reports::domain::{OfficeRef, Report, ReportId, Reporter};
use crate::workflows::reports::intake::ReportIntake;
use crate::workflows::reports::location::{Location, LocationInput};
use crate::workflows::reports::repository::{PhotoStore, PhotoUpload, ReportStore, StoreError};
use crate::workflows::reports::transport::{MailTransport, Notification, TransportError};

#[derive(Default)]
pub(super) struct MemoryStore {
    reports: Mutex<Vec<Report>>,
    unavailable: Mutex<bool>,
}

impl MemoryStore {
    pub(super) fn go_offline(&self) {
        *self.unavailable.lock().expect("store mutex poisoned") = true;
    }

    pub(super) fn all(&self) -> Vec<Report> {
        self.reports.lock().expect("store mutex poisoned").clone()
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if *self.unavailable.lock().expect("store mutex poisoned") {
            Err(StoreError::Unavailable("document store offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl ReportStore for MemoryStore {
    fn insert(&self, report: Report) -> Result<Report, StoreError> {
        self.check_online()?;
        let mut guard = self.reports.lock().expect("store mutex poisoned");
        if guard.iter().any(|existing| existing.id == report.id) {
            return Err(StoreError::Conflict);
        }
        guard.push(report.clone());
        Ok(report)
    }

    fn update(&self, report: Report) -> Result<(), StoreError> {
        self.check_online()?;
        let mut guard = self.reports.lock().expect("store mutex poisoned");
        let slot = guard
            .iter_mut()
            .find(|existing| existing.id == report.id)
            .ok_or(StoreError::NotFound)?;
        *slot = report;
        Ok(())
    }

    fn fetch(&self, id: &ReportId) -> Result<Option<Report>, StoreError> {
        self.check_online()?;
        let guard = self.reports.lock().expect("store mutex poisoned");
        Ok(guard.iter().find(|report| &report.id == id).cloned())
    }

    fn list(&self, limit: usize) -> Result<Vec<Report>, StoreError> {
        self.check_online()?;
        let mut reports = self.all();
        reports.reverse();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        reports.truncate(limit);
        Ok(reports)
    }
}

#[derive(Default)]
pub(super) struct MemoryPhotos {
    stored: Mutex<Vec<PhotoUpload>>,
}

impl MemoryPhotos {
    pub(super) fn count(&self) -> usize {
        self.stored.lock().expect("photo mutex poisoned").len()
    }
}

impl PhotoStore for MemoryPhotos {
    fn store(&self, upload: PhotoUpload) -> Result<String, StoreError> {
        let mut guard = self.stored.lock().expect("photo mutex poisoned");
        guard.push(upload);
        Ok(format!("https://photos.test/{}.jpg", guard.len()))
    }
}

/// Accepts every notification and records it.
#[derive(Default)]
pub(super) struct RecordingTransport {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingTransport {
    pub(super) fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("transport mutex poisoned").clone()
    }

    pub(super) fn recipients(&self) -> Vec<String> {
        let mut recipients: Vec<String> = self.sent().into_iter().map(|sent| sent.to).collect();
        recipients.sort();
        recipients
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, notification: &Notification) -> Result<(), TransportError> {
        self.sent
            .lock()
            .expect("transport mutex poisoned")
            .push(notification.clone());
        Ok(())
    }
}

/// Rejects the listed recipients and accepts everyone else.
pub(super) struct FailingTransport {
    rejected: HashSet<String>,
    inner: RecordingTransport,
}

impl FailingTransport {
    pub(super) fn rejecting(addresses: &[&str]) -> Self {
        Self {
            rejected: addresses.iter().map(|address| address.to_string()).collect(),
            inner: RecordingTransport::default(),
        }
    }

    pub(super) fn delivered(&self) -> Vec<String> {
        self.inner.recipients()
    }
}

#[async_trait]
impl MailTransport for FailingTransport {
    async fn send(&self, notification: &Notification) -> Result<(), TransportError> {
        if self.rejected.contains(&notification.to) {
            return Err(TransportError::Rejected(format!(
                "mailbox {} unavailable",
                notification.to
            )));
        }
        self.inner.send(notification).await
    }
}

/// Stalls on the listed recipients for longer than any test timeout.
pub(super) struct SlowTransport {
    slow: HashSet<String>,
    delay: Duration,
    inner: RecordingTransport,
}

impl SlowTransport {
    pub(super) fn stalling(addresses: &[&str], delay: Duration) -> Self {
        Self {
            slow: addresses.iter().map(|address| address.to_string()).collect(),
            delay,
            inner: RecordingTransport::default(),
        }
    }

    pub(super) fn delivered(&self) -> Vec<String> {
        self.inner.recipients()
    }
}

#[async_trait]
impl MailTransport for SlowTransport {
    async fn send(&self, notification: &Notification) -> Result<(), TransportError> {
        if self.slow.contains(&notification.to) {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.send(notification).await
    }
}

pub(super) fn dispatch_config() -> DispatchConfig {
    DispatchConfig {
        send_timeout: Duration::from_millis(100),
        sender: "noreply@civic.test".to_string(),
        relay_url: None,
    }
}

pub(super) fn build_dispatcher<T>(
    transport: Arc<T>,
) -> (ReportDispatcher<MemoryStore, T>, Arc<MemoryStore>)
where
    T: MailTransport + 'static,
{
    let store = Arc::new(MemoryStore::default());
    let dispatcher = ReportDispatcher::new(store.clone(), transport, dispatch_config());
    (dispatcher, store)
}

pub(super) fn office_ref(name: &str, email: &str) -> OfficeRef {
    OfficeRef {
        id: None,
        kind: "Divisional Secretariat".to_string(),
        name: name.to_string(),
        email: email.to_string(),
    }
}

pub(super) fn colombo_location() -> Location {
    Location::from(LocationInput {
        lat: 6.9271,
        lng: 79.8612,
        address: Some("Galle Road".to_string()),
        city: Some("Colombo".to_string()),
        district: Some("Colombo".to_string()),
        province: Some("Western".to_string()),
    })
}

pub(super) fn draft(description: &str) -> NewReport {
    NewReport {
        description: description.to_string(),
        photo_url: None,
        location: colombo_location(),
        reporter: Reporter {
            name: "Kamala Perera".to_string(),
            email: "kamala@example.lk".to_string(),
        },
    }
}

pub(super) fn kandy_office() -> Office {
    Office {
        id: OfficeId("ds-kandy".to_string()),
        name: "Kandy Four Gravets Divisional Secretariat".to_string(),
        kind: OfficeKind::DivisionalSecretariat,
        address: "Kandy".to_string(),
        city: "Kandy".to_string(),
        district: "Kandy".to_string(),
        province: "Central".to_string(),
        coordinates: Coordinates {
            lat: 7.2906,
            lng: 80.6337,
        },
        contact: ContactDetails {
            email: "dskandy@ds.gov.lk".to_string(),
            phone: "+94 81 222 2222".to_string(),
            website: "https://kandy.ds.gov.lk".to_string(),
        },
    }
}

pub(super) fn resolver(offices: Vec<Office>) -> Arc<GeoResolver<NoEnrichment>> {
    let registry = Arc::new(OfficeRegistry::new(offices).expect("fixture registry is valid"));
    Arc::new(GeoResolver::new(
        registry,
        Arc::new(NoEnrichment),
        ResolverConfig::default(),
    ))
}

pub(super) type TestIntake =
    ReportIntake<MemoryStore, RecordingTransport, MemoryPhotos, NoEnrichment>;

pub(super) struct IntakeHarness {
    pub intake: TestIntake,
    pub store: Arc<MemoryStore>,
    pub transport: Arc<RecordingTransport>,
    pub photos: Arc<MemoryPhotos>,
}

pub(super) fn build_intake(offices: Vec<Office>) -> IntakeHarness {
    let transport = Arc::new(RecordingTransport::default());
    let (dispatcher, store) = build_dispatcher(transport.clone());
    let photos = Arc::new(MemoryPhotos::default());
    let intake = ReportIntake::new(Arc::new(dispatcher), photos.clone(), resolver(offices));
    IntakeHarness {
        intake,
        store,
        transport,
        photos,
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
