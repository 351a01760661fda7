use async_trait::async_trait;
use civic_dispatch::config::{AppConfig, DashboardConfig, DispatchConfig, ResolverConfig};
use civic_dispatch::error::AppError;
use civic_dispatch::workflows::analytics::RegionalAggregator;
use civic_dispatch::workflows::offices::{
    ChatCompletionEnricher, ContactEnricher, EnrichedContact, EnrichmentError, EnrichmentRequest,
    GeoResolver, NoEnrichment, OfficeRegistry,
};
use civic_dispatch::workflows::reports::{
    HttpMailRelay, MailTransport, Notification, PhotoStore, PhotoUpload, Report,
    ReportDispatcher, ReportId, ReportIntake, ReportLifecycle, ReportStore, StoreError,
    TransportError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Report documents held in process; insertion order doubles as creation order.
#[derive(Default, Clone)]
pub(crate) struct InMemoryReportStore {
    records: Arc<Mutex<Vec<Report>>>,
}

impl ReportStore for InMemoryReportStore {
    fn insert(&self, report: Report) -> Result<Report, StoreError> {
        let mut guard = self.records.lock().expect("report store mutex poisoned");
        if guard.iter().any(|existing| existing.id == report.id) {
            return Err(StoreError::Conflict);
        }
        guard.push(report.clone());
        Ok(report)
    }

    fn update(&self, report: Report) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("report store mutex poisoned");
        match guard.iter_mut().find(|existing| existing.id == report.id) {
            Some(slot) => {
                *slot = report;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    fn fetch(&self, id: &ReportId) -> Result<Option<Report>, StoreError> {
        let guard = self.records.lock().expect("report store mutex poisoned");
        Ok(guard.iter().find(|report| &report.id == id).cloned())
    }

    fn list(&self, limit: usize) -> Result<Vec<Report>, StoreError> {
        let guard = self.records.lock().expect("report store mutex poisoned");
        let mut reports: Vec<Report> = guard.iter().rev().cloned().collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        reports.truncate(limit);
        Ok(reports)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryPhotoStore {
    photos: Arc<Mutex<HashMap<String, PhotoUpload>>>,
}

impl PhotoStore for InMemoryPhotoStore {
    fn store(&self, upload: PhotoUpload) -> Result<String, StoreError> {
        let mut guard = self.photos.lock().expect("photo store mutex poisoned");
        let extension = mime_guess::get_mime_extensions_str(&upload.content_type)
            .and_then(|extensions| extensions.first())
            .copied()
            .unwrap_or("bin");
        let key = format!("photo-{:06}.{extension}", guard.len() + 1);
        guard.insert(key.clone(), upload);
        Ok(format!("memory://photos/{key}"))
    }
}

impl InMemoryPhotoStore {
    pub(crate) fn len(&self) -> usize {
        self.photos.lock().expect("photo store mutex poisoned").len()
    }
}

/// Records notifications in the log instead of sending them.
#[derive(Default, Clone)]
pub(crate) struct LoggingMailTransport {
    outbox: Arc<Mutex<Vec<Notification>>>,
}

impl LoggingMailTransport {
    pub(crate) fn outbox(&self) -> Vec<Notification> {
        self.outbox.lock().expect("outbox mutex poisoned").clone()
    }
}

#[async_trait]
impl MailTransport for LoggingMailTransport {
    async fn send(&self, notification: &Notification) -> Result<(), TransportError> {
        info!(
            report = %notification.report_id,
            to = %notification.to,
            subject = %notification.subject,
            "notification queued in local outbox"
        );
        self.outbox
            .lock()
            .expect("outbox mutex poisoned")
            .push(notification.clone());
        Ok(())
    }
}

/// Mail transport selected by `APP_MAIL_RELAY_URL`.
pub(crate) enum ConfiguredTransport {
    Relay(HttpMailRelay),
    Logging(LoggingMailTransport),
}

impl ConfiguredTransport {
    pub(crate) fn from_config(config: &DispatchConfig) -> Self {
        match &config.relay_url {
            Some(url) => Self::Relay(HttpMailRelay::new(url.clone())),
            None => Self::Logging(LoggingMailTransport::default()),
        }
    }
}

#[async_trait]
impl MailTransport for ConfiguredTransport {
    async fn send(&self, notification: &Notification) -> Result<(), TransportError> {
        match self {
            Self::Relay(relay) => relay.send(notification).await,
            Self::Logging(outbox) => outbox.send(notification).await,
        }
    }
}

/// Contact enricher selected by the completion settings.
pub(crate) enum ConfiguredEnricher {
    Completion(ChatCompletionEnricher),
    Disabled(NoEnrichment),
}

impl ConfiguredEnricher {
    pub(crate) fn from_config(config: &AppConfig) -> Self {
        match &config.completion {
            Some(completion) => Self::Completion(ChatCompletionEnricher::new(completion)),
            None => Self::Disabled(NoEnrichment),
        }
    }
}

#[async_trait]
impl ContactEnricher for ConfiguredEnricher {
    async fn enrich(
        &self,
        request: &EnrichmentRequest,
    ) -> Result<EnrichedContact, EnrichmentError> {
        match self {
            Self::Completion(enricher) => enricher.enrich(request).await,
            Self::Disabled(enricher) => enricher.enrich(request).await,
        }
    }

    fn is_enabled(&self) -> bool {
        match self {
            Self::Completion(enricher) => enricher.is_enabled(),
            Self::Disabled(enricher) => enricher.is_enabled(),
        }
    }
}

pub(crate) type PlatformResolver = GeoResolver<ConfiguredEnricher>;
pub(crate) type PlatformDispatcher = ReportDispatcher<InMemoryReportStore, ConfiguredTransport>;
pub(crate) type PlatformIntake =
    ReportIntake<InMemoryReportStore, ConfiguredTransport, InMemoryPhotoStore, ConfiguredEnricher>;

/// Wires the three workflows onto shared in-process adapters.
pub(crate) struct Platform {
    pub(crate) resolver: Arc<PlatformResolver>,
    pub(crate) dispatcher: Arc<PlatformDispatcher>,
    pub(crate) store: Arc<InMemoryReportStore>,
    pub(crate) photos: Arc<InMemoryPhotoStore>,
    pub(crate) transport: Arc<ConfiguredTransport>,
    pub(crate) dashboard: DashboardConfig,
}

impl Platform {
    pub(crate) fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let registry = load_registry(&config.resolver)?;
        info!(offices = registry.len(), "office registry loaded");
        Ok(Self::assemble(
            registry,
            ConfiguredEnricher::from_config(config),
            ConfiguredTransport::from_config(&config.dispatch),
            config.resolver.clone(),
            config.dispatch.clone(),
            config.dashboard.clone(),
        ))
    }

    pub(crate) fn assemble(
        registry: OfficeRegistry,
        enricher: ConfiguredEnricher,
        transport: ConfiguredTransport,
        resolver: ResolverConfig,
        dispatch: DispatchConfig,
        dashboard: DashboardConfig,
    ) -> Self {
        let store = Arc::new(InMemoryReportStore::default());
        let transport = Arc::new(transport);
        let resolver = Arc::new(GeoResolver::new(
            Arc::new(registry),
            Arc::new(enricher),
            resolver,
        ));
        let dispatcher = Arc::new(ReportDispatcher::new(
            store.clone(),
            transport.clone(),
            dispatch,
        ));

        Self {
            resolver,
            dispatcher,
            store,
            photos: Arc::new(InMemoryPhotoStore::default()),
            transport,
            dashboard,
        }
    }

    pub(crate) fn intake(&self) -> PlatformIntake {
        ReportIntake::new(
            self.dispatcher.clone(),
            self.photos.clone(),
            self.resolver.clone(),
        )
    }

    pub(crate) fn lifecycle(&self) -> ReportLifecycle<InMemoryReportStore> {
        ReportLifecycle::new(self.store.clone())
    }

    pub(crate) fn aggregator(&self) -> RegionalAggregator<InMemoryReportStore> {
        RegionalAggregator::new(self.store.clone(), self.dashboard.fetch_limit)
    }
}

/// Operator CSV when configured, otherwise the built-in catalogue.
pub(crate) fn load_registry(config: &ResolverConfig) -> Result<OfficeRegistry, AppError> {
    let registry = match &config.registry_path {
        Some(path) => OfficeRegistry::from_path(path)?,
        None => OfficeRegistry::seeded()?,
    };
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use civic_dispatch::workflows::reports::{Location, LocationInput, ReportStatus, Reporter};

    fn report(id: &str, minutes_ago: i64) -> Report {
        Report {
            id: ReportId(id.to_string()),
            description: "Pothole".to_string(),
            photo_url: None,
            location: Location::from(LocationInput::default()),
            reporter: Reporter::default(),
            offices: Vec::new(),
            emails_sent: Vec::new(),
            status: ReportStatus::Submitted,
            resolution_status: None,
            admin_actions: Vec::new(),
            public_comments: Vec::new(),
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn report_store_lists_newest_first() {
        let store = InMemoryReportStore::default();
        store.insert(report("old", 30)).expect("insert");
        store.insert(report("new", 1)).expect("insert");
        store.insert(report("middle", 10)).expect("insert");

        let ids: Vec<String> = store
            .list(2)
            .expect("list")
            .into_iter()
            .map(|report| report.id.0)
            .collect();
        assert_eq!(ids, vec!["new".to_string(), "middle".to_string()]);
        assert!(matches!(
            store.insert(report("old", 0)),
            Err(StoreError::Conflict)
        ));
    }

    #[test]
    fn photo_urls_use_the_content_type_extension() {
        let photos = InMemoryPhotoStore::default();
        let url = photos
            .store(PhotoUpload {
                file_name: None,
                content_type: "image/png".to_string(),
                bytes: vec![1, 2, 3],
            })
            .expect("stored");
        assert_eq!(url, "memory://photos/photo-000001.png");
        assert_eq!(photos.len(), 1);
    }
}
