use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::config::ResolverConfig;
use crate::workflows::offices::domain::{
    ContactDetails, Coordinates, EnrichedContact, Office, OfficeId, OfficeKind, NOT_AVAILABLE,
};
use crate::workflows::offices::enrichment::{ContactEnricher, EnrichmentError, EnrichmentRequest};
use crate::workflows::offices::registry::OfficeRegistry;
use crate::workflows::offices::resolver::GeoResolver;

pub(super) fn office(id: &str, lat: f64, lng: f64) -> Office {
    Office {
        id: OfficeId(id.to_string()),
        name: format!("{id} office"),
        kind: OfficeKind::DivisionalSecretariat,
        address: format!("{id} road"),
        city: format!("{id} city"),
        district: "District".to_string(),
        province: "Province".to_string(),
        coordinates: Coordinates { lat, lng },
        contact: ContactDetails {
            email: format!("{id}@ds.gov.lk"),
            phone: "+94 11 000 0000".to_string(),
            website: format!("https://{id}.ds.gov.lk"),
        },
    }
}

pub(super) fn incomplete_office(id: &str, lat: f64, lng: f64) -> Office {
    let mut office = office(id, lat, lng);
    office.contact.email = NOT_AVAILABLE.to_string();
    office.contact.website = NOT_AVAILABLE.to_string();
    office
}

pub(super) fn registry(offices: Vec<Office>) -> Arc<OfficeRegistry> {
    Arc::new(OfficeRegistry::new(offices).expect("fixture registry is valid"))
}

pub(super) fn resolver_config() -> ResolverConfig {
    ResolverConfig {
        default_radius_km: 50.0,
        enrichment_timeout: Duration::from_millis(200),
        enrichment_limit: 5,
        registry_path: None,
    }
}

pub(super) fn build_resolver(
    offices: Vec<Office>,
) -> (GeoResolver<ScriptedEnricher>, Arc<ScriptedEnricher>) {
    let enricher = Arc::new(ScriptedEnricher::default());
    let resolver = GeoResolver::new(registry(offices), enricher.clone(), resolver_config());
    (resolver, enricher)
}

/// Enricher returning canned answers per office id and recording every call.
#[derive(Default)]
pub(super) struct ScriptedEnricher {
    responses: Mutex<HashMap<String, Result<EnrichedContact, String>>>,
    calls: Mutex<Vec<String>>,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedEnricher {
    pub(super) fn answer(&self, office_id: &str, contact: EnrichedContact) {
        self.responses
            .lock()
            .expect("responses mutex poisoned")
            .insert(office_id.to_string(), Ok(contact));
    }

    pub(super) fn fail(&self, office_id: &str, message: &str) {
        self.responses
            .lock()
            .expect("responses mutex poisoned")
            .insert(office_id.to_string(), Err(message.to_string()));
    }

    pub(super) fn stall_for(&self, delay: Duration) {
        *self.delay.lock().expect("delay mutex poisoned") = Some(delay);
    }

    pub(super) fn calls(&self) -> Vec<String> {
        let mut calls = self.calls.lock().expect("calls mutex poisoned").clone();
        calls.sort();
        calls
    }
}

#[async_trait]
impl ContactEnricher for ScriptedEnricher {
    async fn enrich(
        &self,
        request: &EnrichmentRequest,
    ) -> Result<EnrichedContact, EnrichmentError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(request.office_id.0.clone());

        let delay = *self.delay.lock().expect("delay mutex poisoned");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self
            .responses
            .lock()
            .expect("responses mutex poisoned")
            .get(&request.office_id.0)
            .cloned();
        match scripted {
            Some(Ok(contact)) => Ok(contact),
            Some(Err(message)) => Err(EnrichmentError::Unavailable(message)),
            None => Err(EnrichmentError::Unavailable("no scripted answer".to_string())),
        }
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
