use async_trait::async_trait;
use std::fmt::Write as _;

use super::domain::{
    ContactDetails, ContactField, Coordinates, EnrichedContact, Office, OfficeId,
};

/// Everything an enrichment collaborator knows about the office being completed.
#[derive(Debug, Clone)]
pub struct EnrichmentRequest {
    pub office_id: OfficeId,
    pub office_name: String,
    pub office_kind: &'static str,
    pub address: String,
    pub city: String,
    pub district: String,
    pub province: String,
    pub known: ContactDetails,
    pub missing: Vec<ContactField>,
    /// Natural-language description of why the office is being looked up.
    pub context: String,
}

impl EnrichmentRequest {
    pub fn for_office(office: &Office, point: Coordinates, report_context: Option<&str>) -> Self {
        Self {
            office_id: office.id.clone(),
            office_name: office.name.clone(),
            office_kind: office.kind.label(),
            address: office.address.clone(),
            city: office.city.clone(),
            district: office.district.clone(),
            province: office.province.clone(),
            known: office.contact.clone(),
            missing: office.contact.missing_fields(),
            context: describe_context(office, point, report_context),
        }
    }

    /// Prompt text handed to text-generation backends.
    pub fn prompt(&self) -> String {
        let mut prompt = String::new();
        let _ = writeln!(prompt, "{}", self.context);
        let _ = writeln!(
            prompt,
            "Office: {} ({}), {}, {} / {} / {}.",
            self.office_name,
            self.office_kind,
            self.address,
            self.city,
            self.district,
            self.province
        );
        let _ = writeln!(
            prompt,
            "Known contacts: email={}, phone={}, website={}.",
            self.known.email, self.known.phone, self.known.website
        );
        let missing: Vec<&str> = self.missing.iter().map(|field| field.label()).collect();
        let _ = write!(
            prompt,
            "Return only a JSON object with the keys email, phone and website, filling in {}. Use null for anything you cannot confirm.",
            missing.join(", ")
        );
        prompt
    }
}

fn describe_context(office: &Office, point: Coordinates, report_context: Option<&str>) -> String {
    let mut context = format!(
        "A citizen reported a civic issue at latitude {:.5}, longitude {:.5}",
        point.lat, point.lng
    );
    match report_context.map(str::trim).filter(|text| !text.is_empty()) {
        Some(text) => {
            let _ = write!(context, " described as: \"{}\".", text);
        }
        None => context.push('.'),
    }
    let _ = write!(
        context,
        " The nearest responsible authority is the {} of {}.",
        office.kind.label(),
        office.city
    );
    context
}

/// Failure modes of an enrichment collaborator. Never surfaced to callers.
#[derive(Debug, thiserror::Error)]
pub enum EnrichmentError {
    #[error("enrichment service unavailable: {0}")]
    Unavailable(String),
    #[error("enrichment response could not be parsed: {0}")]
    Malformed(String),
    #[error("enrichment timed out")]
    TimedOut,
}

/// Fills missing contact fields for an office on a best-effort basis.
#[async_trait]
pub trait ContactEnricher: Send + Sync {
    async fn enrich(&self, request: &EnrichmentRequest)
        -> Result<EnrichedContact, EnrichmentError>;

    fn is_enabled(&self) -> bool {
        true
    }
}

/// Enricher used when no text-generation backend is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEnrichment;

#[async_trait]
impl ContactEnricher for NoEnrichment {
    async fn enrich(
        &self,
        _request: &EnrichmentRequest,
    ) -> Result<EnrichedContact, EnrichmentError> {
        Err(EnrichmentError::Unavailable("enrichment disabled".to_string()))
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Extracts the first JSON object from free-form model output.
pub fn parse_enriched_contact(raw: &str) -> Result<EnrichedContact, EnrichmentError> {
    let start = raw.find('{');
    let end = raw.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if end > start => serde_json::from_str(&raw[start..=end])
            .map_err(|err| EnrichmentError::Malformed(err.to_string())),
        _ => Err(EnrichmentError::Malformed(
            "response did not contain a JSON object".to_string(),
        )),
    }
}
