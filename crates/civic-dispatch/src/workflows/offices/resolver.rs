use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::domain::{Coordinates, Office};
use super::enrichment::{ContactEnricher, EnrichmentError, EnrichmentRequest};
use super::geo::haversine_km;
use super::registry::OfficeRegistry;
use crate::config::ResolverConfig;

/// Registry entry annotated with its distance from the query point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfficeMatch {
    pub office: Office,
    pub distance_km: f64,
    pub maps_url: String,
}

/// Ranked offices for one query point.
///
/// `within_radius` is false when nothing fell inside the requested radius and
/// the whole registry was returned instead; `nearest` may then be far away.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub matches: Vec<OfficeMatch>,
    pub nearest: OfficeMatch,
    pub within_radius: bool,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no offices configured")]
    NoOfficesConfigured,
}

/// Ranks registry offices by great-circle distance and completes their contacts.
pub struct GeoResolver<E> {
    registry: Arc<OfficeRegistry>,
    enricher: Arc<E>,
    config: ResolverConfig,
}

impl<E> GeoResolver<E>
where
    E: ContactEnricher + 'static,
{
    pub fn new(registry: Arc<OfficeRegistry>, enricher: Arc<E>, config: ResolverConfig) -> Self {
        Self {
            registry,
            enricher,
            config,
        }
    }

    pub fn registry(&self) -> &OfficeRegistry {
        &self.registry
    }

    pub fn default_radius_km(&self) -> f64 {
        self.config.default_radius_km
    }

    /// Pure ranking step: no collaborators are contacted.
    pub fn rank(&self, point: Coordinates, radius_km: f64) -> Result<Resolution, ResolveError> {
        if !point.is_valid() {
            return Err(ResolveError::InvalidInput(format!(
                "coordinates ({}, {}) are outside [-90, 90] / [-180, 180]",
                point.lat, point.lng
            )));
        }
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(ResolveError::InvalidInput(format!(
                "search radius must be a non-negative number of kilometres, got {radius_km}"
            )));
        }
        if self.registry.is_empty() {
            return Err(ResolveError::NoOfficesConfigured);
        }

        let mut ranked: Vec<OfficeMatch> = self
            .registry
            .offices()
            .iter()
            .map(|office| OfficeMatch {
                distance_km: haversine_km(point, office.coordinates),
                maps_url: office.coordinates.maps_url(),
                office: office.clone(),
            })
            .collect();

        ranked.sort_by(|a, b| {
            a.distance_km
                .total_cmp(&b.distance_km)
                .then_with(|| a.office.id.cmp(&b.office.id))
        });

        let within: Vec<OfficeMatch> = ranked
            .iter()
            .filter(|candidate| candidate.distance_km <= radius_km)
            .cloned()
            .collect();

        let (matches, within_radius) = if within.is_empty() {
            warn!(
                lat = point.lat,
                lng = point.lng,
                radius_km,
                nearest_km = ranked[0].distance_km,
                "no office within search radius; returning full registry"
            );
            (ranked, false)
        } else {
            (within, true)
        };

        let nearest = matches[0].clone();
        Ok(Resolution {
            matches,
            nearest,
            within_radius,
        })
    }

    /// Ranks offices and overlays best-effort contact enrichment.
    pub async fn resolve(
        &self,
        point: Coordinates,
        radius_km: f64,
        report_context: Option<&str>,
    ) -> Result<Resolution, ResolveError> {
        let mut resolution = self.rank(point, radius_km)?;

        if self.enricher.is_enabled() {
            self.enrich_matches(&mut resolution.matches, point, report_context)
                .await;
            resolution.nearest = resolution.matches[0].clone();
        }

        Ok(resolution)
    }

    async fn enrich_matches(
        &self,
        matches: &mut [OfficeMatch],
        point: Coordinates,
        report_context: Option<&str>,
    ) {
        let requests: Vec<(usize, EnrichmentRequest)> = matches
            .iter()
            .enumerate()
            .take(self.config.enrichment_limit)
            .filter(|(_, candidate)| !candidate.office.contact.is_complete())
            .map(|(index, candidate)| {
                (
                    index,
                    EnrichmentRequest::for_office(&candidate.office, point, report_context),
                )
            })
            .collect();

        let beyond_limit = incomplete_past_limit(matches, self.config.enrichment_limit);
        if beyond_limit > 0 {
            debug!(
                unenriched = beyond_limit,
                limit = self.config.enrichment_limit,
                "incomplete matches past the enrichment limit keep their sentinels"
            );
        }

        if requests.is_empty() {
            return;
        }

        let enricher = self.enricher.as_ref();
        let limit = self.config.enrichment_timeout;
        let outcomes = join_all(requests.iter().map(|(index, request)| async move {
            let outcome = match timeout(limit, enricher.enrich(request)).await {
                Ok(result) => result,
                Err(_) => Err(EnrichmentError::TimedOut),
            };
            (*index, outcome)
        }))
        .await;

        for (index, outcome) in outcomes {
            let office = &mut matches[index].office;
            match outcome {
                Ok(enriched) => {
                    debug!(office = %office.id, "contact enrichment applied");
                    office.contact.merge(&enriched);
                }
                Err(err) => {
                    warn!(office = %office.id, error = %err, "contact enrichment skipped");
                }
            }
        }
    }
}

/// Matches still carrying sentinels that fall outside the enrichment limit.
pub(super) fn incomplete_past_limit(matches: &[OfficeMatch], limit: usize) -> usize {
    matches
        .iter()
        .skip(limit)
        .filter(|candidate| !candidate.office.contact.is_complete())
        .count()
}
