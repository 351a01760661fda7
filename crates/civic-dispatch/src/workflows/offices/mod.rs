//! Nearest-office resolution over the administrative office registry.

pub mod completion;
pub mod domain;
pub mod enrichment;
pub mod geo;
pub mod registry;
pub mod resolver;
pub mod router;

#[cfg(test)]
mod tests;

pub use completion::ChatCompletionEnricher;
pub use domain::{
    is_sentinel, ContactDetails, ContactField, Coordinates, EnrichedContact, InvalidCoordinates,
    Office, OfficeId, OfficeKind, NOT_AVAILABLE,
};
pub use enrichment::{ContactEnricher, EnrichmentError, EnrichmentRequest, NoEnrichment};
pub use geo::haversine_km;
pub use registry::{OfficeRegistry, RegistryLoadError};
pub use resolver::{GeoResolver, OfficeMatch, Resolution, ResolveError};
pub use router::{office_router, NearbyOfficesRequest, NearbyOfficesResponse, OfficialView};
