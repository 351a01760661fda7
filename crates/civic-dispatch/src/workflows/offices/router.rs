use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::Coordinates;
use super::enrichment::ContactEnricher;
use super::resolver::{GeoResolver, OfficeMatch, ResolveError};

/// Router builder exposing nearest-office resolution.
pub fn office_router<E>(resolver: Arc<GeoResolver<E>>) -> Router
where
    E: ContactEnricher + 'static,
{
    Router::new()
        .route("/api/v1/offices/nearby", post(nearby_handler::<E>))
        .with_state(resolver)
}

#[derive(Debug, Clone, Deserialize)]
pub struct NearbyOfficesRequest {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, rename = "searchRadius")]
    pub search_radius: Option<f64>,
    /// Free-text description of the issue, forwarded to contact enrichment.
    #[serde(default)]
    pub context: Option<String>,
}

/// Wire shape of one resolved office.
#[derive(Debug, Clone, Serialize)]
pub struct OfficialView {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    pub formatted_address: String,
    pub email: String,
    pub phone: String,
    pub website: String,
    pub lat: f64,
    pub lng: f64,
    pub distance: f64,
    pub city: String,
    pub district: String,
    pub province: String,
    pub maps_url: String,
}

impl From<&OfficeMatch> for OfficialView {
    fn from(candidate: &OfficeMatch) -> Self {
        let office = &candidate.office;
        Self {
            id: office.id.0.clone(),
            kind: office.kind.label(),
            name: office.name.clone(),
            formatted_address: office.address.clone(),
            email: office.contact.email.clone(),
            phone: office.contact.phone.clone(),
            website: office.contact.website.clone(),
            lat: office.coordinates.lat,
            lng: office.coordinates.lng,
            distance: (candidate.distance_km * 100.0).round() / 100.0,
            city: office.city.clone(),
            district: office.district.clone(),
            province: office.province.clone(),
            maps_url: candidate.maps_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NearbyOfficesResponse {
    pub success: bool,
    pub officials: Vec<OfficialView>,
    pub nearest: OfficialView,
    pub within_radius: bool,
}

pub(crate) async fn nearby_handler<E>(
    State(resolver): State<Arc<GeoResolver<E>>>,
    axum::Json(request): axum::Json<NearbyOfficesRequest>,
) -> Response
where
    E: ContactEnricher + 'static,
{
    let point = Coordinates {
        lat: request.latitude,
        lng: request.longitude,
    };
    let radius = request
        .search_radius
        .unwrap_or_else(|| resolver.default_radius_km());

    match resolver
        .resolve(point, radius, request.context.as_deref())
        .await
    {
        Ok(resolution) => {
            let body = NearbyOfficesResponse {
                success: true,
                officials: resolution.matches.iter().map(OfficialView::from).collect(),
                nearest: OfficialView::from(&resolution.nearest),
                within_radius: resolution.within_radius,
            };
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        Err(err @ ResolveError::InvalidInput(_)) => {
            let payload = json!({ "success": false, "error": err.to_string() });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        Err(err @ ResolveError::NoOfficesConfigured) => {
            let payload = json!({ "success": false, "error": err.to_string() });
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
        }
    }
}
