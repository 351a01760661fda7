use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder stored for contact fields nobody has filled in yet.
pub const NOT_AVAILABLE: &str = "Not available";

/// Returns true when a contact value carries no usable information.
pub fn is_sentinel(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NOT_AVAILABLE)
}

/// Identifier wrapper for registry entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OfficeId(pub String);

impl fmt::Display for OfficeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Administrative office categories that accept citizen reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfficeKind {
    DivisionalSecretariat,
    PradeshiyaSabha,
    MunicipalCouncil,
    UrbanCouncil,
    DistrictSecretariat,
}

impl OfficeKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::DivisionalSecretariat => "Divisional Secretariat",
            Self::PradeshiyaSabha => "Pradeshiya Sabha",
            Self::MunicipalCouncil => "Municipal Council",
            Self::UrbanCouncil => "Urban Council",
            Self::DistrictSecretariat => "District Secretariat",
        }
    }

    /// Accepts both display labels and snake_case identifiers.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "divisionalsecretariat" | "ds" => Some(Self::DivisionalSecretariat),
            "pradeshiyasabha" | "ps" => Some(Self::PradeshiyaSabha),
            "municipalcouncil" | "mc" => Some(Self::MunicipalCouncil),
            "urbancouncil" | "uc" => Some(Self::UrbanCouncil),
            "districtsecretariat" => Some(Self::DistrictSecretariat),
            _ => None,
        }
    }
}

/// WGS84 point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Result<Self, InvalidCoordinates> {
        let point = Self { lat, lng };
        if point.is_valid() {
            Ok(point)
        } else {
            Err(InvalidCoordinates { lat, lng })
        }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    pub fn maps_url(&self) -> String {
        format!(
            "https://www.google.com/maps/search/?api=1&query={},{}",
            self.lat, self.lng
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("coordinates ({lat}, {lng}) are outside [-90, 90] / [-180, 180]")]
pub struct InvalidCoordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactField {
    Email,
    Phone,
    Website,
}

impl ContactField {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Website => "website",
        }
    }
}

/// Published contact channels for an office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub email: String,
    pub phone: String,
    pub website: String,
}

impl Default for ContactDetails {
    fn default() -> Self {
        Self {
            email: NOT_AVAILABLE.to_string(),
            phone: NOT_AVAILABLE.to_string(),
            website: NOT_AVAILABLE.to_string(),
        }
    }
}

impl ContactDetails {
    pub fn missing_fields(&self) -> Vec<ContactField> {
        let mut missing = Vec::new();
        if is_sentinel(&self.email) {
            missing.push(ContactField::Email);
        }
        if is_sentinel(&self.phone) {
            missing.push(ContactField::Phone);
        }
        if is_sentinel(&self.website) {
            missing.push(ContactField::Website);
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Overlays enriched values onto sentinel fields only; published values win.
    pub fn merge(&mut self, enriched: &EnrichedContact) {
        fill(&mut self.email, enriched.email.as_deref(), |value| {
            crate::workflows::reports::is_rfc_shaped_email(value)
        });
        fill(&mut self.phone, enriched.phone.as_deref(), |_| true);
        fill(&mut self.website, enriched.website.as_deref(), |_| true);
    }
}

fn fill(slot: &mut String, candidate: Option<&str>, accept: impl Fn(&str) -> bool) {
    if !is_sentinel(slot) {
        return;
    }
    if let Some(value) = candidate.map(str::trim) {
        if !is_sentinel(value) && accept(value) {
            *slot = value.to_string();
        }
    }
}

/// Contact values proposed by an enrichment collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedContact {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

/// Immutable registry entry for an administrative office.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Office {
    pub id: OfficeId,
    pub name: String,
    pub kind: OfficeKind,
    pub address: String,
    pub city: String,
    pub district: String,
    pub province: String,
    pub coordinates: Coordinates,
    pub contact: ContactDetails,
}
