use serde::{Deserialize, Serialize};

use crate::workflows::offices::{Coordinates, Office};

/// Sentinel for administrative fields that could not be determined.
pub const UNKNOWN: &str = "Unknown";

/// Where a report was filed. Every administrative field is always populated;
/// missing or blank values are normalized to [`UNKNOWN`] on ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "LocationInput")]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    pub address: String,
    pub city: String,
    pub district: String,
    pub province: String,
}

/// Loosely shaped location payload as submitted by clients or read from storage.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationInput {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude")]
    pub lng: f64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
}

impl From<LocationInput> for Location {
    fn from(input: LocationInput) -> Self {
        Self {
            lat: input.lat,
            lng: input.lng,
            address: normalize(input.address),
            city: normalize(input.city),
            district: normalize(input.district),
            province: normalize(input.province),
        }
    }
}

fn normalize(value: Option<String>) -> String {
    match value {
        Some(raw) if !raw.trim().is_empty() && !raw.trim().eq_ignore_ascii_case(UNKNOWN) => {
            raw.trim().to_string()
        }
        _ => UNKNOWN.to_string(),
    }
}

impl Location {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lng: self.lng,
        }
    }

    pub fn has_unknown_region(&self) -> bool {
        [&self.city, &self.district, &self.province]
            .iter()
            .any(|value| value.as_str() == UNKNOWN)
    }

    /// Fills undetermined administrative fields from the responsible office.
    pub fn fill_from_office(&mut self, office: &Office) {
        for (slot, candidate) in [
            (&mut self.city, &office.city),
            (&mut self.district, &office.district),
            (&mut self.province, &office.province),
        ] {
            if slot.as_str() == UNKNOWN && !candidate.trim().is_empty() {
                *slot = candidate.clone();
            }
        }
    }
}
