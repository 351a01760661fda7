use super::domain::{ContactDetails, Coordinates, Office, OfficeId, OfficeKind, NOT_AVAILABLE};
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

const SEEDED_OFFICES: &str = include_str!("../../../data/offices.csv");

#[derive(Debug)]
pub enum RegistryLoadError {
    Io(std::io::Error),
    Csv(csv::Error),
    UnknownKind { id: String, kind: String },
    InvalidCoordinates { id: String },
    DuplicateId(String),
}

impl std::fmt::Display for RegistryLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryLoadError::Io(err) => write!(f, "failed to read office registry: {}", err),
            RegistryLoadError::Csv(err) => write!(f, "invalid office registry CSV: {}", err),
            RegistryLoadError::UnknownKind { id, kind } => {
                write!(f, "office '{}' has unknown type '{}'", id, kind)
            }
            RegistryLoadError::InvalidCoordinates { id } => {
                write!(f, "office '{}' has coordinates outside WGS84 range", id)
            }
            RegistryLoadError::DuplicateId(id) => {
                write!(f, "office id '{}' appears more than once", id)
            }
        }
    }
}

impl std::error::Error for RegistryLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryLoadError::Io(err) => Some(err),
            RegistryLoadError::Csv(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RegistryLoadError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RegistryLoadError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Catalogue of offices that can receive reports. Built once and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct OfficeRegistry {
    offices: Vec<Office>,
}

impl OfficeRegistry {
    pub fn new(offices: Vec<Office>) -> Result<Self, RegistryLoadError> {
        let mut seen = HashSet::new();
        for office in &offices {
            if !office.coordinates.is_valid() {
                return Err(RegistryLoadError::InvalidCoordinates {
                    id: office.id.0.clone(),
                });
            }
            if !seen.insert(office.id.clone()) {
                return Err(RegistryLoadError::DuplicateId(office.id.0.clone()));
            }
        }
        Ok(Self { offices })
    }

    /// Built-in catalogue of Divisional Secretariats and Pradeshiya Sabhas.
    pub fn seeded() -> Result<Self, RegistryLoadError> {
        Self::from_reader(SEEDED_OFFICES.as_bytes())
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RegistryLoadError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RegistryLoadError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut offices = Vec::new();
        for record in csv_reader.deserialize::<OfficeRow>() {
            offices.push(record?.into_office()?);
        }

        Self::new(offices)
    }

    pub fn offices(&self) -> &[Office] {
        &self.offices
    }

    pub fn get(&self, id: &OfficeId) -> Option<&Office> {
        self.offices.iter().find(|office| &office.id == id)
    }

    pub fn len(&self) -> usize {
        self.offices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offices.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct OfficeRow {
    id: String,
    name: String,
    #[serde(rename = "type")]
    kind: String,
    address: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    city: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    district: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    province: Option<String>,
    lat: f64,
    lng: f64,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    email: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    phone: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    website: Option<String>,
}

impl OfficeRow {
    fn into_office(self) -> Result<Office, RegistryLoadError> {
        let kind = OfficeKind::parse(&self.kind).ok_or_else(|| RegistryLoadError::UnknownKind {
            id: self.id.clone(),
            kind: self.kind.clone(),
        })?;

        let unknown = || "Unknown".to_string();
        let sentinel = || NOT_AVAILABLE.to_string();

        Ok(Office {
            id: OfficeId(self.id),
            name: self.name,
            kind,
            address: self.address,
            city: self.city.unwrap_or_else(unknown),
            district: self.district.unwrap_or_else(unknown),
            province: self.province.unwrap_or_else(unknown),
            coordinates: Coordinates {
                lat: self.lat,
                lng: self.lng,
            },
            contact: ContactDetails {
                email: self.email.unwrap_or_else(sentinel),
                phone: self.phone.unwrap_or_else(sentinel),
                website: self.website.unwrap_or_else(sentinel),
            },
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }))
}
