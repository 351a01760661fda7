use serde::{Deserialize, Serialize};

use crate::workflows::reports::{Report, ReportStatus};

/// Sentinel meaning "do not filter on this dimension".
pub const ALL: &str = "all";

/// Which side of the resolved/active split a view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionFilter {
    All,
    #[default]
    Active,
    Resolved,
}

impl ResolutionFilter {
    /// Blank input selects the default active-only view.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") => Some(Self::Active),
            Some("all") => Some(Self::All),
            Some("active") => Some(Self::Active),
            Some("resolved") => Some(Self::Resolved),
            Some(_) => None,
        }
    }

    pub fn admits(self, report: &Report) -> bool {
        match self {
            Self::All => true,
            Self::Active => !report.is_resolved(),
            Self::Resolved => report.is_resolved(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("unknown resolution filter '{0}'")]
    UnknownResolution(String),
    #[error("unknown status filter '{0}'")]
    UnknownStatus(String),
}

/// Dashboard filter. `None` in an exact-match slot means [`ALL`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
    pub resolution: ResolutionFilter,
    pub status: Option<ReportStatus>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub province: Option<String>,
    pub query: Option<String>,
}

/// Query-string shape of [`ReportFilter`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
}

impl TryFrom<FilterParams> for ReportFilter {
    type Error = FilterError;

    fn try_from(params: FilterParams) -> Result<Self, Self::Error> {
        let resolution = ResolutionFilter::parse(params.resolution.as_deref()).ok_or_else(|| {
            FilterError::UnknownResolution(params.resolution.clone().unwrap_or_default())
        })?;
        let status = match exact(params.status) {
            None => None,
            Some(raw) => Some(ReportStatus::parse(&raw).ok_or(FilterError::UnknownStatus(raw))?),
        };

        Ok(Self {
            resolution,
            status,
            city: exact(params.city),
            district: exact(params.district),
            province: exact(params.province),
            query: params
                .q
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty()),
        })
    }
}

fn exact(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty() && !raw.eq_ignore_ascii_case(ALL))
}

impl ReportFilter {
    pub fn with_resolution(mut self, resolution: ResolutionFilter) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Applies the resolution, exact-match and free-text stages in that order.
    pub fn apply<'a>(&self, reports: &'a [Report]) -> Vec<&'a Report> {
        let resolved: Vec<&Report> = reports
            .iter()
            .filter(|report| self.resolution.admits(report))
            .collect();
        let exact: Vec<&Report> = resolved
            .into_iter()
            .filter(|report| self.matches_exact(report))
            .collect();
        exact
            .into_iter()
            .filter(|report| self.matches_text(report))
            .collect()
    }

    fn matches_exact(&self, report: &Report) -> bool {
        let location = &report.location;
        self.status.map_or(true, |status| report.status == status)
            && slot_matches(&self.city, &location.city)
            && slot_matches(&self.district, &location.district)
            && slot_matches(&self.province, &location.province)
    }

    fn matches_text(&self, report: &Report) -> bool {
        let Some(query) = self.query.as_deref() else {
            return true;
        };
        let needle = query.to_lowercase();
        let location = &report.location;
        [
            report.reporter.name.as_str(),
            report.reporter.email.as_str(),
            report.description.as_str(),
            location.address.as_str(),
            location.city.as_str(),
            location.district.as_str(),
            location.province.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

fn slot_matches(expected: &Option<String>, actual: &str) -> bool {
    expected.as_deref().map_or(true, |value| value == actual)
}
