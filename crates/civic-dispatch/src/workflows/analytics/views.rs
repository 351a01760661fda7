use serde::Serialize;

use crate::workflows::reports::Report;

/// Number of areas listed in each ranking.
pub const RANKING_SIZE: usize = 5;

/// Share of the filtered report set falling in one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionBucket {
    pub name: String,
    pub count: usize,
    pub percentage: f64,
}

/// Filtered reports of one city, newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityGroup {
    pub city: String,
    pub count: usize,
    pub reports: Vec<Report>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankedAreas {
    pub cities: Vec<RegionBucket>,
    pub districts: Vec<RegionBucket>,
    pub provinces: Vec<RegionBucket>,
}

/// "Problem areas" (most active issues) and "best performing" areas (fewest).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Rankings {
    pub top: RankedAreas,
    pub bottom: RankedAreas,
}

/// Result of one aggregation pass.
///
/// The three counters cover the whole input; everything else describes the
/// filtered subset, except `rankings`, which always reflect active reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationSnapshot {
    pub total_reports: usize,
    pub active_count: usize,
    pub resolved_count: usize,
    pub filtered_reports: usize,
    pub cities_affected: usize,
    pub by_city: Vec<RegionBucket>,
    pub by_district: Vec<RegionBucket>,
    pub by_province: Vec<RegionBucket>,
    pub rankings: Rankings,
    /// Served page by page, see [`super::pagination::Paginator`].
    #[serde(skip)]
    pub groups: Vec<CityGroup>,
}
