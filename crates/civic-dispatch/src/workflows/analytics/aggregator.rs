use std::collections::HashMap;
use std::sync::Arc;

use super::filter::ReportFilter;
use super::views::{
    AggregationSnapshot, CityGroup, RankedAreas, Rankings, RegionBucket, RANKING_SIZE,
};
use crate::workflows::reports::{Location, Report, ReportStore, StoreError, UNKNOWN};

#[derive(Debug, thiserror::Error)]
pub enum AggregationError {
    #[error("aggregation superseded by a newer request")]
    Cancelled,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("aggregation worker failed: {0}")]
    Worker(String),
}

/// Full recompute over `reports`; never fails, empty input yields zeros.
pub fn aggregate(reports: &[Report], filter: &ReportFilter) -> AggregationSnapshot {
    aggregate_until(reports, filter, &|| false).unwrap_or_default()
}

/// Same pass as [`aggregate`], abandoned between stages once `cancelled` reports true.
pub fn aggregate_until(
    reports: &[Report],
    filter: &ReportFilter,
    cancelled: &dyn Fn() -> bool,
) -> Result<AggregationSnapshot, AggregationError> {
    let checkpoint = || {
        if cancelled() {
            Err(AggregationError::Cancelled)
        } else {
            Ok(())
        }
    };

    let resolved_count = reports.iter().filter(|report| report.is_resolved()).count();
    let active: Vec<&Report> = reports
        .iter()
        .filter(|report| !report.is_resolved())
        .collect();
    checkpoint()?;

    let filtered = filter.apply(reports);
    let total = filtered.len();
    checkpoint()?;

    let groups = group_by_city(&filtered);
    let by_city = groups
        .iter()
        .map(|group| RegionBucket {
            name: group.city.clone(),
            count: group.count,
            percentage: percentage(group.count, total),
        })
        .collect();
    let by_district = buckets(&filtered, |location| &location.district, total);
    let by_province = buckets(&filtered, |location| &location.province, total);
    checkpoint()?;

    let rankings = rank_active(&active);
    checkpoint()?;

    Ok(AggregationSnapshot {
        total_reports: reports.len(),
        active_count: active.len(),
        resolved_count,
        filtered_reports: total,
        cities_affected: groups.len(),
        by_city,
        by_district,
        by_province,
        rankings,
        groups,
    })
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Counts per region, sorted by count descending; ties keep first-appearance order.
fn buckets<'a, F>(reports: &[&'a Report], key: F, total: usize) -> Vec<RegionBucket>
where
    F: Fn(&'a Location) -> &'a String,
{
    let mut counts: Vec<(&'a str, usize)> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    for report in reports.iter().copied() {
        let name = key(&report.location).as_str();
        match index.get(name) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(name, counts.len());
                counts.push((name, 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .map(|(name, count)| RegionBucket {
            name: name.to_string(),
            count,
            percentage: percentage(count, total),
        })
        .collect()
}

fn group_by_city(reports: &[&Report]) -> Vec<CityGroup> {
    let mut groups: Vec<CityGroup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for report in reports.iter().copied() {
        let city = report.location.city.as_str();
        let slot = *index.entry(city).or_insert_with(|| {
            groups.push(CityGroup {
                city: city.to_string(),
                count: 0,
                reports: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].reports.push(report.clone());
        groups[slot].count += 1;
    }

    for group in &mut groups {
        group
            .reports
            .sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }
    groups.sort_by(|a, b| b.count.cmp(&a.count));
    groups
}

fn rank_active(active: &[&Report]) -> Rankings {
    let total = active.len();
    let (top_cities, bottom_cities) = split_ranking(buckets(active, |l| &l.city, total));
    let (top_districts, bottom_districts) =
        split_ranking(buckets(active, |l| &l.district, total));
    let (top_provinces, bottom_provinces) =
        split_ranking(buckets(active, |l| &l.province, total));

    Rankings {
        top: RankedAreas {
            cities: top_cities,
            districts: top_districts,
            provinces: top_provinces,
        },
        bottom: RankedAreas {
            cities: bottom_cities,
            districts: bottom_districts,
            provinces: bottom_provinces,
        },
    }
}

/// Head and reversed tail of the descending list, never including `Unknown`.
fn split_ranking(sorted: Vec<RegionBucket>) -> (Vec<RegionBucket>, Vec<RegionBucket>) {
    let known: Vec<RegionBucket> = sorted
        .into_iter()
        .filter(|bucket| bucket.name != UNKNOWN)
        .collect();
    let top = known.iter().take(RANKING_SIZE).cloned().collect();
    let bottom = known.iter().rev().take(RANKING_SIZE).cloned().collect();
    (top, bottom)
}

/// Point-in-time reads from the report store fed through [`aggregate`].
pub struct RegionalAggregator<S> {
    store: Arc<S>,
    fetch_limit: usize,
}

impl<S> RegionalAggregator<S>
where
    S: ReportStore + 'static,
{
    pub fn new(store: Arc<S>, fetch_limit: usize) -> Self {
        Self { store, fetch_limit }
    }

    pub fn fetch(&self) -> Result<Vec<Report>, StoreError> {
        self.store.list(self.fetch_limit)
    }

    pub fn aggregate(&self, filter: &ReportFilter) -> Result<AggregationSnapshot, StoreError> {
        let reports = self.fetch()?;
        Ok(aggregate(&reports, filter))
    }
}
