use crate::infra::{
    load_registry, ConfiguredEnricher, ConfiguredTransport, LoggingMailTransport, Platform,
};
use civic_dispatch::config::{AppConfig, DashboardConfig, DispatchConfig, ResolverConfig};
use civic_dispatch::error::AppError;
use civic_dispatch::workflows::analytics::{
    aggregate, AggregationSnapshot, CityGroup, DashboardView, FilterParams, PageView, Paginator,
    RankedAreas, RegionBucket, ReportFilter, ResolutionFilter,
};
use civic_dispatch::workflows::offices::{
    Coordinates, GeoResolver, NoEnrichment, OfficeMatch, OfficeRegistry,
};
use civic_dispatch::workflows::reports::{
    CommentInput, Location, LocationInput, OfficeRef, PhotoUpload, Report, ReportStatus,
    ReportSubmission, Reporter, ResolutionStatus,
};
use clap::Args;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct NearestArgs {
    /// Latitude of the reported issue
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) lat: f64,
    /// Longitude of the reported issue
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) lng: f64,
    /// Search radius in kilometres (defaults to APP_SEARCH_RADIUS_KM)
    #[arg(long)]
    pub(crate) radius: Option<f64>,
    /// Office registry CSV overriding the configured catalogue
    #[arg(long)]
    pub(crate) registry: Option<PathBuf>,
    /// Issue description forwarded to contact enrichment
    #[arg(long)]
    pub(crate) context: Option<String>,
    /// Maximum number of offices to print
    #[arg(long, default_value_t = 10)]
    pub(crate) limit: usize,
}

#[derive(Args, Debug)]
pub(crate) struct SummaryArgs {
    /// JSON export of stored reports (array or {"reports": [...]})
    #[arg(long)]
    pub(crate) reports: PathBuf,
    /// active (default), resolved or all
    #[arg(long)]
    pub(crate) resolution: Option<String>,
    /// submitted, in-progress, resolved or all
    #[arg(long)]
    pub(crate) status: Option<String>,
    #[arg(long)]
    pub(crate) city: Option<String>,
    #[arg(long)]
    pub(crate) district: Option<String>,
    #[arg(long)]
    pub(crate) province: Option<String>,
    /// Case-insensitive free-text search
    #[arg(long)]
    pub(crate) query: Option<String>,
    /// Page of city groups to print
    #[arg(long, default_value_t = 1)]
    pub(crate) page: usize,
    #[arg(long, default_value_t = 10)]
    pub(crate) page_size: usize,
    /// Print the snapshot as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Latitude of the demo report (defaults to central Kandy)
    #[arg(long, default_value_t = 7.2936, allow_hyphen_values = true)]
    pub(crate) lat: f64,
    /// Longitude of the demo report
    #[arg(long, default_value_t = 80.6413, allow_hyphen_values = true)]
    pub(crate) lng: f64,
    /// Number of nearby offices to notify
    #[arg(long, default_value_t = 3)]
    pub(crate) recipients: usize,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            lat: 7.2936,
            lng: 80.6413,
            recipients: 3,
        }
    }
}

pub(crate) async fn run_offices_nearest(args: NearestArgs) -> Result<(), AppError> {
    let NearestArgs {
        lat,
        lng,
        radius,
        registry,
        context,
        limit,
    } = args;

    let mut config = AppConfig::load()?;
    if registry.is_some() {
        config.resolver.registry_path = registry;
    }

    let offices = load_registry(&config.resolver)?;
    let enricher = ConfiguredEnricher::from_config(&config);
    let radius = radius.unwrap_or(config.resolver.default_radius_km);
    let resolver = GeoResolver::new(Arc::new(offices), Arc::new(enricher), config.resolver);

    let resolution = resolver
        .resolve(Coordinates { lat, lng }, radius, context.as_deref())
        .await?;

    println!("Offices responsible for ({lat:.4}, {lng:.4})");
    if !resolution.within_radius {
        println!("- nothing within {radius} km; listing the full registry by distance");
    }
    for candidate in resolution.matches.iter().take(limit.max(1)) {
        print_office(candidate);
    }
    Ok(())
}

pub(crate) fn run_analytics_summary(args: SummaryArgs) -> Result<(), AppError> {
    let SummaryArgs {
        reports,
        resolution,
        status,
        city,
        district,
        province,
        query,
        page,
        page_size,
        json,
    } = args;

    let raw = std::fs::read_to_string(&reports)?;
    let reports = match serde_json::from_str::<ReportExport>(&raw)? {
        ReportExport::Bare(reports) => reports,
        ReportExport::Wrapped { reports } => reports,
    };

    let filter = ReportFilter::try_from(FilterParams {
        resolution,
        status,
        city,
        district,
        province,
        q: query,
    })?;
    let snapshot = aggregate(&reports, &filter);

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let mut paginator = Paginator::new(page_size);
    paginator.apply_filter(filter);
    paginator.go_to(page);
    render_snapshot(&snapshot, &paginator.slice(&snapshot.groups));
    Ok(())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReportExport {
    Bare(Vec<Report>),
    Wrapped { reports: Vec<Report> },
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        lat,
        lng,
        recipients,
    } = args;

    println!("Civic dispatch demo");
    let platform = Platform::assemble(
        OfficeRegistry::seeded()?,
        ConfiguredEnricher::Disabled(NoEnrichment),
        ConfiguredTransport::Logging(LoggingMailTransport::default()),
        ResolverConfig::default(),
        DispatchConfig::default(),
        DashboardConfig {
            page_size: 3,
            ..DashboardConfig::default()
        },
    );

    let resolver = platform.resolver.as_ref();
    let resolution = resolver.rank(Coordinates { lat, lng }, resolver.default_radius_km())?;
    println!(
        "\nNearby offices ({} within {} km)",
        resolution.matches.len(),
        resolver.default_radius_km()
    );
    for candidate in resolution.matches.iter().take(5) {
        print_office(candidate);
    }

    let selected: Vec<OfficeRef> = resolution
        .matches
        .iter()
        .take(recipients.max(1))
        .map(|candidate| OfficeRef::from(&candidate.office))
        .collect();

    let intake = platform.intake();
    let lifecycle = platform.lifecycle();

    println!("\nSubmitting a report to {} office(s)", selected.len());
    let submission = ReportSubmission {
        description: "Large pothole blocking the left lane near the market junction".to_string(),
        location: Location::from(LocationInput {
            lat,
            lng,
            address: Some("Market junction".to_string()),
            ..LocationInput::default()
        }),
        offices: selected,
        reporter: Reporter {
            name: "Demo Citizen".to_string(),
            email: "citizen@example.org".to_string(),
        },
        photo: Some(PhotoUpload {
            file_name: Some("pothole.jpg".to_string()),
            content_type: "image/jpeg".to_string(),
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
        }),
    };
    let receipt = match intake.submit(submission).await {
        Ok(receipt) => receipt,
        Err(err) => {
            println!("  Submission rejected: {}", err);
            return Ok(());
        }
    };
    let dispatch = &receipt.dispatch;
    println!(
        "- Report {} -> {}/{} notifications delivered",
        dispatch.report_id, dispatch.successful_emails, dispatch.total_emails
    );
    for delivery in &dispatch.emails_sent {
        println!(
            "  - {} [{:?}]{}",
            delivery.email,
            delivery.status,
            delivery
                .detail
                .as_deref()
                .map(|detail| format!(" {detail}"))
                .unwrap_or_default()
        );
    }
    if let Some(url) = &receipt.photo_url {
        println!("  Photo stored at {url} ({} on file)", platform.photos.len());
    }

    match lifecycle.update_status(&dispatch.report_id, "demo-admin", ReportStatus::InProgress) {
        Ok(report) => println!("- Status now {}", report.status.label()),
        Err(err) => println!("  Status update unavailable: {}", err),
    }
    match lifecycle.append_comment(
        &dispatch.report_id,
        CommentInput {
            name: "Neighbour".to_string(),
            email: "neighbour@example.org".to_string(),
            text: "Still there this morning, two scooters skidded.".to_string(),
        },
    ) {
        Ok(comments) => println!("- {} public comment(s) on file", comments.len()),
        Err(err) => println!("  Comment rejected: {}", err),
    }

    let colombo = Location::from(LocationInput {
        lat: 6.9271,
        lng: 79.8612,
        ..LocationInput::default()
    });
    let nearest_colombo = resolver.rank(colombo.coordinates(), resolver.default_radius_km())?;
    let resolved_submission = ReportSubmission {
        description: "Streetlight out on Galle Road".to_string(),
        location: colombo,
        offices: vec![OfficeRef::from(&nearest_colombo.nearest.office)],
        reporter: Reporter::default(),
        photo: None,
    };
    if let Ok(second) = intake.submit(resolved_submission).await {
        if let Err(err) = lifecycle.update_resolution_status(
            &second.dispatch.report_id,
            "demo-admin",
            ResolutionStatus::Resolved,
        ) {
            println!("  Resolution update unavailable: {}", err);
        }
    }

    println!("\nRegional dashboard");
    let dashboard = DashboardView::new(platform.aggregator(), platform.dashboard.page_size);
    dashboard.set_filter(ReportFilter::default().with_resolution(ResolutionFilter::All));
    match dashboard.refresh().await {
        Ok(view) => render_snapshot(&view.snapshot, &view.page),
        Err(err) => println!("  Dashboard unavailable: {}", err),
    }

    if let ConfiguredTransport::Logging(outbox) = platform.transport.as_ref() {
        println!("\nLocal outbox");
        for notification in outbox.outbox() {
            println!("- {} :: {}", notification.to, notification.subject);
        }
    }

    Ok(())
}

fn print_office(candidate: &OfficeMatch) {
    let office = &candidate.office;
    println!(
        "- {:>7.2} km  {} ({}) | {}, {}, {}",
        candidate.distance_km,
        office.name,
        office.kind.label(),
        office.city,
        office.district,
        office.province
    );
    println!(
        "    email: {} | phone: {} | {}",
        office.contact.email, office.contact.phone, candidate.maps_url
    );
}

fn render_snapshot(snapshot: &AggregationSnapshot, page: &PageView<CityGroup>) {
    println!(
        "- {} reports | {} active | {} resolved",
        snapshot.total_reports, snapshot.active_count, snapshot.resolved_count
    );
    println!(
        "- {} match the filter across {} cities",
        snapshot.filtered_reports, snapshot.cities_affected
    );
    render_buckets("By city", &snapshot.by_city);
    render_buckets("By district", &snapshot.by_district);
    render_buckets("By province", &snapshot.by_province);
    render_ranking("Problem areas", &snapshot.rankings.top);
    render_ranking("Best performing", &snapshot.rankings.bottom);

    println!(
        "City groups (page {} of {}, {} groups)",
        page.number, page.total_pages, page.total_items
    );
    for group in &page.items {
        println!("  - {} ({} reports)", group.city, group.count);
        for report in &group.reports {
            println!(
                "    - {} [{}] {}",
                report.id,
                report.status.label(),
                report.description
            );
        }
    }
}

fn render_buckets(title: &str, buckets: &[RegionBucket]) {
    if buckets.is_empty() {
        return;
    }
    println!("{title}:");
    for bucket in buckets {
        println!(
            "  - {}: {} ({:.1}%)",
            bucket.name, bucket.count, bucket.percentage
        );
    }
}

fn render_ranking(title: &str, areas: &RankedAreas) {
    let names = |buckets: &[RegionBucket]| {
        buckets
            .iter()
            .map(|bucket| format!("{} ({})", bucket.name, bucket.count))
            .collect::<Vec<_>>()
            .join(", ")
    };
    println!("{title}:");
    println!("  cities: {}", names(&areas.cities));
    println!("  districts: {}", names(&areas.districts));
    println!("  provinces: {}", names(&areas.provinces));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exports_accept_bare_and_wrapped_arrays() {
        let bare = r#"[{
            "id": "rpt-1",
            "description": "Pothole",
            "location": {"lat": 6.9, "lng": 79.8, "city": "Colombo"},
            "createdAt": "2025-03-01T09:00:00Z"
        }]"#;
        let wrapped = format!(r#"{{"reports": {bare}}}"#);

        for raw in [bare.to_string(), wrapped] {
            let reports = match serde_json::from_str::<ReportExport>(&raw).expect("export parses")
            {
                ReportExport::Bare(reports) => reports,
                ReportExport::Wrapped { reports } => reports,
            };
            assert_eq!(reports.len(), 1);
            assert_eq!(reports[0].location.city, "Colombo");
        }
    }

    #[tokio::test]
    async fn demo_runs_against_the_seeded_registry() {
        run_demo(DemoArgs::default()).await.expect("demo completes");
    }
}
