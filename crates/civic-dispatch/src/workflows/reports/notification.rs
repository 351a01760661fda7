use std::fmt::Write as _;

use super::domain::{OfficeRef, Report};
use super::location::UNKNOWN;
use super::transport::Notification;

/// Renders the notification one office receives for a report.
pub fn compose(report: &Report, office: &OfficeRef, sender: &str) -> Notification {
    let location = &report.location;
    let coordinates = location.coordinates();
    let maps_url = coordinates.maps_url();

    let area = if location.city == UNKNOWN {
        location.district.as_str()
    } else {
        location.city.as_str()
    };

    let mut body = String::new();
    let _ = writeln!(body, "Dear {},", office.name);
    body.push('\n');
    let _ = writeln!(
        body,
        "A citizen has reported an issue in your area of responsibility."
    );
    body.push('\n');
    let _ = writeln!(body, "Report ID: {}", report.id);
    let _ = writeln!(body, "Description: {}", report.description.trim());
    if !report.reporter.name.trim().is_empty() {
        let _ = writeln!(body, "Reported by: {}", report.reporter.name.trim());
    }
    let _ = writeln!(body, "Address: {}", location.address);
    let _ = writeln!(
        body,
        "Area: {} / {} / {}",
        location.city, location.district, location.province
    );
    let _ = writeln!(
        body,
        "Coordinates: {:.6}, {:.6}",
        coordinates.lat, coordinates.lng
    );
    let _ = writeln!(body, "Map: {}", maps_url);
    if let Some(photo) = &report.photo_url {
        let _ = writeln!(body, "Photo: {}", photo);
    }
    body.push('\n');
    let _ = writeln!(
        body,
        "Submitted {} via the civic issue reporting platform.",
        report.created_at.format("%Y-%m-%d %H:%M UTC")
    );

    Notification {
        report_id: report.id.clone(),
        from: sender.to_string(),
        to: office.email.trim().to_string(),
        subject: format!("New civic issue report: {}", area),
        body,
        photo_url: report.photo_url.clone(),
        maps_url,
    }
}
