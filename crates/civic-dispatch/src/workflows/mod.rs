pub mod analytics;
pub mod offices;
pub mod reports;
