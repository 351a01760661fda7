//! Civic issue reporting core: nearest-office resolution, multi-office report
//! dispatch and regional analytics.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
