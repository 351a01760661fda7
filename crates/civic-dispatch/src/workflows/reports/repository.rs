use super::domain::{Report, ReportId};

/// Document-store abstraction so the dispatch workflow can be exercised in isolation.
///
/// Reports are appended and updated, never deleted. `list` is a point-in-time
/// read returning the newest reports first.
pub trait ReportStore: Send + Sync {
    fn insert(&self, report: Report) -> Result<Report, StoreError>;
    fn update(&self, report: Report) -> Result<(), StoreError>;
    fn fetch(&self, id: &ReportId) -> Result<Option<Report>, StoreError>;
    fn list(&self, limit: usize) -> Result<Vec<Report>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Uploaded image awaiting storage.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Binary storage for report photos, returning a public URL.
pub trait PhotoStore: Send + Sync {
    fn store(&self, upload: PhotoUpload) -> Result<String, StoreError>;
}
