//! Citizen report intake, multi-office notification dispatch and report lifecycle.

pub mod dispatcher;
pub mod domain;
pub mod intake;
pub mod lifecycle;
pub mod location;
pub mod notification;
pub mod repository;
pub mod router;
pub mod transport;

#[cfg(test)]
mod tests;

pub use dispatcher::{DispatchError, DispatchResult, NewReport, ReportDispatcher};
pub use domain::{
    is_rfc_shaped_email, AdminAction, AdminActionKind, DeliveryStatus, EmailDelivery, OfficeRef,
    PublicComment, Report, ReportId, ReportStatus, Reporter, ResolutionStatus,
};
pub use intake::{IntakeError, IntakeReceipt, ReportIntake, ReportSubmission};
pub use lifecycle::{CommentError, CommentInput, LifecycleError, ReportLifecycle};
pub use location::{Location, LocationInput, UNKNOWN};
pub use notification::compose;
pub use repository::{PhotoStore, PhotoUpload, ReportStore, StoreError};
pub use router::{report_router, ListQuery, ReportRoutes, StatusUpdateRequest};
pub use transport::{HttpMailRelay, MailTransport, Notification, TransportError};
