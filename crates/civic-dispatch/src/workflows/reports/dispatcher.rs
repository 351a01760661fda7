use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use tokio::time::timeout;
use tracing::{error, info, warn};

use super::domain::{
    is_rfc_shaped_email, DeliveryStatus, EmailDelivery, OfficeRef, Report, ReportId, ReportStatus,
    Reporter,
};
use super::location::Location;
use super::notification::compose;
use super::repository::{ReportStore, StoreError};
use super::transport::{MailTransport, TransportError};
use crate::config::DispatchConfig;

/// Citizen-supplied content of a report before it is assigned an id.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub description: String,
    pub photo_url: Option<String>,
    pub location: Location,
    pub reporter: Reporter,
}

/// Aggregate outcome of one dispatch.
///
/// Partial delivery failure is a normal outcome; compare `successful_emails`
/// with `total_emails` to detect it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    pub report_id: ReportId,
    pub total_emails: usize,
    pub successful_emails: usize,
    pub failed_emails: usize,
    pub emails_sent: Vec<EmailDelivery>,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no recipient offices selected")]
    NoRecipientsSelected,
    #[error("report could not be stored: {0}")]
    StoreUnavailable(#[source] StoreError),
}

/// Sends one notification per selected office, then persists the report once.
pub struct ReportDispatcher<S, T> {
    store: Arc<S>,
    transport: Arc<T>,
    config: DispatchConfig,
    sequence: AtomicU64,
}

impl<S, T> ReportDispatcher<S, T>
where
    S: ReportStore + 'static,
    T: MailTransport + 'static,
{
    pub fn new(store: Arc<S>, transport: Arc<T>, config: DispatchConfig) -> Self {
        Self {
            store,
            transport,
            config,
            sequence: AtomicU64::new(1),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Checks a submission without side effects. Recipients are checked first,
    /// so an empty selection is always reported as such.
    pub fn validate(&self, draft: &NewReport, offices: &[OfficeRef]) -> Result<(), DispatchError> {
        if offices.is_empty() {
            return Err(DispatchError::NoRecipientsSelected);
        }
        if draft.description.trim().is_empty() {
            return Err(DispatchError::InvalidInput(
                "description must not be empty".to_string(),
            ));
        }
        if !draft.location.coordinates().is_valid() {
            return Err(DispatchError::InvalidInput(format!(
                "coordinates ({}, {}) are outside [-90, 90] / [-180, 180]",
                draft.location.lat, draft.location.lng
            )));
        }
        if let Some(office) = offices.iter().find(|office| office.name.trim().is_empty()) {
            return Err(DispatchError::InvalidInput(format!(
                "selected office with email '{}' has no name",
                office.email
            )));
        }
        Ok(())
    }

    pub async fn dispatch(
        &self,
        draft: NewReport,
        offices: Vec<OfficeRef>,
    ) -> Result<DispatchResult, DispatchError> {
        self.validate(&draft, &offices)?;

        let created_at = Utc::now();
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let report_id = ReportId(format!(
            "rpt-{}-{sequence:04}",
            created_at.format("%Y%m%d%H%M%S")
        ));

        let mut report = Report {
            id: report_id.clone(),
            description: draft.description.trim().to_string(),
            photo_url: draft.photo_url,
            location: draft.location,
            reporter: draft.reporter,
            offices,
            emails_sent: Vec::new(),
            status: ReportStatus::Submitted,
            resolution_status: None,
            admin_actions: Vec::new(),
            public_comments: Vec::new(),
            created_at,
        };

        report.emails_sent = self.deliver(&report).await;

        let successful_emails = report
            .emails_sent
            .iter()
            .filter(|delivery| delivery.succeeded())
            .count();
        let total_emails = report.emails_sent.len();
        let emails_sent = report.emails_sent.clone();

        self.store.insert(report).map_err(|err| {
            error!(report = %report_id, error = %err, "report persistence failed");
            DispatchError::StoreUnavailable(err)
        })?;

        info!(
            report = %report_id,
            total_emails,
            successful_emails,
            "report dispatched"
        );

        Ok(DispatchResult {
            report_id,
            total_emails,
            successful_emails,
            failed_emails: total_emails - successful_emails,
            emails_sent,
        })
    }

    /// Concurrent fan-out; every office ends with a terminal delivery status,
    /// reported in selection order.
    async fn deliver(&self, report: &Report) -> Vec<EmailDelivery> {
        let transport = self.transport.as_ref();
        let limit = self.config.send_timeout;
        let sender = self.config.sender.as_str();

        join_all(report.offices.iter().map(|office| async move {
            let email = office.email.trim().to_string();
            if !is_rfc_shaped_email(&email) {
                warn!(
                    report = %report.id,
                    office = %office.name,
                    "office has no deliverable email address"
                );
                return EmailDelivery {
                    email,
                    status: DeliveryStatus::Failure,
                    detail: Some("no deliverable email address".to_string()),
                };
            }

            let notification = compose(report, office, sender);
            let outcome = match timeout(limit, transport.send(&notification)).await {
                Ok(result) => result,
                Err(_) => Err(TransportError::TimedOut),
            };

            match outcome {
                Ok(()) => {
                    info!(report = %report.id, recipient = %email, "notification delivered");
                    EmailDelivery {
                        email,
                        status: DeliveryStatus::Success,
                        detail: None,
                    }
                }
                Err(err) => {
                    warn!(
                        report = %report.id,
                        recipient = %email,
                        error = %err,
                        "notification failed"
                    );
                    EmailDelivery {
                        email,
                        status: DeliveryStatus::Failure,
                        detail: Some(err.to_string()),
                    }
                }
            }
        }))
        .await
    }
}
