use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use super::domain::{
    is_rfc_shaped_email, PublicComment, Report, ReportId, ReportStatus, ResolutionStatus,
};
use super::repository::{ReportStore, StoreError};

const MAX_COMMENT_CHARS: usize = 2_000;

/// Comment payload from a member of the public.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentInput {
    pub name: String,
    pub email: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommentError {
    #[error("commenter name is required")]
    MissingName,
    #[error("commenter email '{0}' is not a valid address")]
    InvalidEmail(String),
    #[error("comment text is required")]
    EmptyText,
    #[error("comment exceeds {max} characters")]
    TooLong { max: usize },
}

impl CommentInput {
    pub fn validate(&self) -> Result<(), CommentError> {
        if self.name.trim().is_empty() {
            return Err(CommentError::MissingName);
        }
        if !is_rfc_shaped_email(&self.email) {
            return Err(CommentError::InvalidEmail(self.email.trim().to_string()));
        }
        let text = self.text.trim();
        if text.is_empty() {
            return Err(CommentError::EmptyText);
        }
        if text.chars().count() > MAX_COMMENT_CHARS {
            return Err(CommentError::TooLong {
                max: MAX_COMMENT_CHARS,
            });
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("report {0} not found")]
    NotFound(ReportId),
    #[error("acting administrator is required")]
    MissingActor,
    #[error("report is already in the requested state")]
    Unchanged,
    #[error(transparent)]
    Comment(#[from] CommentError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Administrative and public updates to persisted reports.
pub struct ReportLifecycle<S> {
    store: Arc<S>,
}

impl<S> ReportLifecycle<S>
where
    S: ReportStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Newest-first snapshot of up to `limit` reports.
    pub fn list(&self, limit: usize) -> Result<Vec<Report>, LifecycleError> {
        Ok(self.store.list(limit)?)
    }

    pub fn get(&self, id: &ReportId) -> Result<Report, LifecycleError> {
        self.store
            .fetch(id)?
            .ok_or_else(|| LifecycleError::NotFound(id.clone()))
    }

    pub fn update_status(
        &self,
        id: &ReportId,
        actor: &str,
        to: ReportStatus,
    ) -> Result<Report, LifecycleError> {
        let actor = require_actor(actor)?;
        let mut report = self.get(id)?;
        let from = report.status;
        if !report.transition_status(actor, to, Utc::now()) {
            return Err(LifecycleError::Unchanged);
        }
        self.store.update(report.clone())?;
        info!(
            report = %id,
            actor,
            from = from.label(),
            to = to.label(),
            "report status changed"
        );
        Ok(report)
    }

    pub fn update_resolution_status(
        &self,
        id: &ReportId,
        actor: &str,
        to: ResolutionStatus,
    ) -> Result<Report, LifecycleError> {
        let actor = require_actor(actor)?;
        let mut report = self.get(id)?;
        if !report.set_resolution_status(actor, to, Utc::now()) {
            return Err(LifecycleError::Unchanged);
        }
        self.store.update(report.clone())?;
        info!(report = %id, actor, to = to.label(), "resolution status changed");
        Ok(report)
    }

    /// Appends a validated comment and returns the report's full comment thread.
    pub fn append_comment(
        &self,
        id: &ReportId,
        input: CommentInput,
    ) -> Result<Vec<PublicComment>, LifecycleError> {
        input.validate()?;
        let mut report = self.get(id)?;
        report.public_comments.push(PublicComment {
            name: input.name.trim().to_string(),
            email: input.email.trim().to_string(),
            text: input.text.trim().to_string(),
            created_at: Utc::now(),
        });
        let comments = report.public_comments.clone();
        self.store.update(report)?;
        Ok(comments)
    }
}

fn require_actor(actor: &str) -> Result<&str, LifecycleError> {
    let actor = actor.trim();
    if actor.is_empty() {
        Err(LifecycleError::MissingActor)
    } else {
        Ok(actor)
    }
}
