use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::location::Location;
use crate::workflows::offices::{Office, OfficeId};

/// Identifier wrapper for persisted reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReportId(pub String);

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coarse lifecycle controlled by administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportStatus {
    #[default]
    Submitted,
    InProgress,
    Resolved,
}

impl ReportStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::InProgress => "in-progress",
            Self::Resolved => "resolved",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "submitted" => Some(Self::Submitted),
            "in-progress" | "inprogress" => Some(Self::InProgress),
            "resolved" => Some(Self::Resolved),
            _ => None,
        }
    }
}

/// Finer-grained resolution stage, set independently of [`ReportStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStatus {
    Processing,
    Arranging,
    Resolving,
    Resolved,
}

impl ResolutionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Arranging => "arranging",
            Self::Resolving => "resolving",
            Self::Resolved => "resolved",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reporter {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Office selected by the citizen as a recipient of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficeRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<OfficeId>,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
}

impl From<&Office> for OfficeRef {
    fn from(office: &Office) -> Self {
        Self {
            id: Some(office.id.clone()),
            kind: office.kind.label().to_string(),
            name: office.name.clone(),
            email: office.contact.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Success,
    Failure,
}

/// Outcome of one notification attempt, kept on the report for auditing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailDelivery {
    pub email: String,
    pub status: DeliveryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl EmailDelivery {
    pub fn succeeded(&self) -> bool {
        self.status == DeliveryStatus::Success
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AdminActionKind {
    StatusChange {
        from: ReportStatus,
        to: ReportStatus,
    },
    ResolutionUpdate {
        from: Option<ResolutionStatus>,
        to: ResolutionStatus,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminAction {
    pub actor: String,
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: AdminActionKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicComment {
    pub name: String,
    pub email: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// One citizen submission and its administrative history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: ReportId,
    pub description: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    pub location: Location,
    #[serde(default)]
    pub reporter: Reporter,
    #[serde(default)]
    pub offices: Vec<OfficeRef>,
    #[serde(default)]
    pub emails_sent: Vec<EmailDelivery>,
    #[serde(default)]
    pub status: ReportStatus,
    #[serde(default)]
    pub resolution_status: Option<ResolutionStatus>,
    #[serde(default)]
    pub admin_actions: Vec<AdminAction>,
    #[serde(default)]
    pub public_comments: Vec<PublicComment>,
    pub created_at: DateTime<Utc>,
}

impl Report {
    /// Either resolution flag marks the report as resolved.
    pub fn is_resolved(&self) -> bool {
        self.status == ReportStatus::Resolved
            || self.resolution_status == Some(ResolutionStatus::Resolved)
    }

    /// Records a status transition; returns false when the status is unchanged.
    pub fn transition_status(&mut self, actor: &str, to: ReportStatus, at: DateTime<Utc>) -> bool {
        if self.status == to {
            return false;
        }
        self.admin_actions.push(AdminAction {
            actor: actor.to_string(),
            at,
            kind: AdminActionKind::StatusChange {
                from: self.status,
                to,
            },
        });
        self.status = to;
        true
    }

    /// Records a resolution-stage update; returns false when the stage is unchanged.
    pub fn set_resolution_status(
        &mut self,
        actor: &str,
        to: ResolutionStatus,
        at: DateTime<Utc>,
    ) -> bool {
        if self.resolution_status == Some(to) {
            return false;
        }
        self.admin_actions.push(AdminAction {
            actor: actor.to_string(),
            at,
            kind: AdminActionKind::ResolutionUpdate {
                from: self.resolution_status,
                to,
            },
        });
        self.resolution_status = Some(to);
        true
    }
}

/// Loose RFC 5322 shape check: one `@`, a non-empty local part and a dotted domain.
pub fn is_rfc_shaped_email(candidate: &str) -> bool {
    let candidate = candidate.trim();
    if candidate.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = candidate.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
        && domain.contains('.')
}
