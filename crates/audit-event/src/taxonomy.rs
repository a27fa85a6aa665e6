//! Event taxonomy: categories, severities, outcomes and subcategories.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Top-level event category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventCategory {
    /// Authentication and authorization.
    Auth,
    /// CRUD operations on business entities.
    Data,
    /// Outgoing email tracking.
    Email,
    /// System processes and scheduled jobs.
    System,
    /// Auditing and compliance.
    Audit,
    /// Security incidents and access control.
    Security,
}

impl EventCategory {
    /// Wire representation, e.g. `"AUTH"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "AUTH",
            Self::Data => "DATA",
            Self::Email => "EMAIL",
            Self::System => "SYSTEM",
            Self::Audit => "AUDIT",
            Self::Security => "SECURITY",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// Outcome of the audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
    Partial,
}

impl Outcome {
    /// Wire representation, e.g. `"success"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Partial => "partial",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            "partial" => Ok(Self::Partial),
            other => Err(other.to_string()),
        }
    }
}

/// Subcategories of [`EventCategory::Auth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthEventType {
    LoginSuccess,
    LoginFailed,
    Logout,
    PasswordResetRequest,
    PasswordResetComplete,
    PasswordChange,
    TokenRefresh,
    TokenRevoked,
    SessionExpired,
    MfaEnabled,
    MfaDisabled,
    MfaChallengeSuccess,
    MfaChallengeFailed,
}

impl AuthEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoginSuccess => "login_success",
            Self::LoginFailed => "login_failed",
            Self::Logout => "logout",
            Self::PasswordResetRequest => "password_reset_request",
            Self::PasswordResetComplete => "password_reset_complete",
            Self::PasswordChange => "password_change",
            Self::TokenRefresh => "token_refresh",
            Self::TokenRevoked => "token_revoked",
            Self::SessionExpired => "session_expired",
            Self::MfaEnabled => "mfa_enabled",
            Self::MfaDisabled => "mfa_disabled",
            Self::MfaChallengeSuccess => "mfa_challenge_success",
            Self::MfaChallengeFailed => "mfa_challenge_failed",
        }
    }
}

/// Subcategories of [`EventCategory::Data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataEventType {
    Create,
    Update,
    Delete,
    Restore,
    BulkCreate,
    BulkUpdate,
    BulkDelete,
    Import,
    Export,
}

impl DataEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Restore => "restore",
            Self::BulkCreate => "bulk_create",
            Self::BulkUpdate => "bulk_update",
            Self::BulkDelete => "bulk_delete",
            Self::Import => "import",
            Self::Export => "export",
        }
    }
}

/// Suggest a severity from the category and outcome.
///
/// Security events are never below `warning`, and a failed security event is
/// `critical`. Otherwise failures map to `error`, partial outcomes to
/// `warning` and successes to `info`.
pub fn suggest_severity(category: EventCategory, outcome: Outcome) -> EventSeverity {
    match (category, outcome) {
        (EventCategory::Security, Outcome::Failure) => EventSeverity::Critical,
        (EventCategory::Security, _) => EventSeverity::Warning,
        (_, Outcome::Failure) => EventSeverity::Error,
        (_, Outcome::Partial) => EventSeverity::Warning,
        (_, Outcome::Success) => EventSeverity::Info,
    }
}
