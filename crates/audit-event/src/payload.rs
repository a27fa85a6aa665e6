//! Audit event payload as sent to the collector.

use crate::{EventCategory, EventSeverity, Outcome, ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single audit event.
///
/// Only `result` is interpreted by the client; every other field is passed
/// through to the collector untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEventPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<EventCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<EventSeverity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<EventResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<EventContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<StateChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl LogEventPayload {
    /// Create a payload carrying only a result.
    pub fn with_outcome(outcome: Outcome) -> Self {
        Self {
            result: Some(EventResult::new(outcome)),
            ..Default::default()
        }
    }

    /// Check the fields the collector requires.
    pub fn validate(&self) -> ValidationResult<()> {
        let result = self.result.as_ref().ok_or(ValidationError::MissingResult)?;

        if result.outcome.is_empty() {
            return Err(ValidationError::MissingOutcome);
        }
        result
            .outcome
            .parse::<Outcome>()
            .map_err(ValidationError::InvalidOutcome)?;

        if self.category.is_some() && self.subcategory.as_deref().map_or(true, str::is_empty) {
            return Err(ValidationError::MissingSubcategory);
        }

        Ok(())
    }
}

/// Result section of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResult {
    /// One of `success`, `failure`, `partial`. Kept as a string so that
    /// malformed input reaches validation instead of failing to parse.
    #[serde(default)]
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl EventResult {
    pub fn new(outcome: Outcome) -> Self {
        Self {
            outcome: outcome.as_str().to_string(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// The parsed outcome, if valid.
    pub fn parsed_outcome(&self) -> Option<Outcome> {
        self.outcome.parse().ok()
    }
}

/// Who triggered the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginKind {
    User,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Origin {
    #[serde(rename = "type")]
    pub kind: OriginKind,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Create,
    Update,
    Delete,
    Custom,
}

/// What was done, and to which entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub entity: String,
    pub entity_id: String,
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Correlation and environment details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub causality: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

/// Before/after snapshot of the affected entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<Value>,
}
