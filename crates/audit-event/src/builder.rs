//! Builders for the common AUTH and DATA event families.
//!
//! Builders fill in the fields a collector expects but a caller rarely wants
//! to spell out by hand: a suggested severity, an origin, a derived action
//! and default tags.

use crate::{
    suggest_severity, Action, ActionKind, AuthEventType, DataEventType, EventCategory,
    EventContext, EventResult, EventSeverity, LogEventPayload, Origin, OriginKind, Outcome,
    StateChange,
};
use serde_json::{Map, Value};

/// Environment variable naming the deployment environment of the caller.
pub const ENVIRONMENT_ENV_VAR: &str = "AUDIT_RELAY_ENV";

const DEFAULT_ENVIRONMENT: &str = "development";

/// Origin id used when no user is attached to the event.
const SYSTEM_ORIGIN_ID: &str = "audit-relay";

fn current_environment() -> String {
    std::env::var(ENVIRONMENT_ENV_VAR)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
}

fn system_origin() -> Origin {
    Origin {
        kind: OriginKind::System,
        id: SYSTEM_ORIGIN_ID.to_string(),
        details: Some(Map::new()),
    }
}

fn metadata_str<'a>(metadata: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    metadata.get(key).and_then(Value::as_str)
}

/// Derive the action section from the category, subcategory and metadata.
fn derive_action(category: EventCategory, subcategory: &str, metadata: &Map<String, Value>) -> Action {
    let kind = if subcategory.contains("create") || subcategory == "import" {
        ActionKind::Create
    } else if subcategory.contains("update") {
        ActionKind::Update
    } else if subcategory.contains("delete") {
        ActionKind::Delete
    } else {
        ActionKind::Custom
    };

    let mut entity = category.as_str().to_lowercase();
    let mut entity_id = "system-generated".to_string();

    if let Some(value) = metadata_str(metadata, "entityType") {
        entity = value.to_string();
    }
    if let Some(value) = metadata_str(metadata, "entityId") {
        entity_id = value.to_string();
    }

    let first_of = |keys: &[&str], fallback: &str| {
        keys.iter()
            .find_map(|key| metadata_str(metadata, key))
            .unwrap_or(fallback)
            .to_string()
    };

    match category {
        EventCategory::Email => {
            entity = "email".to_string();
            entity_id = first_of(&["emailId", "recipient"], "email-event");
        }
        EventCategory::System => {
            entity = "system-process".to_string();
            entity_id = first_of(&["processName", "externalService"], "system-event");
        }
        EventCategory::Auth => {
            entity = "authentication".to_string();
            entity_id = first_of(&["userId", "sessionId"], "auth-event");
        }
        _ => {}
    }

    Action {
        kind,
        entity,
        entity_id,
        operation: format!("{}: {}", category, subcategory.replace('_', " ")),
        details: Some(Value::Object(metadata.clone())),
    }
}

/// Builder for AUTH events.
#[derive(Debug, Clone)]
pub struct AuthEventBuilder {
    event_type: AuthEventType,
    metadata: Map<String, Value>,
    outcome: Outcome,
    severity: Option<EventSeverity>,
    message: Option<String>,
    user_id: Option<String>,
    ip: Option<String>,
    session_id: Option<String>,
    tags: Option<Vec<String>>,
}

impl AuthEventBuilder {
    fn with_type(event_type: AuthEventType, outcome: Outcome) -> Self {
        Self {
            event_type,
            metadata: Map::new(),
            outcome,
            severity: None,
            message: None,
            user_id: None,
            ip: None,
            session_id: None,
            tags: None,
        }
    }

    pub fn login() -> Self {
        Self::with_type(AuthEventType::LoginSuccess, Outcome::Success)
    }

    pub fn login_failed() -> Self {
        Self::with_type(AuthEventType::LoginFailed, Outcome::Failure)
    }

    pub fn logout() -> Self {
        Self::with_type(AuthEventType::Logout, Outcome::Success)
    }

    pub fn password_reset() -> Self {
        Self::with_type(AuthEventType::PasswordResetComplete, Outcome::Success)
    }

    /// Attach the acting user. Username and email are optional.
    pub fn user(mut self, user_id: &str, username: Option<&str>, email: Option<&str>) -> Self {
        self.user_id = Some(user_id.to_string());
        self.metadata.insert("userId".into(), user_id.into());
        if let Some(username) = username {
            self.metadata.insert("username".into(), username.into());
        }
        if let Some(email) = email {
            self.metadata.insert("email".into(), email.into());
        }
        self
    }

    pub fn from_ip(mut self, ip: &str) -> Self {
        self.metadata.insert("ip".into(), ip.into());
        self.ip = Some(ip.to_string());
        self
    }

    pub fn session(mut self, session_id: &str) -> Self {
        self.metadata.insert("sessionId".into(), session_id.into());
        self.session_id = Some(session_id.to_string());
        self
    }

    /// Record why the attempt failed. Also used as the result message.
    pub fn failure_reason(mut self, reason: &str) -> Self {
        self.metadata.insert("failureReason".into(), reason.into());
        self.message = Some(reason.to_string());
        self
    }

    pub fn severity(mut self, severity: EventSeverity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn build(self) -> LogEventPayload {
        let category = EventCategory::Auth;
        let subcategory = self.event_type.as_str();
        let action = derive_action(category, subcategory, &self.metadata);

        let origin = match &self.user_id {
            Some(user_id) => {
                let mut details = Map::new();
                for key in ["username", "email"] {
                    if let Some(value) = self.metadata.get(key) {
                        details.insert(key.to_string(), value.clone());
                    }
                }
                Origin {
                    kind: OriginKind::User,
                    id: user_id.clone(),
                    details: Some(details),
                }
            }
            None => system_origin(),
        };

        let mut result = EventResult::new(self.outcome);
        result.message = self.message;

        LogEventPayload {
            category: Some(category),
            subcategory: Some(subcategory.to_string()),
            severity: Some(
                self.severity
                    .unwrap_or_else(|| suggest_severity(category, self.outcome)),
            ),
            metadata: Some(Value::Object(self.metadata)),
            origin: Some(origin),
            action: Some(action),
            result: Some(result),
            context: Some(EventContext {
                session: self.session_id,
                ip: self.ip,
                environment: Some(current_environment()),
                ..Default::default()
            }),
            state: None,
            tags: Some(
                self.tags
                    .unwrap_or_else(|| vec![category.as_str().to_string()]),
            ),
        }
    }
}

/// Builder for DATA events.
#[derive(Debug, Clone)]
pub struct DataEventBuilder {
    event_type: DataEventType,
    metadata: Map<String, Value>,
    outcome: Outcome,
    severity: Option<EventSeverity>,
    user_id: Option<String>,
    state: Option<StateChange>,
    tags: Option<Vec<String>>,
}

impl DataEventBuilder {
    fn with_type(event_type: DataEventType, entity_type: &str, entity_id: &str) -> Self {
        let mut metadata = Map::new();
        metadata.insert("entityType".into(), entity_type.into());
        metadata.insert("entityId".into(), entity_id.into());
        Self {
            event_type,
            metadata,
            outcome: Outcome::Success,
            severity: None,
            user_id: None,
            state: None,
            tags: None,
        }
    }

    pub fn create(entity_type: &str, entity_id: &str) -> Self {
        Self::with_type(DataEventType::Create, entity_type, entity_id)
    }

    pub fn update(entity_type: &str, entity_id: &str) -> Self {
        Self::with_type(DataEventType::Update, entity_type, entity_id)
    }

    pub fn delete(entity_type: &str, entity_id: &str) -> Self {
        Self::with_type(DataEventType::Delete, entity_type, entity_id)
    }

    pub fn entity_name(mut self, name: &str) -> Self {
        self.metadata.insert("entityName".into(), name.into());
        self
    }

    pub fn by_user(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    /// Attach before/after snapshots. The diff is left to the collector.
    pub fn with_state(mut self, previous: Value, new: Value) -> Self {
        self.state = Some(StateChange {
            previous: Some(previous),
            new: Some(new),
            diff: None,
        });
        self
    }

    pub fn severity(mut self, severity: EventSeverity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn failed(mut self) -> Self {
        self.outcome = Outcome::Failure;
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn build(self) -> LogEventPayload {
        let category = EventCategory::Data;
        let subcategory = self.event_type.as_str();
        let action = derive_action(category, subcategory, &self.metadata);

        let origin = match &self.user_id {
            Some(user_id) => Origin {
                kind: OriginKind::User,
                id: user_id.clone(),
                details: Some(Map::new()),
            },
            None => system_origin(),
        };

        LogEventPayload {
            category: Some(category),
            subcategory: Some(subcategory.to_string()),
            severity: Some(
                self.severity
                    .unwrap_or_else(|| suggest_severity(category, self.outcome)),
            ),
            metadata: Some(Value::Object(self.metadata)),
            origin: Some(origin),
            action: Some(action),
            result: Some(EventResult::new(self.outcome)),
            context: Some(EventContext {
                environment: Some(current_environment()),
                ..Default::default()
            }),
            state: self.state,
            tags: Some(
                self.tags
                    .unwrap_or_else(|| vec![category.as_str().to_string()]),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_login_builder_defaults() {
        let payload = AuthEventBuilder::login().build();

        assert!(payload.validate().is_ok());
        assert_eq!(payload.category, Some(EventCategory::Auth));
        assert_eq!(payload.subcategory.as_deref(), Some("login_success"));
        assert_eq!(payload.severity, Some(EventSeverity::Info));
        assert_eq!(payload.tags, Some(vec!["AUTH".to_string()]));

        let origin = payload.origin.unwrap();
        assert_eq!(origin.kind, OriginKind::System);
        assert_eq!(origin.id, "audit-relay");

        let action = payload.action.unwrap();
        assert_eq!(action.kind, ActionKind::Custom);
        assert_eq!(action.entity, "authentication");
        assert_eq!(action.entity_id, "auth-event");
        assert_eq!(action.operation, "AUTH: login success");
    }

    #[test]
    fn test_login_failed_with_user() {
        let payload = AuthEventBuilder::login_failed()
            .user("user-42", Some("ada"), None)
            .from_ip("10.0.0.1")
            .failure_reason("bad password")
            .build();

        assert!(payload.validate().is_ok());
        assert_eq!(payload.severity, Some(EventSeverity::Error));

        let result = payload.result.unwrap();
        assert_eq!(result.parsed_outcome(), Some(Outcome::Failure));
        assert_eq!(result.message.as_deref(), Some("bad password"));

        let origin = payload.origin.unwrap();
        assert_eq!(origin.kind, OriginKind::User);
        assert_eq!(origin.id, "user-42");
        assert_eq!(origin.details.unwrap().get("username"), Some(&json!("ada")));

        assert_eq!(payload.action.unwrap().entity_id, "user-42");
        let metadata = payload.metadata.unwrap();
        assert_eq!(metadata["ip"], json!("10.0.0.1"));
        assert_eq!(metadata["failureReason"], json!("bad password"));
    }

    #[test]
    fn test_auth_session_used_when_no_user() {
        let payload = AuthEventBuilder::logout().session("sess-1").build();
        assert_eq!(payload.action.unwrap().entity_id, "sess-1");
    }

    #[test]
    fn test_explicit_severity_wins() {
        let payload = AuthEventBuilder::password_reset()
            .severity(EventSeverity::Critical)
            .tags(["auth", "reset"])
            .build();
        assert_eq!(payload.severity, Some(EventSeverity::Critical));
        assert_eq!(
            payload.tags,
            Some(vec!["auth".to_string(), "reset".to_string()])
        );
    }

    #[test]
    fn test_data_create_builder() {
        let payload = DataEventBuilder::create("invoice", "inv-1")
            .entity_name("Invoice #1")
            .by_user("user-7")
            .build();

        assert!(payload.validate().is_ok());
        assert_eq!(payload.subcategory.as_deref(), Some("create"));
        assert_eq!(payload.severity, Some(EventSeverity::Info));
        assert!(payload.state.is_none());

        let action = payload.action.unwrap();
        assert_eq!(action.kind, ActionKind::Create);
        assert_eq!(action.entity, "invoice");
        assert_eq!(action.entity_id, "inv-1");
        assert_eq!(action.operation, "DATA: create");
        assert_eq!(action.details.unwrap()["entityName"], json!("Invoice #1"));

        let origin = payload.origin.unwrap();
        assert_eq!(origin.kind, OriginKind::User);
        assert_eq!(origin.id, "user-7");
    }

    #[test]
    fn test_data_update_failed_with_state() {
        let payload = DataEventBuilder::update("customer", "c-3")
            .with_state(json!({ "tier": "free" }), json!({ "tier": "pro" }))
            .failed()
            .build();

        assert_eq!(payload.severity, Some(EventSeverity::Error));
        assert_eq!(payload.action.as_ref().unwrap().kind, ActionKind::Update);

        let state = payload.state.unwrap();
        assert_eq!(state.previous, Some(json!({ "tier": "free" })));
        assert_eq!(state.new, Some(json!({ "tier": "pro" })));
        assert!(state.diff.is_none());
    }

    #[test]
    fn test_data_delete_action_kind() {
        let payload = DataEventBuilder::delete("file", "f-1").build();
        assert_eq!(payload.action.unwrap().kind, ActionKind::Delete);
    }

    #[test]
    fn test_derive_action_for_system_and_email() {
        let mut metadata = Map::new();
        metadata.insert("processName".into(), json!("nightly-export"));
        let action = derive_action(EventCategory::System, "cron_job_complete", &metadata);
        assert_eq!(action.entity, "system-process");
        assert_eq!(action.entity_id, "nightly-export");
        assert_eq!(action.kind, ActionKind::Custom);

        let action = derive_action(EventCategory::Email, "sent", &Map::new());
        assert_eq!(action.entity, "email");
        assert_eq!(action.entity_id, "email-event");

        let action = derive_action(EventCategory::Data, "import", &Map::new());
        assert_eq!(action.kind, ActionKind::Create);
        assert_eq!(action.entity, "data");
        assert_eq!(action.entity_id, "system-generated");
    }
}
