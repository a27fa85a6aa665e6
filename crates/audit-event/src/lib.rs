//! Audit event data model for the audit-relay client.
//!
//! This crate provides:
//! - LogEventPayload: the wire shape of a single audit event
//! - Taxonomy enums (category, severity, outcome, subcategories)
//! - Payload validation performed before any delivery attempt
//! - AuthEventBuilder / DataEventBuilder for the common event families

mod builder;
mod error;
mod payload;
mod taxonomy;

pub use builder::{AuthEventBuilder, DataEventBuilder, ENVIRONMENT_ENV_VAR};
pub use error::{ValidationError, ValidationResult};
pub use payload::{
    Action, ActionKind, EventContext, EventResult, LogEventPayload, Origin, OriginKind,
    StateChange,
};
pub use taxonomy::{
    suggest_severity, AuthEventType, DataEventType, EventCategory, EventSeverity, Outcome,
};
