//! Build and submit a single event from flags.

use super::{connect, ConnectionArgs};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use audit_event::{AuthEventBuilder, DataEventBuilder, LogEventPayload};
use audit_outbox::DeliveryResult;
use clap::{Args, ValueEnum};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AuthKind {
    Login,
    LoginFailed,
    Logout,
    PasswordReset,
}

#[derive(Debug, Clone, Args)]
pub struct AuthArgs {
    /// Event type
    #[arg(value_enum)]
    pub kind: AuthKind,
    /// Acting user id
    #[arg(long)]
    pub user: Option<String>,
    #[arg(long, requires = "user")]
    pub username: Option<String>,
    #[arg(long, requires = "user")]
    pub email: Option<String>,
    /// Client IP address
    #[arg(long)]
    pub ip: Option<String>,
    /// Session id
    #[arg(long)]
    pub session: Option<String>,
    /// Failure reason (login-failed)
    #[arg(long)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DataKind {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Args)]
pub struct DataArgs {
    /// Operation
    #[arg(value_enum)]
    pub kind: DataKind,
    /// Entity type, e.g. "invoice"
    pub entity_type: String,
    /// Entity id
    pub entity_id: String,
    /// Human-readable entity name
    #[arg(long)]
    pub name: Option<String>,
    /// Acting user id
    #[arg(long)]
    pub user: Option<String>,
    /// Previous state as JSON
    #[arg(long, requires = "new_state", value_parser = parse_json)]
    pub previous: Option<Value>,
    /// New state as JSON
    #[arg(long = "new", id = "new_state", requires = "previous", value_parser = parse_json)]
    pub new_state: Option<Value>,
    /// Mark the operation as failed
    #[arg(long)]
    pub failed: bool,
}

fn parse_json(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {}", e))
}

pub fn build_auth(args: &AuthArgs) -> LogEventPayload {
    let mut builder = match args.kind {
        AuthKind::Login => AuthEventBuilder::login(),
        AuthKind::LoginFailed => AuthEventBuilder::login_failed(),
        AuthKind::Logout => AuthEventBuilder::logout(),
        AuthKind::PasswordReset => AuthEventBuilder::password_reset(),
    };

    if let Some(user) = &args.user {
        builder = builder.user(user, args.username.as_deref(), args.email.as_deref());
    }
    if let Some(ip) = &args.ip {
        builder = builder.from_ip(ip);
    }
    if let Some(session) = &args.session {
        builder = builder.session(session);
    }
    if let Some(reason) = &args.reason {
        builder = builder.failure_reason(reason);
    }
    builder.build()
}

pub fn build_data(args: &DataArgs) -> LogEventPayload {
    let mut builder = match args.kind {
        DataKind::Create => DataEventBuilder::create(&args.entity_type, &args.entity_id),
        DataKind::Update => DataEventBuilder::update(&args.entity_type, &args.entity_id),
        DataKind::Delete => DataEventBuilder::delete(&args.entity_type, &args.entity_id),
    };

    if let Some(name) = &args.name {
        builder = builder.entity_name(name);
    }
    if let Some(user) = &args.user {
        builder = builder.by_user(user);
    }
    if let (Some(previous), Some(new)) = (&args.previous, &args.new_state) {
        builder = builder.with_state(previous.clone(), new.clone());
    }
    if args.failed {
        builder = builder.failed();
    }
    builder.build()
}

#[derive(Serialize)]
struct EventReport {
    event: LogEventPayload,
    result: DeliveryResult,
}

impl fmt::Display for EventReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match (&self.event.category, &self.event.subcategory) {
            (Some(category), Some(sub)) => format!("{}/{}", category, sub),
            _ => "event".to_string(),
        };
        write!(f, "{}", output::row("event", &kind))?;

        let status = if self.result.is_queued() {
            "queued for later delivery".to_string()
        } else if self.result.success {
            format!("delivered ({})", self.result.log_id.as_deref().unwrap_or_default())
        } else {
            format!("failed: {}", self.result.error.as_deref().unwrap_or_default())
        };
        write!(f, "{}", output::row("status", &status))
    }
}

async fn submit(event: LogEventPayload, args: &ConnectionArgs, format: &OutputFormat) -> Result<()> {
    let client = connect(args)?;
    let result = client.submit(event.clone()).await;
    client.close().await;

    let report = EventReport { event, result };
    output::print(&report, format);

    if !report.result.success {
        anyhow::bail!("event was rejected");
    }
    Ok(())
}

/// Submit an AUTH event.
pub async fn event_auth(auth: &AuthArgs, args: &ConnectionArgs, format: &OutputFormat) -> Result<()> {
    submit(build_auth(auth), args, format).await
}

/// Submit a DATA event.
pub async fn event_data(data: &DataArgs, args: &ConnectionArgs, format: &OutputFormat) -> Result<()> {
    submit(build_data(data), args, format).await
}
