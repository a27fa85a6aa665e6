//! Batch submission from a file.

use super::{connect, read_file, ConnectionArgs};
use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use audit_outbox::{DeliveryResult, LogEventPayload};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::info;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReport {
    pub results: Vec<DeliveryResult>,
    /// Buffered events delivered by the closing drain.
    pub flushed_on_close: usize,
    /// Events still undelivered at exit.
    pub undelivered: usize,
}

impl SendReport {
    fn rejected(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }
}

impl fmt::Display for SendReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, result) in self.results.iter().enumerate() {
            let label = format!("event {}", index + 1);
            let value = match (result.success, &result.log_id, &result.error) {
                (true, _, _) if result.is_queued() => "queued for later delivery".to_string(),
                (true, Some(id), _) if !id.is_empty() => format!("delivered ({})", id),
                (true, _, _) => "delivered".to_string(),
                (false, _, Some(error)) => format!("failed: {}", error),
                (false, _, None) => "failed".to_string(),
            };
            write!(f, "{}", output::row(&label, &value))?;
        }
        write!(
            f,
            "{}",
            output::row("flushed on close", &self.flushed_on_close.to_string())
        )?;
        write!(f, "{}", output::row("undelivered", &self.undelivered.to_string()))
    }
}

/// Parse a JSON array of payloads, or one payload per line.
pub fn parse_payloads(content: &str) -> Result<Vec<LogEventPayload>> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).context("invalid JSON array of events");
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).with_context(|| format!("invalid event on line {}", index + 1))
        })
        .collect()
}

/// Submit every event in `file`, then close the client.
///
/// Fails if any event was rejected, after reporting all results.
pub async fn send(file: &Path, args: &ConnectionArgs, format: &OutputFormat) -> Result<()> {
    let payloads = parse_payloads(&read_file(file)?)?;
    let client = connect(args)?;

    info!(count = payloads.len(), file = %file.display(), "Submitting events");

    let results = client.submit_batch(payloads).await;
    let flushed_on_close = client.close().await;

    let report = SendReport {
        results,
        flushed_on_close,
        undelivered: client.size(),
    };
    output::print(&report, format);

    let rejected = report.rejected();
    if rejected > 0 {
        anyhow::bail!("{} of {} events were rejected", rejected, report.results.len());
    }
    Ok(())
}
