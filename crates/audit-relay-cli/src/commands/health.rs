//! Collector health command.

use super::{connect, ConnectionArgs};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use serde::Serialize;
use std::fmt;

#[derive(Serialize)]
struct HealthReport {
    api_url: String,
    healthy: bool,
}

impl fmt::Display for HealthReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.healthy { "healthy" } else { "unreachable" };
        write!(f, "{}", output::row("collector", &self.api_url))?;
        write!(f, "{}", output::row("status", status))
    }
}

/// Check the collector. Fails when it is not healthy.
pub async fn health(args: &ConnectionArgs, format: &OutputFormat) -> Result<()> {
    let client = connect(args)?;
    let report = HealthReport {
        api_url: client.config().api_url.clone(),
        healthy: client.health_check().await,
    };

    output::print(&report, format);

    if !report.healthy {
        anyhow::bail!("collector at {} is not healthy", report.api_url);
    }
    Ok(())
}
