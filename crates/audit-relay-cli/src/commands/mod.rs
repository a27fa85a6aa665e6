//! CLI command implementations.

mod event;
mod health;
mod send;

pub use event::{event_auth, event_data, AuthArgs, DataArgs};
pub use health::health;
pub use send::send;

use anyhow::{Context, Result};
use audit_outbox::{ClientConfig, DeliveryClient};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Connection settings shared by every command.
#[derive(Debug, Clone, Default)]
pub struct ConnectionArgs {
    pub config: Option<PathBuf>,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub debug: bool,
}

/// Config file used when `--config` is not given, if it exists.
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("audit-relay").join("config.json"))
}

/// Resolve the client configuration: file, then environment, then flags.
pub fn resolve_config(args: &ConnectionArgs) -> Result<ClientConfig> {
    let path = match &args.config {
        Some(path) => Some(path.clone()),
        None => default_config_path().filter(|path| path.exists()),
    };

    let mut config = ClientConfig::load(path.as_deref())
        .with_context(|| match &path {
            Some(path) => format!("failed to load config from {}", path.display()),
            None => "failed to load config from environment".to_string(),
        })?;

    apply_flags(&mut config, args);

    if let Some(path) = &path {
        debug!(config = %path.display(), api_url = %config.api_url, "Resolved configuration");
    }
    Ok(config)
}

fn apply_flags(config: &mut ClientConfig, args: &ConnectionArgs) {
    if let Some(api_url) = &args.api_url {
        config.api_url = api_url.clone();
    }
    if let Some(api_key) = &args.api_key {
        config.api_key = Some(api_key.clone());
    }
    if args.debug {
        config.debug = true;
    }
}

/// Build a delivery client from the resolved configuration.
pub fn connect(args: &ConnectionArgs) -> Result<DeliveryClient> {
    let config = resolve_config(args)?;
    DeliveryClient::new(config).context("cannot create delivery client")
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
