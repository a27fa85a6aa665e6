//! audit-relay - submit audit events to a collector from the command line.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use commands::{AuthArgs, ConnectionArgs, DataArgs};
use std::path::PathBuf;

/// audit-relay - deliver audit events with retry and offline buffering.
#[derive(Parser)]
#[command(name = "audit-relay")]
#[command(about = "Submit audit events to a log collector")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON config file (defaults to <config dir>/audit-relay/config.json)
    #[arg(long, env = "AUDIT_RELAY_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Collector base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// API key sent as X-API-Key
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Emit per-event delivery diagnostics
    #[arg(long, global = true)]
    debug: bool,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Append structured JSON logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit events from a JSON array or JSONL file
    Send {
        /// File with one event per line, or a JSON array
        file: PathBuf,
    },

    /// Check that the collector is reachable
    Health,

    /// Build and submit a single event
    Event {
        #[command(subcommand)]
        command: EventCommands,
    },
}

#[derive(Subcommand)]
enum EventCommands {
    /// Authentication event
    Auth(AuthArgs),
    /// Data change event
    Data(DataArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    observability::init_with_config(observability::LogConfig {
        service_name: "audit-relay".into(),
        default_level: cli.log_level.clone(),
        log_path: cli.log_file.clone(),
        also_stderr: false,
    });

    let connection = ConnectionArgs {
        config: cli.config.clone(),
        api_url: cli.api_url.clone(),
        api_key: cli.api_key.clone(),
        debug: cli.debug,
    };

    let result = match &cli.command {
        Commands::Send { file } => commands::send(file, &connection, &cli.format).await,
        Commands::Health => commands::health(&connection, &cli.format).await,
        Commands::Event { command } => match command {
            EventCommands::Auth(args) => commands::event_auth(args, &connection, &cli.format).await,
            EventCommands::Data(args) => commands::event_data(args, &connection, &cli.format).await,
        },
    };

    if let Err(e) = result {
        output::print_error(&format!("{:#}", e), &cli.format);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_event_data() {
        let cli = Cli::try_parse_from([
            "audit-relay",
            "--api-url",
            "http://collector:8080",
            "event",
            "data",
            "update",
            "invoice",
            "inv-1",
            "--previous",
            r#"{"total":1}"#,
            "--new",
            r#"{"total":2}"#,
        ])
        .unwrap();

        assert_eq!(cli.api_url.as_deref(), Some("http://collector:8080"));
        match cli.command {
            Commands::Event {
                command: EventCommands::Data(args),
            } => {
                assert_eq!(args.entity_id, "inv-1");
                assert!(args.previous.is_some() && args.new_state.is_some());
            }
            _ => panic!("expected event data"),
        }
    }

    #[test]
    fn test_state_flags_require_each_other() {
        let result = Cli::try_parse_from([
            "audit-relay",
            "event",
            "data",
            "create",
            "doc",
            "d-1",
            "--new",
            "{}",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_send_with_json_format() {
        let cli = Cli::try_parse_from(["audit-relay", "send", "events.jsonl", "--format", "json"])
            .unwrap();
        assert!(matches!(cli.format, output::OutputFormat::Json));
        assert!(matches!(cli.command, Commands::Send { .. }));
    }
}
