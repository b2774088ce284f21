//! Argument parsing and command dispatch.

use clap::{Args, Parser, Subcommand, ValueEnum};
use publisher_auth::Credential;
use publisher_config::ConnectionStore;
use publisher_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging};
use reqwest::Url;
use uuid::Uuid;

use crate::client::{CliResult, build_client, parse_url};
use crate::commands::check::handle_check;
use crate::commands::connections::{handle_connections_list, handle_connections_show};
use crate::commands::ui::handle_ui;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_UI_HOST: &str = "127.0.0.1";

/// Parses CLI arguments, installs logging, and executes the requested
/// command. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let logging = LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format.unwrap_or_else(LogFormat::infer),
        ..LoggingConfig::default()
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: {err:#}");
    }

    match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    match cli.command {
        Command::Ui(args) => handle_ui(args).await,
        Command::Connections(command) => {
            let store = ConnectionStore::from_environment();
            match command {
                ConnectionsCommand::List => handle_connections_list(&store, cli.output),
                ConnectionsCommand::Show(args) => {
                    handle_connections_show(&store, &args.name, cli.output)
                }
            }
        }
        Command::Check(args) => {
            let trace_id = Uuid::new_v4().to_string();
            let client = build_client(cli.timeout, &trace_id)?;
            let store = ConnectionStore::from_environment();
            handle_check(&client, &store, &args, cli.output).await
        }
    }
}

#[derive(Parser)]
#[command(
    name = "publisher",
    version,
    about = "Publishing client: credential checks and the local browser UI"
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "PUBLISHER_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub(crate) timeout: u64,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[arg(long, global = true, env = "PUBLISHER_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub(crate) log_level: String,
    #[arg(long, global = true, env = "PUBLISHER_LOG_FORMAT", value_parser = parse_log_format)]
    pub(crate) log_format: Option<LogFormat>,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Serve the local browser UI behind the one-time token handoff.
    Ui(UiArgs),
    /// Inspect federated identity connections.
    #[command(subcommand)]
    Connections(ConnectionsCommand),
    /// Authenticate against a content server and report the current user.
    Check(CheckArgs),
}

#[derive(Subcommand)]
pub(crate) enum ConnectionsCommand {
    /// List every resolved connection.
    List,
    /// Show one connection with secrets masked.
    Show(ConnectionShowArgs),
}

#[derive(Args)]
pub(crate) struct ConnectionShowArgs {
    #[arg(help = "Connection name")]
    pub(crate) name: String,
}

#[derive(Args)]
pub(crate) struct UiArgs {
    #[arg(long, env = "PUBLISHER_UI_HOST", default_value = DEFAULT_UI_HOST)]
    pub(crate) host: String,
    #[arg(long, env = "PUBLISHER_UI_PORT", default_value_t = 0)]
    pub(crate) port: u16,
    #[arg(long, default_value = "/", help = "Initial page, optionally with a #fragment")]
    pub(crate) path: String,
}

#[derive(Args)]
pub(crate) struct CheckArgs {
    #[arg(value_parser = parse_url, help = "Content server URL")]
    pub(crate) url: Url,
    #[arg(
        long,
        help = "Scheme tag (none, api-key, legacy-token, federated); inferred from the other flags when omitted"
    )]
    pub(crate) auth_type: Option<String>,
    #[arg(long, env = "PUBLISHER_API_KEY", hide_env_values = true)]
    pub(crate) api_key: Option<String>,
    #[arg(long, help = "Header carrying the API key instead of Authorization")]
    pub(crate) api_key_header: Option<String>,
    #[arg(long)]
    pub(crate) token_id: Option<String>,
    #[arg(long, env = "PUBLISHER_TOKEN_SECRET", hide_env_values = true)]
    pub(crate) token_secret: Option<String>,
    #[arg(long, env = "PUBLISHER_PRIVATE_KEY", hide_env_values = true)]
    pub(crate) private_key: Option<String>,
    #[arg(long, help = "Federated identity connection name")]
    pub(crate) connection_name: Option<String>,
}

impl CheckArgs {
    /// Credential descriptor assembled from the flags.
    pub(crate) fn credential(&self) -> Credential {
        let mut credential = Credential {
            name: "command-line".to_string(),
            url: self.url.to_string(),
            auth_type: String::new(),
            api_key: self.api_key.clone(),
            api_key_header: self.api_key_header.clone(),
            token_id: self.token_id.clone(),
            token_secret: self.token_secret.clone(),
            private_key: self.private_key.clone(),
            connection_name: self.connection_name.clone(),
        };
        credential.auth_type = self
            .auth_type
            .clone()
            .unwrap_or_else(|| credential.infer_scheme().as_str().to_string());
        credential
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}

fn parse_log_format(input: &str) -> Result<LogFormat, String> {
    input.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn ui_defaults_to_loopback_and_free_port() -> Result<(), clap::Error> {
        let cli = Cli::try_parse_from(["publisher", "ui"])?;
        match cli.command {
            Command::Ui(args) => {
                assert_eq!(args.host, "127.0.0.1");
                assert_eq!(args.port, 0);
                assert_eq!(args.path, "/");
            }
            _ => panic!("expected ui command"),
        }
        Ok(())
    }

    #[test]
    fn check_infers_scheme_from_flags() -> Result<(), clap::Error> {
        let cli = Cli::try_parse_from([
            "publisher",
            "check",
            "https://connect.example.com/",
            "--token-id",
            "T1",
            "--token-secret",
            "c2VjcmV0",
        ])?;
        let Command::Check(args) = cli.command else {
            panic!("expected check command");
        };
        let credential = args.credential();
        assert_eq!(credential.auth_type, "legacy-token");
        assert_eq!(credential.url, "https://connect.example.com/");
        Ok(())
    }

    #[test]
    fn explicit_auth_type_wins() -> Result<(), clap::Error> {
        let cli = Cli::try_parse_from([
            "publisher",
            "check",
            "https://connect.example.com/",
            "--auth-type",
            "none",
            "--api-key",
            "abc",
        ])?;
        let Command::Check(args) = cli.command else {
            panic!("expected check command");
        };
        assert_eq!(args.credential().auth_type, "none");
        Ok(())
    }

    #[test]
    fn rejects_unknown_log_format() {
        assert!(Cli::try_parse_from(["publisher", "--log-format", "xml", "ui"]).is_err());
        assert!(Cli::try_parse_from(["publisher", "--log-format", "json", "ui"]).is_ok());
    }

    #[test]
    fn connections_show_requires_name() {
        assert!(Cli::try_parse_from(["publisher", "connections", "show"]).is_err());
        assert!(Cli::try_parse_from(["publisher", "connections", "show", "prod"]).is_ok());
    }
}
