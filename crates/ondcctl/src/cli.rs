use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use ondc_core::EngineConfig;
use crate::commands;

/// ONDC workbench CLI - inspect and drive protocol flows
#[derive(Parser, Debug)]
#[command(name = "ondcctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Engine configuration file (YAML)
    #[arg(long, short = 'c', global = true, env = "ONDC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Backend base URL (overrides the config file)
    #[arg(long, global = true, env = "ONDC_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for commands that print structured data
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the paired timeline of a FlowMap snapshot file
    Timeline {
        /// FlowMap JSON file, as returned by the backend
        file: PathBuf,

        /// Flow id used to decide what the flow is waiting on
        /// (defaults to the snapshot's active flow)
        #[arg(long)]
        flow: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Poll a live flow and auto-advance it where no human is needed
    Watch {
        /// Session id
        #[arg(long)]
        session: String,

        /// Flow id within the session
        #[arg(long)]
        flow: String,

        /// Poll interval in seconds
        #[arg(long, default_value_t = 2)]
        interval: u64,

        /// Only print, never advance the flow
        #[arg(long)]
        read_only: bool,
    },

    /// Submit answers for the form a flow is waiting on
    Submit {
        /// Session id
        #[arg(long)]
        session: String,

        /// Flow id within the session
        #[arg(long)]
        flow: String,

        /// Form answers as a JSON object keyed by field name
        #[arg(long)]
        data: String,
    },

    /// Show a session's flow to transaction mapping
    Session {
        /// Session id
        id: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },
}

impl Cli {
    pub async fn execute(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Timeline { ref file, ref flow, output } => {
                commands::timeline::execute(file, flow.as_deref(), output)
            }
            Commands::Watch {
                ref session,
                ref flow,
                interval,
                read_only,
            } => {
                let config = load_config(self.config.as_deref(), self.backend_url.as_deref())?;
                commands::watch::execute(&config, session, flow, interval, read_only).await
            }
            Commands::Submit {
                ref session,
                ref flow,
                ref data,
            } => {
                let config = load_config(self.config.as_deref(), self.backend_url.as_deref())?;
                commands::submit::execute(&config, session, flow, data).await
            }
            Commands::Session { ref id, output } => {
                let config = load_config(self.config.as_deref(), self.backend_url.as_deref())?;
                commands::session::execute(&config, id, output).await
            }
        }
    }
}

/// Resolve the engine configuration from file, defaults and flags
fn load_config(
    path: Option<&std::path::Path>,
    backend_url: Option<&str>,
) -> anyhow::Result<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    if let Some(url) = backend_url {
        config = config.with_base_url(url);
    }

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    tracing::debug!(base_url = %config.backend.base_url, "Using backend");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_flag_overrides_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "backend:\n  baseUrl: http://from-file:3000").unwrap();

        let config = load_config(Some(file.path()), Some("http://from-flag:4000")).unwrap();
        assert_eq!(config.backend.base_url, "http://from-flag:4000");

        let config = load_config(Some(file.path()), None).unwrap();
        assert_eq!(config.backend.base_url, "http://from-file:3000");
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(load_config(None, Some("localhost:3000")).is_err());
    }

    #[test]
    fn test_parses_timeline_command() {
        let cli = Cli::try_parse_from([
            "ondcctl", "timeline", "flow.json", "--flow", "f1", "-o", "json",
        ])
        .unwrap();

        match cli.command {
            Commands::Timeline { file, flow, output } => {
                assert_eq!(file, PathBuf::from("flow.json"));
                assert_eq!(flow.as_deref(), Some("f1"));
                assert_eq!(output, OutputFormat::Json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
