//! CLI module for streamdash
//!
//! Command-line interface definitions and handlers for the watchdog dashboard.
//!
//! # Commands
//!
//! - `watch` - Interactive live dashboard
//! - `status` - Print the current backend state once
//! - `set` - Change polling settings
//! - `check-now` - Trigger an immediate check
//! - `history` - Show the status history chart
//! - `lang` - Show or change the display language
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Live dashboard against a backend on the NAS
//! streamdash watch --url http://nas.local:8000
//!
//! # Turn live mode on for the next stream
//! streamdash set --live-mode on
//!
//! # Generate shell completions
//! streamdash completions bash > ~/.bash_completion.d/streamdash
//! ```

pub mod check;
pub mod completions;
pub mod config;
pub mod history;
pub mod lang;
pub mod output;
pub mod set;
pub mod status;
pub mod watch;

pub use completions::handle_completions;
pub use config::handle_config_init;

use crate::config::DashConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// streamdash - Stream watchdog dashboard
#[derive(Parser, Debug)]
#[command(
    name = "streamdash",
    version,
    about = "Terminal dashboard for the YouTube/OBS stream watchdog"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the live dashboard
    Watch(WatchArgs),
    /// Print the current backend state
    Status(StatusArgs),
    /// Change polling settings
    Set(SetArgs),
    /// Trigger an immediate check
    CheckNow(CheckNowArgs),
    /// Show status history
    History(HistoryArgs),
    /// Show or change the display language
    Lang(LangArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Options shared by every command that talks to the backend.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "streamdash.toml")]
    pub config: PathBuf,

    /// Backend base URL (e.g., http://localhost:8000)
    #[arg(short, long, env = "STREAMDASH_URL")]
    pub url: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "STREAMDASH_LOG_LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Number of history entries drawn in the chart
    #[arg(short, long)]
    pub width: Option<usize>,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Seconds to wait for the first state push
    #[arg(long, default_value = "10")]
    pub wait: u64,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Base polling interval in seconds
    #[arg(long)]
    pub check_interval: Option<u64>,

    /// Live mode (on/off)
    #[arg(long, value_parser = parse_switch)]
    pub live_mode: Option<bool>,

    /// Seconds before live mode switches itself off
    #[arg(long)]
    pub live_mode_timeout: Option<u64>,

    /// OBS control (on/off)
    #[arg(long, value_parser = parse_switch)]
    pub obs_enabled: Option<bool>,

    /// YouTube checks (on/off); turning them off also turns OBS control off
    #[arg(long, value_parser = parse_switch)]
    pub youtube_enabled: Option<bool>,

    /// Seconds to wait for the backend to confirm
    #[arg(long, default_value = "30")]
    pub wait: u64,

    /// Do not wait for a confirming push
    #[arg(long)]
    pub no_wait: bool,
}

#[derive(Args, Debug)]
pub struct CheckNowArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Number of entries drawn in the chart
    #[arg(short, long)]
    pub width: Option<usize>,
}

#[derive(Args, Debug)]
pub struct LangArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Language code to switch to (shows the current one when omitted)
    pub language: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "streamdash.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

/// Parse an on/off switch value.
pub fn parse_switch(raw: &str) -> Result<bool, String> {
    match raw.trim().to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(format!("expected on/off, got '{}'", other)),
    }
}

/// Load configuration with CLI overrides
pub fn load_config(args: &CommonArgs) -> Result<DashConfig, Box<dyn std::error::Error>> {
    // Load from file if it exists, otherwise use defaults
    let mut config = if args.config.exists() {
        DashConfig::load(Some(&args.config))?
    } else {
        tracing::debug!("Config file not found, using defaults");
        DashConfig::default()
    };

    config = config.with_env_overrides();

    // CLI overrides (highest priority)
    if let Some(ref url) = args.url {
        config.server.base_url = url.clone();
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parse_watch_defaults() {
        let cli = Cli::try_parse_from(["streamdash", "watch"]).unwrap();
        match cli.command {
            Commands::Watch(args) => {
                assert_eq!(args.common.config, PathBuf::from("streamdash.toml"));
                assert!(args.width.is_none());
            }
            _ => panic!("Expected Watch command"),
        }
    }

    #[test]
    fn test_cli_parse_status_json() {
        let cli = Cli::try_parse_from(["streamdash", "status", "--json"]).unwrap();
        match cli.command {
            Commands::Status(args) => {
                assert!(args.json);
                assert_eq!(args.wait, 10);
            }
            _ => panic!("Expected Status command"),
        }
    }

    #[test]
    fn test_cli_parse_set_switches() {
        let cli = Cli::try_parse_from([
            "streamdash",
            "set",
            "--check-interval",
            "300",
            "--live-mode",
            "on",
            "--youtube-enabled",
            "false",
        ])
        .unwrap();
        match cli.command {
            Commands::Set(args) => {
                assert_eq!(args.check_interval, Some(300));
                assert_eq!(args.live_mode, Some(true));
                assert_eq!(args.youtube_enabled, Some(false));
                assert!(args.obs_enabled.is_none());
            }
            _ => panic!("Expected Set command"),
        }
    }

    #[test]
    fn test_cli_parse_set_rejects_bad_switch() {
        let result = Cli::try_parse_from(["streamdash", "set", "--live-mode", "maybe"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_url_override() {
        let cli =
            Cli::try_parse_from(["streamdash", "check-now", "--url", "http://nas:8000"]).unwrap();
        match cli.command {
            Commands::CheckNow(args) => {
                assert_eq!(args.common.url.as_deref(), Some("http://nas:8000"));
            }
            _ => panic!("Expected CheckNow command"),
        }
    }

    #[test]
    fn test_cli_parse_lang() {
        let cli = Cli::try_parse_from(["streamdash", "lang", "de"]).unwrap();
        match cli.command {
            Commands::Lang(args) => assert_eq!(args.language.as_deref(), Some("de")),
            _ => panic!("Expected Lang command"),
        }
    }

    #[test]
    fn test_parse_switch() {
        assert_eq!(parse_switch("ON"), Ok(true));
        assert_eq!(parse_switch("off"), Ok(false));
        assert_eq!(parse_switch("1"), Ok(true));
        assert!(parse_switch("sometimes").is_err());
    }

    #[test]
    fn test_load_config_cli_overrides_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            temp.path(),
            "[server]\nbase_url = \"http://from-file:8000\"\n[logging]\nlevel = \"info\"",
        )
        .unwrap();

        let args = CommonArgs {
            config: temp.path().to_path_buf(),
            url: Some("http://from-cli:9000".to_string()),
            log_level: Some("debug".to_string()),
        };
        let config = load_config(&args).unwrap();
        assert_eq!(config.server.base_url, "http://from-cli:9000");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_config_rejects_invalid_url() {
        let args = CommonArgs {
            config: PathBuf::from("/nonexistent/streamdash.toml"),
            url: Some("nas:8000".to_string()),
            log_level: None,
        };
        assert!(load_config(&args).is_err());
    }
}
