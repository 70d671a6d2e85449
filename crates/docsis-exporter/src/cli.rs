// Command-line surface. Everything else comes from the environment
// (see `docsis_config::ENV_KEYS`).

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

/// Scrape DOCSIS telemetry from a Sagemcom cable modem into ClickHouse.
#[derive(Debug, Parser)]
#[command(name = "docsis-exporter", version, about, long_about = None)]
pub struct Cli {
    /// TOML file with settings; environment variables take precedence
    #[arg(short, long, env = "DOCSIS_EXPORTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v debug, -vv trace); overrides LOG_LEVEL
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Validate the configuration and exit
    #[arg(long)]
    pub check: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}
