mod cli;
mod error;

use clap::Parser;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use docsis_config::LogLevel;
use docsis_core::{ClickHouseSink, Exporter};

use crate::cli::{Cli, LogFormat};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(level: LogLevel, verbosity: u8, format: LogFormat) {
    let directive = match verbosity {
        0 => level.filter_directive(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let loaded = docsis_config::load(cli.config.as_deref())?;
    init_tracing(loaded.log_level, cli.verbose, cli.log_format);

    if cli.check {
        println!(
            "configuration OK: modem {} -> {}/{}",
            loaded.exporter.modem.url, loaded.clickhouse.database, loaded.clickhouse.table
        );
        return Ok(());
    }

    let sink = ClickHouseSink::new(&loaded.clickhouse)?;
    let exporter = Exporter::new(loaded.exporter, sink);
    let signals = spawn_signal_handler(exporter.shutdown_token())?;

    let result = exporter.run().await;
    signals.abort();
    result.map_err(CliError::from)
}

/// Cancel `token` on SIGTERM or SIGINT.
#[cfg(unix)]
fn spawn_signal_handler(token: CancellationToken) -> Result<JoinHandle<()>, CliError> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    Ok(tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM"),
            _ = sigint.recv() => info!("received SIGINT"),
            () = token.cancelled() => return,
        }
        token.cancel();
    }))
}

/// Cancel `token` on Ctrl-C.
#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn spawn_signal_handler(token: CancellationToken) -> Result<JoinHandle<()>, CliError> {
    Ok(tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if result.is_ok() {
                    info!("received Ctrl-C");
                }
            }
            () = token.cancelled() => return,
        }
        token.cancel();
    }))
}
