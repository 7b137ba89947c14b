use std::path::PathBuf;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use shadow_monitor::{Monitor, MonitorConfig, NotifySource};
use shadow_queue::CancellationToken;

/// Capture the contents of files in a directory the moment they change.
#[derive(Parser, Debug)]
#[command(name = "shadowmon", version)]
struct Cli {
    /// Directory to watch (not recursive)
    #[arg(long, value_name = "DIR")]
    monitor: Option<PathBuf>,

    /// Directory that receives one `<sequence>_<name>` file per snapshot
    #[arg(long, value_name = "DIR")]
    shadow: Option<PathBuf>,

    /// Delete the shadow directory before starting
    #[arg(long)]
    purge_shadow: bool,

    /// Don't echo snapshot contents that look binary
    #[arg(long = "no-display-binary", alias = "display-binary")]
    no_display_binary: bool,

    /// Only capture file names matching this glob
    #[arg(long, value_name = "GLOB")]
    filter: Option<String>,

    /// TOML file with defaults; flags given here take precedence
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<MonitorConfig> {
        let mut cfg = match &self.config {
            Some(path) => MonitorConfig::load_from(path)?,
            None => MonitorConfig::default(),
        };
        if let Some(dir) = self.monitor {
            cfg.monitor_dir = dir;
        }
        if let Some(dir) = self.shadow {
            cfg.shadow_dir = dir;
        }
        if let Some(filter) = self.filter {
            cfg.file_pattern = filter;
        }
        cfg.purge_shadow |= self.purge_shadow;
        cfg.suppress_binary_display |= self.no_display_binary;
        Ok(cfg.expand_paths())
    }
}

fn usage_error(kind: ErrorKind, msg: impl std::fmt::Display) -> ! {
    Cli::command().error(kind, msg).exit()
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cfg = match cli.into_config() {
        Ok(cfg) => cfg,
        Err(err) => usage_error(ErrorKind::Io, format!("{err:#}")),
    };
    if cfg.monitor_dir.as_os_str().is_empty() {
        usage_error(ErrorKind::MissingRequiredArgument, "--monitor <DIR> is required");
    }
    if cfg.shadow_dir.as_os_str().is_empty() {
        usage_error(ErrorKind::MissingRequiredArgument, "--shadow <DIR> is required");
    }
    if let Err(err) = cfg.validate() {
        usage_error(ErrorKind::ValueValidation, format!("{err:#}"));
    }

    let token = CancellationToken::new();
    {
        let token = token.clone();
        ctrlc::set_handler(move || {
            tracing::info!("interrupt received, shutting down");
            token.cancel();
        })
        .context("install interrupt handler")?;
    }

    let mut monitor = Monitor::new(cfg, NotifySource::new(), token)?;
    let stats = monitor.run_until_cancelled()?;
    println!(
        "Persisted {} snapshot(s), {} write failure(s)",
        stats.persisted, stats.write_failures
    );
    Ok(())
}
