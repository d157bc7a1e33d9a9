use std::path::PathBuf;

use clap::Parser;
use eyre::{Result, WrapErr};
use tracing::info;
use tracing::level_filters::LevelFilter;

use sms_relay::{config::DEFAULT_CONFIG_PATH, Config, SerialPortConnector, WebhookClient};
use sms_relay_telemetry::TelemetryConfig;

const ERROR_LOG_FILE: &str = "error.log";
const DEBUG_LOG_FILE: &str = "debug.log";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Receives sms on serial modems and posts them to any webhook api like the one in slack"
)]
struct Cli {
    #[arg(
        short = 'c',
        long = "config",
        default_value = DEFAULT_CONFIG_PATH,
        help = "Path to the JSON config listing modems and webhooks"
    )]
    config: PathBuf,

    #[arg(
        short = 'v',
        long = "verbose",
        help = "Log progress at INFO level to stderr instead of a log file"
    )]
    verbose: bool,

    #[arg(short = 'd', long = "debug", help = "Log serial traffic at DEBUG level")]
    debug: bool,

    #[arg(long = "log-file", help = "Append logs to this file instead of error.log / debug.log")]
    log_file: Option<PathBuf>,

    #[arg(long = "journald", help = "Log to journald when not attached to a terminal")]
    journald: bool,
}

impl Cli {
    fn level(&self) -> LevelFilter {
        if self.debug {
            LevelFilter::DEBUG
        } else if self.verbose {
            LevelFilter::INFO
        } else {
            LevelFilter::WARN
        }
    }

    /// File the logs go to. Without `--verbose` or `--journald` a run always
    /// leaves one behind: `error.log`, or `debug.log` with `--debug`.
    fn log_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.log_file {
            return Some(path.clone());
        }
        if self.verbose || self.journald {
            return None;
        }
        let name = if self.debug { DEBUG_LOG_FILE } else { ERROR_LOG_FILE };
        Some(PathBuf::from(name))
    }

    fn telemetry(&self) -> TelemetryConfig {
        let mut telemetry = TelemetryConfig::new().with_default_level(self.level());
        if self.journald {
            telemetry = telemetry.with_journald(sms_relay::SYSLOG_IDENTIFIER);
        }
        if let Some(path) = self.log_file() {
            telemetry = telemetry.with_log_file(path);
        }
        telemetry
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    cli.telemetry()
        .try_init()
        .wrap_err("failed to initialize logging")?;

    let config = Config::load(&cli.config)?;
    let client = WebhookClient::new().wrap_err("failed to build webhook client")?;

    let summary = sms_relay::run(SerialPortConnector::default(), &client, &config);
    info!(?summary, "run finished");

    Ok(())
}
