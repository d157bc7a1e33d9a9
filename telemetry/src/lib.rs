use std::fs::{File, OpenOptions};
use std::io::IsTerminal as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter,
};

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("failed to open log file '{}'", path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Where formatted log lines end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    Stderr,
    Journald(String),
    File(PathBuf),
}

#[derive(Debug)]
pub struct TelemetryConfig {
    syslog_identifier: Option<String>,
    global_filter: EnvFilter,
    log_file: Option<PathBuf>,
}

impl TelemetryConfig {
    /// Starts from the relay's defaults: WARN level, overridable via `RUST_LOG`,
    /// written to stderr.
    #[expect(clippy::new_without_default, reason = "may add required args later")]
    #[must_use]
    pub fn new() -> Self {
        Self {
            syslog_identifier: None,
            global_filter: env_filter(LevelFilter::WARN),
            log_file: None,
        }
    }

    /// Changes the level used when `RUST_LOG` is not set.
    #[must_use]
    pub fn with_default_level(self, level: LevelFilter) -> Self {
        Self {
            global_filter: env_filter(level),
            ..self
        }
    }

    /// Override the global filter to a custom filter.
    #[must_use]
    pub fn with_global_filter(self, filter: EnvFilter) -> Self {
        Self {
            global_filter: filter,
            ..self
        }
    }

    /// Enables journald, and uses the provided syslog identifier.
    ///
    /// If you run the application in a tty, stderr will be used instead.
    #[must_use]
    pub fn with_journald(self, syslog_identifier: &str) -> Self {
        Self {
            syslog_identifier: Some(syslog_identifier.to_owned()),
            ..self
        }
    }

    /// Appends log lines to `path`. Takes precedence over journald and stderr.
    #[must_use]
    pub fn with_log_file(self, path: impl AsRef<Path>) -> Self {
        Self {
            log_file: Some(path.as_ref().to_owned()),
            ..self
        }
    }

    /// Picks the sink for this config. `stderr_is_terminal` is how we detect
    /// running under systemd.
    pub fn sink(&self, stderr_is_terminal: bool) -> Sink {
        if let Some(path) = &self.log_file {
            return Sink::File(path.clone());
        }
        match &self.syslog_identifier {
            Some(ident) if !stderr_is_terminal => Sink::Journald(ident.clone()),
            _ => Sink::Stderr,
        }
    }
}

impl TelemetryConfig {
    pub fn try_init(self) -> Result<(), TelemetryError> {
        let sink = self.sink(std::io::stderr().is_terminal());

        let mut file_layer = None;
        let mut journald_layer = None;
        match &sink {
            Sink::File(path) => {
                let file = open_log_file(path)?;
                file_layer = Some(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                );
            }
            Sink::Journald(ident) => {
                journald_layer = tracing_journald::layer()
                    .inspect_err(|err| {
                        eprintln!(
                            "failed connecting to journald socket. \
                        will write to stderr: {err}"
                        );
                    })
                    .map(|layer| layer.with_syslog_identifier(ident.clone()))
                    .ok();
            }
            Sink::Stderr => {}
        }
        let stderr_layer = (file_layer.is_none() && journald_layer.is_none())
            .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

        tracing_subscriber::registry()
            .with(stderr_layer)
            .with(journald_layer)
            .with(file_layer)
            .with(self.global_filter)
            .try_init()?;
        Ok(())
    }

    /// Initializes the telemetry config. Call this only once, at the beginning of the
    /// program.
    ///
    /// Calling this more than once or when another tracing subscriber is registered
    /// will cause a panic.
    pub fn init(self) {
        self.try_init().expect("failed to initialize sms-relay telemetry")
    }
}

fn env_filter(default_level: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy()
}

fn open_log_file(path: &Path) -> Result<File, TelemetryError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| TelemetryError::LogFile {
            path: path.to_owned(),
            source,
        })
}
