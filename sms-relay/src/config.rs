use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Contents of the relay's JSON config file:
///
/// ```json
/// {
///     "modems": ["/dev/ttyUSB0", "/dev/ttyUSB3"],
///     "numbers": [
///         {"number": "+491511234567", "webhook": "https://hooks.example/abc"}
///     ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Serial devices to poll.
    pub modems: Vec<String>,
    /// Webhook per SIM number.
    #[serde(default)]
    pub numbers: Vec<NumberRoute>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NumberRoute {
    pub number: String,
    pub webhook: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file '{}'", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Read {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// The webhook configured for exactly this number.
    pub fn webhook_for(&self, number: &str) -> Result<&str, ConfigError> {
        let mut routes = self.numbers.iter().filter(|route| route.number == number);
        match (routes.next(), routes.next()) {
            (Some(route), None) => Ok(&route.webhook),
            (Some(_), Some(_)) => Err(ConfigError::Ambiguous(number.to_owned())),
            (None, _) => Err(ConfigError::NoWebhook(number.to_owned())),
        }
    }
}
