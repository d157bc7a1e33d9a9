use std::io;

/// The modem did not answer the `AT` check, or the serial line failed.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("failed to open serial port '{interface}': {source}")]
    Open {
        interface: String,
        #[source]
        source: io::Error,
    },
    #[error("no modem on '{interface}': identity check answered {response:?}")]
    NoModem {
        interface: String,
        response: Vec<String>,
    },
    #[error("serial i/o on '{interface}' failed: {source}")]
    Io {
        interface: String,
        #[source]
        source: io::Error,
    },
}

/// A response batch did not have the shape expected for its command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("{command} response has {actual} lines, expected at least {expected}")]
    TooShort {
        command: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{command} response has no {field} in {line:?}")]
    MissingField {
        command: &'static str,
        field: &'static str,
        line: String,
    },
    #[error("invalid message index {0:?}")]
    InvalidIndex(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("no webhook configured for number {0}")]
    NoWebhook(String),
    #[error("number {0} has more than one webhook configured")]
    Ambiguous(String),
}

#[derive(Debug, thiserror::Error)]
#[error("webhook request to {url} failed: {source}")]
pub struct DeliveryError {
    pub url: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

#[derive(Debug, thiserror::Error)]
#[error("failed to delete message {index}: {source}")]
pub struct DeleteError {
    pub index: u32,
    #[source]
    pub source: ConnectionError,
}

/// Failure of a single modem controller operation.
#[derive(Debug, thiserror::Error)]
pub enum ModemError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
