//! Relays SMS stored on serial GSM modems to webhooks.
//!
//! Each configured modem is identified by the number of its SIM, which selects
//! the webhook its messages go to. A message is deleted from the SIM only after
//! the webhook accepted it.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod modem;
pub mod webhook;

pub use config::Config;
pub use dispatch::{run, RunSummary};
pub use error::{ConfigError, ConnectionError, DeleteError, DeliveryError, ModemError, ParseError};
pub use modem::{ActiveModem, Connector, DecodedMessage, Modem, SerialPortConnector, SmsRecord};
pub use webhook::{Notifier, WebhookClient};

pub const SYSLOG_IDENTIFIER: &str = "sms-relay";
