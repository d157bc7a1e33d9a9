pub mod data;
pub mod decode;
pub mod parser;
pub mod session;

pub use data::{DecodedMessage, ModemIdentity, RawResponse, SmsRecord};
pub use session::{Connector, SerialLink, SerialPortConnector, Session};

use parser::{parse_message_list, parse_number, LIST_COMMAND, NUMBER_COMMAND};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ConfigError, ConnectionError, DeleteError, ModemError};

/// A modem whose SIM number is not known yet.
///
/// Every operation opens the line, runs one command exchange and closes it
/// again, so a modem left in a confused state by one command does not poison
/// the next.
pub struct Modem<C> {
    connector: C,
    interface: String,
}

impl<C: Connector> Modem<C> {
    pub fn new(connector: C, interface: impl Into<String>) -> Self {
        Self {
            connector,
            interface: interface.into(),
        }
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Asks the modem for the number of its SIM via `AT+CNUM`.
    pub fn identify(&self) -> Result<String, ModemError> {
        info!("getting number");
        let response = {
            let mut session = self.open()?;
            session.send_command(NUMBER_COMMAND)?;
            session.read_lines()?
        };
        let number = parse_number(&response)?;
        info!(%number, "got number");
        Ok(number)
    }

    /// Looks up the webhook for `number`, turning this into a modem that can be polled.
    pub fn resolve_webhook(
        self,
        number: String,
        config: &Config,
    ) -> Result<ActiveModem<C>, ConfigError> {
        debug!(%number, "getting webhook");
        let webhook = config.webhook_for(&number)?.to_owned();
        Ok(ActiveModem {
            identity: ModemIdentity {
                interface: self.interface.clone(),
                number,
            },
            webhook,
            modem: self,
        })
    }

    /// [`identify`](Self::identify) followed by [`resolve_webhook`](Self::resolve_webhook).
    pub fn activate(self, config: &Config) -> Result<ActiveModem<C>, ModemError> {
        let number = self.identify()?;
        Ok(self.resolve_webhook(number, config)?)
    }

    /// Fetches every stored message with `AT+CMGL="ALL"`.
    ///
    /// Messages whose listing entry cannot be parsed are logged and left out;
    /// they stay on the SIM.
    pub fn list_messages(&self) -> Result<Vec<SmsRecord>, ConnectionError> {
        let response = {
            let mut session = self.open()?;
            session.flush_buffers()?;
            session.send_command(LIST_COMMAND)?;
            session.read_lines()?
        };
        let records = parse_message_list(&response)
            .into_iter()
            .filter_map(|parsed| {
                parsed
                    .inspect_err(|error| {
                        warn!(%error, "skipping unparsable message");
                    })
                    .ok()
            })
            .collect();
        Ok(records)
    }

    /// Deletes the message in slot `index` with `AT+CMGD`.
    pub fn delete_message(&self, index: u32) -> Result<(), DeleteError> {
        let deleted = self.open().and_then(|mut session| {
            session.send_command(&format!("AT+CMGD={index}"))?;
            session.close();
            Ok(())
        });
        deleted.map_err(|source| DeleteError { index, source })
    }

    fn open(&self) -> Result<Session, ConnectionError> {
        Session::open(&self.connector, &self.interface)
    }
}

/// A modem with a known number and a webhook to relay its messages to.
pub struct ActiveModem<C> {
    modem: Modem<C>,
    identity: ModemIdentity,
    webhook: String,
}

impl<C: Connector> ActiveModem<C> {
    pub fn identity(&self) -> &ModemIdentity {
        &self.identity
    }

    pub fn webhook(&self) -> &str {
        &self.webhook
    }

    pub fn list_messages(&self) -> Result<Vec<SmsRecord>, ConnectionError> {
        info!("getting all sms");
        self.modem.list_messages()
    }

    pub fn delete_message(&self, index: u32) -> Result<(), DeleteError> {
        info!(index, "deleting sms");
        self.modem.delete_message(index)
    }
}
