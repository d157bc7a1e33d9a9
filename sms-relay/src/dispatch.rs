//! One polling pass over all configured modems.

use tracing::{info, info_span, warn};

use crate::config::Config;
use crate::modem::decode::decode_body;
use crate::modem::{ActiveModem, Connector, DecodedMessage, Modem, SmsRecord};
use crate::webhook::Notifier;

/// Counters of one run, logged when it finishes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub modems_active: usize,
    pub modems_skipped: usize,
    pub modems_failed: usize,
    pub delivered: usize,
    pub delivery_failed: usize,
    pub deleted: usize,
    pub delete_failed: usize,
}

/// Identifies every configured modem and resolves its webhook. Modems for
/// which either step fails are logged and left out.
pub fn activate_modems<C>(connector: C, config: &Config) -> (Vec<ActiveModem<C>>, usize)
where
    C: Connector + Clone,
{
    info!("fetching all available modems");
    let mut active = Vec::with_capacity(config.modems.len());
    let mut skipped = 0;
    for interface in &config.modems {
        let _span = info_span!("modem", %interface).entered();
        match Modem::new(connector.clone(), interface.as_str()).activate(config) {
            Ok(modem) => active.push(modem),
            Err(error) => {
                warn!(%error, "cannot create modem");
                skipped += 1;
            }
        }
    }
    (active, skipped)
}

/// Relays all stored messages of all configured modems once.
pub fn run<C, N>(connector: C, notifier: &N, config: &Config) -> RunSummary
where
    C: Connector + Clone,
    N: Notifier + ?Sized,
{
    let (modems, skipped) = activate_modems(connector, config);
    let mut summary = RunSummary {
        modems_active: modems.len(),
        modems_skipped: skipped,
        ..RunSummary::default()
    };

    info!("fetching all received sms");
    for modem in &modems {
        let identity = modem.identity();
        let _span = info_span!(
            "modem",
            interface = %identity.interface,
            number = %identity.number
        )
        .entered();
        match modem.list_messages() {
            Ok(records) => {
                for record in records {
                    relay_message(modem, notifier, record, &mut summary);
                }
            }
            Err(error) => {
                warn!(%error, "fetching messages failed");
                summary.modems_failed += 1;
            }
        }
    }
    summary
}

/// Delivers one message and deletes it from the SIM only if delivery worked.
fn relay_message<C, N>(
    modem: &ActiveModem<C>,
    notifier: &N,
    record: SmsRecord,
    summary: &mut RunSummary,
) where
    C: Connector,
    N: Notifier + ?Sized,
{
    let message = DecodedMessage {
        text: decode_body(&record.raw_body),
        sender_number: record.sender_number,
    };
    if let Err(error) = notifier.deliver(modem.webhook(), &message) {
        warn!(index = record.index, sender = %message.sender_number, %error, "send failed");
        summary.delivery_failed += 1;
        return;
    }
    summary.delivered += 1;

    match modem.delete_message(record.index) {
        Ok(()) => summary.deleted += 1,
        Err(error) => {
            warn!(index = record.index, %error, "delete failed");
            summary.delete_failed += 1;
        }
    }
}
