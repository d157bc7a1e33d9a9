use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::error::DeliveryError;
use crate::modem::DecodedMessage;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON body posted to a webhook, in the shape Slack incoming webhooks accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookPayload {
    pub text: String,
}

impl From<&DecodedMessage> for WebhookPayload {
    fn from(message: &DecodedMessage) -> Self {
        Self {
            text: format!("From {}: \n {}", message.sender_number, message.text),
        }
    }
}

/// Something that hands a decoded message to the outside world.
pub trait Notifier {
    fn deliver(&self, url: &str, message: &DecodedMessage) -> Result<(), DeliveryError>;
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn deliver(&self, url: &str, message: &DecodedMessage) -> Result<(), DeliveryError> {
        (**self).deliver(url, message)
    }
}

/// Posts messages to webhooks over HTTP.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: reqwest::blocking::Client,
}

impl WebhookClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

impl Notifier for WebhookClient {
    fn deliver(&self, url: &str, message: &DecodedMessage) -> Result<(), DeliveryError> {
        info!(sender = %message.sender_number, "sending sms to webhook");
        self.client
            .post(url)
            .json(&WebhookPayload::from(message))
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map(drop)
            .map_err(|source| DeliveryError {
                url: url.to_owned(),
                source: Box::new(source),
            })
    }
}
