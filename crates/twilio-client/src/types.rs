//! Twilio API types.

use crate::error::TwilioError;
use serde::{Deserialize, Serialize};

/// Channel prefix Twilio puts on WhatsApp addresses.
pub const WHATSAPP_PREFIX: &str = "whatsapp:";

/// Inbound message webhook (form-encoded).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(rename = "From")]
    pub from: Option<String>,
    #[serde(rename = "Body")]
    pub body: Option<String>,
    #[serde(rename = "To")]
    pub to: Option<String>,
    #[serde(rename = "MessageSid")]
    pub message_sid: Option<String>,
    #[serde(rename = "ProfileName")]
    pub profile_name: Option<String>,
}

/// Delivery status callback (form-encoded).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusCallback {
    #[serde(rename = "MessageSid")]
    pub message_sid: Option<String>,
    #[serde(rename = "MessageStatus")]
    pub message_status: Option<String>,
    #[serde(rename = "To")]
    pub to: Option<String>,
    #[serde(rename = "ErrorCode")]
    pub error_code: Option<String>,
}

/// Form body for `Messages.json`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateMessageRequest<'a> {
    #[serde(rename = "From")]
    pub from: &'a str,
    #[serde(rename = "To")]
    pub to: &'a str,
    #[serde(rename = "Body")]
    pub body: &'a str,
}

/// Message resource returned after a send.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SentMessage {
    pub sid: String,
    pub status: String,
}

/// Error body returned on 4xx/5xx.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub code: Option<u32>,
    pub message: String,
}

/// Parsed inbound message for command processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotMessage {
    /// Sender address as delivered, e.g. `whatsapp:+14155551234`. Replies go here.
    pub source: String,
    /// Sender phone number without the channel prefix.
    pub phone: String,
    /// Message text, trimmed.
    pub text: String,
    /// WhatsApp profile name, when Twilio supplies one.
    pub profile_name: Option<String>,
}

impl BotMessage {
    /// Extract a bot message from a webhook delivery.
    pub fn from_webhook(payload: &WebhookPayload) -> Result<Self, TwilioError> {
        let source = payload
            .from
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(TwilioError::MissingField("From"))?;
        let text = payload.body.as_deref().ok_or(TwilioError::MissingField("Body"))?;

        Ok(Self {
            source: source.to_string(),
            phone: strip_channel(source).to_string(),
            text: text.trim().to_string(),
            profile_name: payload.profile_name.clone(),
        })
    }

    /// Build a message directly, e.g. for tests or the API.
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            phone: strip_channel(&source).to_string(),
            source,
            text: text.into(),
            profile_name: None,
        }
    }
}

/// Remove the `whatsapp:` channel prefix, if present.
pub fn strip_channel(address: &str) -> &str {
    address.strip_prefix(WHATSAPP_PREFIX).unwrap_or(address)
}

/// Give `to` the channel prefix of `from` when it has none.
pub fn with_channel_of(from: &str, to: &str) -> String {
    if to.contains(':') || !from.starts_with(WHATSAPP_PREFIX) {
        to.to_string()
    } else {
        format!("{}{}", WHATSAPP_PREFIX, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_channel() {
        assert_eq!(strip_channel("whatsapp:+14155551234"), "+14155551234");
        assert_eq!(strip_channel("+14155551234"), "+14155551234");
    }

    #[test]
    fn test_with_channel_of() {
        let from = "whatsapp:+14155238886";
        assert_eq!(with_channel_of(from, "+14155551234"), "whatsapp:+14155551234");
        assert_eq!(with_channel_of(from, "whatsapp:+14155551234"), "whatsapp:+14155551234");
        assert_eq!(with_channel_of("+15005550006", "+14155551234"), "+14155551234");
    }
}
