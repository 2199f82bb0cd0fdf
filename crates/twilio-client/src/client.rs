//! Twilio HTTP client.

use crate::error::TwilioError;
use crate::types::*;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Default Twilio API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.twilio.com";

/// Outbound text messaging.
///
/// Command handlers notify third parties through this trait so they can be
/// exercised without a Twilio account.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send `body` to `to`, returning the created message.
    async fn send(&self, to: &str, body: &str) -> Result<SentMessage, TwilioError>;
}

/// Twilio Messages API client.
///
/// The auth token is stored using `SecretString` to prevent accidental
/// logging.
#[derive(Clone)]
pub struct TwilioClient {
    client: Client,
    base_url: String,
    account_sid: String,
    auth_token: SecretString,
    from: String,
}

impl TwilioClient {
    /// Create a new Twilio client sending from `from` (e.g. `whatsapp:+14155238886`).
    pub fn new(
        base_url: impl Into<String>,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from: impl Into<String>,
    ) -> Result<Self, TwilioError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        let from = from.into();
        info!("Twilio client initialized, sending from {}", from);

        Ok(Self {
            client,
            base_url,
            account_sid: account_sid.into(),
            auth_token: SecretString::new(auth_token.into()),
            from,
        })
    }

    /// Sender address.
    pub fn sender(&self) -> &str {
        &self.from
    }

    fn account_url(&self) -> String {
        format!("{}/2010-04-01/Accounts/{}", self.base_url, self.account_sid)
    }

    /// Check the credentials by fetching the account resource.
    pub async fn health_check(&self) -> bool {
        self.client
            .get(format!("{}.json", self.account_url()))
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// Reply to an inbound message.
    pub async fn reply(&self, original: &BotMessage, body: &str) -> Result<SentMessage, TwilioError> {
        self.send(&original.source, body).await
    }
}

#[async_trait]
impl MessageSender for TwilioClient {
    #[instrument(skip(self, body))]
    async fn send(&self, to: &str, body: &str) -> Result<SentMessage, TwilioError> {
        let to = with_channel_of(&self.from, to);
        let request = CreateMessageRequest {
            from: &self.from,
            to: &to,
            body,
        };

        let response = self
            .client
            .post(format!("{}/Messages.json", self.account_url()))
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorBody>(&text) {
                Ok(err) => match err.code {
                    Some(code) => format!("{} (code {})", err.message, code),
                    None => err.message,
                },
                Err(_) => text,
            };
            warn!("Send to {} failed: {}", to, message);
            return Err(TwilioError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let sent: SentMessage = response.json().await?;
        debug!("Sent message {} to {} ({})", sent.sid, to, sent.status);
        Ok(sent)
    }
}
