//! Status command - shows whether the sender is registered.

use crate::commands::{resolve_address, CommandHandler};
use crate::error::AppResult;
use crate::networks::NetworkManager;
use async_trait::async_trait;
use movement_client::units::{format_balance, shorten_address};
use name_registry::NameRegistry;
use std::sync::Arc;
use twilio_client::BotMessage;

pub const NOT_REGISTERED_STATUS: &str =
    "📱 *Account Status: Not Registered*\n\nSend REGISTER <name> to get started!";

pub struct StatusHandler {
    registry: Arc<NameRegistry>,
    networks: Arc<NetworkManager>,
}

impl StatusHandler {
    pub fn new(registry: Arc<NameRegistry>, networks: Arc<NetworkManager>) -> Self {
        Self { registry, networks }
    }
}

#[async_trait]
impl CommandHandler for StatusHandler {
    fn name(&self) -> &str {
        "status"
    }

    fn keyword(&self) -> &str {
        "STATUS"
    }

    async fn execute(&self, message: &BotMessage) -> AppResult<String> {
        let phone = &message.phone;
        let Some(address) = resolve_address(&self.registry, &self.networks, phone).await? else {
            return Ok(NOT_REGISTERED_STATUS.into());
        };

        let network = self.networks.active().await.network;
        let balance = self.networks.ledger().await.balance(&address).await?;

        let name_line = match self.registry.name_for_phone(phone).await? {
            Some(name) => format!("Name: {}\n", name),
            None => String::new(),
        };

        Ok(format!(
            "✅ *Account Status: Active*\n\n{}Phone: {}\nAddress: {}\nBalance: {} {}\nNetwork: {}\n\nYou can send and receive payments!",
            name_line,
            phone,
            shorten_address(&address),
            format_balance(balance),
            network.currency,
            network.name
        ))
    }
}
