//! Register command - creates a managed wallet for the sender's phone.

use crate::commands::{arguments, CommandHandler};
use crate::error::AppResult;
use crate::networks::NetworkManager;
use async_trait::async_trait;
use movement_client::units::{is_valid_phone_number, shorten_address};
use movement_client::LocalAccount;
use name_registry::{NameRegistry, RegistryError};
use std::sync::Arc;
use tracing::{info, warn};
use twilio_client::BotMessage;

pub const MIN_NAME_LEN: usize = 2;
pub const MAX_NAME_LEN: usize = 50;

/// Check a display name chosen at registration, returning why it is refused.
///
/// Names are a single word so `PAY <name>` can address them, and never look
/// like a phone number since `PAY` resolves names before phones.
pub fn validate_name(name: &str) -> Result<(), String> {
    if !(MIN_NAME_LEN..=MAX_NAME_LEN).contains(&name.chars().count()) {
        return Err(format!(
            "Name must be between {} and {} characters",
            MIN_NAME_LEN, MAX_NAME_LEN
        ));
    }
    if name.chars().any(char::is_whitespace) {
        return Err("Name must be a single word".into());
    }
    if is_valid_phone_number(name) {
        return Err("Name can't be a phone number".into());
    }
    Ok(())
}

fn registered_as(name: &str) -> String {
    format!(
        "✅ Your phone is already registered as *{}*!\n\nYou can start sending and receiving payments.",
        name
    )
}

fn name_taken(name: &str) -> String {
    format!(
        "❌ The name *{}* is already taken.\n\nTry another one.",
        name
    )
}

pub struct RegisterHandler {
    registry: Arc<NameRegistry>,
    networks: Arc<NetworkManager>,
    registration_url: String,
    funding_amount: u64,
}

impl RegisterHandler {
    pub fn new(
        registry: Arc<NameRegistry>,
        networks: Arc<NetworkManager>,
        registration_url: impl Into<String>,
        funding_amount: u64,
    ) -> Self {
        Self {
            registry,
            networks,
            registration_url: registration_url.into(),
            funding_amount,
        }
    }

    async fn already_registered(&self, phone: &str) -> AppResult<Option<String>> {
        if let Some(record) = self.registry.lookup_by_phone(phone).await? {
            return Ok(Some(registered_as(&record.name)));
        }

        if let Some(contract) = self.networks.contract().await {
            if contract.is_phone_registered(phone).await? {
                return Ok(Some(
                    "✅ Your phone is already registered!\n\nYou can start sending and receiving payments."
                        .into(),
                ));
            }
        }

        Ok(None)
    }

    fn instructions(&self) -> String {
        format!(
            "📝 *Registration*\n\nReply with *REGISTER <name>* to create a wallet for this phone.\nExample: REGISTER alice\n\nOr register with your own wallet at:\n{}",
            self.registration_url
        )
    }
}

#[async_trait]
impl CommandHandler for RegisterHandler {
    fn name(&self) -> &str {
        "register"
    }

    fn keyword(&self) -> &str {
        "REGISTER"
    }

    async fn execute(&self, message: &BotMessage) -> AppResult<String> {
        if let Some(reply) = self.already_registered(&message.phone).await? {
            return Ok(reply);
        }

        let name = arguments(message).join(" ");
        if name.is_empty() {
            return Ok(self.instructions());
        }

        if let Err(reason) = validate_name(&name) {
            return Ok(format!("❌ {}.", reason));
        }

        if self.registry.lookup_by_name(&name).await?.is_some() {
            return Ok(name_taken(&name));
        }

        let account = LocalAccount::generate();
        let record = match self
            .registry
            .claim_name(
                &name,
                &message.phone,
                account.address(),
                Some(account.secret_hex()),
            )
            .await
        {
            Ok(record) => record,
            Err(RegistryError::NameTaken { .. }) => return Ok(name_taken(&name)),
            Err(RegistryError::PhoneTaken { name, .. }) => return Ok(registered_as(&name)),
            Err(e) => return Err(e.into()),
        };
        info!("Created wallet {} for {}", record.address, message.phone);

        let ledger = self.networks.ledger().await;
        let funded = match ledger.fund_account(account.address(), self.funding_amount).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Faucet funding failed for {}: {}", account.address(), e);
                false
            }
        };

        if let Some(contract) = self.networks.contract().await {
            if let Err(e) = contract.register_or_update_phone(&account, &message.phone).await {
                warn!("On-chain phone registration failed for {}: {}", message.phone, e);
            }
        }

        let mut reply = format!(
            "✅ *Welcome, {}!*\n\nYour wallet: {}",
            record.name,
            shorten_address(account.address())
        );
        if !funded {
            reply.push_str("\n\n⚠️ Could not fund your wallet from the faucet yet.");
        }
        reply.push_str("\n\nSend BALANCE to check your funds or HELP for commands.");
        Ok(reply)
    }
}
