//! Balance command - reports the sender's balance and payment counts.

use crate::commands::{resolve_address, CommandHandler, NOT_REGISTERED};
use crate::error::AppResult;
use crate::networks::NetworkManager;
use async_trait::async_trait;
use movement_client::units::{format_balance, shorten_address};
use name_registry::NameRegistry;
use std::sync::Arc;
use tracing::warn;
use twilio_client::BotMessage;

pub struct BalanceHandler {
    registry: Arc<NameRegistry>,
    networks: Arc<NetworkManager>,
}

impl BalanceHandler {
    pub fn new(registry: Arc<NameRegistry>, networks: Arc<NetworkManager>) -> Self {
        Self { registry, networks }
    }
}

#[async_trait]
impl CommandHandler for BalanceHandler {
    fn name(&self) -> &str {
        "balance"
    }

    fn keyword(&self) -> &str {
        "BALANCE"
    }

    async fn execute(&self, message: &BotMessage) -> AppResult<String> {
        let Some(address) = resolve_address(&self.registry, &self.networks, &message.phone).await?
        else {
            return Ok(NOT_REGISTERED.into());
        };

        let currency = self.networks.active().await.network.currency;
        let balance = self.networks.ledger().await.balance(&address).await?;

        let mut reply = format!(
            "💰 *Your Balance*\n\nBalance: {} {}\nAddress: {}",
            format_balance(balance),
            currency,
            shorten_address(&address)
        );

        if let Some(contract) = self.networks.contract().await {
            match contract.transaction_count(&address).await {
                Ok(count) => reply.push_str(&format!(
                    "\n\n📊 Transactions:\n• Sent: {}\n• Received: {}",
                    count.sent, count.received
                )),
                Err(e) => warn!("Could not fetch transaction count for {}: {}", address, e),
            }
        }

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::*;
    use crate::test_support::MockLedger;
    use movement_client::MovementError;
    use serde_json::json;
    use tempfile::TempDir;

    fn message() -> BotMessage {
        BotMessage::new(format!("whatsapp:{}", ALICE_PHONE), "BALANCE")
    }

    #[tokio::test]
    async fn test_balance_from_registry_address() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);
        registry
            .save_record("Alice", ALICE_PHONE, "0x7a9ea50052a16a735b75491d961ac61d9eae45584c1f789a4d93d99132c240a9", None)
            .await
            .unwrap();

        let mut ledger = MockLedger::new();
        ledger
            .expect_balance()
            .withf(|a| a.starts_with("0x7a9ea500"))
            .returning(|_| Ok(150_000_000));

        let handler = BalanceHandler::new(registry, networks(ledger, None));
        let reply = handler.execute(&message()).await.unwrap();

        assert!(reply.contains("Balance: 1.50000000 MOVE"));
        assert!(reply.contains("0x7a9ea500...c240a9"));
        assert!(!reply.contains("Transactions"));
    }

    #[tokio::test]
    async fn test_balance_falls_back_to_contract() {
        let dir = TempDir::new().unwrap();

        let mut ledger = MockLedger::new();
        ledger
            .expect_view()
            .withf(|r| r.function.ends_with("::is_phone_registered"))
            .returning(|_| Ok(vec![json!(true)]));
        ledger
            .expect_view()
            .withf(|r| r.function.ends_with("::get_address_from_phone"))
            .returning(|_| Ok(vec![json!("0xbeef")]));
        ledger
            .expect_view()
            .withf(|r| r.function.ends_with("::get_transaction_count"))
            .returning(|_| Ok(vec![json!("2"), json!("7")]));
        ledger.expect_balance().returning(|_| Ok(0));

        let handler = BalanceHandler::new(registry(&dir), networks(ledger, Some("0xc0ffee")));
        let reply = handler.execute(&message()).await.unwrap();

        assert!(reply.contains("Balance: 0.00000000 MOVE"));
        assert!(reply.contains("Sent: 2"));
        assert!(reply.contains("Received: 7"));
    }

    #[tokio::test]
    async fn test_unregistered_sender() {
        let dir = TempDir::new().unwrap();
        let mut ledger = MockLedger::new();
        ledger.expect_balance().never();

        let handler = BalanceHandler::new(registry(&dir), networks(ledger, None));
        assert_eq!(handler.execute(&message()).await.unwrap(), NOT_REGISTERED);
    }

    #[tokio::test]
    async fn test_ledger_error_propagates() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);
        registry
            .save_record("Alice", ALICE_PHONE, "0xa11ce", None)
            .await
            .unwrap();

        let mut ledger = MockLedger::new();
        ledger
            .expect_balance()
            .returning(|_| Err(MovementError::Timeout("balance".into())));

        let handler = BalanceHandler::new(registry, networks(ledger, None));
        assert!(handler.execute(&message()).await.is_err());
    }
}
