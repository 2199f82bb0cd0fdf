//! Pay command - transfers coins from the sender's managed wallet.

use crate::commands::{arguments, CommandHandler, NOT_REGISTERED};
use crate::error::AppResult;
use crate::networks::NetworkManager;
use async_trait::async_trait;
use movement_client::units::{format_balance, is_valid_phone_number, parse_amount, shorten_address};
use movement_client::LocalAccount;
use name_registry::NameRegistry;
use std::sync::Arc;
use tracing::{info, warn};
use twilio_client::{BotMessage, MessageSender};

pub const PAY_USAGE: &str = "❌ Invalid PAY command.\n\nUsage: PAY <phone|name> <amount>\nExample: PAY +1234567890 0.01";

pub const INVALID_AMOUNT: &str = "❌ Invalid amount.\n\nAmount must be a positive number.";

/// Resolved payment recipient.
struct Recipient {
    address: String,
    phone: Option<String>,
    label: String,
}

pub struct PayHandler {
    registry: Arc<NameRegistry>,
    networks: Arc<NetworkManager>,
    messenger: Option<Arc<dyn MessageSender>>,
}

impl PayHandler {
    pub fn new(
        registry: Arc<NameRegistry>,
        networks: Arc<NetworkManager>,
        messenger: Option<Arc<dyn MessageSender>>,
    ) -> Self {
        Self {
            registry,
            networks,
            messenger,
        }
    }

    async fn resolve_recipient(&self, identifier: &str) -> AppResult<Option<Recipient>> {
        if let Some(record) = self.registry.lookup_by_identifier(identifier).await? {
            return Ok(Some(Recipient {
                label: format!("{} ({})", record.name, record.phone),
                address: record.address,
                phone: Some(record.phone),
            }));
        }

        if !is_valid_phone_number(identifier) {
            return Ok(None);
        }

        let Some(contract) = self.networks.contract().await else {
            return Ok(None);
        };
        Ok(contract
            .address_from_phone(identifier)
            .await?
            .map(|address| Recipient {
                address,
                phone: Some(identifier.to_string()),
                label: identifier.to_string(),
            }))
    }

    async fn notify_recipient(&self, phone: &str, sender: &str, amount: &str, hash: &str) {
        let Some(messenger) = &self.messenger else {
            return;
        };

        let body = format!(
            "💰 *Payment Received!*\n\nAmount: {}\nFrom: {}\n\nTransaction: {}\n\nCheck balance: Send BALANCE",
            amount,
            sender,
            shorten_address(hash)
        );
        if let Err(e) = messenger.send(phone, &body).await {
            warn!("Could not notify {} of payment: {}", phone, e);
        }
    }
}

#[async_trait]
impl CommandHandler for PayHandler {
    fn name(&self) -> &str {
        "pay"
    }

    fn keyword(&self) -> &str {
        "PAY"
    }

    async fn execute(&self, message: &BotMessage) -> AppResult<String> {
        let args = arguments(message);
        let [identifier, amount_text, ..] = args.as_slice() else {
            return Ok(PAY_USAGE.into());
        };

        let Some(octas) = parse_amount(amount_text) else {
            return Ok(INVALID_AMOUNT.into());
        };

        let Some(sender) = self.registry.lookup_by_phone(&message.phone).await? else {
            return Ok(NOT_REGISTERED.into());
        };
        let Some(secret) = sender.secret.as_deref() else {
            return Ok(
                "❌ Your wallet key is not held by ChatterPay.\n\nSend payments from your own wallet instead."
                    .into(),
            );
        };

        let Some(recipient) = self.resolve_recipient(identifier).await? else {
            return Ok(format!(
                "❌ Recipient {} is not registered.\n\nThey need to register first.",
                identifier
            ));
        };

        if recipient.address == sender.address {
            return Ok("❌ You can't pay yourself.".into());
        }

        let account = LocalAccount::from_secret_hex(secret)?;
        let currency = self.networks.active().await.network.currency;
        let amount = format!("{} {}", format_balance(octas), currency);

        info!(
            "Payment of {} octas from {} to {}",
            octas, message.phone, recipient.address
        );
        let tx = self
            .networks
            .ledger()
            .await
            .transfer(&account, &recipient.address, octas)
            .await?;

        if let Some(phone) = &recipient.phone {
            let from = format!("{} ({})", sender.name, sender.phone);
            self.notify_recipient(phone, &from, &amount, &tx.hash).await;
        }

        Ok(format!(
            "✅ *Payment Sent!*\n\nAmount: {}\nTo: {}\n\nTransaction: {}\n\nCheck balance: Send BALANCE",
            amount,
            recipient.label,
            shorten_address(&tx.hash)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::*;
    use crate::test_support::{committed, sent, MockLedger, MockSender};
    use movement_client::MovementError;
    use serde_json::json;
    use tempfile::TempDir;
    use twilio_client::TwilioError;

    const TX_HASH: &str = "0x5b1fa8c0b17c2f4dc6a3b1d1e0a9f7c9e3d2b1a0f9e8d7c6b5a4938271605f4e";

    fn message(text: &str) -> BotMessage {
        BotMessage::new(format!("whatsapp:{}", ALICE_PHONE), text)
    }

    async fn seeded_registry(dir: &TempDir) -> (Arc<NameRegistry>, LocalAccount) {
        let registry = registry(dir);
        let alice = LocalAccount::generate();
        registry
            .save_record("Alice", ALICE_PHONE, alice.address(), Some(alice.secret_hex()))
            .await
            .unwrap();
        registry
            .save_record("Bob", BOB_PHONE, "0xb0b", None)
            .await
            .unwrap();
        (registry, alice)
    }

    #[tokio::test]
    async fn test_usage_and_amount_validation() {
        let dir = TempDir::new().unwrap();
        let (registry, _) = seeded_registry(&dir).await;
        let mut ledger = MockLedger::new();
        ledger.expect_transfer().never();
        let handler = PayHandler::new(registry, networks(ledger, None), None);

        assert_eq!(handler.execute(&message("PAY")).await.unwrap(), PAY_USAGE);
        assert_eq!(handler.execute(&message("PAY bob")).await.unwrap(), PAY_USAGE);
        assert_eq!(
            handler.execute(&message("PAY bob -1")).await.unwrap(),
            INVALID_AMOUNT
        );
        assert_eq!(
            handler.execute(&message("PAY bob 0")).await.unwrap(),
            INVALID_AMOUNT
        );
    }

    #[tokio::test]
    async fn test_pay_by_name_transfers_and_notifies() {
        let dir = TempDir::new().unwrap();
        let (registry, alice) = seeded_registry(&dir).await;
        let alice_address = alice.address().to_string();

        let mut ledger = MockLedger::new();
        ledger
            .expect_transfer()
            .withf(move |account, to, amount| {
                account.address() == alice_address && to == "0xb0b" && *amount == 1_000_000
            })
            .times(1)
            .returning(|_, _, _| Ok(committed(TX_HASH)));

        let mut messenger = MockSender::new();
        messenger
            .expect_send()
            .withf(|to, body| to == BOB_PHONE && body.contains("Payment Received") && body.contains("Alice"))
            .times(1)
            .returning(|_, _| Ok(sent("SM1")));

        let handler = PayHandler::new(
            registry,
            networks(ledger, None),
            Some(Arc::new(messenger)),
        );
        let reply = handler.execute(&message("PAY BOB 0.01")).await.unwrap();

        assert!(reply.contains("Payment Sent"));
        assert!(reply.contains("0.01000000 MOVE"));
        assert!(reply.contains("Bob (+14155550002)"));
    }

    #[tokio::test]
    async fn test_pay_by_phone() {
        let dir = TempDir::new().unwrap();
        let (registry, _) = seeded_registry(&dir).await;

        let mut ledger = MockLedger::new();
        ledger
            .expect_transfer()
            .withf(|_, to, _| to == "0xb0b")
            .times(1)
            .returning(|_, _, _| Ok(committed(TX_HASH)));

        let handler = PayHandler::new(registry, networks(ledger, None), None);
        let reply = handler.execute(&message("PAY +14155550002 1")).await.unwrap();
        assert!(reply.contains("1.00000000 MOVE"));
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_payment() {
        let dir = TempDir::new().unwrap();
        let (registry, _) = seeded_registry(&dir).await;

        let mut ledger = MockLedger::new();
        ledger
            .expect_transfer()
            .returning(|_, _, _| Ok(committed(TX_HASH)));

        let mut messenger = MockSender::new();
        messenger.expect_send().returning(|_, _| {
            Err(TwilioError::Api {
                status: 429,
                message: "daily limit".into(),
            })
        });

        let handler = PayHandler::new(
            registry,
            networks(ledger, None),
            Some(Arc::new(messenger)),
        );
        let reply = handler.execute(&message("PAY bob 0.5")).await.unwrap();
        assert!(reply.contains("Payment Sent"));
    }

    #[tokio::test]
    async fn test_recipient_resolved_on_contract() {
        let dir = TempDir::new().unwrap();
        let (registry, _) = seeded_registry(&dir).await;

        let mut ledger = MockLedger::new();
        ledger
            .expect_view()
            .withf(|r| r.function.ends_with("::is_phone_registered"))
            .returning(|_| Ok(vec![json!(true)]));
        ledger
            .expect_view()
            .withf(|r| r.function.ends_with("::get_address_from_phone"))
            .returning(|_| Ok(vec![json!("0xca401")]));
        ledger
            .expect_transfer()
            .withf(|_, to, _| to == "0xca401")
            .times(1)
            .returning(|_, _, _| Ok(committed(TX_HASH)));

        let handler = PayHandler::new(registry, networks(ledger, Some("0xc0ffee")), None);
        let reply = handler.execute(&message("PAY +447700900123 2")).await.unwrap();
        assert!(reply.contains("To: +447700900123"));
    }

    #[tokio::test]
    async fn test_unknown_recipient() {
        let dir = TempDir::new().unwrap();
        let (registry, _) = seeded_registry(&dir).await;
        let mut ledger = MockLedger::new();
        ledger.expect_transfer().never();

        let handler = PayHandler::new(registry, networks(ledger, None), None);
        let reply = handler.execute(&message("PAY carol 1")).await.unwrap();
        assert!(reply.contains("Recipient carol is not registered"));
    }

    #[tokio::test]
    async fn test_sender_without_secret_or_registration() {
        let dir = TempDir::new().unwrap();
        let (registry, _) = seeded_registry(&dir).await;
        let mut ledger = MockLedger::new();
        ledger.expect_transfer().never();
        let handler = PayHandler::new(registry, networks(ledger, None), None);

        let bob = BotMessage::new(format!("whatsapp:{}", BOB_PHONE), "PAY alice 1");
        let reply = handler.execute(&bob).await.unwrap();
        assert!(reply.contains("not held by ChatterPay"));

        let stranger = BotMessage::new("whatsapp:+14155559999", "PAY alice 1");
        assert_eq!(handler.execute(&stranger).await.unwrap(), NOT_REGISTERED);
    }

    #[tokio::test]
    async fn test_self_payment_rejected() {
        let dir = TempDir::new().unwrap();
        let (registry, _) = seeded_registry(&dir).await;
        let mut ledger = MockLedger::new();
        ledger.expect_transfer().never();

        let handler = PayHandler::new(registry, networks(ledger, None), None);
        let reply = handler.execute(&message("PAY alice 1")).await.unwrap();
        assert!(reply.contains("can't pay yourself"));
    }

    #[tokio::test]
    async fn test_failed_transfer_is_an_error() {
        let dir = TempDir::new().unwrap();
        let (registry, _) = seeded_registry(&dir).await;

        let mut ledger = MockLedger::new();
        ledger.expect_transfer().returning(|_, _, _| {
            Err(MovementError::TransactionFailed {
                hash: TX_HASH.into(),
                vm_status: "EINSUFFICIENT_BALANCE".into(),
            })
        });

        let handler = PayHandler::new(registry, networks(ledger, None), None);
        assert!(handler.execute(&message("PAY bob 1000")).await.is_err());
    }
}
