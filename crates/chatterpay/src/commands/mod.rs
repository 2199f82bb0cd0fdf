//! Chat command handlers.

mod balance;
mod help;
mod pay;
mod register;
mod status;

pub use balance::BalanceHandler;
pub use help::HelpHandler;
pub use pay::PayHandler;
pub use register::{validate_name, RegisterHandler, MAX_NAME_LEN, MIN_NAME_LEN};
pub use status::StatusHandler;

use crate::error::AppResult;
use crate::networks::NetworkManager;
use async_trait::async_trait;
use name_registry::NameRegistry;
use tracing::{error, info};
use twilio_client::BotMessage;

pub const UNKNOWN_COMMAND: &str = "❓ Unknown command.\n\nSend HELP to see available commands.";

pub const FAILURE_REPLY: &str =
    "❌ An error occurred processing your request. Please try again later.";

pub const NOT_REGISTERED: &str =
    "❌ Your phone is not registered.\n\nSend REGISTER <name> to get started.";

/// Command handler trait.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Command name, for logging.
    fn name(&self) -> &str;

    /// First word that selects this command (matched case-insensitively).
    fn keyword(&self) -> &str;

    /// Check if this handler matches the message.
    fn matches(&self, message: &BotMessage) -> bool {
        message
            .text
            .split_whitespace()
            .next()
            .is_some_and(|word| word.eq_ignore_ascii_case(self.keyword()))
    }

    /// Execute the command.
    async fn execute(&self, message: &BotMessage) -> AppResult<String>;
}

/// Words after the command keyword.
pub(crate) fn arguments(message: &BotMessage) -> Vec<&str> {
    message.text.split_whitespace().skip(1).collect()
}

/// Routes inbound messages to the first matching handler.
pub struct CommandRouter {
    handlers: Vec<Box<dyn CommandHandler>>,
}

impl CommandRouter {
    pub fn new(handlers: Vec<Box<dyn CommandHandler>>) -> Self {
        Self { handlers }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Produce the reply for `message`. Never fails: handler errors become
    /// [`FAILURE_REPLY`].
    pub async fn dispatch(&self, message: &BotMessage) -> String {
        let Some(handler) = self.handlers.iter().find(|h| h.matches(message)) else {
            info!("Unknown command from {}", message.phone);
            return UNKNOWN_COMMAND.into();
        };

        info!("{} command from {}", handler.name(), message.phone);
        match handler.execute(message).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("{} handler error: {}", handler.name(), e);
                FAILURE_REPLY.into()
            }
        }
    }
}

/// Ledger address for `phone`: the registry first, then the contract when configured.
pub(crate) async fn resolve_address(
    registry: &NameRegistry,
    networks: &NetworkManager,
    phone: &str,
) -> AppResult<Option<String>> {
    if let Some(address) = registry.address_for_phone(phone).await? {
        return Ok(Some(address));
    }

    match networks.contract().await {
        Some(contract) => Ok(contract.address_from_phone(phone).await?),
        None => Ok(None),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    struct Echo;

    #[async_trait]
    impl CommandHandler for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn keyword(&self) -> &str {
            "ECHO"
        }

        async fn execute(&self, message: &BotMessage) -> AppResult<String> {
            Ok(arguments(message).join(" "))
        }
    }

    struct Broken;

    #[async_trait]
    impl CommandHandler for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn keyword(&self) -> &str {
            "BREAK"
        }

        async fn execute(&self, _message: &BotMessage) -> AppResult<String> {
            Err(AppError::BadRequest("boom".into()))
        }
    }

    fn router() -> CommandRouter {
        CommandRouter::new(vec![Box::new(Echo), Box::new(Broken)])
    }

    #[tokio::test]
    async fn test_dispatch_is_case_insensitive() {
        let reply = router()
            .dispatch(&BotMessage::new("whatsapp:+14155550001", "echo hello  world"))
            .await;
        assert_eq!(reply, "hello world");
    }

    #[tokio::test]
    async fn test_keyword_must_be_whole_word() {
        let reply = router()
            .dispatch(&BotMessage::new("whatsapp:+14155550001", "echoes"))
            .await;
        assert_eq!(reply, UNKNOWN_COMMAND);
    }

    #[tokio::test]
    async fn test_unknown_and_empty_messages() {
        let router = router();
        assert_eq!(
            router.dispatch(&BotMessage::new("whatsapp:+1", "hi there")).await,
            UNKNOWN_COMMAND
        );
        assert_eq!(
            router.dispatch(&BotMessage::new("whatsapp:+1", "")).await,
            UNKNOWN_COMMAND
        );
    }

    #[tokio::test]
    async fn test_handler_error_becomes_generic_reply() {
        let reply = router()
            .dispatch(&BotMessage::new("whatsapp:+14155550001", "BREAK"))
            .await;
        assert_eq!(reply, FAILURE_REPLY);
    }
}
