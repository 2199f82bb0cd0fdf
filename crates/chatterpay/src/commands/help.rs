//! Help command - lists available commands.

use crate::commands::CommandHandler;
use crate::error::AppResult;
use async_trait::async_trait;
use twilio_client::BotMessage;

pub struct HelpHandler;

impl HelpHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HelpHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandHandler for HelpHandler {
    fn name(&self) -> &str {
        "help"
    }

    fn keyword(&self) -> &str {
        "HELP"
    }

    async fn execute(&self, _message: &BotMessage) -> AppResult<String> {
        Ok(r#"🌟 *ChatterPay Commands*

📱 *REGISTER <name>* - Create your wallet and claim a name
💰 *BALANCE* - Check your account balance
💸 *PAY <phone|name> <amount>* - Send payment
   Example: PAY +1234567890 0.01
   Example: PAY alice 0.5

📊 *STATUS* - Check registration status
❓ *HELP* - Show this message"#
            .into())
    }
}
