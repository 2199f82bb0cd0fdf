//! ChatterPay - WhatsApp payment relay for the Movement network.
//!
//! Users text commands (REGISTER, BALANCE, PAY, STATUS, HELP) to a WhatsApp
//! number. Twilio delivers them to the webhook, the command router turns them
//! into ledger operations, and replies go back through Twilio. A JSON API
//! exposes the same operations for the web registration page.

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod networks;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use networks::{LedgerFactory, Network, NetworkEntry, NetworkManager, NetworksFile};
