//! Twilio Messages API client for WhatsApp.

mod client;
mod error;
mod types;

pub use client::{MessageSender, TwilioClient, DEFAULT_BASE_URL};
pub use error::TwilioError;
pub use types::*;
