//! Ledger client errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MovementError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid secret key: {0}")]
    InvalidSecret(String),

    #[error("Transaction {hash} failed: {vm_status}")]
    TransactionFailed { hash: String, vm_status: String },

    #[error("Timed out waiting for transaction {0}")]
    Timeout(String),

    #[error("Faucet not configured for this network")]
    FaucetUnavailable,

    #[error("Phone number is not registered: {0}")]
    PhoneNotRegistered(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}
