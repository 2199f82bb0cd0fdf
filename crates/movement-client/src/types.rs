//! Ledger REST API types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Coin store resource holding the native coin balance.
pub const COIN_STORE: &str = "0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>";

/// Framework function for a plain coin transfer (creates the recipient if needed).
pub const TRANSFER_FUNCTION: &str = "0x1::aptos_account::transfer";

/// Entry function call submitted in a transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "entry_function_payload")]
pub struct EntryFunctionPayload {
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<Value>,
}

impl EntryFunctionPayload {
    pub fn new(function: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self {
            function: function.into(),
            type_arguments: Vec::new(),
            arguments,
        }
    }

    /// Native coin transfer of `amount` octas to `to`.
    pub fn transfer(to: &str, amount: u64) -> Self {
        Self::new(
            TRANSFER_FUNCTION,
            vec![Value::from(to), Value::from(amount.to_string())],
        )
    }
}

/// Read-only function call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewRequest {
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<Value>,
}

impl ViewRequest {
    pub fn new(function: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self {
            function: function.into(),
            type_arguments: Vec::new(),
            arguments,
        }
    }
}

/// Account metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfo {
    pub sequence_number: String,
    pub authentication_key: Option<String>,
}

/// A resource stored under an account.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub data: Value,
}

/// Transaction as returned by the node.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub hash: String,
    pub version: Option<String>,
    pub success: Option<bool>,
    pub vm_status: Option<String>,
}

impl TransactionInfo {
    pub fn is_pending(&self) -> bool {
        self.kind == "pending_transaction"
    }
}

/// Response to a transaction submission.
#[derive(Debug, Clone, Deserialize)]
pub struct PendingTransaction {
    pub hash: String,
}

/// Transaction body sent to `encode_submission` and, with a signature, to `/transactions`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct UnsignedTransaction<'a> {
    pub sender: &'a str,
    pub sequence_number: String,
    pub max_gas_amount: String,
    pub gas_unit_price: String,
    pub expiration_timestamp_secs: String,
    pub payload: &'a EntryFunctionPayload,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SignedTransaction<'a> {
    #[serde(flatten)]
    pub transaction: UnsignedTransaction<'a>,
    pub signature: TransactionSignature,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct TransactionSignature {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub public_key: String,
    pub signature: String,
}

/// Faucet responses come either as a bare hash list or wrapped.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum FaucetResponse {
    Hashes(Vec<String>),
    Wrapped { txn_hashes: Vec<String> },
}

impl FaucetResponse {
    pub fn into_hashes(self) -> Vec<String> {
        match self {
            FaucetResponse::Hashes(h) => h,
            FaucetResponse::Wrapped { txn_hashes } => txn_hashes,
        }
    }
}

/// Sent/received payment counts tracked by the phone registry contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransactionCount {
    pub sent: u64,
    pub received: u64,
}

/// Result of registering a phone on the contract.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneRegistration {
    pub transaction_hash: String,
    pub address: String,
    pub phone_hash: String,
}
