//! API request and response types.

use crate::networks::NetworkEntry;
use movement_client::{PhoneRegistration, TransactionCount};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Service banner.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub timestamp: String,
    pub network: String,
    pub chain_id: u64,
    pub currency: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime: f64,
    pub timestamp: String,
    pub registered_users: usize,
    pub ledger_healthy: bool,
    pub network: NetworkEntry,
}

#[derive(Debug, Serialize)]
pub struct NetworksResponse {
    pub success: bool,
    pub networks: Vec<NetworkEntry>,
    pub active: String,
}

#[derive(Debug, Serialize)]
pub struct NetworkResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub network: NetworkEntry,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchNetworkRequest {
    pub network_key: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletResponse {
    pub success: bool,
    pub address: String,
    pub private_key: String,
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct FundRequest {
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundData {
    pub address: String,
    pub amount: u64,
    pub transaction_hashes: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub private_key: Option<String>,
    pub phone: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterData {
    pub name: String,
    pub phone: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_chain: Option<PhoneRegistration>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub private_key_hex: Option<String>,
    pub recipient_phone: Option<String>,
    /// Accepted as a JSON string or number.
    pub amount: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendData {
    pub transaction_hash: String,
    pub sender: String,
    pub recipient_phone: String,
    pub amount: String,
    pub amount_in_octas: u64,
}

/// Success envelope for operations returning a payload.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub message: &'static str,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(message: &'static str, data: T) -> Self {
        Self {
            success: true,
            message,
            data,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationStatusResponse {
    pub success: bool,
    pub phone: String,
    pub is_registered: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub success: bool,
    pub address: String,
    pub balance: u64,
    pub balance_formatted: String,
}

#[derive(Debug, Serialize)]
pub struct TransactionsResponse {
    pub success: bool,
    pub address: String,
    pub transactions: TransactionCount,
}

#[derive(Debug, Deserialize)]
pub struct TestMessageRequest {
    pub to: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TestMessageResponse {
    pub success: bool,
    pub sid: String,
    pub status: String,
    pub message: &'static str,
}
