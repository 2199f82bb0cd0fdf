//! HTTP client for an Aptos-compatible node.

use crate::account::LocalAccount;
use crate::error::MovementError;
use crate::ledger::LedgerClient;
use crate::types::*;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

const DEFAULT_MAX_GAS_AMOUNT: u64 = 100_000;
const DEFAULT_GAS_UNIT_PRICE: u64 = 100;
const TRANSACTION_TTL_SECS: i64 = 60;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Ledger client over the node REST API.
#[derive(Clone)]
pub struct MovementClient {
    client: Client,
    node_url: String,
    faucet_url: Option<String>,
    poll_interval: Duration,
    wait_timeout: Duration,
}

impl MovementClient {
    /// Create a client for `node_url` (e.g. `https://testnet.movementnetwork.xyz/v1`).
    pub fn new(
        node_url: impl Into<String>,
        faucet_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, MovementError> {
        let client = Client::builder().timeout(timeout).build()?;

        let node_url = node_url.into().trim_end_matches('/').to_string();
        let faucet_url = faucet_url.map(|u| u.trim_end_matches('/').to_string());

        info!("Movement client initialized: {}", node_url);

        Ok(Self {
            client,
            node_url,
            faucet_url,
            poll_interval: DEFAULT_POLL_INTERVAL,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
        })
    }

    /// Override how transaction confirmation is polled.
    pub fn with_polling(mut self, poll_interval: Duration, wait_timeout: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.wait_timeout = wait_timeout;
        self
    }

    pub fn node_url(&self) -> &str {
        &self.node_url
    }

    pub fn faucet_url(&self) -> Option<&str> {
        self.faucet_url.as_deref()
    }

    /// Fetch account metadata (sequence number).
    #[instrument(skip(self))]
    pub async fn account(&self, address: &str) -> Result<AccountInfo, MovementError> {
        let response = self
            .client
            .get(format!("{}/accounts/{}", self.node_url, address))
            .send()
            .await?;
        parse_json(response).await
    }

    /// List all resources stored under an account.
    #[instrument(skip(self))]
    pub async fn resources(&self, address: &str) -> Result<Vec<AccountResource>, MovementError> {
        let response = self
            .client
            .get(format!("{}/accounts/{}/resources", self.node_url, address))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Account {} not found, no resources", address);
            return Ok(Vec::new());
        }

        parse_json(response).await
    }

    /// Look up a transaction; `None` while the node has not seen it yet.
    pub async fn transaction_by_hash(
        &self,
        hash: &str,
    ) -> Result<Option<TransactionInfo>, MovementError> {
        let response = self
            .client
            .get(format!("{}/transactions/by_hash/{}", self.node_url, hash))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        parse_json(response).await.map(Some)
    }

    async fn encode_submission(
        &self,
        transaction: &UnsignedTransaction<'_>,
    ) -> Result<Vec<u8>, MovementError> {
        let response = self
            .client
            .post(format!("{}/transactions/encode_submission", self.node_url))
            .json(transaction)
            .send()
            .await?;

        let encoded: String = parse_json(response).await?;
        hex::decode(encoded.trim_start_matches("0x")).map_err(|e| {
            MovementError::UnexpectedResponse(format!("signing message is not hex: {}", e))
        })
    }
}

#[async_trait]
impl LedgerClient for MovementClient {
    async fn balance(&self, address: &str) -> Result<u64, MovementError> {
        let resources = self.resources(address).await?;

        let Some(store) = resources.iter().find(|r| r.resource_type == COIN_STORE) else {
            return Ok(0);
        };

        let value = &store.data["coin"]["value"];
        parse_u64(value).ok_or_else(|| {
            MovementError::UnexpectedResponse(format!("invalid coin value: {}", value))
        })
    }

    #[instrument(skip(self, request), fields(function = %request.function))]
    async fn view(&self, request: &ViewRequest) -> Result<Vec<Value>, MovementError> {
        let response = self
            .client
            .post(format!("{}/view", self.node_url))
            .json(request)
            .send()
            .await?;
        parse_json(response).await
    }

    #[instrument(skip(self, account, payload), fields(sender = %account.address(), function = %payload.function))]
    async fn submit(
        &self,
        account: &LocalAccount,
        payload: &EntryFunctionPayload,
    ) -> Result<String, MovementError> {
        let info = self.account(account.address()).await?;
        let expiration = chrono::Utc::now().timestamp() + TRANSACTION_TTL_SECS;

        let transaction = UnsignedTransaction {
            sender: account.address(),
            sequence_number: info.sequence_number,
            max_gas_amount: DEFAULT_MAX_GAS_AMOUNT.to_string(),
            gas_unit_price: DEFAULT_GAS_UNIT_PRICE.to_string(),
            expiration_timestamp_secs: expiration.to_string(),
            payload,
        };

        let signing_message = self.encode_submission(&transaction).await?;

        let signed = SignedTransaction {
            transaction,
            signature: TransactionSignature {
                kind: "ed25519_signature",
                public_key: account.public_key_hex(),
                signature: account.sign(&signing_message),
            },
        };

        let response = self
            .client
            .post(format!("{}/transactions", self.node_url))
            .json(&signed)
            .send()
            .await?;

        let pending: PendingTransaction = parse_json(response).await?;
        info!("Transaction submitted: {}", pending.hash);
        Ok(pending.hash)
    }

    #[instrument(skip(self))]
    async fn wait_for_transaction(&self, hash: &str) -> Result<TransactionInfo, MovementError> {
        let started = Instant::now();

        loop {
            if let Some(tx) = self.transaction_by_hash(hash).await? {
                if !tx.is_pending() {
                    if tx.success == Some(false) {
                        let vm_status = tx.vm_status.unwrap_or_else(|| "unknown".into());
                        warn!("Transaction {} failed: {}", hash, vm_status);
                        return Err(MovementError::TransactionFailed {
                            hash: hash.to_string(),
                            vm_status,
                        });
                    }
                    debug!("Transaction {} committed", hash);
                    return Ok(tx);
                }
            }

            if started.elapsed() >= self.wait_timeout {
                return Err(MovementError::Timeout(hash.to_string()));
            }
            sleep(self.poll_interval).await;
        }
    }

    #[instrument(skip(self))]
    async fn fund_account(&self, address: &str, amount: u64) -> Result<Vec<String>, MovementError> {
        let faucet_url = self
            .faucet_url
            .as_deref()
            .ok_or(MovementError::FaucetUnavailable)?;

        let response = self
            .client
            .post(format!("{}/mint", faucet_url))
            .query(&[("amount", amount.to_string()), ("address", address.to_string())])
            .send()
            .await?;

        let hashes = parse_json::<FaucetResponse>(response).await?.into_hashes();
        for hash in &hashes {
            self.wait_for_transaction(hash).await?;
        }

        info!("Funded {} with {} octas ({} transactions)", address, amount, hashes.len());
        Ok(hashes)
    }

    async fn health_check(&self) -> bool {
        self.client
            .get(format!("{}/-/healthy", self.node_url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

/// Turn a non-2xx response into [`MovementError::Api`], otherwise decode JSON.
async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, MovementError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(MovementError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json().await?)
}

/// Move encodes u64 as a JSON string; accept plain numbers too.
pub(crate) fn parse_u64(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}
