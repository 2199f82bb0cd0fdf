//! Ledger abstraction used by the relay.

use crate::account::LocalAccount;
use crate::error::MovementError;
use crate::types::{EntryFunctionPayload, TransactionInfo, ViewRequest};
use async_trait::async_trait;
use serde_json::Value;

/// Operations the relay needs from a ledger node.
///
/// Implemented over HTTP by [`MovementClient`](crate::MovementClient); command
/// handlers and API routes depend only on this trait.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Native coin balance in octas. Unknown accounts have balance 0.
    async fn balance(&self, address: &str) -> Result<u64, MovementError>;

    /// Evaluate a read-only function.
    async fn view(&self, request: &ViewRequest) -> Result<Vec<Value>, MovementError>;

    /// Sign and submit an entry function call, returning the transaction hash.
    async fn submit(
        &self,
        account: &LocalAccount,
        payload: &EntryFunctionPayload,
    ) -> Result<String, MovementError>;

    /// Wait until a transaction is committed. A failed VM status is an error.
    async fn wait_for_transaction(&self, hash: &str) -> Result<TransactionInfo, MovementError>;

    /// Mint test coins to `address` from the network faucet and wait for them.
    async fn fund_account(&self, address: &str, amount: u64) -> Result<Vec<String>, MovementError>;

    /// Submit and wait for confirmation.
    async fn submit_and_wait(
        &self,
        account: &LocalAccount,
        payload: &EntryFunctionPayload,
    ) -> Result<TransactionInfo, MovementError> {
        let hash = self.submit(account, payload).await?;
        self.wait_for_transaction(&hash).await
    }

    /// Transfer `amount` octas from `account` to `to` and wait for confirmation.
    async fn transfer(
        &self,
        account: &LocalAccount,
        to: &str,
        amount: u64,
    ) -> Result<TransactionInfo, MovementError> {
        self.submit_and_wait(account, &EntryFunctionPayload::transfer(to, amount))
            .await
    }

    /// Whether the node is reachable.
    async fn health_check(&self) -> bool {
        true
    }
}
