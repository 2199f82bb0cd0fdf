//! Mocks shared by unit tests.

use async_trait::async_trait;
use mockall::mock;
use movement_client::{
    EntryFunctionPayload, LedgerClient, LocalAccount, MovementError, TransactionInfo, ViewRequest,
};
use serde_json::Value;
use twilio_client::{MessageSender, SentMessage, TwilioError};

mock! {
    pub Ledger {}

    #[async_trait]
    impl LedgerClient for Ledger {
        async fn balance(&self, address: &str) -> Result<u64, MovementError>;
        async fn view(&self, request: &ViewRequest) -> Result<Vec<Value>, MovementError>;
        async fn submit(
            &self,
            account: &LocalAccount,
            payload: &EntryFunctionPayload,
        ) -> Result<String, MovementError>;
        async fn wait_for_transaction(&self, hash: &str) -> Result<TransactionInfo, MovementError>;
        async fn fund_account(&self, address: &str, amount: u64) -> Result<Vec<String>, MovementError>;
        async fn submit_and_wait(
            &self,
            account: &LocalAccount,
            payload: &EntryFunctionPayload,
        ) -> Result<TransactionInfo, MovementError>;
        async fn transfer(
            &self,
            account: &LocalAccount,
            to: &str,
            amount: u64,
        ) -> Result<TransactionInfo, MovementError>;
        async fn health_check(&self) -> bool;
    }
}

mock! {
    pub Sender {}

    #[async_trait]
    impl MessageSender for Sender {
        async fn send(&self, to: &str, body: &str) -> Result<SentMessage, TwilioError>;
    }
}

pub fn committed(hash: &str) -> TransactionInfo {
    TransactionInfo {
        kind: "user_transaction".into(),
        hash: hash.into(),
        version: Some("1".into()),
        success: Some(true),
        vm_status: Some("Executed successfully".into()),
    }
}

pub fn sent(sid: &str) -> SentMessage {
    SentMessage {
        sid: sid.into(),
        status: "queued".into(),
    }
}
