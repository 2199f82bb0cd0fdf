//! Wrapper over the deployed `phone_registry` Move module.

use crate::account::LocalAccount;
use crate::client::parse_u64;
use crate::error::MovementError;
use crate::ledger::LedgerClient;
use crate::types::{EntryFunctionPayload, PhoneRegistration, TransactionCount, ViewRequest};
use crate::units::phone_hash_hex;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument, warn};

const MODULE: &str = "phone_registry";

/// Abort code the module raises when a phone hash is already mapped.
pub const PHONE_ALREADY_REGISTERED: &str = "PHONE_ALREADY_REGISTERED";

/// Phone registry contract at a fixed module address.
///
/// Phones never leave the relay in clear text: every call passes the
/// SHA-256 of the number.
#[derive(Clone)]
pub struct PhoneRegistryContract {
    ledger: Arc<dyn LedgerClient>,
    address: String,
}

impl PhoneRegistryContract {
    pub fn new(ledger: Arc<dyn LedgerClient>, address: impl Into<String>) -> Self {
        Self {
            ledger,
            address: address.into(),
        }
    }

    /// Module address.
    pub fn address(&self) -> &str {
        &self.address
    }

    fn function(&self, name: &str) -> String {
        format!("{}::{}::{}", self.address, MODULE, name)
    }

    /// Map `phone` to the signer's address.
    #[instrument(skip(self, account), fields(sender = %account.address()))]
    pub async fn register_phone(
        &self,
        account: &LocalAccount,
        phone: &str,
    ) -> Result<PhoneRegistration, MovementError> {
        self.call_with_phone(account, phone, "register_phone").await
    }

    /// Re-point an existing phone mapping at the signer's address.
    #[instrument(skip(self, account), fields(sender = %account.address()))]
    pub async fn update_phone(
        &self,
        account: &LocalAccount,
        phone: &str,
    ) -> Result<PhoneRegistration, MovementError> {
        self.call_with_phone(account, phone, "update_phone").await
    }

    /// Register, falling back to an update when the phone is already mapped.
    pub async fn register_or_update_phone(
        &self,
        account: &LocalAccount,
        phone: &str,
    ) -> Result<PhoneRegistration, MovementError> {
        match self.register_phone(account, phone).await {
            Err(e) if is_already_registered(&e) => {
                info!("Phone already registered on chain, updating instead");
                self.update_phone(account, phone).await
            }
            other => other,
        }
    }

    async fn call_with_phone(
        &self,
        account: &LocalAccount,
        phone: &str,
        function: &str,
    ) -> Result<PhoneRegistration, MovementError> {
        let phone_hash = phone_hash_hex(phone);
        let payload = EntryFunctionPayload::new(
            self.function(function),
            vec![Value::from(phone_hash.as_str()), Value::from(self.address.as_str())],
        );

        let tx = self.ledger.submit_and_wait(account, &payload).await?;
        info!("{} confirmed: {}", function, tx.hash);

        Ok(PhoneRegistration {
            transaction_hash: tx.hash,
            address: account.address().to_string(),
            phone_hash,
        })
    }

    /// Pay `amount` octas to whoever owns `recipient_phone` on chain.
    #[instrument(skip(self, account), fields(sender = %account.address()))]
    pub async fn send_payment_to_phone(
        &self,
        account: &LocalAccount,
        recipient_phone: &str,
        amount: u64,
    ) -> Result<String, MovementError> {
        if !self.is_phone_registered(recipient_phone).await? {
            return Err(MovementError::PhoneNotRegistered(recipient_phone.to_string()));
        }

        let payload = EntryFunctionPayload::new(
            self.function("send_payment_to_phone"),
            vec![
                Value::from(phone_hash_hex(recipient_phone)),
                Value::from(amount.to_string()),
                Value::from(self.address.as_str()),
            ],
        );

        let tx = self.ledger.submit_and_wait(account, &payload).await?;
        Ok(tx.hash)
    }

    pub async fn is_phone_registered(&self, phone: &str) -> Result<bool, MovementError> {
        let result = self
            .view("is_phone_registered", vec![
                Value::from(phone_hash_hex(phone)),
                Value::from(self.address.as_str()),
            ])
            .await?;

        match result.first() {
            Some(Value::Bool(b)) => Ok(*b),
            other => Err(unexpected("is_phone_registered", other)),
        }
    }

    /// Address mapped to `phone`, `None` when it is not registered.
    pub async fn address_from_phone(&self, phone: &str) -> Result<Option<String>, MovementError> {
        if !self.is_phone_registered(phone).await? {
            return Ok(None);
        }

        let result = self
            .view("get_address_from_phone", vec![
                Value::from(phone_hash_hex(phone)),
                Value::from(self.address.as_str()),
            ])
            .await?;

        match result.first() {
            Some(Value::String(address)) => Ok(Some(address.clone())),
            other => Err(unexpected("get_address_from_phone", other)),
        }
    }

    /// Payment counters for `address`. Missing counters read as zero.
    pub async fn transaction_count(&self, address: &str) -> Result<TransactionCount, MovementError> {
        let result = self
            .view("get_transaction_count", vec![Value::from(address)])
            .await?;

        Ok(TransactionCount {
            sent: result.first().and_then(parse_u64).unwrap_or_default(),
            received: result.get(1).and_then(parse_u64).unwrap_or_default(),
        })
    }

    pub async fn total_users(&self) -> Result<u64, MovementError> {
        let result = self
            .view("get_total_users", vec![Value::from(self.address.as_str())])
            .await?;

        result
            .first()
            .and_then(parse_u64)
            .ok_or_else(|| unexpected("get_total_users", result.first()))
    }

    async fn view(&self, name: &str, arguments: Vec<Value>) -> Result<Vec<Value>, MovementError> {
        let request = ViewRequest::new(self.function(name), arguments);
        self.ledger.view(&request).await.inspect_err(|e| {
            warn!("View {} failed: {}", name, e);
        })
    }
}

fn is_already_registered(error: &MovementError) -> bool {
    match error {
        MovementError::Api { message, .. } => message.contains(PHONE_ALREADY_REGISTERED),
        MovementError::TransactionFailed { vm_status, .. } => {
            vm_status.contains(PHONE_ALREADY_REGISTERED)
        }
        _ => false,
    }
}

fn unexpected(function: &str, value: Option<&Value>) -> MovementError {
    MovementError::UnexpectedResponse(format!("{} returned {:?}", function, value))
}
