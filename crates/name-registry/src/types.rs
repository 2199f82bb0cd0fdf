//! Registry record types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A registered user: display name, phone, ledger address and optional signing secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Display name as the user typed it.
    pub name: String,
    /// Phone number (E.164-like, not validated here).
    pub phone: String,
    /// Ledger account address.
    pub address: String,
    /// Signing secret for the account, stored in cleartext.
    #[serde(default, alias = "privateKey", skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

impl UserRecord {
    pub fn new(
        name: impl Into<String>,
        phone: impl Into<String>,
        address: impl Into<String>,
        secret: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            address: address.into(),
            secret,
        }
    }

    /// Case-folded lookup key for this record.
    pub fn key(&self) -> String {
        fold_name(&self.name)
    }

    /// Public projection without the secret.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            name: self.name.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
        }
    }
}

// Secrets never reach logs through `{:?}`.
impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("name", &self.name)
            .field("phone", &self.phone)
            .field("address", &self.address)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Public fields of a record, as listed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub name: String,
    pub phone: String,
    pub address: String,
}

/// Case-fold a display name into its lookup key.
pub fn fold_name(name: &str) -> String {
    name.to_lowercase()
}
