//! Registry errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to create data directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("The name {name} is already taken")]
    NameTaken { name: String },

    #[error("Phone {phone} is already registered as {name}")]
    PhoneTaken { phone: String, name: String },
}

impl RegistryError {
    /// Whether the write was refused because another user owns the name or phone.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            RegistryError::NameTaken { .. } | RegistryError::PhoneTaken { .. }
        )
    }
}
