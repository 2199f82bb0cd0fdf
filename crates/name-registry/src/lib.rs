//! User registry for the payment relay.
//!
//! Maps a case-folded display name to a phone number, a ledger address and an
//! optional signing secret, with reverse lookups by phone. The whole table is
//! kept in memory and mirrored to a single JSON document on disk.

mod error;
mod store;
mod types;

pub use error::RegistryError;
pub use store::NameRegistry;
pub use types::{fold_name, UserRecord, UserSummary};
