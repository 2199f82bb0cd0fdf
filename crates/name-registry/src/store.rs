//! File-backed name registry.

use crate::error::RegistryError;
use crate::types::{fold_name, UserRecord, UserSummary};
use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info, instrument, warn};

/// Primary table plus the phone-keyed reverse indices derived from it.
#[derive(Debug, Clone, Default)]
struct Tables {
    /// Records keyed by case-folded name.
    records: HashMap<String, UserRecord>,
    /// Phone -> case-folded name.
    phone_to_name: HashMap<String, String>,
    /// Phone -> ledger address.
    phone_to_address: HashMap<String, String>,
}

impl Tables {
    /// Rebuild from a loaded document.
    ///
    /// Writes never let two names share a phone, but older files can. In that
    /// case the phone stays with the first name in case-folded order, on every
    /// load.
    fn from_records(records: BTreeMap<String, UserRecord>) -> Self {
        let mut tables = Self::default();
        for (_, record) in records {
            if let Some(owner) = tables.phone_to_name.get(&record.phone) {
                warn!(
                    "Phone {} is listed under both {} and {}; keeping {}",
                    record.phone,
                    owner,
                    record.key(),
                    owner
                );
                tables.records.insert(record.key(), record);
                continue;
            }
            tables.insert(record);
        }
        tables
    }

    /// Refuse a write that would take a phone, or with `claim` a name, from
    /// another user.
    fn check_owner(&self, name: &str, phone: &str, claim: bool) -> Result<(), RegistryError> {
        let key = fold_name(name);

        if let Some(owner) = self.phone_to_name.get(phone).filter(|owner| **owner != key) {
            return Err(RegistryError::PhoneTaken {
                phone: phone.to_string(),
                name: self
                    .records
                    .get(owner)
                    .map_or_else(|| owner.clone(), |r| r.name.clone()),
            });
        }

        if claim {
            if let Some(existing) = self.records.get(&key).filter(|r| r.phone != phone) {
                return Err(RegistryError::NameTaken {
                    name: existing.name.clone(),
                });
            }
        }

        Ok(())
    }

    fn insert(&mut self, record: UserRecord) {
        let key = record.key();

        // Drop the old phone's reverse entries if they still point at this name.
        if let Some(previous) = self.records.get(&key) {
            if previous.phone != record.phone
                && self.phone_to_name.get(&previous.phone) == Some(&key)
            {
                self.phone_to_name.remove(&previous.phone);
                self.phone_to_address.remove(&previous.phone);
            }
        }

        self.phone_to_name.insert(record.phone.clone(), key.clone());
        self.phone_to_address
            .insert(record.phone.clone(), record.address.clone());
        self.records.insert(key, record);
    }

    fn by_phone(&self, phone: &str) -> Option<&UserRecord> {
        self.phone_to_name
            .get(phone)
            .and_then(|key| self.records.get(key))
    }
}

/// Name -> phone -> address registry persisted as a single JSON document.
///
/// The document is loaded lazily on first use and rewritten in full after
/// every mutation. Writers hold the table lock across the persist step, so
/// concurrent registrations are applied one at a time.
pub struct NameRegistry {
    path: PathBuf,
    tables: RwLock<Tables>,
    initialized: OnceCell<()>,
}

impl NameRegistry {
    /// Create a registry backed by the JSON file at `path`.
    ///
    /// Nothing is read until the first operation.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tables: RwLock::new(Tables::default()),
            initialized: OnceCell::new(),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the data directory and load existing records.
    ///
    /// Idempotent: only the first successful call touches the filesystem.
    pub async fn initialize(&self) -> Result<(), RegistryError> {
        self.initialized
            .get_or_try_init(|| async {
                let tables = load(&self.path).await?;
                info!(
                    "Loaded {} registry records from {:?}",
                    tables.records.len(),
                    self.path
                );
                *self.tables.write().await = tables;
                Ok::<(), RegistryError>(())
            })
            .await?;
        Ok(())
    }

    /// Insert or replace the record for `name` and persist the whole table.
    ///
    /// The previous record under the same case-folded name is replaced
    /// wholesale, including its secret, and may move to a new phone. A phone
    /// registered under a different name is refused with
    /// [`RegistryError::PhoneTaken`]. On a failed write the in-memory table is
    /// left untouched.
    #[instrument(skip(self, secret))]
    pub async fn save_record(
        &self,
        name: &str,
        phone: &str,
        address: &str,
        secret: Option<String>,
    ) -> Result<UserRecord, RegistryError> {
        self.write(UserRecord::new(name, phone, address, secret), false)
            .await
    }

    /// Register `name` for `phone`, unless either already belongs to someone else.
    ///
    /// Like [`save_record`](Self::save_record), but a name held by a different
    /// phone is refused with [`RegistryError::NameTaken`]. The check and the
    /// write happen under one lock, so concurrent claims of a name admit one.
    #[instrument(skip(self, secret))]
    pub async fn claim_name(
        &self,
        name: &str,
        phone: &str,
        address: &str,
        secret: Option<String>,
    ) -> Result<UserRecord, RegistryError> {
        self.write(UserRecord::new(name, phone, address, secret), true)
            .await
    }

    /// Whether [`claim_name`](Self::claim_name) would currently accept `name` for `phone`.
    pub async fn ensure_claimable(&self, name: &str, phone: &str) -> Result<(), RegistryError> {
        self.initialize().await?;
        self.tables.read().await.check_owner(name, phone, true)
    }

    async fn write(&self, record: UserRecord, claim: bool) -> Result<UserRecord, RegistryError> {
        self.initialize().await?;

        let mut tables = self.tables.write().await;
        tables.check_owner(&record.name, &record.phone, claim)?;

        let mut next = tables.clone();
        next.insert(record.clone());

        persist(&self.path, &next.records).await?;
        *tables = next;

        info!("Saved mapping: {} -> {} -> {}", record.name, record.phone, record.address);
        Ok(record)
    }

    /// Look up a record by display name, ignoring case.
    pub async fn lookup_by_name(&self, name: &str) -> Result<Option<UserRecord>, RegistryError> {
        self.initialize().await?;
        let tables = self.tables.read().await;
        Ok(tables.records.get(&fold_name(name)).cloned())
    }

    /// Look up a record by phone number.
    pub async fn lookup_by_phone(&self, phone: &str) -> Result<Option<UserRecord>, RegistryError> {
        self.initialize().await?;
        let tables = self.tables.read().await;
        Ok(tables.by_phone(phone).cloned())
    }

    /// Look up by name first, then by phone.
    pub async fn lookup_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<UserRecord>, RegistryError> {
        self.initialize().await?;
        let tables = self.tables.read().await;
        Ok(tables
            .records
            .get(&fold_name(identifier))
            .or_else(|| tables.by_phone(identifier))
            .cloned())
    }

    /// Display name registered for a phone number.
    pub async fn name_for_phone(&self, phone: &str) -> Result<Option<String>, RegistryError> {
        self.initialize().await?;
        let tables = self.tables.read().await;
        Ok(tables.by_phone(phone).map(|r| r.name.clone()))
    }

    /// Ledger address registered for a phone number.
    pub async fn address_for_phone(&self, phone: &str) -> Result<Option<String>, RegistryError> {
        self.initialize().await?;
        let tables = self.tables.read().await;
        Ok(tables.phone_to_address.get(phone).cloned())
    }

    /// Stored signing secret for the user registered under `phone`.
    pub async fn secret_for_phone(&self, phone: &str) -> Result<Option<String>, RegistryError> {
        self.initialize().await?;
        let tables = self.tables.read().await;
        Ok(tables.by_phone(phone).and_then(|r| r.secret.clone()))
    }

    /// Public fields of every record, ordered by case-folded name.
    pub async fn list_all(&self) -> Result<Vec<UserSummary>, RegistryError> {
        self.initialize().await?;
        let tables = self.tables.read().await;
        let mut users: Vec<(&String, &UserRecord)> = tables.records.iter().collect();
        users.sort_by(|a, b| a.0.cmp(b.0));
        Ok(users.into_iter().map(|(_, r)| r.summary()).collect())
    }

    /// Number of records.
    pub async fn count(&self) -> Result<usize, RegistryError> {
        self.initialize().await?;
        Ok(self.tables.read().await.records.len())
    }
}

/// Read the backing file. A missing, unreadable or malformed file yields an empty table.
async fn load(path: &Path) -> Result<Tables, RegistryError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|source| RegistryError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    let data = match fs::read(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("No existing name mappings found at {:?}, starting fresh", path);
            return Ok(Tables::default());
        }
        Err(e) => {
            warn!("Could not read registry file {:?}, starting fresh: {}", path, e);
            return Ok(Tables::default());
        }
    };

    match serde_json::from_slice::<BTreeMap<String, UserRecord>>(&data) {
        Ok(records) => Ok(Tables::from_records(records)),
        Err(e) => {
            warn!("Registry file {:?} is not valid JSON, starting fresh: {}", path, e);
            Ok(Tables::default())
        }
    }
}

/// Write the whole table to a temp file and rename it over the backing file.
async fn persist(path: &Path, records: &HashMap<String, UserRecord>) -> Result<(), RegistryError> {
    let ordered: BTreeMap<&String, &UserRecord> = records.iter().collect();
    let json = serde_json::to_vec_pretty(&ordered)?;

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, &json).await?;
    fs::rename(&temp_path, path).await?;

    debug!("Persisted {} records ({} bytes) to {:?}", records.len(), json.len(), path);
    Ok(())
}
