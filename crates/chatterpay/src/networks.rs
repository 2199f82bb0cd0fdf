//! Network selection.
//!
//! The network list lives in a JSON file (`{activeNetwork, networks}`). The
//! active network decides which node and faucet the ledger client talks to;
//! switching rebuilds the client and rewrites the file.

use crate::error::{AppError, AppResult};
use movement_client::{LedgerClient, MovementError, PhoneRegistryContract};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// One configured network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub name: String,
    pub rpc_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faucet_url: Option<String>,
    #[serde(default)]
    pub chain_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(rename = "type", default)]
    pub network_type: String,
    #[serde(default)]
    pub active: bool,
}

fn default_currency() -> String {
    "MOVE".into()
}

/// On-disk network list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworksFile {
    pub active_network: String,
    pub networks: BTreeMap<String, Network>,
}

impl Default for NetworksFile {
    fn default() -> Self {
        let testnet = Network {
            name: "Movement Testnet".into(),
            rpc_url: "https://testnet.movementnetwork.xyz/v1".into(),
            faucet_url: Some("https://faucet.testnet.movementnetwork.xyz".into()),
            chain_id: 250,
            explorer_url: Some("https://explorer.movementnetwork.xyz".into()),
            currency: default_currency(),
            network_type: "testnet".into(),
            active: true,
        };

        Self {
            active_network: "testnet".into(),
            networks: BTreeMap::from([("testnet".to_string(), testnet)]),
        }
    }
}

/// A network together with its key, as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkEntry {
    pub key: String,
    #[serde(flatten)]
    pub network: Network,
}

/// Builds a ledger client for a network.
pub type LedgerFactory =
    Arc<dyn Fn(&Network) -> Result<Arc<dyn LedgerClient>, MovementError> + Send + Sync>;

struct NetworkState {
    file: NetworksFile,
    active: Network,
    ledger: Arc<dyn LedgerClient>,
}

/// Active network and the ledger client bound to it.
pub struct NetworkManager {
    path: Option<PathBuf>,
    factory: LedgerFactory,
    contract_address: Option<String>,
    state: RwLock<NetworkState>,
}

impl NetworkManager {
    /// Load the network list from `path`, falling back to the built-in
    /// testnet when the file does not exist.
    pub async fn load(
        path: impl Into<PathBuf>,
        factory: LedgerFactory,
        contract_address: Option<String>,
    ) -> AppResult<Self> {
        let path = path.into();
        let file = match fs::read(&path).await {
            Ok(data) => serde_json::from_slice(&data)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No network config at {:?}, using built-in testnet", path);
                NetworksFile::default()
            }
            Err(e) => return Err(e.into()),
        };

        Self::build(file, Some(path), factory, contract_address)
    }

    /// Manager over an in-memory network list; switches are not persisted.
    pub fn in_memory(
        file: NetworksFile,
        factory: LedgerFactory,
        contract_address: Option<String>,
    ) -> AppResult<Self> {
        Self::build(file, None, factory, contract_address)
    }

    fn build(
        file: NetworksFile,
        path: Option<PathBuf>,
        factory: LedgerFactory,
        contract_address: Option<String>,
    ) -> AppResult<Self> {
        let active = file
            .networks
            .get(&file.active_network)
            .cloned()
            .ok_or_else(|| AppError::NetworkNotFound(file.active_network.clone()))?;
        let ledger = factory(&active)?;

        info!(
            "Network config loaded. Active: {} ({})",
            file.active_network, active.rpc_url
        );

        Ok(Self {
            path,
            factory,
            contract_address: contract_address.filter(|a| !a.is_empty()),
            state: RwLock::new(NetworkState {
                file,
                active,
                ledger,
            }),
        })
    }

    pub async fn active(&self) -> NetworkEntry {
        let state = self.state.read().await;
        NetworkEntry {
            key: state.file.active_network.clone(),
            network: state.active.clone(),
        }
    }

    pub async fn all(&self) -> Vec<NetworkEntry> {
        let state = self.state.read().await;
        state
            .file
            .networks
            .iter()
            .map(|(key, network)| NetworkEntry {
                key: key.clone(),
                network: network.clone(),
            })
            .collect()
    }

    /// Make `key` the active network, persist the choice, and rebind the ledger client.
    pub async fn switch(&self, key: &str) -> AppResult<NetworkEntry> {
        let mut state = self.state.write().await;

        let network = state
            .file
            .networks
            .get(key)
            .ok_or_else(|| AppError::NetworkNotFound(key.to_string()))?;
        let ledger = (self.factory)(network)?;

        let mut file = state.file.clone();
        file.active_network = key.to_string();
        for (k, n) in file.networks.iter_mut() {
            n.active = k == key;
        }

        if let Some(path) = &self.path {
            persist(path, &file).await?;
        }

        let network = file.networks[key].clone();
        state.file = file;
        state.active = network.clone();
        state.ledger = ledger;

        info!("Switched to network: {}", key);
        Ok(NetworkEntry {
            key: key.to_string(),
            network,
        })
    }

    /// Ledger client for the active network.
    pub async fn ledger(&self) -> Arc<dyn LedgerClient> {
        self.state.read().await.ledger.clone()
    }

    /// Phone registry contract on the active network, when an address is configured.
    pub async fn contract(&self) -> Option<PhoneRegistryContract> {
        let address = self.contract_address.as_deref()?;
        Some(PhoneRegistryContract::new(self.ledger().await, address))
    }

    pub fn contract_address(&self) -> Option<&str> {
        self.contract_address.as_deref()
    }
}

async fn persist(path: &Path, file: &NetworksFile) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_vec_pretty(file)?;
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, &json).await?;
    fs::rename(&temp_path, path).await?;

    debug!("Network config saved to {:?}", path);
    Ok(())
}
