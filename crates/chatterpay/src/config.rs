//! Configuration for the relay.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Relay configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Twilio configuration (messaging is disabled when incomplete)
    #[serde(default)]
    pub twilio: TwilioConfig,

    /// Ledger client configuration
    #[serde(default)]
    pub movement: MovementConfig,

    /// Registry storage configuration
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Network list configuration
    #[serde(default)]
    pub networks: NetworksConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,

    /// Chat command configuration
    #[serde(default)]
    pub bot: BotConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory served for paths no route matches
    pub static_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwilioConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,

    /// Sender address, e.g. `whatsapp:+14155238886`
    pub phone_number: Option<String>,

    #[serde(default = "default_twilio_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovementConfig {
    /// Address of the deployed phone registry module
    pub contract_address: Option<String>,

    /// HTTP request timeout
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// How often to poll for transaction confirmation
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    /// How long to wait for a transaction before giving up
    #[serde(default = "default_wait_timeout", with = "humantime_serde")]
    pub wait_timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Path to the name mapping file
    #[serde(default = "default_registry_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworksConfig {
    /// Path to the network list
    #[serde(default = "default_networks_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Window over which `max_requests` applies
    #[serde(default = "default_window", with = "humantime_serde")]
    pub window: Duration,

    /// Requests allowed per window across all `/api` clients
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `text` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Web registration page mentioned in chat replies
    #[serde(default = "default_registration_url")]
    pub registration_url: String,

    /// Octas requested from the faucet for new wallets
    #[serde(default = "default_funding_amount")]
    pub funding_amount: u64,
}

// Default implementations
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
            static_dir: None,
        }
    }
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            phone_number: None,
            base_url: default_twilio_url(),
        }
    }
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            contract_address: None,
            request_timeout: default_request_timeout(),
            poll_interval: default_poll_interval(),
            wait_timeout: default_wait_timeout(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: default_registry_path(),
        }
    }
}

impl Default for NetworksConfig {
    fn default() -> Self {
        Self {
            path: default_networks_path(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            max_requests: default_max_requests(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            registration_url: default_registration_url(),
            funding_amount: default_funding_amount(),
        }
    }
}

// Default value functions
fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    3000
}

fn default_twilio_url() -> String {
    twilio_client::DEFAULT_BASE_URL.into()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_wait_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("data/name-mappings.json")
}

fn default_networks_path() -> PathBuf {
    PathBuf::from("config/networks.json")
}

fn default_window() -> Duration {
    Duration::from_secs(15 * 60)
}

fn default_max_requests() -> u32 {
    100
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_registration_url() -> String {
    "https://chatterpay.app/register".into()
}

fn default_funding_amount() -> u64 {
    movement_client::units::OCTAS_PER_COIN
}

impl TwilioConfig {
    /// Credentials and sender, when all three are set.
    pub fn credentials(&self) -> Option<(&str, &str, &str)> {
        Some((
            self.account_sid.as_deref().filter(|s| !s.is_empty())?,
            self.auth_token.as_deref().filter(|s| !s.is_empty())?,
            self.phone_number.as_deref().filter(|s| !s.is_empty())?,
        ))
    }
}

impl ServerConfig {
    /// Socket address to bind.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .listen_addr
            .parse()
            .with_context(|| format!("Invalid listen address {:?}", self.listen_addr))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
