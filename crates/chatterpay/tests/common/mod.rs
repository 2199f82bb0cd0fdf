//! Common test utilities for integration tests.

use axum::{body::Body, http::Request, response::Response, Router};
use chatterpay::{
    api::{create_router, AppState, RateLimitState},
    config::BotConfig,
    LedgerFactory, Network, NetworkManager, NetworksFile,
};
use movement_client::{LedgerClient, MovementClient, MovementError};
use name_registry::NameRegistry;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;
use twilio_client::{MessageSender, TwilioClient};
use wiremock::MockServer;

pub const TWILIO_SID: &str = "AC123";
pub const TWILIO_FROM: &str = "whatsapp:+14155238886";

/// A router backed by a mock ledger node and a temporary registry.
pub struct TestApp {
    pub router: Router,
    pub registry: Arc<NameRegistry>,
    pub ledger: MockServer,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::build(None, RateLimitState::permissive()).await
    }

    /// App whose replies go to a mock Twilio server.
    pub async fn with_twilio(twilio: &MockServer) -> Self {
        let client = TwilioClient::new(twilio.uri(), TWILIO_SID, "test-token", TWILIO_FROM).unwrap();
        Self::build(Some(Arc::new(client)), RateLimitState::permissive()).await
    }

    pub async fn with_rate_limit(rate_limit: RateLimitState) -> Self {
        Self::build(None, rate_limit).await
    }

    async fn build(messenger: Option<Arc<dyn MessageSender>>, rate_limit: RateLimitState) -> Self {
        let ledger = MockServer::start().await;
        let dir = TempDir::new().unwrap();

        let registry = Arc::new(NameRegistry::new(dir.path().join("name-mappings.json")));
        registry.initialize().await.unwrap();

        let networks = Arc::new(
            NetworkManager::in_memory(networks_file(&ledger.uri()), factory(), None).unwrap(),
        );

        let state = AppState::new(registry.clone(), networks, messenger, &BotConfig::default());
        let router = create_router(state, rate_limit, None);

        Self {
            router,
            registry,
            ledger,
            _dir: dir,
        }
    }

    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response {
        self.request(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_form(&self, uri: &str, body: &str) -> Response {
        self.request(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

/// Two networks, both served by the same mock node. `local` is active.
pub fn networks_file(node_url: &str) -> NetworksFile {
    let network = |name: &str, chain_id: u64| Network {
        name: name.into(),
        rpc_url: node_url.into(),
        faucet_url: Some(node_url.into()),
        chain_id,
        explorer_url: None,
        currency: "MOVE".into(),
        network_type: "testnet".into(),
        active: false,
    };

    NetworksFile {
        active_network: "local".into(),
        networks: BTreeMap::from([
            ("local".to_string(), network("Local Testnet", 4)),
            ("other".to_string(), network("Other Testnet", 250)),
        ]),
    }
}

fn factory() -> LedgerFactory {
    Arc::new(
        |network: &Network| -> Result<Arc<dyn LedgerClient>, MovementError> {
            let client = MovementClient::new(
                &network.rpc_url,
                network.faucet_url.clone(),
                Duration::from_secs(5),
            )?
            .with_polling(Duration::from_millis(10), Duration::from_millis(200));
            Ok(Arc::new(client))
        },
    )
}

pub async fn json_body(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
