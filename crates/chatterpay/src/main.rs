//! ChatterPay - Entry point.

use anyhow::Context;
use chatterpay::{
    api::{create_router, AppState, RateLimitState},
    config::{Config, LogConfig},
    LedgerFactory, Network, NetworkManager,
};
use movement_client::{LedgerClient, MovementClient, MovementError};
use name_registry::NameRegistry;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use twilio_client::{MessageSender, TwilioClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config.log);

    info!("Starting ChatterPay relay...");

    // Registry
    let registry = Arc::new(NameRegistry::new(&config.registry.path));
    registry
        .initialize()
        .await
        .context("Failed to initialize name registry")?;
    info!(
        "Name registry ready at {:?} ({} users)",
        config.registry.path,
        registry.count().await?
    );

    // Networks and ledger client
    let movement = config.movement.clone();
    let factory: LedgerFactory = Arc::new(
        move |network: &Network| -> Result<Arc<dyn LedgerClient>, MovementError> {
            let client = MovementClient::new(
                &network.rpc_url,
                network.faucet_url.clone(),
                movement.request_timeout,
            )?
            .with_polling(movement.poll_interval, movement.wait_timeout);
            Ok(Arc::new(client))
        },
    );

    let networks = Arc::new(
        NetworkManager::load(
            &config.networks.path,
            factory,
            config.movement.contract_address.clone(),
        )
        .await
        .context("Failed to load network config")?,
    );

    let active = networks.active().await;
    if networks.ledger().await.health_check().await {
        info!("Ledger node healthy - {} ({})", active.network.name, active.network.rpc_url);
    } else {
        warn!("Ledger node not reachable at {} - will retry on requests", active.network.rpc_url);
    }
    info!(
        "Contract: {}",
        networks.contract_address().unwrap_or("Not configured")
    );

    // Messaging
    let messenger: Option<Arc<dyn MessageSender>> = match config.twilio.credentials() {
        Some((sid, token, from)) => {
            let twilio = TwilioClient::new(&config.twilio.base_url, sid, token, from)
                .context("Failed to create Twilio client")?;
            if twilio.health_check().await {
                info!("Twilio healthy - sending from {}", from);
            } else {
                warn!("Twilio credential check failed - sends may fail");
            }
            Some(Arc::new(twilio))
        }
        None => {
            warn!("Twilio credentials not fully configured - replies disabled");
            None
        }
    };

    // Router
    let state = AppState::new(registry, networks, messenger, &config.bot);
    info!("Registered {} command handlers", state.commands.len());

    let rate_limit = RateLimitState::new(config.rate_limit.max_requests, config.rate_limit.window);
    if let Some(dir) = &config.server.static_dir {
        info!("Serving static files from {:?}", dir);
    }
    let app = create_router(state, rate_limit, config.server.static_dir.clone());

    // Bind to address
    let addr = config.server.socket_addr()?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("ChatterPay server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down...");
    Ok(())
}

fn init_logging(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let registry = tracing_subscriber::registry().with(filter);

    if log.format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
