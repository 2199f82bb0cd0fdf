//! HTTP API, WhatsApp webhook and static site.

mod handlers;
mod middleware;
mod types;

pub use handlers::*;
pub use middleware::{logging_middleware, rate_limit_middleware, RateLimitState};
pub use types::*;

use crate::commands::{
    BalanceHandler, CommandRouter, HelpHandler, PayHandler, RegisterHandler, StatusHandler,
};
use crate::config::BotConfig;
use crate::networks::NetworkManager;
use axum::{
    handler::HandlerWithoutStateExt,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use name_registry::NameRegistry;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use twilio_client::MessageSender;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Name, phone and wallet records
    pub registry: Arc<NameRegistry>,
    /// Active network and its ledger client
    pub networks: Arc<NetworkManager>,
    /// Outbound WhatsApp messaging, when configured
    pub messenger: Option<Arc<dyn MessageSender>>,
    /// Chat command dispatch
    pub commands: Arc<CommandRouter>,
    /// Octas requested from the faucet per funding
    pub funding_amount: u64,
    pub started_at: Instant,
}

impl AppState {
    /// Create application state with the standard chat commands.
    pub fn new(
        registry: Arc<NameRegistry>,
        networks: Arc<NetworkManager>,
        messenger: Option<Arc<dyn MessageSender>>,
        bot: &BotConfig,
    ) -> Self {
        let commands = CommandRouter::new(vec![
            Box::new(HelpHandler::new()),
            Box::new(RegisterHandler::new(
                registry.clone(),
                networks.clone(),
                bot.registration_url.clone(),
                bot.funding_amount,
            )),
            Box::new(BalanceHandler::new(registry.clone(), networks.clone())),
            Box::new(PayHandler::new(
                registry.clone(),
                networks.clone(),
                messenger.clone(),
            )),
            Box::new(StatusHandler::new(registry.clone(), networks.clone())),
        ]);

        Self {
            registry,
            networks,
            messenger,
            commands: Arc::new(commands),
            funding_amount: bot.funding_amount,
            started_at: Instant::now(),
        }
    }
}

/// Create the router. `/api` routes share the global rate limit.
pub fn create_router(
    state: AppState,
    rate_limit: RateLimitState,
    static_dir: Option<PathBuf>,
) -> Router {
    let api = Router::new()
        .route("/networks", get(handlers::list_networks))
        .route("/networks/active", get(handlers::active_network))
        .route("/networks/switch", post(handlers::switch_network))
        .route("/users", get(handlers::list_users))
        .route("/generate-wallet", post(handlers::generate_wallet))
        .route("/fund-account", post(handlers::fund_account))
        .route("/register", post(handlers::register))
        .route("/send", post(handlers::send))
        .route("/check-registration/:phone", get(handlers::check_registration))
        .route("/balance/:address", get(handlers::balance))
        .route("/transactions/:address", get(handlers::transactions))
        .route("/test-message", post(handlers::test_message))
        .layer(axum_middleware::from_fn_with_state(
            rate_limit,
            rate_limit_middleware,
        ));

    let router = Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/webhook", post(handlers::webhook))
        .route("/status", post(handlers::status_callback))
        .nest("/api", api);

    let router = match static_dir {
        Some(dir) => router.fallback_service(
            ServeDir::new(dir).not_found_service(handlers::not_found.into_service()),
        ),
        None => router.fallback(handlers::not_found),
    };

    router
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
