//! HTTP request handlers.

use super::types::*;
use super::AppState;
use crate::commands::validate_name;
use crate::error::{AppError, AppResult};
use axum::{
    extract::{Path, State},
    Form, Json,
};
use movement_client::units::{format_balance, is_valid_address, is_valid_phone_number, parse_amount};
use movement_client::LocalAccount;
use name_registry::UserSummary;
use serde_json::Value;
use tracing::{error, info, warn};
use twilio_client::{BotMessage, StatusCallback, WebhookPayload};

const INVALID_PHONE: &str = "Invalid phone number format. Use E.164 format: +1234567890";

/// Service banner.
pub async fn index(State(state): State<AppState>) -> Json<IndexResponse> {
    let active = state.networks.active().await;

    Json(IndexResponse {
        status: "online",
        service: "ChatterPay API",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
        network: active.network.name,
        chain_id: active.network.chain_id,
        currency: active.network.currency,
    })
}

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    let registered_users = state.registry.count().await?;
    let ledger_healthy = state.networks.ledger().await.health_check().await;

    Ok(Json(HealthResponse {
        status: "healthy",
        uptime: state.started_at.elapsed().as_secs_f64(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        registered_users,
        ledger_healthy,
        network: state.networks.active().await,
    }))
}

pub async fn list_networks(State(state): State<AppState>) -> Json<NetworksResponse> {
    Json(NetworksResponse {
        success: true,
        networks: state.networks.all().await,
        active: state.networks.active().await.key,
    })
}

pub async fn active_network(State(state): State<AppState>) -> Json<NetworkResponse> {
    Json(NetworkResponse {
        success: true,
        message: None,
        network: state.networks.active().await,
    })
}

pub async fn switch_network(
    State(state): State<AppState>,
    Json(request): Json<SwitchNetworkRequest>,
) -> AppResult<Json<NetworkResponse>> {
    let key = request
        .network_key
        .filter(|k| !k.is_empty())
        .ok_or_else(|| AppError::BadRequest("networkKey is required".into()))?;

    let network = state.networks.switch(&key).await?;

    Ok(Json(NetworkResponse {
        success: true,
        message: Some(format!("Switched to {}", network.network.name)),
        network,
    }))
}

/// Every registered user's public fields.
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserSummary>>> {
    Ok(Json(state.registry.list_all().await?))
}

pub async fn generate_wallet() -> Json<WalletResponse> {
    let account = LocalAccount::generate();
    info!("Generated wallet {}", account.address());

    Json(WalletResponse {
        success: true,
        address: account.address().to_string(),
        private_key: account.secret_hex(),
        message: "Wallet generated successfully. Keep your private key safe!",
    })
}

pub async fn fund_account(
    State(state): State<AppState>,
    Json(request): Json<FundRequest>,
) -> AppResult<Json<DataResponse<FundData>>> {
    let address = request
        .address
        .filter(|a| !a.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing required field: address".into()))?;
    if !is_valid_address(&address) {
        return Err(AppError::BadRequest("Invalid account address".into()));
    }

    info!("Funding account: {}", address);
    let transaction_hashes = state
        .networks
        .ledger()
        .await
        .fund_account(&address, state.funding_amount)
        .await?;

    Ok(Json(DataResponse::new(
        "Account funded successfully",
        FundData {
            address,
            amount: state.funding_amount,
            transaction_hashes,
        },
    )))
}

/// Link a phone and name to a caller-supplied wallet.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<Json<DataResponse<RegisterData>>> {
    let (Some(private_key), Some(phone), Some(name), Some(address)) =
        (request.private_key, request.phone, request.name, request.address)
    else {
        return Err(AppError::BadRequest(
            "Missing required fields: privateKey, phone, name, address".into(),
        ));
    };

    if !is_valid_phone_number(&phone) {
        return Err(AppError::BadRequest(INVALID_PHONE.into()));
    }

    let name = name.trim().to_string();
    validate_name(&name).map_err(AppError::BadRequest)?;

    let account = LocalAccount::from_secret_hex(&private_key)?;
    if !account.address().eq_ignore_ascii_case(&address) {
        return Err(AppError::BadRequest(
            "Address does not match private key".into(),
        ));
    }

    info!("Registration request for phone: {}, name: {}, address: {}", phone, name, address);

    // Refuse before touching the contract; the claim below re-checks under the lock.
    state.registry.ensure_claimable(&name, &phone).await?;

    let on_chain = match state.networks.contract().await {
        Some(contract) => Some(contract.register_or_update_phone(&account, &phone).await?),
        None => None,
    };

    let record = state
        .registry
        .claim_name(&name, &phone, account.address(), Some(account.secret_hex()))
        .await?;
    info!("Name mapping saved: {} -> {} -> {}", record.name, record.phone, record.address);

    Ok(Json(DataResponse::new(
        "Phone number registered successfully",
        RegisterData {
            name: record.name,
            phone: record.phone,
            address: record.address,
            on_chain,
        },
    )))
}

/// Pay a registered phone number from a caller-supplied key.
pub async fn send(
    State(state): State<AppState>,
    Json(request): Json<SendRequest>,
) -> AppResult<Json<DataResponse<SendData>>> {
    let amount_text = match request.amount {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    let (Some(private_key), Some(recipient_phone), Some(amount_text)) =
        (request.private_key_hex, request.recipient_phone, amount_text)
    else {
        return Err(AppError::BadRequest(
            "Missing required fields: privateKeyHex, recipientPhone, amount".into(),
        ));
    };

    if !is_valid_phone_number(&recipient_phone) {
        return Err(AppError::BadRequest(INVALID_PHONE.into()));
    }
    let octas = parse_amount(&amount_text).ok_or_else(|| {
        AppError::BadRequest("Invalid amount. Must be a positive number".into())
    })?;

    let account = LocalAccount::from_secret_hex(&private_key)?;
    info!("Payment request: {} octas to {}", octas, recipient_phone);

    let transaction_hash = match state.networks.contract().await {
        Some(contract) => {
            contract
                .send_payment_to_phone(&account, &recipient_phone, octas)
                .await?
        }
        None => {
            let address = state
                .registry
                .address_for_phone(&recipient_phone)
                .await?
                .ok_or_else(|| {
                    AppError::BadRequest("Recipient phone number is not registered".into())
                })?;
            state
                .networks
                .ledger()
                .await
                .transfer(&account, &address, octas)
                .await?
                .hash
        }
    };

    Ok(Json(DataResponse::new(
        "Payment sent successfully",
        SendData {
            transaction_hash,
            sender: account.address().to_string(),
            recipient_phone,
            amount: format_balance(octas),
            amount_in_octas: octas,
        },
    )))
}

pub async fn check_registration(
    State(state): State<AppState>,
    Path(phone): Path<String>,
) -> AppResult<Json<RegistrationStatusResponse>> {
    let mut is_registered = state.registry.lookup_by_phone(&phone).await?.is_some();
    if !is_registered {
        if let Some(contract) = state.networks.contract().await {
            is_registered = contract.is_phone_registered(&phone).await?;
        }
    }

    Ok(Json(RegistrationStatusResponse {
        success: true,
        phone,
        is_registered,
    }))
}

pub async fn balance(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> AppResult<Json<BalanceResponse>> {
    let balance = state.networks.ledger().await.balance(&address).await?;
    let currency = state.networks.active().await.network.currency;

    Ok(Json(BalanceResponse {
        success: true,
        address,
        balance,
        balance_formatted: format!("{} {}", format_balance(balance), currency),
    }))
}

/// Sent/received counters; zero when no contract is configured.
pub async fn transactions(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> AppResult<Json<TransactionsResponse>> {
    let transactions = match state.networks.contract().await {
        Some(contract) => contract.transaction_count(&address).await?,
        None => Default::default(),
    };

    Ok(Json(TransactionsResponse {
        success: true,
        address,
        transactions,
    }))
}

/// Send an arbitrary message, to check messaging credentials and limits.
pub async fn test_message(
    State(state): State<AppState>,
    Json(request): Json<TestMessageRequest>,
) -> AppResult<Json<TestMessageResponse>> {
    let (Some(to), Some(message)) = (request.to, request.message) else {
        return Err(AppError::BadRequest(
            "Missing required fields: to, message".into(),
        ));
    };
    let messenger = state.messenger.as_ref().ok_or(AppError::NotConfigured("Twilio"))?;

    let sent = messenger.send(&to, &message).await?;

    Ok(Json(TestMessageResponse {
        success: true,
        sid: sent.sid,
        status: sent.status,
        message: "Test message sent",
    }))
}

/// Inbound WhatsApp message.
///
/// Always acknowledges once the command ran, even if the reply could not be
/// delivered, so Twilio does not redeliver and repeat a payment.
pub async fn webhook(
    State(state): State<AppState>,
    Form(payload): Form<WebhookPayload>,
) -> AppResult<&'static str> {
    let message = BotMessage::from_webhook(&payload).map_err(|e| {
        warn!("Invalid webhook data: {}", e);
        AppError::BadRequest("Invalid webhook data".into())
    })?;
    info!("Message from {}: {}", message.source, message.text);

    let reply = state.commands.dispatch(&message).await;

    match &state.messenger {
        Some(messenger) => {
            if let Err(e) = messenger.send(&message.source, &reply).await {
                error!("Failed to send reply to {}: {}", message.source, e);
            }
        }
        None => warn!("Twilio not configured, dropping reply to {}", message.source),
    }

    Ok("OK")
}

/// Delivery status callback.
pub async fn status_callback(Form(callback): Form<StatusCallback>) -> &'static str {
    info!(
        sid = callback.message_sid.as_deref().unwrap_or("-"),
        status = callback.message_status.as_deref().unwrap_or("-"),
        to = callback.to.as_deref().unwrap_or("-"),
        "Status callback received"
    );
    if let Some(code) = &callback.error_code {
        warn!("Delivery error code {}", code);
    }
    "OK"
}

/// JSON 404 for unmatched paths.
pub async fn not_found() -> AppError {
    AppError::NotFound
}
