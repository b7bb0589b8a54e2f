//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db;
use crate::domain::{AccountSummary, OperationContext};
use crate::error::{AppError, AppResult};

use super::middleware::{auth_middleware, logging_middleware, rate_limit_middleware};
use super::state::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendCoinRequest {
    #[serde(rename = "toUser")]
    pub to_user: String,
    pub amount: i64,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router with its middleware stack and state applied.
///
/// Order, outermost first: logging -> rate limit -> bearer auth (protected
/// routes only) -> handler.
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/info", get(info))
        .route("/api/sendCoin", post(send_coin))
        .route("/api/buy/:item", get(buy))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth", post(auth))
        .merge(protected)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

fn account_of(context: &OperationContext) -> AppResult<Uuid> {
    context.account_id.ok_or(AppError::MissingToken)
}

// =========================================================================
// GET /health
// =========================================================================

async fn health_check(State(state): State<AppState>) -> AppResult<&'static str> {
    db::verify_connection(&state.pool)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok("OK")
}

// =========================================================================
// POST /api/auth
// =========================================================================

/// Authenticate, registering the login on first use, and return a token
async fn auth(
    State(state): State<AppState>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> AppResult<Json<AuthResponse>> {
    let Json(request) = payload.map_err(|e| AppError::InvalidRequest(e.body_text()))?;

    let account_id = state
        .identity
        .resolve_or_create_account(&request.username, &request.password)
        .await?;

    let token = state
        .tokens
        .issue(account_id, &request.username)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(AuthResponse { token }))
}

// =========================================================================
// GET /api/info
// =========================================================================

async fn info(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
) -> AppResult<Json<AccountSummary>> {
    let account_id = account_of(&context)?;
    let summary = state.history.account_summary(account_id).await?;
    Ok(Json(summary))
}

// =========================================================================
// POST /api/sendCoin
// =========================================================================

async fn send_coin(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    payload: Result<Json<SendCoinRequest>, JsonRejection>,
) -> AppResult<StatusCode> {
    let account_id = account_of(&context)?;
    let Json(request) = payload.map_err(|e| AppError::InvalidRequest(e.body_text()))?;

    state
        .ledger
        .transfer(account_id, &request.to_user, request.amount)
        .await?;

    Ok(StatusCode::OK)
}

// =========================================================================
// GET /api/buy/:item
// =========================================================================

async fn buy(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(item): Path<String>,
) -> AppResult<StatusCode> {
    let account_id = account_of(&context)?;
    state.ledger.purchase(account_id, &item).await?;
    Ok(StatusCode::OK)
}
