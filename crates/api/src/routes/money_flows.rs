//! Money-flow ledger routes.
//!
//! Every route works on the ledger of the shop named in the caller's token.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;

use crate::error::ledger_error_response;
use crate::{AppState, middleware::AuthUser};
use mercato_core::aggregation::Granularity;
use mercato_core::ledger::{AppendInput, FlowDirection, LedgerService};
use mercato_shared::Capability;

/// Creates the money-flow routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/money-flows", post(record_money_flow))
        .route("/money-flows/balance", get(get_balance))
        .route("/money-flows/balance-at", get(get_balance_at))
        .route("/money-flows/ledger", get(get_ledger))
        .route("/money-flows/transactions", get(list_transactions))
        .route("/money-flows/transactions/{entry_id}", get(get_transaction))
        .route("/money-flows/audit", get(audit_ledger))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for recording a money flow.
#[derive(Debug, Deserialize)]
pub struct RecordMoneyFlowRequest {
    /// "in" or "out".
    pub direction: String,
    /// Non-negative amount.
    pub amount: Option<Decimal>,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Explicit timestamp for ordered imports; must lie between the ledger
    /// tail and the current time.
    pub recorded_at: Option<DateTime<Utc>>,
}

/// Query parameters for a half-open range `[start, end)`.
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    /// Inclusive start (RFC 3339).
    pub start: DateTime<Utc>,
    /// Exclusive end (RFC 3339).
    pub end: DateTime<Utc>,
}

/// Query parameters for the bucketed ledger.
#[derive(Debug, Deserialize)]
pub struct LedgerQuery {
    /// Inclusive start (RFC 3339).
    pub start: DateTime<Utc>,
    /// Exclusive end (RFC 3339).
    pub end: DateTime<Utc>,
    /// Overrides the granularity picked from the range length.
    pub granularity: Option<String>,
}

/// Query parameters for a point-in-time balance.
#[derive(Debug, Deserialize)]
pub struct BalanceAtQuery {
    /// Instant to read the balance at (RFC 3339).
    pub at: DateTime<Utc>,
}

/// Response for a balance read.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Balance as a decimal string.
    pub balance: Decimal,
    /// Instant the balance applies to, when one was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at: Option<DateTime<Utc>>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/money-flows` - Append an entry to the caller's shop ledger.
async fn record_money_flow(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<RecordMoneyFlowRequest>,
) -> impl IntoResponse {
    if let Err(response) = auth.require(Capability::RecordMoneyFlow) {
        return response;
    }

    let direction = match FlowDirection::from_str(&payload.direction) {
        Ok(direction) => direction,
        Err(e) => return ledger_error_response(e),
    };

    let amount = match LedgerService::require_amount(payload.amount) {
        Ok(amount) => amount,
        Err(e) => return ledger_error_response(e),
    };

    let mut input = AppendInput::new(direction, amount, payload.description);
    if let Some(at) = payload.recorded_at {
        input = input.recorded_at(at);
    }

    match state.money_flows.append(auth.shop_id(), input).await {
        Ok(entry) => (StatusCode::CREATED, Json(entry)).into_response(),
        Err(e) => ledger_error_response(e),
    }
}

/// GET `/money-flows/balance` - Current balance.
async fn get_balance(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    if let Err(response) = auth.require(Capability::ViewLedger) {
        return response;
    }

    match state.money_flows.current_balance(auth.shop_id()).await {
        Ok(balance) => (
            StatusCode::OK,
            Json(BalanceResponse { balance, at: None }),
        )
            .into_response(),
        Err(e) => ledger_error_response(e),
    }
}

/// GET `/money-flows/balance-at?at=` - Balance after the latest entry at or before `at`.
async fn get_balance_at(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<BalanceAtQuery>,
) -> impl IntoResponse {
    if let Err(response) = auth.require(Capability::ViewLedger) {
        return response;
    }

    match state.money_flows.balance_at(auth.shop_id(), query.at).await {
        Ok(balance) => (
            StatusCode::OK,
            Json(BalanceResponse {
                balance,
                at: Some(query.at),
            }),
        )
            .into_response(),
        Err(e) => ledger_error_response(e),
    }
}

/// GET `/money-flows/ledger?start=&end=&granularity=` - Bucketed ledger.
async fn get_ledger(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<LedgerQuery>,
) -> impl IntoResponse {
    if let Err(response) = auth.require(Capability::ViewLedger) {
        return response;
    }

    let granularity = match query.granularity.as_deref().map(Granularity::from_str) {
        None => None,
        Some(Ok(granularity)) => Some(granularity),
        Some(Err(e)) => return ledger_error_response(e),
    };

    match state
        .money_flows
        .ledger(auth.shop_id(), query.start, query.end, granularity)
        .await
    {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => ledger_error_response(e),
    }
}

/// GET `/money-flows/transactions?start=&end=` - Entries in `[start, end)`.
async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<RangeQuery>,
) -> impl IntoResponse {
    if let Err(response) = auth.require(Capability::ViewLedger) {
        return response;
    }

    match state
        .money_flows
        .transactions(auth.shop_id(), query.start, query.end)
        .await
    {
        Ok(transactions) => {
            (StatusCode::OK, Json(json!({ "transactions": transactions }))).into_response()
        }
        Err(e) => ledger_error_response(e),
    }
}

/// GET `/money-flows/transactions/{entry_id}` - Single entry.
async fn get_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(entry_id): Path<i64>,
) -> impl IntoResponse {
    if let Err(response) = auth.require(Capability::ViewLedger) {
        return response;
    }

    match state.money_flows.transaction(auth.shop_id(), entry_id).await {
        Ok(entry) => (StatusCode::OK, Json(entry)).into_response(),
        Err(e) => ledger_error_response(e),
    }
}

/// GET `/money-flows/audit` - Re-walk the balance chain.
async fn audit_ledger(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    if let Err(response) = auth.require(Capability::AuditLedger) {
        return response;
    }

    match state.money_flows.audit(auth.shop_id()).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => ledger_error_response(e),
    }
}
