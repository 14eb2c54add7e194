//! Analytics routes: period-over-period comparisons.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::str::FromStr;

use crate::error::ledger_error_response;
use crate::{AppState, middleware::AuthUser};
use mercato_core::analytics::Metric;
use mercato_shared::Capability;

/// Creates the analytics routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/analytics/compare", get(compare_metric))
        .route("/analytics/overview", get(get_overview))
}

/// Query parameters for a single-metric comparison.
#[derive(Debug, Deserialize)]
pub struct CompareQuery {
    /// `orders`, `revenue`, or `new_customers`.
    pub metric: String,
    /// Inclusive start (RFC 3339).
    pub start: DateTime<Utc>,
    /// Exclusive end (RFC 3339).
    pub end: DateTime<Utc>,
}

/// Query parameters for the overview.
#[derive(Debug, Deserialize)]
pub struct OverviewQuery {
    /// Inclusive start (RFC 3339).
    pub start: DateTime<Utc>,
    /// Exclusive end (RFC 3339).
    pub end: DateTime<Utc>,
}

/// GET `/analytics/compare?metric=&start=&end=`
async fn compare_metric(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<CompareQuery>,
) -> impl IntoResponse {
    if let Err(response) = auth.require(Capability::ViewAnalytics) {
        return response;
    }

    let metric = match Metric::from_str(&query.metric) {
        Ok(metric) => metric,
        Err(e) => return ledger_error_response(e),
    };

    match state
        .analytics
        .compare(auth.shop_id(), metric, query.start, query.end)
        .await
    {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => ledger_error_response(e),
    }
}

/// GET `/analytics/overview?start=&end=`
async fn get_overview(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<OverviewQuery>,
) -> impl IntoResponse {
    if let Err(response) = auth.require(Capability::ViewAnalytics) {
        return response;
    }

    match state
        .analytics
        .overview(auth.shop_id(), query.start, query.end)
        .await
    {
        Ok(overview) => (StatusCode::OK, Json(overview)).into_response(),
        Err(e) => ledger_error_response(e),
    }
}
