//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST routes for the money-flow ledger and analytics
//! - Bearer-token authentication middleware
//! - Mapping of ledger errors onto JSON error responses

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use mercato_core::analytics::{AnalyticsService, OrderMetrics};
use mercato_core::ledger::{MoneyFlowService, MoneyFlowStore};
use mercato_shared::JwtService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Money-flow ledger operations.
    pub money_flows: MoneyFlowService,
    /// Period-over-period analytics.
    pub analytics: AnalyticsService,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
}

impl AppState {
    /// Wires the services over a ledger store and an order metric source.
    #[must_use]
    pub fn new(
        ledger: Arc<dyn MoneyFlowStore>,
        orders: Arc<dyn OrderMetrics>,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        Self {
            money_flows: MoneyFlowService::new(Arc::clone(&ledger)),
            analytics: AnalyticsService::new(ledger, orders),
            jwt_service,
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
