//! Router creation and configuration

use super::handlers::*;
use super::types::AppState;
use crate::cache::response_cache_layer;
use crate::rate_limit::rate_limit_layer;
use crate::ws::ws_handler;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the REST API router
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route(
            "/transactions/:id",
            get(get_transaction)
                .put(update_transaction)
                .delete(delete_transaction),
        )
        .route("/transactions/:id/mark-fraud", post(mark_fraud))
        .route("/transactions/:id/mark-safe", post(mark_safe))
        .route("/alerts", get(list_alerts))
        .route("/alerts/:id", get(get_alert).delete(delete_alert))
        .route("/alerts/:id/acknowledge", post(acknowledge_alert))
        .route("/alerts/:id/resolve", post(resolve_alert))
        .route("/alerts/:id/dismiss", post(dismiss_alert));

    Router::new()
        .route("/health", get(health))
        .route("/ws", get(ws_handler))
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            response_cache_layer,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit_layer))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
