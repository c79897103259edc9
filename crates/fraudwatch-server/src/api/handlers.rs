//! API endpoint handlers

use super::extractors::JsonExtractor;
use super::types::*;
use crate::error::ApiError;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use fraudwatch_core::{
    DomainEvent, Transaction, TransactionDraft, TransactionStatus, MAX_RISK_SCORE,
};
use fraudwatch_runtime::{DuplicatePolicy, IngestOutcome};
use tracing::{info, warn};

/// Health check endpoint
pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /api/transactions` - run the full pipeline
pub(super) async fn create_transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    JsonExtractor(draft): JsonExtractor<TransactionDraft>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let actor = actor_from_headers(&headers);

    let outcome = state
        .pipeline
        .ingest(draft, DuplicatePolicy::Reject, &actor)
        .await?;

    let transaction = match outcome {
        IngestOutcome::Created { transaction, .. } => transaction,
        // Reject policy never yields Skipped
        IngestOutcome::Skipped { transaction_id } => {
            return Err(ApiError::Internal(format!(
                "unexpected skip for {}",
                transaction_id
            )))
        }
    };

    info!(transaction_id = %transaction.transaction_id, "transaction created");
    state.cache.invalidate("/api/transactions").await;
    state.cache.invalidate("/api/alerts").await;

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// `GET /api/transactions`
pub(super) async fn list_transactions(
    State(state): State<AppState>,
    Query(params): Query<TransactionListParams>,
) -> Result<Json<TransactionListResponse>, ApiError> {
    let query = params.to_query();
    let transactions = state.transactions.list(&query).await?;
    let total = state.transactions.count(&query).await?;

    Ok(Json(TransactionListResponse {
        transactions,
        pagination: Pagination::new(params.page(), params.limit(), total),
    }))
}

/// `GET /api/transactions/:id`
pub(super) async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Transaction>, ApiError> {
    let transaction = state.transactions.get(&id).await?;
    Ok(Json(transaction))
}

/// `PUT /api/transactions/:id` - reviewer update of allowed fields
pub(super) async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    JsonExtractor(payload): JsonExtractor<UpdateTransactionPayload>,
) -> Result<Json<Transaction>, ApiError> {
    if let Some(score) = payload.risk_score {
        if score > MAX_RISK_SCORE {
            return Err(ApiError::Validation(
                "riskScore must be between 0 and 100".to_string(),
            ));
        }
    }

    let mut transaction = state.transactions.get(&id).await?;
    let actor = actor_from_headers(&headers);

    if let Some(status) = payload.status {
        transaction.status = status;
    }
    if let Some(score) = payload.risk_score {
        transaction.risk_score = score;
    }
    if payload.description.is_some() {
        transaction.description = payload.description;
    }
    if payload.merchant_id.is_some() {
        transaction.merchant_id = payload.merchant_id;
    }
    if payload.merchant_name.is_some() {
        transaction.merchant_name = payload.merchant_name;
    }
    if let Some(method) = payload.payment_method {
        transaction.payment_method = method;
    }
    if let Some(location) = payload.location {
        transaction.location = location;
    }
    if let Some(metadata) = payload.metadata {
        transaction.metadata = metadata;
    }
    if payload.notes.is_some() {
        transaction.notes = payload.notes;
    }
    transaction.updated_at = Utc::now();
    transaction.updated_by = Some(actor);

    let updated = state.transactions.update(transaction).await?;

    notify(&state, DomainEvent::TransactionUpdated(updated.clone())).await;
    state.cache.invalidate("/api/transactions").await;

    Ok(Json(updated))
}

/// `DELETE /api/transactions/:id`
pub(super) async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let removed = state.transactions.delete(&id).await?;

    notify(
        &state,
        DomainEvent::TransactionDeleted {
            transaction_id: removed.transaction_id.clone(),
        },
    )
    .await;
    state.cache.invalidate("/api/transactions").await;

    Ok(Json(serde_json::json!({
        "deleted": removed.transaction_id
    })))
}

/// `POST /api/transactions/:id/mark-fraud` - reviewer re-classification
pub(super) async fn mark_fraud(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    payload: Option<Json<ActionPayload>>,
) -> Result<Json<Transaction>, ApiError> {
    review_transaction(state, id, headers, payload, TransactionStatus::Fraud).await
}

/// `POST /api/transactions/:id/mark-safe` - reviewer re-classification
pub(super) async fn mark_safe(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    payload: Option<Json<ActionPayload>>,
) -> Result<Json<Transaction>, ApiError> {
    review_transaction(state, id, headers, payload, TransactionStatus::Safe).await
}

async fn review_transaction(
    state: AppState,
    id: String,
    headers: HeaderMap,
    payload: Option<Json<ActionPayload>>,
    status: TransactionStatus,
) -> Result<Json<Transaction>, ApiError> {
    let mut transaction = state.transactions.get(&id).await?;
    let actor = actor_from_headers(&headers);
    let notes = payload.and_then(|Json(p)| p.notes);

    transaction.review(status, &actor, notes);
    let updated = state.transactions.update(transaction).await?;

    info!(transaction_id = %updated.transaction_id, status = ?status, reviewer = %actor,
        "transaction re-classified");
    notify(&state, DomainEvent::TransactionUpdated(updated.clone())).await;
    state.cache.invalidate("/api/transactions").await;

    Ok(Json(updated))
}

/// `GET /api/alerts`
pub(super) async fn list_alerts(
    State(state): State<AppState>,
    Query(params): Query<AlertListParams>,
) -> Result<Json<AlertListResponse>, ApiError> {
    let query = params.to_query();
    let alerts = state.alerts.list(&query).await?;
    let total = state.alerts.count(&query).await?;

    Ok(Json(AlertListResponse {
        alerts,
        pagination: Pagination::new(params.page(), params.limit(), total),
    }))
}

/// `GET /api/alerts/:id`
pub(super) async fn get_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<fraudwatch_core::Alert>, ApiError> {
    Ok(Json(state.alerts.get(&id).await?))
}

/// `POST /api/alerts/:id/acknowledge`
pub(super) async fn acknowledge_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<fraudwatch_core::Alert>, ApiError> {
    let actor = actor_from_headers(&headers);
    let alert = state.lifecycle.acknowledge(&id, &actor).await?;
    state.cache.invalidate("/api/alerts").await;
    Ok(Json(alert))
}

/// `POST /api/alerts/:id/resolve`
pub(super) async fn resolve_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    payload: Option<Json<ActionPayload>>,
) -> Result<Json<fraudwatch_core::Alert>, ApiError> {
    let actor = actor_from_headers(&headers);
    let notes = payload.and_then(|Json(p)| p.notes);
    let alert = state.lifecycle.resolve(&id, &actor, notes).await?;
    state.cache.invalidate("/api/alerts").await;
    Ok(Json(alert))
}

/// `POST /api/alerts/:id/dismiss`
pub(super) async fn dismiss_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    payload: Option<Json<ActionPayload>>,
) -> Result<Json<fraudwatch_core::Alert>, ApiError> {
    let actor = actor_from_headers(&headers);
    let notes = payload.and_then(|Json(p)| p.notes);
    let alert = state.lifecycle.dismiss(&id, &actor, notes).await?;
    state.cache.invalidate("/api/alerts").await;
    Ok(Json(alert))
}

/// `DELETE /api/alerts/:id`
pub(super) async fn delete_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let removed = state.alerts.delete(&id).await?;
    state.cache.invalidate("/api/alerts").await;
    Ok(Json(serde_json::json!({ "deleted": removed.id })))
}

/// Best-effort sink notification from a write handler
async fn notify(state: &AppState, event: DomainEvent) {
    if let Err(e) = state.sink.notify(event).await {
        warn!(error = %e, "failed to notify event sink");
    }
}
