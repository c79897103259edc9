//! REST API type definitions
//!
//! Application state, request/response payloads and pagination metadata.

use crate::cache::ResponseCache;
use crate::rate_limit::RateLimiter;
use crate::ws::StreamHub;
use axum::http::HeaderMap;
use fraudwatch_core::{
    Alert, AlertStatus, Location, PaymentMethod, Severity, Transaction, TransactionStatus,
};
use fraudwatch_repository::{AlertQuery, AlertStore, RuleStore, TransactionQuery, TransactionStore};
use fraudwatch_runtime::{AlertLifecycle, EventSink, IngestPipeline};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Maximum page size for list endpoints
const MAX_PAGE_SIZE: u32 = 100;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IngestPipeline>,
    pub lifecycle: Arc<AlertLifecycle>,
    pub transactions: Arc<dyn TransactionStore>,
    pub alerts: Arc<dyn AlertStore>,
    pub rules: Arc<dyn RuleStore>,
    pub sink: Arc<dyn EventSink>,
    pub hub: Arc<StreamHub>,
    pub cache: ResponseCache,
    pub limiter: Option<RateLimiter>,
}

/// Caller identity from the `x-actor` header; auth itself is an external
/// collaborator, only the identity reaches the core
pub fn actor_from_headers(headers: &HeaderMap) -> String {
    headers
        .get("x-actor")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("system")
        .to_string()
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Pagination metadata for list responses
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: usize,
    pub items_per_page: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total_items: usize) -> Self {
        let total_pages = ((total_items as u64 + limit as u64 - 1) / limit as u64) as u32;
        Self {
            current_page: page,
            total_pages,
            total_items,
            items_per_page: limit,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

/// Query parameters for `GET /api/transactions`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<TransactionStatus>,
    pub user_id: Option<String>,
    pub merchant_id: Option<String>,
    pub min_risk_score: Option<u8>,
    pub max_risk_score: Option<u8>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
}

impl TransactionListParams {
    /// Clamped page number (1-based)
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Clamped page size
    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(TransactionQuery::DEFAULT_LIMIT as u32)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Convert to a store query
    pub fn to_query(&self) -> TransactionQuery {
        let limit = self.limit();
        TransactionQuery {
            status: self.status,
            user_id: self.user_id.clone(),
            merchant_id: self.merchant_id.clone(),
            min_risk_score: self.min_risk_score,
            max_risk_score: self.max_risk_score,
            min_amount: self.min_amount,
            max_amount: self.max_amount,
            limit: limit as usize,
            offset: ((self.page() - 1) * limit) as usize,
        }
    }
}

/// Query parameters for `GET /api/alerts`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<AlertStatus>,
    pub severity: Option<Severity>,
    pub transaction_id: Option<String>,
    pub user_id: Option<String>,
}

impl AlertListParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(TransactionQuery::DEFAULT_LIMIT as u32)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn to_query(&self) -> AlertQuery {
        let limit = self.limit();
        AlertQuery {
            status: self.status,
            severity: self.severity,
            transaction_id: self.transaction_id.clone(),
            user_id: self.user_id.clone(),
            limit: limit as usize,
            offset: ((self.page() - 1) * limit) as usize,
        }
    }
}

/// `GET /api/transactions` response
#[derive(Debug, Serialize)]
pub struct TransactionListResponse {
    pub transactions: Vec<Transaction>,
    pub pagination: Pagination,
}

/// `GET /api/alerts` response
#[derive(Debug, Serialize)]
pub struct AlertListResponse {
    pub alerts: Vec<Alert>,
    pub pagination: Pagination,
}

/// `PUT /api/transactions/:id` payload (allowed fields only)
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateTransactionPayload {
    pub status: Option<TransactionStatus>,
    pub risk_score: Option<u8>,
    pub description: Option<String>,
    pub merchant_id: Option<String>,
    pub merchant_name: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub location: Option<Location>,
    pub metadata: Option<HashMap<String, serde_json::Value>>,
    pub notes: Option<String>,
}

/// Body for reviewer and alert actions
#[derive(Debug, Default, Deserialize)]
pub struct ActionPayload {
    #[serde(default)]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(actor_from_headers(&headers), "system");

        headers.insert("x-actor", "analyst-4".parse().unwrap());
        assert_eq!(actor_from_headers(&headers), "analyst-4");
    }

    #[test]
    fn test_pagination_math() {
        let p = Pagination::new(2, 10, 35);
        assert_eq!(p.total_pages, 4);
        assert!(p.has_next);
        assert!(p.has_prev);

        let first = Pagination::new(1, 10, 5);
        assert_eq!(first.total_pages, 1);
        assert!(!first.has_next);
        assert!(!first.has_prev);

        let empty = Pagination::new(1, 10, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next);
    }

    #[test]
    fn test_params_clamping_and_offset() {
        let params = TransactionListParams {
            page: Some(3),
            limit: Some(500),
            ..Default::default()
        };
        assert_eq!(params.limit(), 100);
        let query = params.to_query();
        assert_eq!(query.limit, 100);
        assert_eq!(query.offset, 200);

        let defaults = TransactionListParams::default();
        assert_eq!(defaults.page(), 1);
        assert_eq!(defaults.to_query().offset, 0);
    }

    #[test]
    fn test_params_deserialize_camel_case() {
        let params: TransactionListParams =
            serde_json::from_str(r#"{ "userId": "u1", "minRiskScore": 40, "status": "FRAUD" }"#)
                .unwrap();
        assert_eq!(params.user_id.as_deref(), Some("u1"));
        assert_eq!(params.min_risk_score, Some(40));
        assert_eq!(params.status, Some(TransactionStatus::Fraud));
    }
}
