//! PostgreSQL store implementations
//!
//! Each entity is stored as a JSONB document alongside the columns the list
//! filters need. The `transaction_id` primary key is the uniqueness
//! constraint the idempotency guard relies on: a racing second insert fails
//! with a unique violation, which is mapped to [`RepositoryError::Duplicate`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fraudwatch_core::{Alert, Rule, Transaction};
use serde::Serialize;
use sqlx::postgres::PgPool;
use sqlx::types::Json;
use sqlx::Row;

use crate::error::{RepositoryError, RepositoryResult};
use crate::traits::{AlertQuery, AlertStore, RuleStore, TransactionQuery, TransactionStore};

/// PostgreSQL-backed stores sharing one connection pool
#[derive(Clone)]
pub struct PostgresStores {
    pool: PgPool,
}

impl PostgresStores {
    /// Connect and create tables if they do not exist
    pub async fn connect(database_url: &str) -> RepositoryResult<Self> {
        let pool = PgPool::connect(database_url).await?;
        let stores = Self { pool };
        stores.ensure_schema().await?;
        Ok(stores)
    }

    /// Build from an existing pool (tables must already exist)
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Idempotently create the schema
    pub async fn ensure_schema(&self) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transactions (
                transaction_id TEXT PRIMARY KEY,
                user_id        TEXT NOT NULL,
                merchant_id    TEXT,
                status         TEXT NOT NULL,
                risk_score     SMALLINT NOT NULL,
                amount         DOUBLE PRECISION NOT NULL,
                ts             TIMESTAMPTZ NOT NULL,
                document       JSONB NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS alerts (
                id             TEXT PRIMARY KEY,
                transaction_id TEXT NOT NULL,
                user_id        TEXT NOT NULL,
                status         TEXT NOT NULL,
                severity       TEXT NOT NULL,
                created_at     TIMESTAMPTZ NOT NULL,
                document       JSONB NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS rules (
                name            TEXT PRIMARY KEY,
                active          BOOLEAN NOT NULL,
                priority        SMALLINT NOT NULL,
                execution_count BIGINT NOT NULL DEFAULT 0,
                last_executed   TIMESTAMPTZ,
                created_at      TIMESTAMPTZ NOT NULL,
                document        JSONB NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Text form of a unit enum, as it appears on the wire
fn enum_text<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(|s| s.to_string()))
        .unwrap_or_default()
}

fn map_insert_error(err: sqlx::Error, transaction_id: String) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return RepositoryError::Duplicate { transaction_id };
        }
    }
    RepositoryError::Database(err)
}

#[async_trait]
impl TransactionStore for PostgresStores {
    async fn insert(&self, transaction: Transaction) -> RepositoryResult<Transaction> {
        sqlx::query(
            r#"
            INSERT INTO transactions
                (transaction_id, user_id, merchant_id, status, risk_score, amount, ts, document)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&transaction.transaction_id)
        .bind(&transaction.user_id)
        .bind(&transaction.merchant_id)
        .bind(enum_text(&transaction.status))
        .bind(transaction.risk_score as i16)
        .bind(transaction.amount)
        .bind(transaction.timestamp)
        .bind(Json(&transaction))
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, transaction.transaction_id.clone()))?;

        Ok(transaction)
    }

    async fn get(&self, transaction_id: &str) -> RepositoryResult<Transaction> {
        let row = sqlx::query("SELECT document FROM transactions WHERE transaction_id = $1")
            .bind(transaction_id)
            .fetch_optional(&self.pool)
            .await?;

        let row = row.ok_or_else(|| RepositoryError::NotFound {
            id: transaction_id.to_string(),
        })?;
        let Json(transaction): Json<Transaction> = row.try_get("document")?;
        Ok(transaction)
    }

    async fn update(&self, transaction: Transaction) -> RepositoryResult<Transaction> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET user_id = $2, merchant_id = $3, status = $4, risk_score = $5,
                amount = $6, ts = $7, document = $8
            WHERE transaction_id = $1
            "#,
        )
        .bind(&transaction.transaction_id)
        .bind(&transaction.user_id)
        .bind(&transaction.merchant_id)
        .bind(enum_text(&transaction.status))
        .bind(transaction.risk_score as i16)
        .bind(transaction.amount)
        .bind(transaction.timestamp)
        .bind(Json(&transaction))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                id: transaction.transaction_id,
            });
        }
        Ok(transaction)
    }

    async fn delete(&self, transaction_id: &str) -> RepositoryResult<Transaction> {
        let row = sqlx::query(
            "DELETE FROM transactions WHERE transaction_id = $1 RETURNING document",
        )
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or_else(|| RepositoryError::NotFound {
            id: transaction_id.to_string(),
        })?;
        let Json(transaction): Json<Transaction> = row.try_get("document")?;
        Ok(transaction)
    }

    async fn list(&self, query: &TransactionQuery) -> RepositoryResult<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT document FROM transactions
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR user_id = $2)
              AND ($3::text IS NULL OR merchant_id = $3)
              AND ($4::smallint IS NULL OR risk_score >= $4)
              AND ($5::smallint IS NULL OR risk_score <= $5)
              AND ($6::double precision IS NULL OR amount >= $6)
              AND ($7::double precision IS NULL OR amount <= $7)
            ORDER BY ts DESC
            LIMIT $8 OFFSET $9
            "#,
        )
        .bind(query.status.as_ref().map(enum_text))
        .bind(&query.user_id)
        .bind(&query.merchant_id)
        .bind(query.min_risk_score.map(|s| s as i16))
        .bind(query.max_risk_score.map(|s| s as i16))
        .bind(query.min_amount)
        .bind(query.max_amount)
        .bind(query.limit as i64)
        .bind(query.offset as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let Json(transaction): Json<Transaction> = row.try_get("document")?;
                Ok(transaction)
            })
            .collect()
    }

    async fn count(&self, query: &TransactionQuery) -> RepositoryResult<usize> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total FROM transactions
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR user_id = $2)
              AND ($3::text IS NULL OR merchant_id = $3)
              AND ($4::smallint IS NULL OR risk_score >= $4)
              AND ($5::smallint IS NULL OR risk_score <= $5)
              AND ($6::double precision IS NULL OR amount >= $6)
              AND ($7::double precision IS NULL OR amount <= $7)
            "#,
        )
        .bind(query.status.as_ref().map(enum_text))
        .bind(&query.user_id)
        .bind(&query.merchant_id)
        .bind(query.min_risk_score.map(|s| s as i16))
        .bind(query.max_risk_score.map(|s| s as i16))
        .bind(query.min_amount)
        .bind(query.max_amount)
        .fetch_one(&self.pool)
        .await?;

        let total: i64 = row.try_get("total")?;
        Ok(total as usize)
    }
}

#[async_trait]
impl AlertStore for PostgresStores {
    async fn insert(&self, alert: Alert) -> RepositoryResult<Alert> {
        sqlx::query(
            r#"
            INSERT INTO alerts (id, transaction_id, user_id, status, severity, created_at, document)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&alert.id)
        .bind(&alert.transaction_id)
        .bind(&alert.user_id)
        .bind(enum_text(&alert.status))
        .bind(enum_text(&alert.severity))
        .bind(alert.created_at)
        .bind(Json(&alert))
        .execute(&self.pool)
        .await?;

        Ok(alert)
    }

    async fn get(&self, id: &str) -> RepositoryResult<Alert> {
        let row = sqlx::query("SELECT document FROM alerts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let row = row.ok_or_else(|| RepositoryError::NotFound { id: id.to_string() })?;
        let Json(alert): Json<Alert> = row.try_get("document")?;
        Ok(alert)
    }

    async fn update(&self, alert: Alert) -> RepositoryResult<Alert> {
        let result = sqlx::query(
            "UPDATE alerts SET status = $2, severity = $3, document = $4 WHERE id = $1",
        )
        .bind(&alert.id)
        .bind(enum_text(&alert.status))
        .bind(enum_text(&alert.severity))
        .bind(Json(&alert))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound { id: alert.id });
        }
        Ok(alert)
    }

    async fn delete(&self, id: &str) -> RepositoryResult<Alert> {
        let row = sqlx::query("DELETE FROM alerts WHERE id = $1 RETURNING document")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let row = row.ok_or_else(|| RepositoryError::NotFound { id: id.to_string() })?;
        let Json(alert): Json<Alert> = row.try_get("document")?;
        Ok(alert)
    }

    async fn list(&self, query: &AlertQuery) -> RepositoryResult<Vec<Alert>> {
        let rows = sqlx::query(
            r#"
            SELECT document FROM alerts
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR severity = $2)
              AND ($3::text IS NULL OR transaction_id = $3)
              AND ($4::text IS NULL OR user_id = $4)
            ORDER BY created_at DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(query.status.as_ref().map(enum_text))
        .bind(query.severity.as_ref().map(enum_text))
        .bind(&query.transaction_id)
        .bind(&query.user_id)
        .bind(query.limit as i64)
        .bind(query.offset as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let Json(alert): Json<Alert> = row.try_get("document")?;
                Ok(alert)
            })
            .collect()
    }

    async fn count(&self, query: &AlertQuery) -> RepositoryResult<usize> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total FROM alerts
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR severity = $2)
              AND ($3::text IS NULL OR transaction_id = $3)
              AND ($4::text IS NULL OR user_id = $4)
            "#,
        )
        .bind(query.status.as_ref().map(enum_text))
        .bind(query.severity.as_ref().map(enum_text))
        .bind(&query.transaction_id)
        .bind(&query.user_id)
        .fetch_one(&self.pool)
        .await?;

        let total: i64 = row.try_get("total")?;
        Ok(total as usize)
    }
}

#[async_trait]
impl RuleStore for PostgresStores {
    async fn insert(&self, rule: Rule) -> RepositoryResult<Rule> {
        sqlx::query(
            r#"
            INSERT INTO rules (name, active, priority, execution_count, last_executed, created_at, document)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (name) DO UPDATE
            SET active = EXCLUDED.active, priority = EXCLUDED.priority,
                document = EXCLUDED.document
            "#,
        )
        .bind(&rule.name)
        .bind(rule.active)
        .bind(rule.priority as i16)
        .bind(rule.execution_count as i64)
        .bind(rule.last_executed)
        .bind(rule.created_at)
        .bind(Json(&rule))
        .execute(&self.pool)
        .await?;

        Ok(rule)
    }

    async fn active_rules(&self) -> RepositoryResult<Vec<Rule>> {
        let rows = sqlx::query(
            r#"
            SELECT document, execution_count, last_executed FROM rules
            WHERE active
            ORDER BY priority DESC, created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|row| rule_from_row(&row)).collect()
    }

    async fn record_execution(&self, names: &[String]) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            UPDATE rules
            SET execution_count = execution_count + 1, last_executed = NOW()
            WHERE name = ANY($1)
            "#,
        )
        .bind(names)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn all(&self) -> RepositoryResult<Vec<Rule>> {
        let rows = sqlx::query(
            "SELECT document, execution_count, last_executed FROM rules ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|row| rule_from_row(&row)).collect()
    }
}

/// Rebuild a rule from its document, overlaying the live counter columns
fn rule_from_row(row: &sqlx::postgres::PgRow) -> RepositoryResult<Rule> {
    let Json(mut rule): Json<Rule> = row.try_get("document")?;
    let execution_count: i64 = row.try_get("execution_count")?;
    let last_executed: Option<DateTime<Utc>> = row.try_get("last_executed")?;
    rule.execution_count = execution_count as u64;
    rule.last_executed = last_executed;
    Ok(rule)
}
