// Postgres-backed `AnalysisStore`. `put` relies on the unique index on
// `request_id` (see `analyses` table layout) and treats a conflict as the
// idempotent no-op the contract asks for, rather than surfacing a
// constraint-violation error to the caller.

use super::{decode_cursor, encode_cursor, AnalysisRecord, AnalysisStore, ListQuery, ListResponse, PolicyStatus};
use crate::errors::{FinOpsError, Result};
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};

pub struct PgAnalysisStore {
    pool: PgPool,
}

impl PgAnalysisStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| FinOpsError::internal(format!("failed to connect to postgres: {e}")))?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalysisStore for PgAnalysisStore {
    async fn put(&self, record: AnalysisRecord) -> Result<()> {
        let policy_status = record.policy_status.map(|s| match s {
            PolicyStatus::Pass => "pass",
            PolicyStatus::Fail => "fail",
            PolicyStatus::NotApplicable => "n/a",
        });

        sqlx::query(
            r#"
            INSERT INTO analyses (
                request_id, started_at, completed_at, duration_ms, iac_type,
                environment, estimated_monthly_cost, estimated_first_week_cost,
                resource_count, policy_status, policy_id, risk_flags,
                recommendations_count, result_json, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (request_id) DO NOTHING
            "#,
        )
        .bind(&record.request_id)
        .bind(record.started_at)
        .bind(record.completed_at)
        .bind(record.duration_ms)
        .bind(&record.iac_type)
        .bind(&record.environment)
        .bind(record.estimated_monthly_cost)
        .bind(record.estimated_first_week_cost)
        .bind(record.resource_count)
        .bind(policy_status)
        .bind(&record.policy_id)
        .bind(&record.risk_flags)
        .bind(record.recommendations_count)
        .bind(&record.result_json)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| FinOpsError::internal(format!("failed to persist analysis: {e}")))?;

        Ok(())
    }

    async fn get(&self, request_id: &str) -> Result<AnalysisRecord> {
        let row = sqlx::query(
            r#"SELECT request_id, started_at, completed_at, duration_ms, iac_type,
                      environment, estimated_monthly_cost, estimated_first_week_cost,
                      resource_count, policy_status, policy_id, risk_flags,
                      recommendations_count, result_json, created_at
               FROM analyses WHERE request_id = $1"#,
        )
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| FinOpsError::internal(format!("failed to load analysis: {e}")))?
        .ok_or_else(|| FinOpsError::AnalysisNotFound(request_id.to_string()))?;

        row_to_record(&row)
    }

    async fn list(&self, query: ListQuery) -> Result<ListResponse> {
        let limit = if query.limit == 0 { 20 } else { query.limit } as i64;
        let cursor = query.cursor.as_deref().and_then(decode_cursor);

        let rows = sqlx::query(
            r#"SELECT request_id, started_at, completed_at, duration_ms, iac_type,
                      environment, estimated_monthly_cost, estimated_first_week_cost,
                      resource_count, policy_status, policy_id, risk_flags,
                      recommendations_count, result_json, created_at
               FROM analyses
               WHERE ($1::timestamptz IS NULL OR started_at >= $1)
                 AND ($2::timestamptz IS NULL OR started_at <= $2)
                 AND ($3::timestamptz IS NULL OR started_at < $3
                      OR (started_at = $3 AND request_id < $4))
               ORDER BY started_at DESC, request_id DESC
               LIMIT $5"#,
        )
        .bind(query.since)
        .bind(query.until)
        .bind(cursor.as_ref().map(|(ts, _)| *ts))
        .bind(cursor.as_ref().map(|(_, id)| id.clone()).unwrap_or_default())
        .bind(limit + 1)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| FinOpsError::internal(format!("failed to list analyses: {e}")))?;

        let mut items: Vec<AnalysisRecord> = rows
            .iter()
            .map(row_to_record)
            .collect::<Result<Vec<_>>>()?;

        let has_more = items.len() > limit as usize;
        items.truncate(limit as usize);

        let next_cursor = if has_more {
            items
                .last()
                .map(|r| encode_cursor(r.started_at, &r.request_id))
        } else {
            None
        };

        Ok(ListResponse { items, next_cursor })
    }
}

fn row_to_record(row: &sqlx::postgres::PgRow) -> Result<AnalysisRecord> {
    let policy_status: Option<String> = row.try_get("policy_status").ok();
    Ok(AnalysisRecord {
        request_id: row
            .try_get("request_id")
            .map_err(|e| FinOpsError::internal(e.to_string()))?,
        started_at: row
            .try_get("started_at")
            .map_err(|e| FinOpsError::internal(e.to_string()))?,
        completed_at: row
            .try_get("completed_at")
            .map_err(|e| FinOpsError::internal(e.to_string()))?,
        duration_ms: row
            .try_get("duration_ms")
            .map_err(|e| FinOpsError::internal(e.to_string()))?,
        iac_type: row
            .try_get("iac_type")
            .map_err(|e| FinOpsError::internal(e.to_string()))?,
        environment: row
            .try_get("environment")
            .map_err(|e| FinOpsError::internal(e.to_string()))?,
        estimated_monthly_cost: row
            .try_get("estimated_monthly_cost")
            .map_err(|e| FinOpsError::internal(e.to_string()))?,
        estimated_first_week_cost: row
            .try_get("estimated_first_week_cost")
            .map_err(|e| FinOpsError::internal(e.to_string()))?,
        resource_count: row
            .try_get("resource_count")
            .map_err(|e| FinOpsError::internal(e.to_string()))?,
        policy_status: policy_status.map(|s| match s.as_str() {
            "pass" => PolicyStatus::Pass,
            "fail" => PolicyStatus::Fail,
            _ => PolicyStatus::NotApplicable,
        }),
        policy_id: row
            .try_get("policy_id")
            .map_err(|e| FinOpsError::internal(e.to_string()))?,
        risk_flags: row
            .try_get("risk_flags")
            .map_err(|e| FinOpsError::internal(e.to_string()))?,
        recommendations_count: row
            .try_get("recommendations_count")
            .map_err(|e| FinOpsError::internal(e.to_string()))?,
        result_json: row
            .try_get("result_json")
            .map_err(|e| FinOpsError::internal(e.to_string()))?,
        created_at: row
            .try_get("created_at")
            .map_err(|e| FinOpsError::internal(e.to_string()))?,
    })
}
