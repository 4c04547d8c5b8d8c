// In-memory `AnalysisStore` fake. Used in tests and as a zero-dependency
// fallback when `DATABASE_URL` is unset; the trait boundary means the
// facade never has to know which backing it is talking to.

use super::{decode_cursor, encode_cursor, AnalysisRecord, AnalysisStore, ListQuery, ListResponse};
use crate::errors::{FinOpsError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct InMemoryAnalysisStore {
    records: Mutex<HashMap<String, AnalysisRecord>>,
}

impl InMemoryAnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AnalysisStore for InMemoryAnalysisStore {
    async fn put(&self, record: AnalysisRecord) -> Result<()> {
        let mut guard = self.records.lock().expect("analysis store lock poisoned");
        guard.entry(record.request_id.clone()).or_insert(record);
        Ok(())
    }

    async fn get(&self, request_id: &str) -> Result<AnalysisRecord> {
        let guard = self.records.lock().expect("analysis store lock poisoned");
        guard
            .get(request_id)
            .cloned()
            .ok_or_else(|| FinOpsError::AnalysisNotFound(request_id.to_string()))
    }

    async fn list(&self, query: ListQuery) -> Result<ListResponse> {
        let guard = self.records.lock().expect("analysis store lock poisoned");
        let mut items: Vec<AnalysisRecord> = guard
            .values()
            .filter(|r| query.since.map_or(true, |since| r.started_at >= since))
            .filter(|r| query.until.map_or(true, |until| r.started_at <= until))
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            b.started_at
                .cmp(&a.started_at)
                .then_with(|| b.request_id.cmp(&a.request_id))
        });

        if let Some(cursor) = query.cursor.as_deref().and_then(decode_cursor) {
            items.retain(|r| (r.started_at, r.request_id.clone()) < cursor);
        }

        let limit = if query.limit == 0 { 20 } else { query.limit };
        let has_more = items.len() > limit;
        items.truncate(limit);

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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn record(id: &str) -> AnalysisRecord {
        let now = Utc::now();
        AnalysisRecord {
            request_id: id.to_string(),
            started_at: now,
            completed_at: now,
            duration_ms: 5,
            iac_type: "terraform".to_string(),
            environment: "dev".to_string(),
            estimated_monthly_cost: 30.0,
            estimated_first_week_cost: 7.0,
            resource_count: 1,
            policy_status: None,
            policy_id: None,
            risk_flags: Vec::new(),
            recommendations_count: 0,
            result_json: json!({}),
            created_at: now,
        }
    }

    #[tokio::test]
    async fn put_is_idempotent_on_request_id() {
        let store = InMemoryAnalysisStore::new();
        let mut r = record("req-1");
        store.put(r.clone()).await.unwrap();
        r.estimated_monthly_cost = 999.0;
        store.put(r).await.unwrap();

        let stored = store.get("req-1").await.unwrap();
        assert_eq!(stored.estimated_monthly_cost, 30.0);
    }

    #[tokio::test]
    async fn get_unknown_id_is_not_found() {
        let store = InMemoryAnalysisStore::new();
        let err = store.get("nope").await.unwrap_err();
        assert!(matches!(err, FinOpsError::AnalysisNotFound(_)));
        assert_eq!(err.id(), "analysis_not_found");
    }

    #[tokio::test]
    async fn result_json_round_trips_through_the_store() {
        let store = InMemoryAnalysisStore::new();
        let mut r = record("req-2");
        r.result_json = json!({"estimated_monthly_cost": 42.5, "breakdown": [1, 2, 3]});
        store.put(r.clone()).await.unwrap();

        let stored = store.get("req-2").await.unwrap();
        assert_eq!(stored.result_json, r.result_json);
    }
}
