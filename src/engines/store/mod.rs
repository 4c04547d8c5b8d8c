// Analysis Store (C8): persistence of completed checks, queryable by time
// and by request id. The trait lets the in-memory fake substitute for
// Postgres in tests without touching the facade or the caller.

pub mod memory;
#[cfg(feature = "postgres-store")]
pub mod postgres;
pub mod types;

pub use memory::InMemoryAnalysisStore;
#[cfg(feature = "postgres-store")]
pub use postgres::PgAnalysisStore;
pub use types::{AnalysisRecord, ListQuery, ListResponse, PolicyStatus};

use crate::errors::Result;
use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Idempotent on `request_id`: a second `put` for an id already
    /// present is a no-op rather than an error or a duplicate row.
    async fn put(&self, record: AnalysisRecord) -> Result<()>;
    async fn get(&self, request_id: &str) -> Result<AnalysisRecord>;
    async fn list(&self, query: ListQuery) -> Result<ListResponse>;
}

pub(crate) fn encode_cursor(started_at: DateTime<Utc>, request_id: &str) -> String {
    base64::engine::general_purpose::STANDARD
        .encode(format!("{}|{}", started_at.to_rfc3339(), request_id))
}

pub(crate) fn decode_cursor(cursor: &str) -> Option<(DateTime<Utc>, String)> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(cursor).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    let (ts, id) = text.split_once('|')?;
    let started_at = DateTime::parse_from_rfc3339(ts).ok()?.with_timezone(&Utc);
    Some((started_at, id.to_string()))
}
