//! Content record domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of a "many records" content entity (post, page, ...).
///
/// `entity_type` is the owning entity definition's slug.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Record {
    pub id: i64,
    pub entity_type: String,
    pub content: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
