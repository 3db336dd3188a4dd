//! Principal (user) domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::permission::PermissionSet;

/// The actor being authorized.
///
/// `permissions` is the principal's own override set; the effective view
/// is the OR-merge of this set with every assigned role's set and lives
/// on the per-request access handle, not on the record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Principal {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    #[sqlx(json)]
    pub permissions: PermissionSet,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create principal request
#[derive(Debug, Deserialize, Validate)]
pub struct NewPrincipal {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default)]
    pub permissions: PermissionSet,
}
