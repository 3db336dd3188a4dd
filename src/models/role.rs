//! Role domain models

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::permission::PermissionSet;

static SLUG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]{0,63}$").expect("slug pattern is valid"));

/// Role: a named, reusable bundle of permissions assignable to principals.
///
/// `slug` is the durable cross-reference key, `id` the relational key.
/// Identity is immutable after creation; the permission payload is only
/// ever replaced whole, never patched.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub id: i64,
    pub slug: String,
    pub name: String,
    #[sqlx(json)]
    pub permissions: PermissionSet,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Two role references denote the same role if either the id or the slug
/// matches. Some call sites resolve roles by id, others by slug; the slug
/// uniqueness constraint at the creation boundary keeps this sound.
impl PartialEq for Role {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id || self.slug == other.slug
    }
}

impl Role {
    /// Check whether this role matches a polymorphic reference
    pub fn matches(&self, role: &RoleRef<'_>) -> bool {
        match role {
            RoleRef::Id(id) => self.id == *id,
            RoleRef::Slug(slug) => self.slug == *slug,
            RoleRef::Role(other) => self.id == other.id || self.slug == other.slug,
        }
    }
}

/// Polymorphic role reference: by id, by slug, or by instance
#[derive(Debug, Clone, Copy)]
pub enum RoleRef<'a> {
    Id(i64),
    Slug(&'a str),
    Role(&'a Role),
}

impl From<i64> for RoleRef<'static> {
    fn from(id: i64) -> Self {
        RoleRef::Id(id)
    }
}

impl<'a> From<&'a str> for RoleRef<'a> {
    fn from(slug: &'a str) -> Self {
        RoleRef::Slug(slug)
    }
}

impl<'a> From<&'a Role> for RoleRef<'a> {
    fn from(role: &'a Role) -> Self {
        RoleRef::Role(role)
    }
}

/// Create role request
#[derive(Debug, Deserialize, Validate)]
pub struct NewRole {
    #[validate(regex(
        path = *SLUG_PATTERN,
        message = "slug must be 1-64 lowercase alphanumeric characters or dashes"
    ))]
    pub slug: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub permissions: PermissionSet,
}

/// Update role request; `permissions`, when present, replaces the whole set
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRole {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub permissions: Option<PermissionSet>,
}
