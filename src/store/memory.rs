//! 内存存储实现
//! 用于测试与无数据库的嵌入场景

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;
use validator::Validate;

use crate::error::AccessError;
use crate::models::role::{NewRole, Role};
use crate::models::user::{NewPrincipal, Principal};
use crate::store::{PrincipalStore, RoleBindings, RoleStore};

/// 内存角色存储
#[derive(Debug, Default)]
pub struct MemoryRoleStore {
    roles: RwLock<HashMap<i64, Role>>,
    next_id: AtomicI64,
}

impl MemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建角色；slug 唯一性在此边界强制
    pub async fn create(&self, req: &NewRole) -> Result<Role, AccessError> {
        req.validate()?;

        let mut roles = self.roles.write().await;

        if roles.values().any(|r| r.slug == req.slug) {
            return Err(AccessError::Conflict(format!(
                "role slug '{}' already in use",
                req.slug
            )));
        }

        let now = Utc::now();
        let role = Role {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            slug: req.slug.clone(),
            name: req.name.clone(),
            permissions: req.permissions.clone(),
            created_at: now,
            updated_at: now,
        };

        roles.insert(role.id, role.clone());
        Ok(role)
    }
}

#[async_trait]
impl RoleStore for MemoryRoleStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Role>, AccessError> {
        let roles = self.roles.read().await;
        Ok(roles.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Role>, AccessError> {
        let roles = self.roles.read().await;
        Ok(roles.values().find(|r| r.slug == slug).cloned())
    }

    async fn all(&self) -> Result<Vec<Role>, AccessError> {
        let roles = self.roles.read().await;
        let mut all: Vec<Role> = roles.values().cloned().collect();
        all.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(all)
    }
}

/// 内存角色关联存储；Vec 顺序即关联建立顺序
#[derive(Debug, Default)]
pub struct MemoryRoleBindings {
    rows: RwLock<HashMap<Uuid, Vec<i64>>>,
}

impl MemoryRoleBindings {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleBindings for MemoryRoleBindings {
    async fn attach(&self, principal_id: Uuid, role_id: i64) -> Result<(), AccessError> {
        let mut rows = self.rows.write().await;
        let bindings = rows.entry(principal_id).or_default();
        if !bindings.contains(&role_id) {
            bindings.push(role_id);
        }
        Ok(())
    }

    async fn detach(&self, principal_id: Uuid, role_id: i64) -> Result<u64, AccessError> {
        let mut rows = self.rows.write().await;
        let Some(bindings) = rows.get_mut(&principal_id) else {
            return Ok(0);
        };

        let before = bindings.len();
        bindings.retain(|id| *id != role_id);
        Ok((before - bindings.len()) as u64)
    }

    async fn detach_all(&self, principal_id: Uuid) -> Result<u64, AccessError> {
        let mut rows = self.rows.write().await;
        let removed = rows.remove(&principal_id).map(|b| b.len()).unwrap_or(0);
        Ok(removed as u64)
    }

    async fn list(&self, principal_id: Uuid) -> Result<Vec<i64>, AccessError> {
        let rows = self.rows.read().await;
        Ok(rows.get(&principal_id).cloned().unwrap_or_default())
    }
}

/// 内存主体存储
#[derive(Debug, Default)]
pub struct MemoryPrincipals {
    users: RwLock<HashMap<Uuid, Principal>>,
}

impl MemoryPrincipals {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建主体
    pub async fn create(&self, req: &NewPrincipal) -> Result<Principal, AccessError> {
        req.validate()?;

        let now = Utc::now();
        let principal = Principal {
            id: Uuid::new_v4(),
            username: req.username.clone(),
            email: req.email.clone(),
            permissions: req.permissions.clone(),
            created_at: now,
            updated_at: now,
        };

        let mut users = self.users.write().await;
        users.insert(principal.id, principal.clone());
        Ok(principal)
    }
}

#[async_trait]
impl PrincipalStore for MemoryPrincipals {
    async fn find(&self, id: Uuid) -> Result<Option<Principal>, AccessError> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AccessError> {
        let mut users = self.users.write().await;
        Ok(users.remove(&id).is_some())
    }
}
