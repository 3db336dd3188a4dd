//! 授权服务
//! 主体的角色解析、有效权限合并与角色变更操作

use std::sync::Arc;

use uuid::Uuid;

use crate::config::AccessConfig;
use crate::error::AccessError;
use crate::models::permission::PermissionSet;
use crate::models::role::{Role, RoleRef};
use crate::models::user::Principal;
use crate::notify::NotificationSink;
use crate::store::{PrincipalStore, RoleBindings, RoleStore};

/// 授权服务：持有存储协作者，为单个主体发放访问句柄
pub struct AccessService {
    principals: Arc<dyn PrincipalStore>,
    roles: Arc<dyn RoleStore>,
    bindings: Arc<dyn RoleBindings>,
    events: Arc<dyn NotificationSink>,
    soft_deletes: bool,
}

impl AccessService {
    pub fn new(
        principals: Arc<dyn PrincipalStore>,
        roles: Arc<dyn RoleStore>,
        bindings: Arc<dyn RoleBindings>,
        events: Arc<dyn NotificationSink>,
        config: &AccessConfig,
    ) -> Self {
        Self {
            principals,
            roles,
            bindings,
            events,
            soft_deletes: config.soft_deletes,
        }
    }

    /// 加载主体并返回单请求生命周期的访问句柄
    pub async fn access(&self, principal_id: Uuid) -> Result<UserAccess, AccessError> {
        let principal = self
            .principals
            .find(principal_id)
            .await?
            .ok_or_else(|| AccessError::NotFound(format!("principal {principal_id}")))?;

        Ok(UserAccess {
            principal,
            principals: Arc::clone(&self.principals),
            roles: Arc::clone(&self.roles),
            bindings: Arc::clone(&self.bindings),
            events: Arc::clone(&self.events),
            soft_deletes: self.soft_deletes,
            cached: None,
        })
    }
}

/// 单个主体的访问句柄。
///
/// 有效权限缓存的生命周期为一次逻辑请求；句柄不可跨线程共享，
/// 缓存失效是普通字段写入，无原子性保证。
pub struct UserAccess {
    principal: Principal,
    principals: Arc<dyn PrincipalStore>,
    roles: Arc<dyn RoleStore>,
    bindings: Arc<dyn RoleBindings>,
    events: Arc<dyn NotificationSink>,
    soft_deletes: bool,
    cached: Option<PermissionSet>,
}

impl UserAccess {
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// 按关联顺序解析主体当前的角色；已失效的角色 ID 被跳过
    pub async fn get_roles(&self) -> Result<Vec<Role>, AccessError> {
        let role_ids = self.bindings.list(self.principal.id).await?;

        let mut roles = Vec::with_capacity(role_ids.len());
        for role_id in role_ids {
            if let Some(role) = self.roles.find_by_id(role_id).await? {
                roles.push(role);
            }
        }

        Ok(roles)
    }

    /// 判断主体是否拥有某个角色；参数可为角色实例、slug 或 ID
    pub async fn in_role<'a>(&self, role: impl Into<RoleRef<'a>>) -> Result<bool, AccessError> {
        let role = role.into();
        let roles = self.get_roles().await?;

        Ok(roles.iter().any(|r| r.matches(&role)))
    }

    /// 检查主体是否拥有某项权限。
    ///
    /// `use_cache` 为 false 或缓存失效时重新计算：从主体自身权限出发，
    /// OR 合并每个角色的权限集（合并顺序不影响结果），随后缓存。
    /// 数据缺失返回 false，不报错。
    pub async fn has_access(&mut self, key: &str, use_cache: bool) -> Result<bool, AccessError> {
        if !use_cache || self.cached.is_none() {
            let mut merged = self.principal.permissions.clone();
            for role in self.get_roles().await? {
                merged = merged.merge(&role.permissions);
            }

            metrics::counter!("access.permission_cache.rebuild").increment(1);
            self.cached = Some(merged);
        }

        Ok(self.cached.as_ref().map(|p| p.has(key)).unwrap_or(false))
    }

    /// 为主体附加角色。
    ///
    /// 重复附加为幂等无操作（持久化层 ON CONFLICT 语义），但通知
    /// 在每次成功的持久化调用后都会发出。
    pub async fn add_role(&mut self, role: &Role) -> Result<Role, AccessError> {
        self.cached = None;

        self.bindings.attach(self.principal.id, role.id).await?;

        metrics::counter!("access.role.attached").increment(1);
        tracing::info!(principal = %self.principal.id, role = %role.slug, "Role attached");
        self.events.role_added(&self.principal, std::slice::from_ref(role));

        Ok(role.clone())
    }

    /// 按 slug 解除角色关联，返回解除的行数（0 或 1）。
    ///
    /// 未关联的 slug 为无操作返回 0。此路径不发出通知，通知仅在
    /// 显式 remove_role 路径发出。
    pub async fn remove_role_by_slug(&mut self, slug: &str) -> Result<u64, AccessError> {
        self.cached = None;

        let Some(assigned) = self.find_assigned_by_slug(slug).await? else {
            return Ok(0);
        };

        let removed = self.bindings.detach(self.principal.id, assigned.id).await?;
        if removed > 0 {
            metrics::counter!("access.role.detached").increment(removed);
            tracing::info!(principal = %self.principal.id, role = %slug, "Role detached");
        }

        Ok(removed)
    }

    /// 解除角色关联（按 slug 解析），返回解除的行数。
    ///
    /// 仅在实际解除了关联时发出移除通知。
    pub async fn remove_role(&mut self, role: &Role) -> Result<u64, AccessError> {
        self.cached = None;

        let Some(assigned) = self.find_assigned_by_slug(&role.slug).await? else {
            return Ok(0);
        };

        let removed = self.bindings.detach(self.principal.id, assigned.id).await?;
        if removed > 0 {
            metrics::counter!("access.role.detached").increment(removed);
            tracing::info!(principal = %self.principal.id, role = %assigned.slug, "Role detached");
            self.events
                .role_removed(&self.principal, std::slice::from_ref(&assigned));
        }

        Ok(removed)
    }

    /// 以新的角色集整体替换当前角色集。
    ///
    /// 先快照当前关联，解除全部关联并发出一次移除通知（携带原角色），
    /// 再附加新集合并发出一次新增通知。任一附加失败则回滚到调用前的
    /// 关联集并传播原始错误。事务边界由持久化协作者提供。
    pub async fn replace_roles(&mut self, roles: &[Role]) -> Result<(), AccessError> {
        self.cached = None;

        let previous = self.get_roles().await?;
        let previous_ids = self.bindings.list(self.principal.id).await?;

        self.bindings.detach_all(self.principal.id).await?;
        self.events.role_removed(&self.principal, &previous);

        for role in roles {
            if let Err(e) = self.bindings.attach(self.principal.id, role.id).await {
                tracing::warn!(
                    principal = %self.principal.id,
                    role = %role.slug,
                    error = %e,
                    "Role replacement failed, rolling back"
                );
                self.rollback_bindings(&previous_ids).await;
                return Err(e);
            }
        }

        metrics::counter!("access.role.replaced").increment(1);
        tracing::info!(
            principal = %self.principal.id,
            count = roles.len(),
            "Roles replaced"
        );
        self.events.role_added(&self.principal, roles);

        Ok(())
    }

    /// 删除主体。
    ///
    /// 非软删除时先解除全部角色关联，避免孤儿关联行；软删除时记录
    /// 仍逻辑存在，保留关联。
    pub async fn delete(mut self) -> Result<(), AccessError> {
        self.cached = None;

        if !self.soft_deletes {
            self.bindings.detach_all(self.principal.id).await?;
        }

        self.principals.delete(self.principal.id).await?;

        tracing::info!(principal = %self.principal.id, "Principal deleted");
        Ok(())
    }

    /// 在当前关联的角色中按 slug 查找
    async fn find_assigned_by_slug(&self, slug: &str) -> Result<Option<Role>, AccessError> {
        let roles = self.get_roles().await?;
        Ok(roles.into_iter().find(|r| r.slug == slug))
    }

    /// 尽力恢复到替换前的关联集，保持原有顺序
    async fn rollback_bindings(&self, previous: &[i64]) {
        if let Err(e) = self.bindings.detach_all(self.principal.id).await {
            tracing::error!(
                principal = %self.principal.id,
                error = %e,
                "Rollback detach failed"
            );
            return;
        }

        for role_id in previous {
            if let Err(e) = self.bindings.attach(self.principal.id, *role_id).await {
                tracing::error!(
                    principal = %self.principal.id,
                    role_id = role_id,
                    error = %e,
                    "Rollback re-attach failed"
                );
            }
        }
    }
}
