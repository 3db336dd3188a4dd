//! 存储协作者边界
//! 角色、角色关联与主体的持久化接口及其 PostgreSQL / 内存实现

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AccessError;
use crate::models::role::Role;
use crate::models::user::Principal;

pub mod bindings;
pub mod memory;
pub mod principals;
pub mod role_store;

pub use bindings::PgRoleBindings;
pub use memory::{MemoryPrincipals, MemoryRoleBindings, MemoryRoleStore};
pub use principals::PgPrincipals;
pub use role_store::PgRoleStore;

/// 角色查询接口
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// 根据 ID 查找角色
    async fn find_by_id(&self, id: i64) -> Result<Option<Role>, AccessError>;

    /// 根据 slug 查找角色
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Role>, AccessError>;

    /// 列出所有角色
    async fn all(&self) -> Result<Vec<Role>, AccessError>;
}

/// 主体与角色的关联持久化接口
///
/// `list` 按关联建立顺序返回角色 ID。detach 与 attach 的事务边界由
/// 实现方提供。
#[async_trait]
pub trait RoleBindings: Send + Sync {
    /// 建立关联；重复关联为幂等无操作
    async fn attach(&self, principal_id: Uuid, role_id: i64) -> Result<(), AccessError>;

    /// 解除关联，返回实际解除的行数（0 或 1）
    async fn detach(&self, principal_id: Uuid, role_id: i64) -> Result<u64, AccessError>;

    /// 解除主体的全部关联，返回解除的行数
    async fn detach_all(&self, principal_id: Uuid) -> Result<u64, AccessError>;

    /// 按关联顺序列出主体的角色 ID
    async fn list(&self, principal_id: Uuid) -> Result<Vec<i64>, AccessError>;
}

/// 主体查询与生命周期接口
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    /// 根据 ID 查找主体
    async fn find(&self, id: Uuid) -> Result<Option<Principal>, AccessError>;

    /// 删除主体记录
    async fn delete(&self, id: Uuid) -> Result<bool, AccessError>;
}
