//! Role bindings (主体角色关联数据访问)

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AccessError;
use crate::store::RoleBindings;

pub struct PgRoleBindings {
    db: PgPool,
}

impl PgRoleBindings {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RoleBindings for PgRoleBindings {
    async fn attach(&self, principal_id: Uuid, role_id: i64) -> Result<(), AccessError> {
        sqlx::query(
            "INSERT INTO role_users (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(principal_id)
        .bind(role_id)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn detach(&self, principal_id: Uuid, role_id: i64) -> Result<u64, AccessError> {
        let result = sqlx::query("DELETE FROM role_users WHERE user_id = $1 AND role_id = $2")
            .bind(principal_id)
            .bind(role_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }

    async fn detach_all(&self, principal_id: Uuid) -> Result<u64, AccessError> {
        let result = sqlx::query("DELETE FROM role_users WHERE user_id = $1")
            .bind(principal_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }

    async fn list(&self, principal_id: Uuid) -> Result<Vec<i64>, AccessError> {
        // 代理键 id 即关联建立顺序
        let role_ids = sqlx::query_scalar::<_, i64>(
            "SELECT role_id FROM role_users WHERE user_id = $1 ORDER BY id",
        )
        .bind(principal_id)
        .fetch_all(&self.db)
        .await?;

        Ok(role_ids)
    }
}
