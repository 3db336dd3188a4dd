//! Role store (角色数据访问)

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use validator::Validate;

use crate::error::AccessError;
use crate::models::role::{NewRole, Role, UpdateRole};
use crate::store::RoleStore;

pub struct PgRoleStore {
    db: PgPool,
}

impl PgRoleStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 列出所有角色
    pub async fn list(&self) -> Result<Vec<Role>, AccessError> {
        let roles = sqlx::query_as::<_, Role>("SELECT * FROM roles ORDER BY slug")
            .fetch_all(&self.db)
            .await?;

        Ok(roles)
    }

    /// 创建角色；slug 唯一性在此边界强制
    pub async fn create(&self, req: &NewRole) -> Result<Role, AccessError> {
        req.validate()?;

        let role = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (slug, name, permissions)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&req.slug)
        .bind(&req.name)
        .bind(Json(&req.permissions))
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, &req.slug))?;

        tracing::info!(role = %role.slug, "Role created");
        Ok(role)
    }

    /// 更新角色；permissions 为整体替换
    pub async fn update(&self, id: i64, req: &UpdateRole) -> Result<Option<Role>, AccessError> {
        req.validate()?;

        let role = sqlx::query_as::<_, Role>(
            r#"
            UPDATE roles
            SET
                name = COALESCE($2, name),
                permissions = COALESCE($3, permissions),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(req.permissions.as_ref().map(Json))
        .fetch_optional(&self.db)
        .await?;

        Ok(role)
    }

    /// 删除角色
    pub async fn delete(&self, id: i64) -> Result<bool, AccessError> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl RoleStore for PgRoleStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Role>, AccessError> {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(role)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Role>, AccessError> {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.db)
            .await?;

        Ok(role)
    }

    async fn all(&self) -> Result<Vec<Role>, AccessError> {
        self.list().await
    }
}

/// 将唯一约束冲突（SQLSTATE 23505）映射为 Conflict 错误
fn map_unique_violation(e: sqlx::Error, slug: &str) -> AccessError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().map(|code| code == "23505").unwrap_or(false) {
            return AccessError::Conflict(format!("role slug '{slug}' already in use"));
        }
    }

    AccessError::Database(e)
}
