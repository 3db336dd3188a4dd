//! Principal store (主体数据访问)

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::AccessError;
use crate::models::user::{NewPrincipal, Principal};
use crate::store::PrincipalStore;

pub struct PgPrincipals {
    db: PgPool,
}

impl PgPrincipals {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 创建主体
    pub async fn create(&self, req: &NewPrincipal) -> Result<Principal, AccessError> {
        req.validate()?;

        let principal = sqlx::query_as::<_, Principal>(
            r#"
            INSERT INTO users (username, email, permissions)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&req.username)
        .bind(&req.email)
        .bind(Json(&req.permissions))
        .fetch_one(&self.db)
        .await?;

        tracing::info!(principal = %principal.id, username = %principal.username, "Principal created");
        Ok(principal)
    }

    /// 替换主体自身的权限覆盖集（整体替换）
    pub async fn replace_permissions(
        &self,
        id: Uuid,
        permissions: &crate::models::permission::PermissionSet,
    ) -> Result<Option<Principal>, AccessError> {
        let principal = sqlx::query_as::<_, Principal>(
            r#"
            UPDATE users
            SET permissions = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(Json(permissions))
        .fetch_optional(&self.db)
        .await?;

        Ok(principal)
    }
}

#[async_trait]
impl PrincipalStore for PgPrincipals {
    async fn find(&self, id: Uuid) -> Result<Option<Principal>, AccessError> {
        let principal = sqlx::query_as::<_, Principal>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(principal)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AccessError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
