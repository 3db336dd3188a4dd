//! 测试公共模块
//! 提供内存存储环境和测试辅助函数

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use platform_access::config::AccessConfig;
use platform_access::error::AccessError;
use platform_access::models::{NewPrincipal, NewRole, PermissionSet, Principal, Role};
use platform_access::notify::NotificationSink;
use platform_access::services::AccessService;
use platform_access::store::{
    MemoryPrincipals, MemoryRoleBindings, MemoryRoleStore, PrincipalStore, RoleBindings,
    RoleStore,
};

/// 记录到的一次通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifiedEvent {
    pub kind: &'static str,
    pub principal_id: Uuid,
    pub role_slugs: Vec<String>,
}

/// 记录所有通知的测试 sink
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<NotifiedEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<NotifiedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    fn record(&self, kind: &'static str, principal: &Principal, roles: &[Role]) {
        self.events.lock().unwrap().push(NotifiedEvent {
            kind,
            principal_id: principal.id,
            role_slugs: roles.iter().map(|r| r.slug.clone()).collect(),
        });
    }
}

impl NotificationSink for RecordingSink {
    fn role_added(&self, principal: &Principal, roles: &[Role]) {
        self.record("added", principal, roles);
    }

    fn role_removed(&self, principal: &Principal, roles: &[Role]) {
        self.record("removed", principal, roles);
    }
}

/// 在附加指定角色时失败的关联存储，用于回滚测试
pub struct FailingBindings {
    inner: MemoryRoleBindings,
    fail_attach_role: i64,
}

impl FailingBindings {
    pub fn new(fail_attach_role: i64) -> Self {
        Self {
            inner: MemoryRoleBindings::new(),
            fail_attach_role,
        }
    }
}

#[async_trait]
impl RoleBindings for FailingBindings {
    async fn attach(&self, principal_id: Uuid, role_id: i64) -> Result<(), AccessError> {
        if role_id == self.fail_attach_role {
            return Err(AccessError::Database(sqlx::Error::PoolClosed));
        }
        self.inner.attach(principal_id, role_id).await
    }

    async fn detach(&self, principal_id: Uuid, role_id: i64) -> Result<u64, AccessError> {
        self.inner.detach(principal_id, role_id).await
    }

    async fn detach_all(&self, principal_id: Uuid) -> Result<u64, AccessError> {
        self.inner.detach_all(principal_id).await
    }

    async fn list(&self, principal_id: Uuid) -> Result<Vec<i64>, AccessError> {
        self.inner.list(principal_id).await
    }
}

/// 内存测试环境
pub struct TestEnv {
    pub roles: Arc<MemoryRoleStore>,
    pub bindings: Arc<dyn RoleBindings>,
    pub principals: Arc<MemoryPrincipals>,
    pub sink: Arc<RecordingSink>,
    pub service: AccessService,
}

/// 创建默认测试环境（硬删除）
pub fn setup() -> TestEnv {
    setup_with(MemoryRoleBindings::new(), false)
}

/// 创建指定关联存储与软删除策略的测试环境
pub fn setup_with(bindings: impl RoleBindings + 'static, soft_deletes: bool) -> TestEnv {
    let roles = Arc::new(MemoryRoleStore::new());
    let bindings: Arc<dyn RoleBindings> = Arc::new(bindings);
    let principals = Arc::new(MemoryPrincipals::new());
    let sink = Arc::new(RecordingSink::default());

    let service = AccessService::new(
        Arc::clone(&principals) as Arc<dyn PrincipalStore>,
        Arc::clone(&roles) as Arc<dyn RoleStore>,
        Arc::clone(&bindings),
        Arc::clone(&sink) as Arc<dyn NotificationSink>,
        &AccessConfig { soft_deletes },
    );

    TestEnv {
        roles,
        bindings,
        principals,
        sink,
        service,
    }
}

/// 从 (键, 是否授予) 对构建权限集
pub fn permission_set(pairs: &[(&str, bool)]) -> PermissionSet {
    PermissionSet::try_from_iter(pairs.iter().map(|(k, v)| (k.to_string(), *v)))
        .expect("valid permission keys")
}

/// 创建测试角色
pub async fn create_role(env: &TestEnv, slug: &str, pairs: &[(&str, bool)]) -> Role {
    env.roles
        .create(&NewRole {
            slug: slug.to_string(),
            name: slug.to_string(),
            permissions: permission_set(pairs),
        })
        .await
        .expect("Failed to create test role")
}

/// 创建测试主体
pub async fn create_principal(env: &TestEnv, username: &str, pairs: &[(&str, bool)]) -> Principal {
    env.principals
        .create(&NewPrincipal {
            username: username.to_string(),
            email: None,
            permissions: permission_set(pairs),
        })
        .await
        .expect("Failed to create test principal")
}
