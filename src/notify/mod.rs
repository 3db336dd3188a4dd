//! 角色变更通知
//! 下游监听者通过注入的 NotificationSink 接收角色增删通知

use crate::models::role::Role;
use crate::models::user::Principal;

/// 角色变更通知接口；即发即弃，核心不消费返回值
pub trait NotificationSink: Send + Sync {
    /// 主体新增角色后触发
    fn role_added(&self, principal: &Principal, roles: &[Role]);

    /// 主体移除角色后触发
    fn role_removed(&self, principal: &Principal, roles: &[Role]);
}

/// 将角色变更写入结构化日志的通知实现
#[derive(Debug, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn role_added(&self, principal: &Principal, roles: &[Role]) {
        let slugs: Vec<&str> = roles.iter().map(|r| r.slug.as_str()).collect();
        tracing::info!(
            principal = %principal.id,
            roles = ?slugs,
            "Roles added"
        );
    }

    fn role_removed(&self, principal: &Principal, roles: &[Role]) {
        let slugs: Vec<&str> = roles.iter().map(|r| r.slug.as_str()).collect();
        tracing::info!(
            principal = %principal.id,
            roles = ?slugs,
            "Roles removed"
        );
    }
}

/// 丢弃所有通知的空实现
#[derive(Debug, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn role_added(&self, _principal: &Principal, _roles: &[Role]) {}

    fn role_removed(&self, _principal: &Principal, _roles: &[Role]) {}
}
