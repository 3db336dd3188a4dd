//! 统一错误模型
//! 定义访问控制核心的所有错误类型

use thiserror::Error;

/// 访问控制错误类型
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid permission key: {0}")]
    InvalidPermissionKey(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl AccessError {
    /// 获取用户友好的错误消息（不包含敏感信息）
    pub fn user_message(&self) -> String {
        match self {
            AccessError::Database(_) => "Database error occurred".to_string(),
            AccessError::Config(_) => "Configuration error".to_string(),
            AccessError::NotFound(what) => format!("Resource not found: {what}"),
            AccessError::InvalidPermissionKey(key) => {
                format!("Invalid permission key: {key}")
            }
            AccessError::Validation(msg) => msg.clone(),
            AccessError::Conflict(msg) => msg.clone(),
        }
    }

    /// 判断是否为未找到错误
    pub fn is_not_found(&self) -> bool {
        matches!(self, AccessError::NotFound(_))
    }
}

/// 从 config::ConfigError 转换
impl From<config::ConfigError> for AccessError {
    fn from(e: config::ConfigError) -> Self {
        AccessError::Config(e.to_string())
    }
}

/// 从 validator::ValidationErrors 转换
impl From<validator::ValidationErrors> for AccessError {
    fn from(e: validator::ValidationErrors) -> Self {
        AccessError::Validation(e.to_string())
    }
}
