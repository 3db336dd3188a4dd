//! 平台访问控制核心库
//! 提供角色、权限与主体（Principal）授权模型及内容实体网格

pub mod config;
pub mod db;
pub mod error;
pub mod grid;
pub mod models;
pub mod notify;
pub mod services;
pub mod store;
pub mod telemetry;
