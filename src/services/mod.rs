//! 服务层

pub mod access;

pub use access::{AccessService, UserAccess};
