//! # KV Config Common
//!
//! 基于键值存储的组件配置所共享的基础类型。
//!
//! ## 核心组件
//!
//! - [`ConfigError`] - 配置错误类型
//! - [`ConfigResult`] - 配置操作结果别名

pub mod errors;

pub use errors::*;
