//! # KV Config Abstractions
//!
//! 组件配置管理的抽象层，定义键值存储客户端接口和配置事件模型。
//!
//! ## 核心接口
//!
//! - [`KvClient`] - 外部键值存储客户端接口
//! - [`KvEvent`] - 键值存储原始监控事件
//! - [`ConfigType`] - 配置类别
//! - [`ConfigChangeEvent`] - 按属性划分的配置变更事件

pub mod client;
pub mod events;
pub mod model;

pub use client::*;
pub use events::*;
pub use model::*;
