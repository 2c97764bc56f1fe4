//! # KV Config Implementation
//!
//! 基于层级键值存储的组件配置管理实现。
//!
//! ## 主要组件
//!
//! - [`ConfigManager`] - 配置管理器，持有存储后端并创建组件配置
//! - [`ComponentConfig`] - 单个组件某一配置类别的读写与监控
//! - [`ConfigWatch`] - 类型化的配置变更事件流
//! - [`Backend`] - 键值存储后端适配器
//! - [`KvClientRegistry`] - 按存储类型创建客户端
//! - [`MemoryKvClient`] - 进程内键值存储客户端
//! - [`LogLevelService`] - 日志级别的设置、列出和清除
//!
//! ## 示例
//!
//! ```rust,no_run
//! use kvconfig_abstractions::ConfigType;
//! use kvconfig_impl::{ConfigManager, KvClientRegistry, KvStoreSettings};
//!
//! # async fn run() -> kvconfig_common::ConfigResult<()> {
//! let settings = KvStoreSettings::default().with_store_type("memory");
//! let manager = ConfigManager::from_registry(&KvClientRegistry::with_defaults(), &settings)?;
//!
//! let config = manager.init_component_config("rw-core", ConfigType::LogLevel)?;
//! config.save("default", "DEBUG").await?;
//!
//! let mut watch = config.monitor().await?;
//! while let Some(event) = watch.recv().await {
//!     println!("{:?} {}", event.change_type, event.config_attribute);
//! }
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod component;
pub mod loglevel;
pub mod manager;
pub mod memory;
pub mod path;
pub mod registry;
pub mod settings;
pub mod watcher;

pub use backend::*;
pub use component::*;
pub use loglevel::*;
pub use manager::*;
pub use memory::*;
pub use registry::*;
pub use settings::*;
pub use watcher::*;
