//! 键值存储客户端注册表

use kvconfig_abstractions::KvClient;
use kvconfig_common::{ConfigError, ConfigResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::memory::{MemoryKvClient, MEMORY_STORE_TYPE};
use crate::settings::KvStoreSettings;

/// 客户端工厂
pub type KvClientFactory =
    Box<dyn Fn(&KvStoreSettings) -> ConfigResult<Arc<dyn KvClient>> + Send + Sync>;

/// 键值存储客户端注册表
///
/// 按存储类型创建客户端。网络客户端（如 etcd）由上层应用注册。
#[derive(Default)]
pub struct KvClientRegistry {
    factories: HashMap<String, KvClientFactory>,
}

impl std::fmt::Debug for KvClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvClientRegistry")
            .field("store_types", &self.store_types())
            .finish()
    }
}

impl KvClientRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建包含内存存储的注册表
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(MEMORY_STORE_TYPE, |_| {
            Ok(Arc::new(MemoryKvClient::new()) as Arc<dyn KvClient>)
        });
        registry
    }

    /// 注册客户端工厂，同名工厂会被替换
    pub fn register<F>(&mut self, store_type: impl Into<String>, factory: F)
    where
        F: Fn(&KvStoreSettings) -> ConfigResult<Arc<dyn KvClient>> + Send + Sync + 'static,
    {
        let store_type = store_type.into();
        info!("注册键值存储客户端工厂: {}", store_type);
        if self
            .factories
            .insert(store_type.clone(), Box::new(factory))
            .is_some()
        {
            warn!("替换已注册的客户端工厂: {}", store_type);
        }
    }

    /// 按设置中的存储类型创建客户端
    pub fn create(&self, settings: &KvStoreSettings) -> ConfigResult<Arc<dyn KvClient>> {
        let factory = self.factories.get(&settings.store_type).ok_or_else(|| {
            ConfigError::UnsupportedStoreKind {
                kind: settings.store_type.clone(),
            }
        })?;

        debug!(
            "创建键值存储客户端: {} ({})",
            settings.store_type,
            settings.address()
        );
        factory(settings)
    }

    /// 已注册的存储类型
    pub fn store_types(&self) -> Vec<String> {
        let mut store_types: Vec<String> = self.factories.keys().cloned().collect();
        store_types.sort();
        store_types
    }
}
