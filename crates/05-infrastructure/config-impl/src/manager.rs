//! 配置管理器实现

use kvconfig_abstractions::{ConfigType, KvClient};
use kvconfig_common::ConfigResult;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

use crate::backend::Backend;
use crate::component::{ComponentConfig, GLOBAL_COMPONENT};
use crate::path::{config_key_prefix, parse_component_from_key, validate_component_label, PATH_SEPARATOR};
use crate::registry::KvClientRegistry;
use crate::settings::KvStoreSettings;

/// 配置管理器
///
/// 持有唯一的存储后端和共享的配置前缀，负责创建 [`ComponentConfig`]。
/// 克隆只复制内部状态的 `Arc`，各组件配置共享同一个存储后端，
/// 可以移动到独立的任务中使用。
/// 构造时不做任何 I/O；进程退出前由调用方调用 [`ConfigManager::close`]。
#[derive(Debug, Clone)]
pub struct ConfigManager {
    inner: Arc<ManagerInner>,
}

#[derive(Debug)]
struct ManagerInner {
    backend: Backend,
    config_prefix: String,
    watch_buffer: usize,
}

impl ConfigManager {
    /// 创建新的配置管理器
    pub fn new(client: Arc<dyn KvClient>, settings: &KvStoreSettings) -> Self {
        info!(
            "创建配置管理器: {} ({}), 路径前缀 {}",
            settings.store_type,
            settings.address(),
            settings.path_prefix
        );

        Self {
            inner: Arc::new(ManagerInner {
                backend: Backend::new(client, settings),
                config_prefix: settings.config_prefix.clone(),
                watch_buffer: settings.watch_buffer.max(1),
            }),
        }
    }

    /// 通过客户端注册表创建配置管理器
    pub fn from_registry(
        registry: &KvClientRegistry,
        settings: &KvStoreSettings,
    ) -> ConfigResult<Self> {
        settings.validate()?;
        let client = registry.create(settings)?;
        Ok(Self::new(client, settings))
    }

    /// 创建组件配置
    pub fn init_component_config(
        &self,
        component_label: &str,
        config_type: ConfigType,
    ) -> ConfigResult<ComponentConfig> {
        validate_component_label(component_label, config_type)?;
        Ok(ComponentConfig::new(self.clone(), component_label, config_type))
    }

    /// 获取某配置类别下已有配置的组件名称（去重并排序）
    pub async fn retrieve_component_list(&self, config_type: ConfigType) -> ConfigResult<Vec<String>> {
        let config_prefix = format!("{}{PATH_SEPARATOR}", self.inner.config_prefix);
        debug!("获取组件列表: {} ({})", config_prefix, config_type);

        let data = self.inner.backend.list(&config_prefix).await?;

        let key_prefix = config_key_prefix(self.inner.backend.path_prefix(), &self.inner.config_prefix);
        let components: BTreeSet<String> = data
            .keys()
            .filter_map(|key| parse_component_from_key(key, &key_prefix, config_type).ok())
            .map(|(component, _)| component)
            .collect();

        Ok(components.into_iter().collect())
    }

    /// 获取组件叠加全局默认值后的配置
    pub async fn retrieve_component_config(
        &self,
        component_label: &str,
        config_type: ConfigType,
    ) -> ConfigResult<HashMap<String, String>> {
        let component = self.init_component_config(component_label, config_type)?;
        let global = self.init_component_config(GLOBAL_COMPONENT, config_type)?;
        component.retrieve_layered(&global).await
    }

    /// 关闭存储后端
    ///
    /// 关闭对所有克隆及其创建的组件配置生效，之后的请求返回
    /// [`ConfigError::BackendUnavailable`](kvconfig_common::ConfigError::BackendUnavailable)。
    pub async fn close(self) {
        info!("关闭配置管理器");
        self.inner.backend.close().await;
    }

    /// 存储后端
    pub fn backend(&self) -> &Backend {
        &self.inner.backend
    }

    /// 配置前缀
    pub fn config_prefix(&self) -> &str {
        &self.inner.config_prefix
    }

    /// 监控事件输出通道容量
    pub fn watch_buffer(&self) -> usize {
        self.inner.watch_buffer
    }
}
