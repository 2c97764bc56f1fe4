//! 键值存储连接设置

use kvconfig_common::{ConfigError, ConfigResult};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error};

use crate::path::{DEFAULT_CONFIG_PREFIX, DEFAULT_STORE_PATH_PREFIX};

/// 环境变量前缀
pub const ENV_PREFIX: &str = "KVCONFIG";

/// 键值存储连接设置
///
/// 显式传入 [`crate::ConfigManager`]，不依赖任何全局默认值。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KvStoreSettings {
    /// 存储类型，例如 `etcd`
    pub store_type: String,
    /// 主机地址
    pub host: String,
    /// 端口
    pub port: u16,
    /// 超时时间（秒）
    pub timeout_secs: u64,
    /// 存储路径前缀
    pub path_prefix: String,
    /// 配置前缀
    pub config_prefix: String,
    /// 监控事件输出通道容量
    pub watch_buffer: usize,
}

impl Default for KvStoreSettings {
    fn default() -> Self {
        Self {
            store_type: "etcd".to_string(),
            host: "127.0.0.1".to_string(),
            port: 2379,
            timeout_secs: 5,
            path_prefix: DEFAULT_STORE_PATH_PREFIX.to_string(),
            config_prefix: DEFAULT_CONFIG_PREFIX.to_string(),
            watch_buffer: 1,
        }
    }
}

impl KvStoreSettings {
    /// 加载设置
    ///
    /// 依次叠加默认值、可选的配置文件以及 `KVCONFIG_*` 环境变量。
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            debug!("加载存储设置文件: {}", path.display());
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .and_then(|config| config.try_deserialize::<Self>())
            .map_err(|e| {
                error!("存储设置加载失败: {}", e);
                ConfigError::from(e)
            })?;

        settings.validate()?;
        Ok(settings)
    }

    /// 使用指定存储类型
    pub fn with_store_type(mut self, store_type: impl Into<String>) -> Self {
        self.store_type = store_type.into();
        self
    }

    /// 校验设置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.watch_buffer == 0 {
            return Err(ConfigError::invalid_attribute_value(
                "watch_buffer",
                "0",
                "监控通道容量至少为 1",
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid_attribute_value(
                "timeout_secs",
                "0",
                "超时时间必须大于 0",
            ));
        }
        Ok(())
    }

    /// 存储地址 `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 超时时间
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
