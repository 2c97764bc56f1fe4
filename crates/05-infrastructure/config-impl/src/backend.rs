//! 键值存储后端适配器

use kvconfig_abstractions::{KvClient, KvEvent};
use kvconfig_common::{ConfigError, ConfigResult};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::path::PATH_SEPARATOR;
use crate::settings::KvStoreSettings;

/// 键值存储后端
///
/// 对外部客户端的薄封装：保存连接参数和路径前缀，
/// 所有键在发送给客户端前都会拼接上路径前缀。
pub struct Backend {
    client: Arc<dyn KvClient>,
    store_type: String,
    host: String,
    port: u16,
    timeout: Duration,
    path_prefix: String,
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("client", &self.client.name())
            .field("store_type", &self.store_type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("timeout", &self.timeout)
            .field("path_prefix", &self.path_prefix)
            .finish()
    }
}

impl Backend {
    /// 创建新的后端
    pub fn new(client: Arc<dyn KvClient>, settings: &KvStoreSettings) -> Self {
        Self {
            client,
            store_type: settings.store_type.clone(),
            host: settings.host.clone(),
            port: settings.port,
            timeout: settings.timeout(),
            path_prefix: settings.path_prefix.clone(),
        }
    }

    /// 拼接完整键路径
    pub fn make_path(&self, key: &str) -> String {
        format!("{}{PATH_SEPARATOR}{key}", self.path_prefix)
    }

    /// 写入键值
    pub async fn put(&self, key: &str, value: &str) -> ConfigResult<()> {
        let path = self.make_path(key);
        debug!("写入键: {}", path);
        self.with_timeout("put", &path, self.client.put(&path, value.as_bytes()))
            .await
    }

    /// 删除键
    pub async fn delete(&self, key: &str) -> ConfigResult<()> {
        let path = self.make_path(key);
        debug!("删除键: {}", path);
        self.with_timeout("delete", &path, self.client.delete(&path))
            .await
    }

    /// 按前缀列出键值
    pub async fn list(&self, key: &str) -> ConfigResult<HashMap<String, Vec<u8>>> {
        let path = self.make_path(key);
        debug!("列出键前缀: {}", path);
        self.with_timeout("list", &path, self.client.list(&path))
            .await
    }

    /// 创建子键监控
    pub async fn create_watch_for_sub_keys(
        &self,
        key: &str,
    ) -> ConfigResult<mpsc::Receiver<KvEvent>> {
        let path = self.make_path(key);
        debug!("创建子键监控: {}", path);
        self.with_timeout("watch", &path, self.client.watch(&path))
            .await
    }

    /// 关闭客户端连接
    pub async fn close(&self) {
        debug!("关闭键值存储客户端: {}", self.client.name());
        self.client.close().await;
    }

    async fn with_timeout<T>(
        &self,
        operation: &str,
        path: &str,
        request: impl Future<Output = ConfigResult<T>>,
    ) -> ConfigResult<T> {
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                error!("键值存储 {} 失败: {} - {}", operation, path, e);
                Err(e)
            }
            Err(_) => {
                error!("键值存储 {} 超时: {} ({:?})", operation, path, self.timeout);
                Err(ConfigError::backend_unavailable(format!(
                    "{operation} {path} 超时 ({:?})",
                    self.timeout
                )))
            }
        }
    }

    /// 存储路径前缀
    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }

    /// 存储类型
    pub fn store_type(&self) -> &str {
        &self.store_type
    }

    /// 存储地址 `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 请求超时时间
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}
