//! 键值存储客户端抽象接口

use async_trait::async_trait;
use kvconfig_common::ConfigResult;
use std::collections::HashMap;
use tokio::sync::mpsc;

use crate::events::KvEvent;

/// 键值存储客户端 trait
///
/// 由外部网络客户端（如 etcd）实现。所有键均为完整路径，
/// 客户端自身负责连接管理和线程安全。
#[async_trait]
pub trait KvClient: Send + Sync {
    /// 写入键值（覆盖已有值）
    async fn put(&self, key: &str, value: &[u8]) -> ConfigResult<()>;

    /// 删除键，键不存在时不报错
    async fn delete(&self, key: &str) -> ConfigResult<()>;

    /// 按前缀列出所有键值，返回完整键到值的映射
    async fn list(&self, prefix: &str) -> ConfigResult<HashMap<String, Vec<u8>>>;

    /// 监控前缀下所有子键的变更
    ///
    /// 返回的事件流在断开连接或取消订阅时由客户端关闭。
    async fn watch(&self, prefix: &str) -> ConfigResult<mpsc::Receiver<KvEvent>>;

    /// 关闭客户端连接
    async fn close(&self);

    /// 获取客户端名称
    fn name(&self) -> &str;
}
