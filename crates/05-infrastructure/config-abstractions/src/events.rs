//! 配置变更事件定义

use serde::{Deserialize, Serialize};
use std::fmt;

/// 键值存储原始事件类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum KvEventType {
    /// 键写入
    Put,
    /// 键删除
    Delete,
    /// 与存储的连接断开
    ConnectionDown,
    /// 无法识别的事件
    Unknown,
}

impl fmt::Display for KvEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Put => write!(f, "put"),
            Self::Delete => write!(f, "delete"),
            Self::ConnectionDown => write!(f, "connection-down"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// 键值存储原始监控事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvEvent {
    /// 事件类型
    pub event_type: KvEventType,
    /// 完整键路径
    pub key: String,
    /// 写入后的值（删除及连接事件为空）
    pub value: Option<Vec<u8>>,
}

impl KvEvent {
    /// 创建写入事件
    pub fn put(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            event_type: KvEventType::Put,
            key: key.into(),
            value: Some(value.into()),
        }
    }

    /// 创建删除事件
    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            event_type: KvEventType::Delete,
            key: key.into(),
            value: None,
        }
    }

    /// 创建连接断开事件
    pub fn connection_down(key: impl Into<String>) -> Self {
        Self {
            event_type: KvEventType::ConnectionDown,
            key: key.into(),
            value: None,
        }
    }
}

/// 配置变更类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChangeEventType {
    /// 属性写入
    Put,
    /// 属性删除
    Delete,
}

impl ChangeEventType {
    /// 从原始事件类型转换，连接类和未知事件返回 `None`
    pub fn from_kv(event_type: KvEventType) -> Option<Self> {
        match event_type {
            KvEventType::Put => Some(Self::Put),
            KvEventType::Delete => Some(Self::Delete),
            KvEventType::ConnectionDown | KvEventType::Unknown => None,
        }
    }
}

/// 配置变更事件
///
/// 例如 `ChangeEventType::Put` 与属性 `default`。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigChangeEvent {
    /// 变更类型
    pub change_type: ChangeEventType,
    /// 变更的属性名称
    pub config_attribute: String,
}

impl ConfigChangeEvent {
    /// 创建配置变更事件
    pub fn new(change_type: ChangeEventType, config_attribute: impl Into<String>) -> Self {
        Self {
            change_type,
            config_attribute: config_attribute.into(),
        }
    }
}
