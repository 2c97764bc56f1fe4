//! 配置类别与列表条目定义

use kvconfig_common::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 配置类别
///
/// 每个类别的字符串标识作为路径段持久化在存储中，一经发布不可更名。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ConfigType {
    /// 日志级别
    LogLevel,
    /// Kafka 连接配置
    Kafka,
}

impl ConfigType {
    /// 所有配置类别
    pub const ALL: [Self; 2] = [Self::LogLevel, Self::Kafka];

    /// 获取路径段标识
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LogLevel => "loglevel",
            Self::Kafka => "kafka",
        }
    }
}

impl fmt::Display for ConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|config_type| config_type.as_str() == s)
            .ok_or_else(|| ConfigError::invalid_attribute_value("config_type", s, "未知的配置类别"))
    }
}

/// 跨组件列表条目
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct ConfigListEntry {
    /// 组件名称
    pub component_name: String,
    /// 属性名称
    pub attribute_name: String,
    /// 属性值
    pub value: String,
}

impl ConfigListEntry {
    /// 创建列表条目
    pub fn new(
        component_name: impl Into<String>,
        attribute_name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            component_name: component_name.into(),
            attribute_name: attribute_name.into(),
            value: value.into(),
        }
    }
}
