//! 错误类型定义

use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("键值存储不可用: {message}")]
    BackendUnavailable { message: String },

    #[error("键值存储拒绝写入: {key}, 原因: {message}")]
    WriteRejected { key: String, message: String },

    #[error("配置键格式错误: {key} (缺少配置类型段 {config_type})")]
    MalformedKey { key: String, config_type: String },

    #[error("不支持的键值存储类型: {kind}")]
    UnsupportedStoreKind { kind: String },

    #[error("配置值无效: {attribute} = {value}, 原因: {reason}")]
    InvalidAttributeValue {
        attribute: String,
        value: String,
        reason: String,
    },

    #[error("组件名称无效: {label:?}, 原因: {reason}")]
    InvalidComponentLabel { label: String, reason: String },

    #[error("存储设置加载失败: {source}")]
    SettingsError {
        #[from]
        source: config::ConfigError,
    },
}

impl ConfigError {
    /// 创建存储不可用错误
    pub fn backend_unavailable(message: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            message: message.into(),
        }
    }

    /// 创建写入被拒绝错误
    pub fn write_rejected(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WriteRejected {
            key: key.into(),
            message: message.into(),
        }
    }

    /// 创建键格式错误
    pub fn malformed_key(key: impl Into<String>, config_type: impl Into<String>) -> Self {
        Self::MalformedKey {
            key: key.into(),
            config_type: config_type.into(),
        }
    }

    /// 创建配置值无效错误
    pub fn invalid_attribute_value(
        attribute: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidAttributeValue {
            attribute: attribute.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// 创建组件名称无效错误
    pub fn invalid_component_label(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidComponentLabel {
            label: label.into(),
            reason: reason.into(),
        }
    }

    /// 是否为存储侧错误（连接失败或写入被拒绝）
    pub fn is_backend_error(&self) -> bool {
        matches!(
            self,
            Self::BackendUnavailable { .. } | Self::WriteRejected { .. }
        )
    }
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
