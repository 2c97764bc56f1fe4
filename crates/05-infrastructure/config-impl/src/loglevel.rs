//! 日志级别配置
//!
//! 组件日志级别的设置、列出和清除。组件参数形如 `<组件名称>#<包名>`，
//! 省略包名时使用默认属性；未指定组件时作用于全局组件。

use kvconfig_abstractions::{ConfigListEntry, ConfigType};
use kvconfig_common::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{error, info, warn};

use crate::component::{DEFAULT_ATTRIBUTE, GLOBAL_COMPONENT};
use crate::manager::ConfigManager;
use crate::path::ATTRIBUTE_ESCAPE;

/// 日志级别
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// 调试
    Debug,
    /// 信息
    Info,
    /// 警告
    Warn,
    /// 错误
    Error,
    /// 致命
    Fatal,
}

impl LogLevel {
    /// 所有日志级别
    pub const ALL: [Self; 5] = [Self::Debug, Self::Info, Self::Warn, Self::Error, Self::Fatal];

    /// 获取规范的大写形式
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        }
    }

    /// 检查字符串是否为有效的日志级别
    pub fn is_valid(value: &str) -> bool {
        value.parse::<Self>().is_ok()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == upper)
            .ok_or_else(|| {
                ConfigError::invalid_attribute_value(
                    "level",
                    s,
                    "允许的值为 DEBUG, INFO, WARN, ERROR, FATAL",
                )
            })
    }
}

/// 日志级别操作目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentTarget {
    /// 组件名称
    pub component_name: String,
    /// 包名（逻辑形式，可包含 `/`）
    pub package_name: String,
}

impl ComponentTarget {
    /// 解析命令行参数
    ///
    /// `rw-core#github.com/opencord/voltha-go` 解析为组件 `rw-core`
    /// 和包名 `github.com/opencord/voltha-go`；`rw-core` 使用默认包名。
    pub fn parse(arg: &str) -> Self {
        match arg.split_once(ATTRIBUTE_ESCAPE) {
            Some((component, package)) if !package.is_empty() => {
                Self::new(component, package)
            }
            Some((component, _)) => Self::new(component, DEFAULT_ATTRIBUTE),
            None => Self::new(arg, DEFAULT_ATTRIBUTE),
        }
    }

    /// 创建操作目标
    pub fn new(component_name: impl Into<String>, package_name: impl Into<String>) -> Self {
        Self {
            component_name: component_name.into(),
            package_name: package_name.into(),
        }
    }

    /// 全局组件的默认包
    pub fn global() -> Self {
        Self::new(GLOBAL_COMPONENT, DEFAULT_ATTRIBUTE)
    }
}

/// 操作状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OperationStatus {
    /// 成功
    Success,
    /// 失败
    Failure,
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.pad("Success"),
            Self::Failure => f.pad("Failure"),
        }
    }
}

/// 单个组件的操作结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogLevelOutput {
    /// 组件名称
    pub component_name: String,
    /// 操作状态
    pub status: OperationStatus,
    /// 失败原因
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LogLevelOutput {
    fn from_result(component_name: &str, result: ConfigResult<()>) -> Self {
        match result {
            Ok(()) => Self {
                component_name: component_name.to_string(),
                status: OperationStatus::Success,
                error: None,
            },
            Err(e) => Self {
                component_name: component_name.to_string(),
                status: OperationStatus::Failure,
                error: Some(e.to_string()),
            },
        }
    }

    /// 操作是否成功
    pub fn is_success(&self) -> bool {
        self.status == OperationStatus::Success
    }
}

/// 日志级别服务
#[derive(Debug, Clone)]
pub struct LogLevelService {
    manager: ConfigManager,
}

impl LogLevelService {
    /// 创建日志级别服务，与传入的管理器共享存储后端
    pub fn new(manager: &ConfigManager) -> Self {
        Self {
            manager: manager.clone(),
        }
    }

    /// 设置日志级别
    ///
    /// 级别无效时整体失败；否则逐个组件独立设置，单个组件失败不影响其他组件。
    pub async fn set(
        &self,
        level: &str,
        targets: &[ComponentTarget],
    ) -> ConfigResult<Vec<LogLevelOutput>> {
        let level: LogLevel = level.parse()?;
        let targets = targets_or_global(targets);

        let mut outputs = Vec::with_capacity(targets.len());
        for target in &targets {
            let result = self.save_level(target, level).await;
            if let Err(e) = &result {
                log_failure("设置", &target.component_name, e);
            }
            outputs.push(LogLevelOutput::from_result(&target.component_name, result));
        }

        info!("设置日志级别 {} 完成, 目标数: {}", level, outputs.len());
        Ok(outputs)
    }

    /// 列出日志级别
    ///
    /// 未指定组件时列出所有已配置日志级别的组件。每个组件的结果叠加全局默认级别，
    /// 无效级别和空包名会被过滤。
    pub async fn list(&self, components: &[String]) -> ConfigResult<Vec<ConfigListEntry>> {
        let components = if components.is_empty() {
            self.manager
                .retrieve_component_list(ConfigType::LogLevel)
                .await?
        } else {
            components.to_vec()
        };

        let global = self
            .manager
            .init_component_config(GLOBAL_COMPONENT, ConfigType::LogLevel)?;

        let mut entries = Vec::new();
        for component_name in &components {
            let config = self
                .manager
                .init_component_config(component_name, ConfigType::LogLevel)?;
            let levels = config
                .retrieve_layered_with(&global, LogLevel::is_valid)
                .await?;

            entries.extend(
                levels
                    .into_iter()
                    .filter(|(package, level)| !package.is_empty() && LogLevel::is_valid(level))
                    .map(|(package, level)| ConfigListEntry::new(component_name, package, level)),
            );
        }

        entries.sort();
        Ok(entries)
    }

    /// 清除日志级别
    ///
    /// 逐个组件独立删除，删除不存在的配置同样视为成功。
    pub async fn clear(&self, targets: &[ComponentTarget]) -> Vec<LogLevelOutput> {
        let targets = targets_or_global(targets);

        let mut outputs = Vec::with_capacity(targets.len());
        for target in &targets {
            let result = match self
                .manager
                .init_component_config(&target.component_name, ConfigType::LogLevel)
            {
                Ok(config) => config.delete(&target.package_name).await,
                Err(e) => Err(e),
            };
            if let Err(e) = &result {
                log_failure("清除", &target.component_name, e);
            }
            outputs.push(LogLevelOutput::from_result(&target.component_name, result));
        }

        outputs
    }

    async fn save_level(&self, target: &ComponentTarget, level: LogLevel) -> ConfigResult<()> {
        let config = self
            .manager
            .init_component_config(&target.component_name, ConfigType::LogLevel)?;
        config.save(&target.package_name, level.as_str()).await
    }
}

/// 存储侧的失败记为错误，其余（例如组件名称无效）记为警告
fn log_failure(action: &str, component_name: &str, e: &ConfigError) {
    if e.is_backend_error() {
        error!("{}组件日志级别失败: {} - {}", action, component_name, e);
    } else {
        warn!("{}组件日志级别失败: {} - {}", action, component_name, e);
    }
}

fn targets_or_global(targets: &[ComponentTarget]) -> Vec<ComponentTarget> {
    if targets.is_empty() {
        vec![ComponentTarget::global()]
    } else {
        targets.to_vec()
    }
}
