//! 组件配置实现

use kvconfig_abstractions::{ConfigListEntry, ConfigType};
use kvconfig_common::ConfigResult;
use std::collections::HashMap;
use tracing::{debug, error};

use crate::manager::ConfigManager;
use crate::path::{
    config_key_prefix, decode_attribute, encode_attribute, parse_component_from_key,
    resolve_attribute_path, resolve_base_path, PATH_SEPARATOR,
};
use crate::watcher::ConfigWatch;

/// 全局组件名称，作为各组件的默认值层
pub const GLOBAL_COMPONENT: &str = "global";

/// 默认属性名称
pub const DEFAULT_ATTRIBUTE: &str = "default";

/// 组件配置
///
/// 表示某个组件的一类配置，例如 rw-core 的日志级别配置。
/// 同一组件的不同配置类别对应不同的 `ComponentConfig`。
///
/// 配置以键值对形式保存在如下路径下：
/// `<存储路径前缀>/<配置前缀>/<组件名称>/<配置类别>/`
///
/// 句柄持有管理器内部状态的共享引用，可以克隆并移动到其他任务中。
#[derive(Debug, Clone)]
pub struct ComponentConfig {
    manager: ConfigManager,
    component_label: String,
    config_type: ConfigType,
}

impl ComponentConfig {
    pub(crate) fn new(
        manager: ConfigManager,
        component_label: impl Into<String>,
        config_type: ConfigType,
    ) -> Self {
        Self {
            manager,
            component_label: component_label.into(),
            config_type,
        }
    }

    /// 组件名称
    pub fn component_label(&self) -> &str {
        &self.component_label
    }

    /// 配置类别
    pub const fn config_type(&self) -> ConfigType {
        self.config_type
    }

    /// 配置基础路径（不含存储路径前缀）
    pub fn make_config_path(&self) -> String {
        resolve_base_path(
            self.manager.config_prefix(),
            &self.component_label,
            self.config_type,
        )
    }

    fn sub_key_prefix(&self) -> String {
        format!("{}{PATH_SEPARATOR}", self.make_config_path())
    }

    fn full_key_prefix(&self) -> String {
        self.manager.backend().make_path(&self.sub_key_prefix())
    }

    /// 保存属性值，已有值会被覆盖
    pub async fn save(&self, attribute: &str, value: &str) -> ConfigResult<()> {
        let key = resolve_attribute_path(&self.make_config_path(), &encode_attribute(attribute));
        debug!("保存配置: {} = {}", key, value);

        self.manager.backend().put(&key, value).await.map_err(|e| {
            error!("保存配置失败: {} - {}", key, e);
            e
        })
    }

    /// 删除属性，属性不存在时同样返回成功
    pub async fn delete(&self, attribute: &str) -> ConfigResult<()> {
        let key = resolve_attribute_path(&self.make_config_path(), &encode_attribute(attribute));
        debug!("删除配置: {}", key);

        self.manager.backend().delete(&key).await.map_err(|e| {
            error!("删除配置失败: {} - {}", key, e);
            e
        })
    }

    /// 获取本组件该类别下的所有属性
    ///
    /// 例如键 `.../rw-core/loglevel/default` 与值 `"DEBUG"`
    /// 会得到 `default -> DEBUG`。
    pub async fn retrieve_all(&self) -> ConfigResult<HashMap<String, String>> {
        let sub_key_prefix = self.sub_key_prefix();
        debug!("获取组件配置: {}", sub_key_prefix);

        let data = self.manager.backend().list(&sub_key_prefix).await?;

        let full_key_prefix = self.full_key_prefix();
        Ok(data
            .into_iter()
            .map(|(key, value)| {
                let attribute = key.strip_prefix(&full_key_prefix).unwrap_or(&key);
                (decode_attribute(attribute), trim_value(&value))
            })
            .collect())
    }

    /// 获取所有组件在该配置类别下的属性列表
    ///
    /// 无法按本配置类别解析的键（例如其他类别的配置）会被跳过。
    pub async fn retrieve_list(&self) -> ConfigResult<Vec<ConfigListEntry>> {
        let config_prefix = format!("{}{PATH_SEPARATOR}", self.manager.config_prefix());
        debug!("获取配置列表: {}", config_prefix);

        let data = self.manager.backend().list(&config_prefix).await?;

        let key_prefix = config_key_prefix(
            self.manager.backend().path_prefix(),
            self.manager.config_prefix(),
        );
        let mut entries: Vec<ConfigListEntry> = data
            .into_iter()
            .filter_map(|(key, value)| {
                match parse_component_from_key(&key, &key_prefix, self.config_type) {
                    Ok((component, attribute)) => Some(ConfigListEntry::new(
                        component,
                        decode_attribute(&attribute),
                        trim_value(&value),
                    )),
                    Err(e) => {
                        debug!("跳过无法解析的键: {}", e);
                        None
                    }
                }
            })
            .collect();

        entries.sort();
        Ok(entries)
    }

    /// 获取叠加全局默认值后的属性
    ///
    /// 若本组件没有设置默认属性，则使用全局组件的默认属性。
    pub async fn retrieve_layered(
        &self,
        global: &ComponentConfig,
    ) -> ConfigResult<HashMap<String, String>> {
        self.retrieve_layered_with(global, |_| true).await
    }

    /// 获取叠加全局默认值后的属性，只采用通过 `accept` 校验的全局值
    pub async fn retrieve_layered_with<F>(
        &self,
        global: &ComponentConfig,
        accept: F,
    ) -> ConfigResult<HashMap<String, String>>
    where
        F: Fn(&str) -> bool + Send,
    {
        let mut attributes = self.retrieve_all().await?;

        if global.component_label == self.component_label
            && global.config_type == self.config_type
        {
            return Ok(attributes);
        }

        let global_attributes = global.retrieve_all().await?;
        if let Some(global_default) = global_attributes.get(DEFAULT_ATTRIBUTE) {
            if accept(global_default) {
                attributes
                    .entry(DEFAULT_ATTRIBUTE.to_string())
                    .or_insert_with(|| global_default.clone());
            } else {
                debug!("忽略无效的全局默认值: {}", global_default);
            }
        }

        Ok(attributes)
    }

    /// 监控本组件该类别下所有属性的变更
    ///
    /// 例如监控 `.../rw-core/loglevel/` 下的写入和删除事件。
    pub async fn monitor(&self) -> ConfigResult<ConfigWatch> {
        let sub_key_prefix = self.sub_key_prefix();
        debug!("监控配置变更: {}", sub_key_prefix);

        let raw = self
            .manager
            .backend()
            .create_watch_for_sub_keys(&sub_key_prefix)
            .await?;

        Ok(ConfigWatch::spawn(
            raw,
            self.full_key_prefix(),
            self.manager.watch_buffer(),
        ))
    }
}

/// 去掉存储值两端的引号
fn trim_value(value: &[u8]) -> String {
    String::from_utf8_lossy(value).trim_matches('"').to_string()
}
