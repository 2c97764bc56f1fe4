//! 配置路径解析
//!
//! 存储中的每个配置键都具有如下形式：
//!
//! ```text
//! <存储路径前缀>/<配置前缀>/<组件名称>/<配置类别>/<属性名称>
//! ```
//!
//! 例如 rw-core 组件的默认日志级别保存在
//! `/service/voltha/config/rw-core/loglevel/default`。

use kvconfig_abstractions::ConfigType;
use kvconfig_common::{ConfigError, ConfigResult};

/// 路径分隔符
pub const PATH_SEPARATOR: char = '/';

/// 属性名中分隔符的转义字符
pub const ATTRIBUTE_ESCAPE: char = '#';

/// 默认配置前缀
pub const DEFAULT_CONFIG_PREFIX: &str = "config";

/// 默认存储路径前缀
pub const DEFAULT_STORE_PATH_PREFIX: &str = "/service/voltha";

/// 生成组件配置的基础路径（不含末尾分隔符）
pub fn resolve_base_path(
    config_prefix: &str,
    component_label: &str,
    config_type: ConfigType,
) -> String {
    format!(
        "{config_prefix}{PATH_SEPARATOR}{component_label}{PATH_SEPARATOR}{}",
        config_type.as_str()
    )
}

/// 在基础路径后追加属性名
pub fn resolve_attribute_path(base_path: &str, attribute: &str) -> String {
    format!("{base_path}{PATH_SEPARATOR}{attribute}")
}

/// 生成跨组件共享的键前缀 `<存储路径前缀>/<配置前缀>/`
pub fn config_key_prefix(store_path_prefix: &str, config_prefix: &str) -> String {
    format!("{store_path_prefix}{PATH_SEPARATOR}{config_prefix}{PATH_SEPARATOR}")
}

/// 从完整键中解析组件名称和属性名称
///
/// 先去掉 `key_prefix`，再按第一次出现的 `/<配置类别>/` 切分，
/// 前半部分为组件名称，后半部分为属性名称。组件名称中含有任一
/// 配置类别段的键视为其他类别的键。
pub fn parse_component_from_key(
    raw_key: &str,
    key_prefix: &str,
    config_type: ConfigType,
) -> ConfigResult<(String, String)> {
    let malformed = || ConfigError::malformed_key(raw_key, config_type.as_str());

    let remainder = raw_key.strip_prefix(key_prefix).ok_or_else(malformed)?;
    let type_segment = format!("{PATH_SEPARATOR}{}{PATH_SEPARATOR}", config_type.as_str());
    let (component, attribute) = remainder.split_once(&type_segment).ok_or_else(malformed)?;

    if component.is_empty() || reserved_segment(component).is_some() {
        return Err(malformed());
    }

    Ok((component.to_string(), attribute.to_string()))
}

/// 将逻辑属性名编码为存储形式（`/` 转为 `#`）
pub fn encode_attribute(attribute: &str) -> String {
    attribute.replace(PATH_SEPARATOR, &ATTRIBUTE_ESCAPE.to_string())
}

/// 将存储形式的属性名解码为逻辑形式（`#` 转为 `/`）
pub fn decode_attribute(attribute: &str) -> String {
    attribute.replace(ATTRIBUTE_ESCAPE, &PATH_SEPARATOR.to_string())
}

/// 校验组件名称
///
/// 名称不能为空，且任何以 `/` 分隔的片段都不能等于任一配置类别标识。
/// 否则按第一次出现切分时，本类别的键可能被解析为其他类别的条目。
pub fn validate_component_label(label: &str, config_type: ConfigType) -> ConfigResult<()> {
    if label.is_empty() {
        return Err(ConfigError::invalid_component_label(label, "组件名称不能为空"));
    }

    if let Some(reserved) = reserved_segment(label) {
        return Err(ConfigError::invalid_component_label(
            label,
            format!("组件名称不能包含配置类别段 {reserved} (当前类别 {config_type})"),
        ));
    }

    Ok(())
}

/// 返回名称中与配置类别标识相同的片段
fn reserved_segment(label: &str) -> Option<ConfigType> {
    label.split(PATH_SEPARATOR).find_map(|segment| {
        ConfigType::ALL
            .into_iter()
            .find(|config_type| config_type.as_str() == segment)
    })
}
