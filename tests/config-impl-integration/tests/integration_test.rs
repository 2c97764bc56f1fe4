//! 组件配置管理集成测试
//!
//! 通过公共 API 验证键布局、全局默认值叠加、变更监控和批量日志级别操作。

use config_impl_integration_tests::FaultyKvClient;
use futures::StreamExt;
use kvconfig_abstractions::{ChangeEventType, ConfigType, KvClient, KvEvent};
use kvconfig_common::ConfigError;
use kvconfig_impl::{
    ComponentTarget, ConfigManager, KvClientRegistry, KvStoreSettings, LogLevelService,
    MemoryKvClient, WatchState, MEMORY_STORE_TYPE,
};
use std::sync::Arc;
use std::time::Duration;

fn memory_settings() -> KvStoreSettings {
    KvStoreSettings::default().with_store_type(MEMORY_STORE_TYPE)
}

fn manager_with(client: Arc<dyn KvClient>) -> ConfigManager {
    ConfigManager::new(client, &memory_settings())
}

#[tokio::test]
async fn test_save_and_retrieve_round_trip() -> anyhow::Result<()> {
    let client = Arc::new(MemoryKvClient::new());
    let manager = manager_with(client.clone());

    let config = manager.init_component_config("rw-core", ConfigType::LogLevel)?;
    config.save("default", "DEBUG").await?;
    config.save("github.com/opencord/voltha-go", "WARN").await?;

    // 属性中的 '/' 在存储中以 '#' 表示
    let stored = client.list("/service/voltha/config/rw-core/loglevel/").await?;
    assert!(stored.contains_key("/service/voltha/config/rw-core/loglevel/default"));
    assert!(stored.contains_key(
        "/service/voltha/config/rw-core/loglevel/github.com#opencord#voltha-go"
    ));

    let values = config.retrieve_all().await?;
    assert_eq!(values.len(), 2);
    assert_eq!(values.get("default").map(String::as_str), Some("DEBUG"));
    assert_eq!(
        values.get("github.com/opencord/voltha-go").map(String::as_str),
        Some("WARN")
    );
    Ok(())
}

#[tokio::test]
async fn test_quoted_values_are_trimmed() -> anyhow::Result<()> {
    let client = Arc::new(MemoryKvClient::new());
    let manager = manager_with(client.clone());

    client
        .put("/service/voltha/config/ofagent/loglevel/default", b"\"ERROR\"")
        .await?;

    let values = manager
        .init_component_config("ofagent", ConfigType::LogLevel)?
        .retrieve_all()
        .await?;
    assert_eq!(values.get("default").map(String::as_str), Some("ERROR"));
    Ok(())
}

#[tokio::test]
async fn test_delete_is_idempotent() -> anyhow::Result<()> {
    let manager = manager_with(Arc::new(MemoryKvClient::new()));
    let config = manager.init_component_config("rw-core", ConfigType::LogLevel)?;

    config.save("default", "INFO").await?;
    config.delete("default").await?;
    config.delete("default").await?;
    config.delete("never-written").await?;

    assert!(config.retrieve_all().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_component_value_shadows_global_default() -> anyhow::Result<()> {
    let manager = manager_with(Arc::new(MemoryKvClient::new()));

    let global = manager.init_component_config("global", ConfigType::LogLevel)?;
    global.save("default", "INFO").await?;
    global.save("shared-pkg", "WARN").await?;

    let component = manager.init_component_config("adapter", ConfigType::LogLevel)?;
    component.save("default", "DEBUG").await?;

    let layered = manager
        .retrieve_component_config("adapter", ConfigType::LogLevel)
        .await?;
    assert_eq!(layered.get("default").map(String::as_str), Some("DEBUG"), "组件值应覆盖全局值");
    assert!(!layered.contains_key("shared-pkg"), "只叠加全局默认属性");

    let untouched = manager
        .retrieve_component_config("nobody", ConfigType::LogLevel)
        .await?;
    assert_eq!(untouched.get("default").map(String::as_str), Some("INFO"));
    Ok(())
}

#[tokio::test]
async fn test_config_types_are_isolated() -> anyhow::Result<()> {
    let manager = manager_with(Arc::new(MemoryKvClient::new()));

    manager
        .init_component_config("rw-core", ConfigType::Kafka)?
        .save("broker", "kafka:9092")
        .await?;
    manager
        .init_component_config("rw-core", ConfigType::LogLevel)?
        .save("default", "INFO")
        .await?;

    let log_levels = manager
        .init_component_config("rw-core", ConfigType::LogLevel)?
        .retrieve_all()
        .await?;
    assert_eq!(log_levels.len(), 1);
    assert!(!log_levels.contains_key("broker"));

    let kafka_components = manager.retrieve_component_list(ConfigType::Kafka).await?;
    assert_eq!(kafka_components, vec!["rw-core".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_watch_delivers_events_in_order() -> anyhow::Result<()> {
    let client = Arc::new(MemoryKvClient::new());
    let manager = manager_with(client.clone());
    let config = manager.init_component_config("rw-core", ConfigType::LogLevel)?;

    let mut watch = config.monitor().await?;
    assert_eq!(watch.state(), WatchState::Watching);

    let writer = manager.init_component_config("rw-core", ConfigType::LogLevel)?;
    writer.save("pkgA/pkgB", "DEBUG").await?;
    writer.save("default", "INFO").await?;
    writer.delete("default").await?;

    let first = watch.recv().await.expect("应收到第一个事件");
    assert_eq!(first.change_type, ChangeEventType::Put);
    assert_eq!(first.config_attribute, "pkgA/pkgB");

    let second = watch.recv().await.expect("应收到第二个事件");
    assert_eq!(second.change_type, ChangeEventType::Put);
    assert_eq!(second.config_attribute, "default");

    let third = watch.recv().await.expect("应收到第三个事件");
    assert_eq!(third.change_type, ChangeEventType::Delete);
    assert_eq!(third.config_attribute, "default");

    watch.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_watch_skips_connection_events() -> anyhow::Result<()> {
    let client = Arc::new(MemoryKvClient::new());
    let manager = manager_with(client.clone());
    let config = manager.init_component_config("ofagent", ConfigType::LogLevel)?;

    let mut watch = config.monitor().await?;

    client.emit(&KvEvent::connection_down("/service/voltha/config/ofagent/loglevel/"));
    config.save("default", "WARN").await?;

    let event = watch.recv().await.expect("应收到写入事件");
    assert_eq!(event.change_type, ChangeEventType::Put);
    assert_eq!(event.config_attribute, "default");

    watch.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_watch_ignores_other_components() -> anyhow::Result<()> {
    let manager = manager_with(Arc::new(MemoryKvClient::new()));
    let watched = manager.init_component_config("rw-core", ConfigType::LogLevel)?;
    let other = manager.init_component_config("ofagent", ConfigType::LogLevel)?;

    let mut watch = watched.monitor().await?;
    other.save("default", "ERROR").await?;
    watched.save("default", "DEBUG").await?;

    let event = watch.recv().await.expect("应收到被监控组件的事件");
    assert_eq!(event.config_attribute, "default");
    assert_eq!(watch.key_prefix(), "/service/voltha/config/rw-core/loglevel/");

    watch.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_watch_stream_ends_when_store_disconnects() -> anyhow::Result<()> {
    let client = Arc::new(MemoryKvClient::new());
    let manager = manager_with(client.clone());
    let config = manager.init_component_config("rw-core", ConfigType::LogLevel)?;

    let watch = config.monitor().await?;
    config.save("default", "INFO").await?;
    client.disconnect_watchers();

    let events: Vec<_> = tokio::time::timeout(Duration::from_secs(5), watch.collect::<Vec<_>>())
        .await
        .expect("存储断开后事件流应结束");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].config_attribute, "default");
    Ok(())
}

#[tokio::test]
async fn test_shutdown_idle_watch() -> anyhow::Result<()> {
    let client = Arc::new(MemoryKvClient::new());
    let manager = manager_with(client.clone());
    let config = manager.init_component_config("rw-core", ConfigType::LogLevel)?;

    let watch = config.monitor().await?;
    let token = watch.cancellation_token();

    tokio::time::timeout(Duration::from_secs(5), watch.shutdown())
        .await
        .expect("空闲监控应能及时关闭");
    assert!(token.is_cancelled());
    Ok(())
}

#[tokio::test]
async fn test_log_level_set_list_clear() -> anyhow::Result<()> {
    let manager = ConfigManager::from_registry(&KvClientRegistry::with_defaults(), &memory_settings())?;
    let service = LogLevelService::new(&manager);

    let outputs = service
        .set(
            "debug",
            &[
                ComponentTarget::parse("rw-core#github.com/opencord/voltha-go/rw_core/core"),
                ComponentTarget::parse("ofagent"),
            ],
        )
        .await?;
    assert!(outputs.iter().all(|output| output.is_success()));
    service.set("INFO", &[]).await?;

    let entries = service.list(&[]).await?;
    let rendered: Vec<(String, String, String)> = entries
        .iter()
        .map(|entry| {
            (
                entry.component_name.clone(),
                entry.attribute_name.clone(),
                entry.value.clone(),
            )
        })
        .collect();
    assert!(rendered.contains(&(
        "rw-core".to_string(),
        "github.com/opencord/voltha-go/rw_core/core".to_string(),
        "DEBUG".to_string()
    )));
    assert!(rendered.contains(&("ofagent".to_string(), "default".to_string(), "DEBUG".to_string())));
    // rw-core 未设置 default，取全局默认值
    assert!(rendered.contains(&("rw-core".to_string(), "default".to_string(), "INFO".to_string())));

    let cleared = service.clear(&[ComponentTarget::parse("ofagent")]).await;
    assert!(cleared[0].is_success());

    let ofagent = service.list(&["ofagent".to_string()]).await?;
    assert_eq!(ofagent.len(), 1);
    assert_eq!(ofagent[0].value, "INFO", "清除后应回落到全局默认值");
    Ok(())
}

#[tokio::test]
async fn test_log_level_set_rejects_invalid_level() -> anyhow::Result<()> {
    let manager = manager_with(Arc::new(MemoryKvClient::new()));
    let service = LogLevelService::new(&manager);

    let result = service.set("VERBOSE", &[ComponentTarget::parse("rw-core")]).await;
    assert!(matches!(result, Err(ConfigError::InvalidAttributeValue { .. })));
    assert!(service.list(&[]).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_batch_set_reports_partial_failure() -> anyhow::Result<()> {
    let client = Arc::new(FaultyKvClient::new());
    client.reject_keys_containing("/config/ofagent/");
    let manager = manager_with(client.clone());
    let service = LogLevelService::new(&manager);

    let outputs = service
        .set(
            "WARN",
            &[
                ComponentTarget::parse("rw-core"),
                ComponentTarget::parse("ofagent"),
                ComponentTarget::parse("adapter-open-olt"),
            ],
        )
        .await?;

    assert_eq!(outputs.len(), 3);
    assert!(outputs[0].is_success());
    assert!(!outputs[1].is_success());
    assert_eq!(outputs[1].component_name, "ofagent");
    assert!(outputs[1].error.is_some());
    assert!(outputs[2].is_success(), "单个组件失败不应影响后续组件");

    let values = manager
        .init_component_config("adapter-open-olt", ConfigType::LogLevel)?
        .retrieve_all()
        .await?;
    assert_eq!(values.get("default").map(String::as_str), Some("WARN"));
    Ok(())
}

#[tokio::test]
async fn test_backend_unavailable_propagates() -> anyhow::Result<()> {
    let client = Arc::new(FaultyKvClient::new());
    let manager = manager_with(client.clone());
    let config = manager.init_component_config("rw-core", ConfigType::LogLevel)?;

    client.set_unavailable(true);

    let save = config.save("default", "INFO").await;
    assert!(matches!(save, Err(ConfigError::BackendUnavailable { .. })));

    let list = manager.retrieve_component_list(ConfigType::LogLevel).await;
    assert!(matches!(list, Err(ConfigError::BackendUnavailable { .. })));

    let monitor = config.monitor().await;
    assert!(matches!(monitor, Err(ConfigError::BackendUnavailable { .. })));

    client.set_unavailable(false);
    config.save("default", "INFO").await?;
    Ok(())
}

#[tokio::test]
async fn test_slow_backend_times_out() -> anyhow::Result<()> {
    let client = Arc::new(FaultyKvClient::new());
    client.set_delay(Some(Duration::from_secs(3)));

    let mut settings = memory_settings();
    settings.timeout_secs = 1;
    let manager = ConfigManager::new(client, &settings);

    let result = manager
        .init_component_config("rw-core", ConfigType::LogLevel)?
        .retrieve_all()
        .await;
    assert!(matches!(result, Err(ConfigError::BackendUnavailable { .. })));
    Ok(())
}

#[tokio::test]
async fn test_settings_drive_key_layout() -> anyhow::Result<()> {
    let client = Arc::new(MemoryKvClient::new());
    let mut settings = memory_settings();
    settings.path_prefix = "/custom/root".to_string();
    settings.config_prefix = "settings".to_string();
    let manager = ConfigManager::new(client.clone(), &settings);

    manager
        .init_component_config("rw-core", ConfigType::LogLevel)?
        .save("default", "FATAL")
        .await?;

    let stored = client.list("/custom/root/").await?;
    assert_eq!(
        stored.keys().collect::<Vec<_>>(),
        vec!["/custom/root/settings/rw-core/loglevel/default"]
    );
    assert_eq!(
        manager.retrieve_component_list(ConfigType::LogLevel).await?,
        vec!["rw-core".to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn test_label_with_other_type_segment_is_rejected() -> anyhow::Result<()> {
    let manager = manager_with(Arc::new(MemoryKvClient::new()));

    let result = manager.init_component_config("edge/kafka", ConfigType::LogLevel);
    assert!(matches!(result, Err(ConfigError::InvalidComponentLabel { .. })));
    let result = manager.init_component_config("x/loglevel/y", ConfigType::Kafka);
    assert!(matches!(result, Err(ConfigError::InvalidComponentLabel { .. })));

    manager
        .init_component_config("edge", ConfigType::LogLevel)?
        .save("default", "DEBUG")
        .await?;

    let kafka = manager.init_component_config("edge", ConfigType::Kafka)?;
    assert!(kafka.retrieve_list().await?.is_empty(), "日志级别配置不应出现在 kafka 列表中");
    assert!(manager.retrieve_component_list(ConfigType::Kafka).await?.is_empty());
    assert_eq!(
        manager.retrieve_component_list(ConfigType::LogLevel).await?,
        vec!["edge".to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn test_slow_watch_consumer_loses_no_events() -> anyhow::Result<()> {
    let client = Arc::new(MemoryKvClient::with_watch_capacity(1));
    let mut settings = memory_settings();
    settings.timeout_secs = 1;
    settings.watch_buffer = 1;
    let manager = ConfigManager::new(client.clone(), &settings);
    let config = manager.init_component_config("rw-core", ConfigType::LogLevel)?;

    let mut watch = config.monitor().await?;

    // 消费者暂不读取，输出通道和原始事件通道都会被填满
    let attributes: Vec<String> = (0..6).map(|i| format!("pkg{i}")).collect();
    for attribute in &attributes {
        config.save(attribute, "DEBUG").await?;
    }
    assert_eq!(config.retrieve_all().await?.len(), attributes.len());

    for attribute in &attributes {
        let event = tokio::time::timeout(Duration::from_secs(5), watch.recv())
            .await?
            .expect("每次写入都应产生事件");
        assert_eq!(event.change_type, ChangeEventType::Put);
        assert_eq!(&event.config_attribute, attribute);
    }

    watch.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_handles_are_usable_from_spawned_tasks() -> anyhow::Result<()> {
    let manager = manager_with(Arc::new(MemoryKvClient::new()));
    let service = LogLevelService::new(&manager);

    let setter = tokio::spawn(async move {
        service
            .set("ERROR", &[ComponentTarget::parse("ofagent")])
            .await
    });
    let outputs = setter.await??;
    assert!(outputs.iter().all(|output| output.is_success()));

    let config = manager.init_component_config("ofagent", ConfigType::LogLevel)?;
    let reader = tokio::spawn(async move { config.retrieve_all().await });
    let values = reader.await??;
    assert_eq!(values.get("default").map(String::as_str), Some("ERROR"));
    Ok(())
}
