//! # 示例应用程序
//!
//! 演示如何通过键值存储管理各组件的日志级别配置。
//!
//! 默认使用进程内内存存储，`set`/`list`/`clear` 只在单次运行内有效；
//! `demo` 子命令在同一进程内完整演示写入、叠加读取、监控和清除。

use anyhow::Context;
use clap::{Parser, Subcommand};
use kvconfig_abstractions::{ConfigListEntry, ConfigType};
use kvconfig_impl::{
    ComponentTarget, ConfigManager, KvClientRegistry, KvStoreSettings, LogLevelOutput,
    LogLevelService, GLOBAL_COMPONENT,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "基于键值存储的组件日志级别管理示例")]
struct Args {
    /// 存储配置文件路径
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// 覆盖配置中的存储类型
    #[arg(long)]
    store_type: Option<String>,

    /// 以 JSON 格式输出结果
    #[arg(long)]
    json: bool,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 设置日志级别，目标格式为 component 或 component#package
    Set {
        level: String,
        targets: Vec<String>,
    },
    /// 列出组件的日志级别，未指定组件时列出全部
    List { components: Vec<String> },
    /// 清除日志级别，未指定目标时清除全局默认级别
    Clear { targets: Vec<String> },
    /// 监控组件日志级别的变更
    Watch {
        component: String,
        /// 监控时长（秒），不指定则直到 Ctrl-C
        #[arg(long)]
        seconds: Option<u64>,
    },
    /// 在内存存储上完整演示
    Demo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let mut settings = KvStoreSettings::load(args.settings.as_deref()).context("加载存储配置失败")?;
    if let Some(store_type) = &args.store_type {
        settings = settings.with_store_type(store_type.as_str());
    }
    if matches!(args.command, Command::Demo) {
        settings = settings.with_store_type(kvconfig_impl::MEMORY_STORE_TYPE);
    }

    info!("启动示例应用, 存储类型: {}", settings.store_type);

    let registry = KvClientRegistry::with_defaults();
    let manager = ConfigManager::from_registry(&registry, &settings).context("创建配置管理器失败")?;

    let result = run(&manager, &args).await;
    manager.close().await;

    info!("应用已关闭");
    result
}

async fn run(manager: &ConfigManager, args: &Args) -> anyhow::Result<()> {
    let service = LogLevelService::new(manager);

    match &args.command {
        Command::Set { level, targets } => {
            let outputs = service.set(level, &parse_targets(targets)).await?;
            print_outputs(&outputs, args.json)?;
        }
        Command::List { components } => {
            let entries = service.list(components).await?;
            print_entries(&entries, args.json)?;
        }
        Command::Clear { targets } => {
            let outputs = service.clear(&parse_targets(targets)).await;
            print_outputs(&outputs, args.json)?;
        }
        Command::Watch { component, seconds } => {
            watch_component(manager, component, *seconds, args.json).await?;
        }
        Command::Demo => demonstrate(manager, args.json).await?,
    }

    Ok(())
}

fn parse_targets(targets: &[String]) -> Vec<ComponentTarget> {
    targets.iter().map(|target| ComponentTarget::parse(target)).collect()
}

/// 监控单个组件
async fn watch_component(
    manager: &ConfigManager,
    component: &str,
    seconds: Option<u64>,
    json: bool,
) -> anyhow::Result<()> {
    let config = manager.init_component_config(component, ConfigType::LogLevel)?;
    let mut watch = config.monitor().await?;
    info!("开始监控组件 {} 的日志级别", component);

    let deadline = async {
        match seconds {
            Some(seconds) => tokio::time::sleep(Duration::from_secs(seconds)).await,
            None => {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("等待退出信号失败: {}", e);
                }
            }
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            event = watch.recv() => match event {
                Some(event) if json => println!("{}", serde_json::to_string(&event)?),
                Some(event) => println!("{:?}\t{}", event.change_type, event.config_attribute),
                None => {
                    warn!("监控事件流已结束");
                    break;
                }
            },
        }
    }

    watch.shutdown().await;
    Ok(())
}

/// 演示完整流程
async fn demonstrate(manager: &ConfigManager, json: bool) -> anyhow::Result<()> {
    info!("演示日志级别管理功能");
    let service = LogLevelService::new(manager);

    // 监控 rw-core 的变更
    let rw_core = manager.init_component_config("rw-core", ConfigType::LogLevel)?;
    let mut watch = rw_core.monitor().await?;

    let outputs = service.set("INFO", &[]).await?;
    print_outputs(&outputs, json)?;

    let outputs = service
        .set(
            "debug",
            &parse_targets(&[
                "rw-core#github.com/opencord/voltha-go/rw_core/core".to_string(),
                "ofagent".to_string(),
            ]),
        )
        .await?;
    print_outputs(&outputs, json)?;

    if let Some(event) = watch.recv().await {
        info!("收到 rw-core 变更: {:?} {}", event.change_type, event.config_attribute);
    }

    info!("叠加全局默认值后的配置:");
    let entries = service.list(&[]).await?;
    print_entries(&entries, json)?;

    let layered = manager
        .retrieve_component_config("adapter-open-olt", ConfigType::LogLevel)
        .await?;
    info!("未单独配置的组件 adapter-open-olt: {:?}", layered);

    let outputs = service.clear(&[ComponentTarget::parse("ofagent")]).await;
    print_outputs(&outputs, json)?;

    let entries = service.list(&["ofagent".to_string(), GLOBAL_COMPONENT.to_string()]).await?;
    print_entries(&entries, json)?;

    watch.shutdown().await;
    info!("演示完成");
    Ok(())
}

fn print_outputs(outputs: &[LogLevelOutput], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outputs)?);
        return Ok(());
    }

    println!("{:<24} {:<8} ERROR", "COMPONENTNAME", "STATUS");
    for output in outputs {
        println!(
            "{:<24} {:<8} {}",
            output.component_name,
            output.status,
            output.error.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn print_entries(entries: &[ConfigListEntry], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }

    println!("{:<24} {:<48} LEVEL", "COMPONENTNAME", "PACKAGENAME");
    for entry in entries {
        println!(
            "{:<24} {:<48} {}",
            entry.component_name, entry.attribute_name, entry.value
        );
    }
    Ok(())
}
