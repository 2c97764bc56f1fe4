//! 配置监控实现
//!
//! 把键值存储的原始事件流转换为按属性划分的 [`ConfigChangeEvent`] 事件流。
//! 每个监控对应一个后台任务，只通过两个有界通道与外部交互：
//! 原始事件输入和类型化事件输出。

use futures::Stream;
use kvconfig_abstractions::{ChangeEventType, ConfigChangeEvent, KvEvent};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::component::DEFAULT_ATTRIBUTE;
use crate::path::decode_attribute;

/// 监控状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// 转换任务正在运行
    Watching,
    /// 转换任务已结束
    Closed,
}

/// 配置监控句柄
///
/// 消费者应持续读取直到事件流结束。上游事件流关闭、调用
/// [`ConfigWatch::cancel`] 或丢弃句柄都会结束后台任务。
#[derive(Debug)]
pub struct ConfigWatch {
    receiver: mpsc::Receiver<ConfigChangeEvent>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    key_prefix: String,
}

impl ConfigWatch {
    /// 启动转换任务
    ///
    /// `key_prefix` 为包含末尾分隔符的完整键前缀，`buffer` 为输出通道容量。
    pub(crate) fn spawn(raw: mpsc::Receiver<KvEvent>, key_prefix: String, buffer: usize) -> Self {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        let cancel = CancellationToken::new();

        let task = tokio::spawn(process_kv_store_watch_events(
            raw,
            sender,
            key_prefix.clone(),
            cancel.clone(),
        ));

        Self {
            receiver,
            cancel,
            task: Some(task),
            key_prefix,
        }
    }

    /// 接收下一个配置变更事件，事件流结束时返回 `None`
    pub async fn recv(&mut self) -> Option<ConfigChangeEvent> {
        self.receiver.recv().await
    }

    /// 取消监控
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// 获取取消令牌
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 当前监控状态
    pub fn state(&self) -> WatchState {
        match &self.task {
            Some(task) if !task.is_finished() => WatchState::Watching,
            _ => WatchState::Closed,
        }
    }

    /// 取消监控并等待后台任务结束
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("配置监控任务异常结束: {}", e);
            }
        }
        debug!("配置监控已关闭: {}", self.key_prefix);
    }

    /// 监控的完整键前缀
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }
}

impl Drop for ConfigWatch {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Stream for ConfigWatch {
    type Item = ConfigChangeEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// 将原始事件转换为配置变更事件
///
/// 非写入/删除事件返回 `None`。去掉前缀后为空的键对应默认属性。
pub(crate) fn translate_event(event: &KvEvent, key_prefix: &str) -> Option<ConfigChangeEvent> {
    let change_type = ChangeEventType::from_kv(event.event_type)?;

    let attribute = event.key.strip_prefix(key_prefix).unwrap_or(&event.key);
    let attribute = if attribute.is_empty() {
        DEFAULT_ATTRIBUTE.to_string()
    } else {
        decode_attribute(attribute)
    };

    Some(ConfigChangeEvent::new(change_type, attribute))
}

async fn process_kv_store_watch_events(
    mut raw: mpsc::Receiver<KvEvent>,
    sender: mpsc::Sender<ConfigChangeEvent>,
    key_prefix: String,
    cancel: CancellationToken,
) {
    debug!("开始处理键值存储监控事件: {}", key_prefix);

    loop {
        let event = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("配置监控已取消: {}", key_prefix);
                break;
            }
            event = raw.recv() => match event {
                Some(event) => event,
                None => {
                    info!("键值存储监控事件流已关闭: {}", key_prefix);
                    break;
                }
            },
        };

        let Some(change) = translate_event(&event, &key_prefix) else {
            warn!(
                "监控通道收到无效的变更类型: {} ({})，已忽略",
                event.event_type, event.key
            );
            continue;
        };

        debug!("收到配置变更事件: {:?}", change);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("配置监控已取消: {}", key_prefix);
                break;
            }
            result = sender.send(change) => {
                if result.is_err() {
                    debug!("配置变更事件消费者已关闭: {}", key_prefix);
                    break;
                }
            }
        }
    }
}
