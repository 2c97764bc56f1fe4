//! 内存键值存储客户端
//!
//! 进程内的 [`KvClient`] 实现，供测试和示例应用使用。
//!
//! 写入和删除在提交时即把事件放入每个匹配监控者的队列，再由每个监控各自的
//! 转发任务按顺序送入有界通道。消费者处理缓慢只会让事件在队列中等待，
//! 不会阻塞写入，也不会因请求超时被取消而丢失事件。

use async_trait::async_trait;
use kvconfig_abstractions::{KvClient, KvEvent, KvEventType};
use kvconfig_common::{ConfigError, ConfigResult};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// 内存存储类型标识
pub const MEMORY_STORE_TYPE: &str = "memory";

const DEFAULT_WATCH_CAPACITY: usize = 64;

struct PrefixWatcher {
    prefix: String,
    queue: mpsc::UnboundedSender<KvEvent>,
}

impl PrefixWatcher {
    fn accepts(&self, event: &KvEvent) -> bool {
        match event.event_type {
            KvEventType::Put | KvEventType::Delete => event.key.starts_with(&self.prefix),
            KvEventType::ConnectionDown | KvEventType::Unknown => true,
        }
    }
}

/// 内存键值存储客户端
pub struct MemoryKvClient {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
    watchers: Mutex<Vec<PrefixWatcher>>,
    watch_capacity: usize,
    closed: AtomicBool,
}

impl std::fmt::Debug for MemoryKvClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryKvClient")
            .field("entries", &self.entries.read().len())
            .field("watchers", &self.watchers.lock().len())
            .field("watch_capacity", &self.watch_capacity)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

impl MemoryKvClient {
    /// 创建新的内存客户端
    pub fn new() -> Self {
        Self::with_watch_capacity(DEFAULT_WATCH_CAPACITY)
    }

    /// 指定每个监控事件流的通道容量
    pub fn with_watch_capacity(watch_capacity: usize) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            watchers: Mutex::new(Vec::new()),
            watch_capacity: watch_capacity.max(1),
            closed: AtomicBool::new(false),
        }
    }

    /// 注入一个原始事件
    ///
    /// 写入/删除事件只发送给前缀匹配的监控者，连接状态事件发送给所有监控者。
    pub fn emit(&self, event: &KvEvent) {
        self.notify(event);
    }

    /// 关闭所有监控事件流
    pub fn disconnect_watchers(&self) {
        let mut watchers = self.watchers.lock();
        info!("断开 {} 个监控事件流", watchers.len());
        watchers.clear();
    }

    /// 当前活跃的监控者数量
    pub fn watcher_count(&self) -> usize {
        let mut watchers = self.watchers.lock();
        watchers.retain(|watcher| !watcher.queue.is_closed());
        watchers.len()
    }

    /// 存储的键数量
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// 存储是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn ensure_open(&self) -> ConfigResult<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(ConfigError::backend_unavailable("内存存储客户端已关闭"))
        } else {
            Ok(())
        }
    }

    /// 把事件放入匹配监控者的队列，不会等待消费者
    fn notify(&self, event: &KvEvent) {
        let mut watchers = self.watchers.lock();
        watchers.retain(|watcher| !watcher.queue.is_closed());
        for watcher in watchers.iter().filter(|watcher| watcher.accepts(event)) {
            if watcher.queue.send(event.clone()).is_err() {
                debug!("监控者已关闭，丢弃事件: {}", event.key);
            }
        }
    }
}

/// 把监控队列中的事件按顺序送入有界通道
///
/// 队列关闭（监控被断开）时送完剩余事件后结束；消费者关闭时立即结束。
async fn forward_watch_events(
    mut queue: mpsc::UnboundedReceiver<KvEvent>,
    sender: mpsc::Sender<KvEvent>,
) {
    loop {
        let event = tokio::select! {
            biased;
            () = sender.closed() => break,
            event = queue.recv() => event,
        };
        let Some(event) = event else { break };
        if sender.send(event).await.is_err() {
            break;
        }
    }
}

impl Default for MemoryKvClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvClient for MemoryKvClient {
    async fn put(&self, key: &str, value: &[u8]) -> ConfigResult<()> {
        self.ensure_open()?;
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), value.to_vec());
        // 持有写锁入队，保证事件顺序与提交顺序一致
        self.notify(&KvEvent::put(key, value));
        Ok(())
    }

    async fn delete(&self, key: &str) -> ConfigResult<()> {
        self.ensure_open()?;
        let mut entries = self.entries.write();
        if entries.remove(key).is_some() {
            self.notify(&KvEvent::delete(key));
        }
        Ok(())
    }

    async fn list(&self, prefix: &str) -> ConfigResult<HashMap<String, Vec<u8>>> {
        self.ensure_open()?;
        let entries = self.entries.read();
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    async fn watch(&self, prefix: &str) -> ConfigResult<mpsc::Receiver<KvEvent>> {
        self.ensure_open()?;
        let (sender, receiver) = mpsc::channel(self.watch_capacity);
        let (queue, pending) = mpsc::unbounded_channel();
        tokio::spawn(forward_watch_events(pending, sender));
        self.watchers.lock().push(PrefixWatcher {
            prefix: prefix.to_string(),
            queue,
        });
        debug!("添加前缀监控: {}", prefix);
        Ok(receiver)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.disconnect_watchers();
    }

    fn name(&self) -> &str {
        MEMORY_STORE_TYPE
    }
}
