//! Model Cache - 有界 LRU 模型句柄缓存
//!
//! ModelKey -> 句柄的有界映射。整个 check/evict/construct/insert 序列
//! 在单把锁内完成:任何 key 的并发 acquire 都会等待，包括并发 miss
//! 背后的缓存命中。以 miss 路径吞吐换取严格保证——
//! 永不并发执行两个昂贵加载，常驻条目数（哪怕瞬时）永不超过 N。
//!
//! 淘汰先同步释放句柄、再发回收提示，然后才开始新的（可能很大的）
//! 加载:先回收、后增长的顺序是强制的。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::sync::Mutex;

use crate::application::ports::{MemoryMonitorPort, ModelHandlePort, ModelRuntimePort};
use crate::domain::ModelKey;

/// 缓存错误
#[derive(Debug, Error)]
pub enum CacheError {
    /// 模型加载失败;映射中不留部分条目，失败的 key 不自动重试
    #[error("Failed to load model {key}: {reason}")]
    LoadFailed { key: ModelKey, reason: String },
}

/// 缓存配置
#[derive(Debug, Clone)]
pub struct ModelCacheConfig {
    /// 常驻句柄数上限，最紧的部署配置为 1
    pub capacity: usize,
}

impl Default for ModelCacheConfig {
    fn default() -> Self {
        Self { capacity: 1 }
    }
}

/// 缓存统计
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub resident: usize,
    pub capacity: usize,
    pub hit_count: u64,
    pub miss_count: u64,
    pub eviction_count: u64,
}

/// 缓存条目
///
/// 句柄的 Arc 由缓存持有;淘汰丢弃该 Arc，缓存是唯一持有者时
/// 释放同步发生
struct CacheEntry {
    handle: Arc<dyn ModelHandlePort>,
    last_used: Instant,
}

/// 模型缓存
pub struct ModelCache {
    runtime: Arc<dyn ModelRuntimePort>,
    monitor: Arc<dyn MemoryMonitorPort>,
    capacity: usize,
    entries: Mutex<HashMap<ModelKey, CacheEntry>>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
    eviction_count: AtomicU64,
}

impl ModelCache {
    pub fn new(
        config: ModelCacheConfig,
        runtime: Arc<dyn ModelRuntimePort>,
        monitor: Arc<dyn MemoryMonitorPort>,
    ) -> Self {
        tracing::info!(capacity = config.capacity, "ModelCache initialized");
        Self {
            runtime,
            monitor,
            capacity: config.capacity.max(1),
            entries: Mutex::new(HashMap::new()),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            eviction_count: AtomicU64::new(0),
        }
    }

    /// 获取模型句柄
    ///
    /// 命中则刷新 last_used 并返回常驻句柄;未命中则按策略淘汰后
    /// 通过外部运行时加载、插入、返回。锁覆盖整个序列。
    pub async fn acquire(&self, key: &ModelKey) -> Result<Arc<dyn ModelHandlePort>, CacheError> {
        let mut entries = self.entries.lock().await;

        if let Some(entry) = entries.get_mut(key) {
            entry.last_used = Instant::now();
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(model_key = %key, "Model cache hit");
            return Ok(entry.handle.clone());
        }

        self.miss_count.fetch_add(1, Ordering::Relaxed);

        // 腾出空间:capacity=1 时无条件淘汰唯一条目
        while entries.len() >= self.capacity {
            self.evict_oldest(&mut entries);
        }

        tracing::info!(model_key = %key, "Loading model");
        let started = Instant::now();

        // 加载仍在锁内:这正是序列化所有 acquire 的点
        let handle = self.runtime.load(key).await.map_err(|e| {
            tracing::error!(model_key = %key, error = %e, "Model load failed");
            CacheError::LoadFailed {
                key: key.clone(),
                reason: e.to_string(),
            }
        })?;

        tracing::info!(
            model_key = %key,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Model loaded"
        );

        entries.insert(
            key.clone(),
            CacheEntry {
                handle: handle.clone(),
                last_used: Instant::now(),
            },
        );

        Ok(handle)
    }

    /// 淘汰 last_used 最旧的条目
    ///
    /// 必须在持有 entries 锁时调用
    fn evict_oldest(&self, entries: &mut HashMap<ModelKey, CacheEntry>) {
        let oldest = entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            if let Some(entry) = entries.remove(&key) {
                // 先释放句柄（缓存为唯一持有者时同步 release），再发回收提示
                drop(entry);
                self.eviction_count.fetch_add(1, Ordering::Relaxed);
                tracing::info!(model_key = %key, "Evicted model from cache");
                self.monitor.reclaim_hint();
            }
        }
    }

    /// 当前常驻模型数
    pub async fn loaded_count(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// 当前常驻模型键
    pub async fn loaded_keys(&self) -> Vec<ModelKey> {
        self.entries.lock().await.keys().cloned().collect()
    }

    /// 指定模型是否常驻
    pub async fn contains(&self, key: &ModelKey) -> bool {
        self.entries.lock().await.contains_key(key)
    }

    /// 释放所有常驻句柄
    ///
    /// 用于 /cleanup 强制淘汰和进程关闭时的清理，返回释放数量
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let released = entries.len();
        entries.clear();
        if released > 0 {
            self.eviction_count
                .fetch_add(released as u64, Ordering::Relaxed);
            tracing::info!(released, "Cleared model cache");
            self.monitor.reclaim_hint();
        }
        released
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            resident: self.entries.lock().await.len(),
            capacity: self.capacity,
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            eviction_count: self.eviction_count.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::infrastructure::adapters::runtime::{FakeModelRuntime, RuntimeEvent};
    use crate::infrastructure::memory::ProcMemoryMonitor;

    fn cache_with(capacity: usize, runtime: Arc<FakeModelRuntime>) -> ModelCache {
        ModelCache::new(
            ModelCacheConfig { capacity },
            runtime,
            Arc::new(ProcMemoryMonitor::new()),
        )
    }

    #[tokio::test]
    async fn test_hit_returns_resident_handle_without_reload() {
        let runtime = Arc::new(FakeModelRuntime::new());
        let cache = cache_with(2, runtime.clone());
        let key = ModelKey::new("model-a");

        let first = cache.acquire(&key).await.unwrap();
        let second = cache.acquire(&key).await.unwrap();

        assert_eq!(runtime.load_count(), 1);
        assert!(Arc::ptr_eq(&first, &second));

        let stats = cache.stats().await;
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
    }

    #[tokio::test]
    async fn test_residency_never_exceeds_capacity() {
        for capacity in [1usize, 2, 3] {
            let runtime = Arc::new(FakeModelRuntime::new());
            let cache = cache_with(capacity, runtime.clone());

            for name in ["a", "b", "c", "d", "e"] {
                let handle = cache.acquire(&ModelKey::new(name)).await.unwrap();
                drop(handle);
                assert!(cache.loaded_count().await <= capacity);
                // 活句柄数 = 常驻数（调用方句柄已丢弃）
                assert_eq!(runtime.live_handles(), cache.loaded_count().await as i64);
            }
        }
    }

    #[tokio::test]
    async fn test_concurrent_same_key_loads_once() {
        let runtime = Arc::new(
            FakeModelRuntime::new().with_load_delay(Duration::from_millis(50)),
        );
        let cache = Arc::new(cache_with(1, runtime.clone()));
        let key = ModelKey::new("model-a");

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let key = key.clone();
            tasks.push(tokio::spawn(async move { cache.acquire(&key).await }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(runtime.load_count(), 1);
        assert_eq!(cache.loaded_count().await, 1);
    }

    #[tokio::test]
    async fn test_capacity_one_evicts_a_before_loading_b() {
        let runtime = Arc::new(FakeModelRuntime::new());
        let cache = cache_with(1, runtime.clone());
        let key_a = ModelKey::new("model-a");
        let key_b = ModelKey::new("model-b");

        let handle_a = cache.acquire(&key_a).await.unwrap();
        drop(handle_a);

        let _handle_b = cache.acquire(&key_b).await.unwrap();

        // 最终只有 B 常驻，A 恰好释放一次
        assert!(cache.contains(&key_b).await);
        assert!(!cache.contains(&key_a).await);
        assert_eq!(runtime.releases_for(&key_a), 1);

        // A 的释放与 B 的加载不得在时间上重叠:事件顺序必须是
        // Load(A), Release(A), Load(B)
        let events = runtime.events();
        assert_eq!(
            events,
            vec![
                RuntimeEvent::Loaded(key_a.clone()),
                RuntimeEvent::Released(key_a),
                RuntimeEvent::Loaded(key_b),
            ]
        );
    }

    #[tokio::test]
    async fn test_lru_evicts_oldest_entry() {
        let runtime = Arc::new(FakeModelRuntime::new());
        let cache = cache_with(2, runtime.clone());
        let key_a = ModelKey::new("model-a");
        let key_b = ModelKey::new("model-b");
        let key_c = ModelKey::new("model-c");

        drop(cache.acquire(&key_a).await.unwrap());
        tokio::time::sleep(Duration::from_millis(5)).await;
        drop(cache.acquire(&key_b).await.unwrap());
        tokio::time::sleep(Duration::from_millis(5)).await;

        // 触碰 A，使 B 成为最旧条目
        drop(cache.acquire(&key_a).await.unwrap());
        tokio::time::sleep(Duration::from_millis(5)).await;

        drop(cache.acquire(&key_c).await.unwrap());

        assert!(cache.contains(&key_a).await);
        assert!(!cache.contains(&key_b).await);
        assert!(cache.contains(&key_c).await);
        assert_eq!(runtime.releases_for(&key_b), 1);
    }

    #[tokio::test]
    async fn test_load_failure_leaves_no_partial_entry() {
        let runtime = Arc::new(FakeModelRuntime::new());
        let key = ModelKey::new("model-a");
        runtime.fail_on(&key);
        let cache = cache_with(1, runtime.clone());

        let result = cache.acquire(&key).await;
        assert!(matches!(result, Err(CacheError::LoadFailed { .. })));
        assert_eq!(cache.loaded_count().await, 0);
        assert!(!cache.contains(&key).await);

        // 故障恢复后，同 key 的下一次请求可以正常加载
        runtime.clear_failures();
        cache.acquire(&key).await.unwrap();
        assert!(cache.contains(&key).await);
    }

    #[tokio::test]
    async fn test_clear_releases_all_handles() {
        let runtime = Arc::new(FakeModelRuntime::new());
        let cache = cache_with(2, runtime.clone());

        drop(cache.acquire(&ModelKey::new("model-a")).await.unwrap());
        drop(cache.acquire(&ModelKey::new("model-b")).await.unwrap());

        let released = cache.clear().await;
        assert_eq!(released, 2);
        assert_eq!(cache.loaded_count().await, 0);
        assert_eq!(runtime.release_count(), 2);
        assert_eq!(runtime.live_handles(), 0);
    }
}
