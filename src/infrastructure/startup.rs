//! Startup - 预加载任务与服务就绪状态
//!
//! 默认模型的预加载是可取消的后台任务:在接受流量前开始填充缓存，
//! 失败不阻塞服务，回退到首次未命中时加载。

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::domain::VoiceCatalog;
use crate::infrastructure::cache::ModelCache;

/// 服务就绪状态
pub struct ServiceStatus {
    ready: AtomicBool,
    started_at: DateTime<Utc>,
}

impl ServiceStatus {
    pub fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
            started_at: Utc::now(),
        }
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

impl Default for ServiceStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// 启动默认模型预加载任务
///
/// 无论预加载成功与否都标记就绪:预加载失败回退到首次请求时加载
pub fn spawn_preload(
    cache: Arc<ModelCache>,
    catalog: Arc<VoiceCatalog>,
    status: Arc<ServiceStatus>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Some(profile) = catalog.default_profile() {
            tracing::info!(
                voice = %profile.id,
                model_key = %profile.model_key,
                "Preloading default model"
            );
            match cache.acquire(&profile.model_key).await {
                Ok(_handle) => {
                    tracing::info!(model_key = %profile.model_key, "Default model preloaded");
                }
                Err(e) => {
                    tracing::warn!(
                        model_key = %profile.model_key,
                        error = %e,
                        "Preload failed, will load on first request"
                    );
                }
            }
        } else {
            tracing::warn!("Voice catalog is empty, nothing to preload");
        }
        status.mark_ready();
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelKey;
    use crate::infrastructure::adapters::runtime::FakeModelRuntime;
    use crate::infrastructure::cache::ModelCacheConfig;
    use crate::infrastructure::memory::ProcMemoryMonitor;

    fn cache_with(runtime: Arc<FakeModelRuntime>) -> Arc<ModelCache> {
        Arc::new(ModelCache::new(
            ModelCacheConfig { capacity: 1 },
            runtime,
            Arc::new(ProcMemoryMonitor::new()),
        ))
    }

    #[tokio::test]
    async fn test_preload_populates_cache_and_marks_ready() {
        let runtime = Arc::new(FakeModelRuntime::new());
        let cache = cache_with(runtime.clone());
        let catalog = Arc::new(VoiceCatalog::builtin("female_calm"));
        let status = Arc::new(ServiceStatus::new());
        assert!(!status.is_ready());

        spawn_preload(cache.clone(), catalog, status.clone())
            .await
            .unwrap();

        assert!(status.is_ready());
        assert!(
            cache
                .contains(&ModelKey::new("tts_models/en/ljspeech/tacotron2-DDC"))
                .await
        );
        assert_eq!(runtime.load_count(), 1);
    }

    #[tokio::test]
    async fn test_preload_failure_still_marks_ready() {
        let runtime = Arc::new(FakeModelRuntime::new());
        runtime.fail_on(&ModelKey::new("tts_models/en/ljspeech/tacotron2-DDC"));
        let cache = cache_with(runtime);
        let catalog = Arc::new(VoiceCatalog::builtin("female_calm"));
        let status = Arc::new(ServiceStatus::new());

        spawn_preload(cache.clone(), catalog, status.clone())
            .await
            .unwrap();

        // 失败不阻塞服务
        assert!(status.is_ready());
        assert_eq!(cache.loaded_count().await, 0);
    }
}
