//! Fake Model Runtime - 测试用模型运行时
//!
//! 不调用真实运行时，返回固定音频；
//! 记录加载/释放事件序列与活句柄数，供缓存不变量测试断言。

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::application::ports::{
    ModelHandlePort, ModelRuntimePort, RuntimeError, SynthesisParams,
};
use crate::domain::ModelKey;

/// 运行时事件（按发生顺序记录）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    Loaded(ModelKey),
    Released(ModelKey),
}

struct FakeRuntimeState {
    events: Mutex<Vec<RuntimeEvent>>,
    synth_calls: Mutex<Vec<SynthesisParams>>,
    fail_keys: Mutex<HashSet<ModelKey>>,
    load_count: AtomicUsize,
    release_count: AtomicUsize,
    live_handles: AtomicI64,
    audio_data: Vec<u8>,
    load_delay: Mutex<Duration>,
}

/// Fake Model Runtime
pub struct FakeModelRuntime {
    state: Arc<FakeRuntimeState>,
}

impl FakeModelRuntime {
    pub fn new() -> Self {
        // RIFF 魔数开头的几个字节，足够让管线认为输出非空
        Self::with_audio(vec![0x52, 0x49, 0x46, 0x46, 0x00, 0x01, 0x02, 0x03])
    }

    /// 指定合成调用写出的固定音频（空向量可模拟无输出故障）
    pub fn with_audio(audio_data: Vec<u8>) -> Self {
        Self {
            state: Arc::new(FakeRuntimeState {
                events: Mutex::new(Vec::new()),
                synth_calls: Mutex::new(Vec::new()),
                fail_keys: Mutex::new(HashSet::new()),
                load_count: AtomicUsize::new(0),
                release_count: AtomicUsize::new(0),
                live_handles: AtomicI64::new(0),
                audio_data,
                load_delay: Mutex::new(Duration::ZERO),
            }),
        }
    }

    /// 模拟昂贵加载的延迟
    pub fn with_load_delay(self, delay: Duration) -> Self {
        *self.state.load_delay.lock().unwrap() = delay;
        self
    }

    /// 让指定 key 的加载失败
    pub fn fail_on(&self, key: &ModelKey) {
        self.state.fail_keys.lock().unwrap().insert(key.clone());
    }

    pub fn clear_failures(&self) {
        self.state.fail_keys.lock().unwrap().clear();
    }

    pub fn load_count(&self) -> usize {
        self.state.load_count.load(Ordering::SeqCst)
    }

    pub fn release_count(&self) -> usize {
        self.state.release_count.load(Ordering::SeqCst)
    }

    /// 已加载且尚未释放的句柄数
    pub fn live_handles(&self) -> i64 {
        self.state.live_handles.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<RuntimeEvent> {
        self.state.events.lock().unwrap().clone()
    }

    pub fn releases_for(&self, key: &ModelKey) -> usize {
        self.state
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, RuntimeEvent::Released(k) if k == key))
            .count()
    }

    /// 到达合成调用的参数（验证钳制与截断）
    pub fn synth_calls(&self) -> Vec<SynthesisParams> {
        self.state.synth_calls.lock().unwrap().clone()
    }
}

impl Default for FakeModelRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelRuntimePort for FakeModelRuntime {
    async fn load(&self, key: &ModelKey) -> Result<Arc<dyn ModelHandlePort>, RuntimeError> {
        let delay = *self.state.load_delay.lock().unwrap();
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }

        if self.state.fail_keys.lock().unwrap().contains(key) {
            return Err(RuntimeError::LoadFailed(format!(
                "fake runtime configured to fail for {}",
                key
            )));
        }

        self.state.load_count.fetch_add(1, Ordering::SeqCst);
        self.state.live_handles.fetch_add(1, Ordering::SeqCst);
        self.state
            .events
            .lock()
            .unwrap()
            .push(RuntimeEvent::Loaded(key.clone()));

        Ok(Arc::new(FakeModelHandle {
            key: key.clone(),
            state: self.state.clone(),
        }))
    }
}

struct FakeModelHandle {
    key: ModelKey,
    state: Arc<FakeRuntimeState>,
}

#[async_trait]
impl ModelHandlePort for FakeModelHandle {
    fn model_key(&self) -> &ModelKey {
        &self.key
    }

    async fn synthesize_to(
        &self,
        params: SynthesisParams,
        out_path: &Path,
    ) -> Result<(), RuntimeError> {
        self.state.synth_calls.lock().unwrap().push(params);
        tokio::fs::write(out_path, &self.state.audio_data)
            .await
            .map_err(|e| RuntimeError::SynthesisFailed(e.to_string()))
    }
}

impl Drop for FakeModelHandle {
    fn drop(&mut self) {
        self.state.release_count.fetch_add(1, Ordering::SeqCst);
        self.state.live_handles.fetch_sub(1, Ordering::SeqCst);
        self.state
            .events
            .lock()
            .unwrap()
            .push(RuntimeEvent::Released(self.key.clone()));
    }
}
