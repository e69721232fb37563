//! Admission Controller - 内存压力准入控制
//!
//! 纯背压，不是队列:被拒绝的请求不缓冲、不内部重试，重试由调用方决定。
//!
//! 判定规则:
//! - usage < warn            → Allow
//! - warn <= usage < hard    → 发一次回收提示，等待一个有界间隔后重读，
//!                             低于 hard 则 Allow，否则 Reject（恰好一次重试）
//! - usage >= hard           → 立即 Reject，零延迟（不给注定失败的请求加延迟）

use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::MemoryMonitorPort;

/// 准入判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allow,
    Reject,
}

/// 准入控制配置
#[derive(Debug, Clone)]
pub struct AdmissionConfig {
    /// 警告阈值（MB），超过后先回收再判定
    pub warn_threshold_mb: f64,
    /// 硬阈值（MB），超过立即拒绝
    pub hard_threshold_mb: f64,
    /// 警告区间内回收后的等待时间，配置上限 1s
    pub retry_wait: Duration,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            warn_threshold_mb: 3072.0,
            hard_threshold_mb: 3584.0,
            retry_wait: Duration::from_millis(500),
        }
    }
}

/// 准入控制器
///
/// usage 读取无锁，回收提示幂等，可被并发请求安全调用
pub struct AdmissionController {
    monitor: Arc<dyn MemoryMonitorPort>,
    config: AdmissionConfig,
}

impl AdmissionController {
    pub fn new(monitor: Arc<dyn MemoryMonitorPort>, config: AdmissionConfig) -> Self {
        Self { monitor, config }
    }

    /// 判定当前请求是否可以进入
    pub async fn admit(&self) -> Admission {
        let usage = self.monitor.usage_mb();

        if usage < self.config.warn_threshold_mb {
            return Admission::Allow;
        }

        if usage >= self.config.hard_threshold_mb {
            tracing::warn!(
                usage_mb = usage,
                hard_threshold_mb = self.config.hard_threshold_mb,
                "Memory above hard threshold, rejecting request"
            );
            return Admission::Reject;
        }

        // 警告区间:回收一次，等待一次，重读一次，绝不循环
        tracing::info!(
            usage_mb = usage,
            warn_threshold_mb = self.config.warn_threshold_mb,
            "Memory above warn threshold, reclaiming before admission"
        );
        self.monitor.reclaim_hint();
        tokio::time::sleep(self.config.retry_wait).await;

        let usage = self.monitor.usage_mb();
        if usage < self.config.hard_threshold_mb {
            Admission::Allow
        } else {
            tracing::warn!(
                usage_mb = usage,
                "Memory still above hard threshold after reclaim, rejecting request"
            );
            Admission::Reject
        }
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Instant;

    /// 按序返回预设读数的监视器
    struct StubMonitor {
        readings: Mutex<Vec<f64>>,
        reads: AtomicUsize,
        reclaims: AtomicUsize,
    }

    impl StubMonitor {
        fn new(readings: Vec<f64>) -> Arc<Self> {
            Arc::new(Self {
                readings: Mutex::new(readings),
                reads: AtomicUsize::new(0),
                reclaims: AtomicUsize::new(0),
            })
        }
    }

    impl MemoryMonitorPort for StubMonitor {
        fn usage_mb(&self) -> f64 {
            let mut readings = self.readings.lock().unwrap();
            self.reads.fetch_add(1, Ordering::SeqCst);
            if readings.len() > 1 {
                readings.remove(0)
            } else {
                readings[0]
            }
        }

        fn reclaim_hint(&self) {
            self.reclaims.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn config(retry_wait_ms: u64) -> AdmissionConfig {
        AdmissionConfig {
            warn_threshold_mb: 1000.0,
            hard_threshold_mb: 2000.0,
            retry_wait: Duration::from_millis(retry_wait_ms),
        }
    }

    #[tokio::test]
    async fn test_below_warn_allows_without_reclaim() {
        let monitor = StubMonitor::new(vec![500.0]);
        let controller = AdmissionController::new(monitor.clone(), config(10));

        assert_eq!(controller.admit().await, Admission::Allow);
        assert_eq!(monitor.reads.load(Ordering::SeqCst), 1);
        assert_eq!(monitor.reclaims.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_above_hard_rejects_immediately() {
        let monitor = StubMonitor::new(vec![2500.0]);
        let controller = AdmissionController::new(monitor.clone(), config(200));

        let start = Instant::now();
        assert_eq!(controller.admit().await, Admission::Reject);

        // 不应观察到回收-重试延迟
        assert!(start.elapsed() < Duration::from_millis(100));
        assert_eq!(monitor.reads.load(Ordering::SeqCst), 1);
        assert_eq!(monitor.reclaims.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_warn_band_allows_after_single_reclaim() {
        // 回收后第二次读数降到 hard 以下
        let monitor = StubMonitor::new(vec![1500.0, 1200.0]);
        let controller = AdmissionController::new(monitor.clone(), config(10));

        assert_eq!(controller.admit().await, Admission::Allow);
        assert_eq!(monitor.reclaims.load(Ordering::SeqCst), 1);
        // 恰好两次读取:一次初判，一次重读，绝不循环
        assert_eq!(monitor.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_warn_band_rejects_when_reclaim_does_not_help() {
        let monitor = StubMonitor::new(vec![1500.0, 2100.0]);
        let controller = AdmissionController::new(monitor.clone(), config(10));

        assert_eq!(controller.admit().await, Admission::Reject);
        assert_eq!(monitor.reclaims.load(Ordering::SeqCst), 1);
        assert_eq!(monitor.reads.load(Ordering::SeqCst), 2);
    }
}
