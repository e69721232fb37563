//! Memory Monitor Port - 进程内存采样抽象
//!
//! 采样必须廉价、无副作用，可以每个请求调用一次；
//! 回收提示是建议性的，幂等且并发安全。

/// Memory Monitor Port
pub trait MemoryMonitorPort: Send + Sync {
    /// 当前进程常驻内存（MB）
    ///
    /// 无法采样时返回 0.0（宁可放行也不因采样失败拒绝请求）
    fn usage_mb(&self) -> f64;

    /// 回收提示
    ///
    /// 建议运行时尽快释放未引用内存，不保证立即生效
    fn reclaim_hint(&self);
}
