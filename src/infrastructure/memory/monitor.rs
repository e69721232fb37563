//! Process Memory Monitor - 进程内存采样
//!
//! Linux 走 /proc/self/status 的 VmRSS 快速路径（无锁、无共享状态），
//! 其他平台回退到 sysinfo 快照。
//! 回收提示映射为 glibc 的 malloc_trim，建议性且幂等。

use crate::application::ports::MemoryMonitorPort;

/// 进程内存监视器
///
/// 无共享可变状态，采样可安全地在每个请求中并发调用
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcMemoryMonitor;

impl ProcMemoryMonitor {
    pub fn new() -> Self {
        Self
    }
}

/// 读取当前进程 RSS（字节）
pub fn current_rss_bytes() -> Option<u64> {
    #[cfg(target_os = "linux")]
    {
        // /proc 在某些沙箱环境不可用，按尽力而为处理
        let status = match std::fs::read_to_string("/proc/self/status") {
            Ok(status) => status,
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    tracing::debug!(error = %err, "Failed to read /proc/self/status");
                }
                return None;
            }
        };
        for line in status.lines() {
            if let Some(rest) = line.trim_start().strip_prefix("VmRSS:") {
                let kb = rest.split_whitespace().next()?;
                match kb.parse::<u64>() {
                    Ok(kb) => return Some(kb.saturating_mul(1024)),
                    Err(err) => {
                        tracing::debug!(value = %kb, error = %err, "Failed to parse VmRSS");
                        return None;
                    }
                }
            }
        }
        None
    }

    #[cfg(not(target_os = "linux"))]
    {
        use sysinfo::{Pid, ProcessRefreshKind, RefreshKind, System};

        let pid = Pid::from_u32(std::process::id());
        let sys = System::new_with_specifics(
            RefreshKind::new().with_processes(ProcessRefreshKind::new().with_memory()),
        );
        sys.process(pid).map(|p| p.memory())
    }
}

impl MemoryMonitorPort for ProcMemoryMonitor {
    fn usage_mb(&self) -> f64 {
        current_rss_bytes()
            .map(|bytes| bytes as f64 / (1024.0 * 1024.0))
            .unwrap_or(0.0)
    }

    fn reclaim_hint(&self) {
        #[cfg(all(target_os = "linux", target_env = "gnu"))]
        {
            // malloc_trim 线程安全，重复调用无害
            let released = unsafe { libc::malloc_trim(0) };
            tracing::debug!(released = released == 1, "Issued malloc_trim reclaim hint");
        }

        #[cfg(not(all(target_os = "linux", target_env = "gnu")))]
        {
            tracing::debug!("Reclaim hint is a no-op on this platform");
        }
    }
}
