//! Vocel - 内存受限的 TTS 推理服务
//!
//! 启动顺序:配置 -> 日志 -> 上下文构建 -> 预加载 -> 服务 -> 清理

use std::sync::Arc;
use std::time::Duration;

use vocel::application::{MemoryMonitorPort, PipelineConfig, SynthesisPipeline};
use vocel::config::{load_config, print_config};
use vocel::domain::VoiceCatalog;
use vocel::infrastructure::adapters::runtime::{HttpModelRuntime, HttpModelRuntimeConfig};
use vocel::infrastructure::cache::{ModelCache, ModelCacheConfig};
use vocel::infrastructure::http::{AppState, HttpServer, ServerConfig};
use vocel::infrastructure::memory::{AdmissionConfig, AdmissionController, ProcMemoryMonitor};
use vocel::infrastructure::startup::{spawn_preload, ServiceStatus};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!(
        "{},vocel={},tower_http=debug",
        config.log.level, config.log.level
    );
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));
    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    tracing::info!("Vocel - memory-bounded TTS inference service");
    print_config(&config);

    // 进程级上下文:显式构建，传引用进管线，绝不作为全局状态
    let monitor: Arc<dyn MemoryMonitorPort> = Arc::new(ProcMemoryMonitor::new());

    let runtime_config = HttpModelRuntimeConfig {
        base_url: config.runtime.url.clone(),
        timeout_secs: config.runtime.timeout_secs,
    };
    let runtime = Arc::new(
        HttpModelRuntime::new(runtime_config)
            .map_err(|e| anyhow::anyhow!("Failed to create model runtime client: {}", e))?,
    );

    let cache = Arc::new(ModelCache::new(
        ModelCacheConfig {
            capacity: config.cache.capacity,
        },
        runtime,
        monitor.clone(),
    ));

    let admission = Arc::new(AdmissionController::new(
        monitor.clone(),
        AdmissionConfig {
            warn_threshold_mb: config.memory.warn_threshold_mb,
            hard_threshold_mb: config.memory.hard_threshold_mb,
            retry_wait: Duration::from_millis(config.memory.admit_retry_wait_ms),
        },
    ));

    let catalog = Arc::new(VoiceCatalog::builtin(&config.synthesis.default_voice));

    let pipeline = SynthesisPipeline::new(
        catalog.clone(),
        cache.clone(),
        admission,
        monitor.clone(),
        PipelineConfig {
            max_text_len: config.synthesis.max_text_len,
            text_policy: config.synthesis.text_policy,
            speed_min: config.synthesis.speed_min,
            speed_max: config.synthesis.speed_max,
            pitch_min: config.synthesis.pitch_min,
            pitch_max: config.synthesis.pitch_max,
        },
    );

    let status = Arc::new(ServiceStatus::new());

    // 预加载默认模型（可取消；失败回退到首次未命中时加载）
    let preload = spawn_preload(cache.clone(), catalog.clone(), status.clone());

    let state = Arc::new(AppState::new(
        pipeline,
        cache.clone(),
        monitor,
        catalog,
        status,
        config.memory.clone(),
    ));

    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let server = HttpServer::new(server_config, state);

    tracing::info!("Starting HTTP server...");

    server
        .run_with_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to listen for ctrl-c");
            tracing::info!("Received shutdown signal");
        })
        .await?;

    // 关闭清理:取消未完成的预加载，释放全部常驻句柄
    preload.abort();
    let released = cache.clear().await;
    tracing::info!(released, "Server shutdown complete");

    Ok(())
}
