use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use tokio::{net::TcpListener, sync::broadcast};
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};

use gateway_api::{create_app, AppState};
use gateway_config::AppConfig;
use gateway_dispatcher::{
    DispatchConfig, Dispatcher, EvaluationConfig as EngineConfig, EvaluationEngine, Sentinels,
};
use gateway_domain::DatasetLoader;
use gateway_infrastructure::{
    CachedDatasetLoader, CommandSupervisor, CsvMetricsRepository, HttpWorkerTransport,
    JsonAliasRegistry, ManagedWorkerPool,
};
use gateway_observability::PrometheusHandle;

/// 主应用程序：进程内每个服务只构造一次，通过 `Arc` 共享
pub struct Application {
    config: AppConfig,
    router: Router,
    dataset_loader: Arc<CachedDatasetLoader>,
}

impl Application {
    pub fn new(config: AppConfig, metrics_handle: Option<PrometheusHandle>) -> Self {
        info!("初始化应用程序，Worker数量: {}", config.pool.workers.len());

        let supervisor = Arc::new(CommandSupervisor::new(config.supervisor.clone()));
        let pool = Arc::new(ManagedWorkerPool::from_config(&config.pool, supervisor));
        let manager_name: Arc<str> = Arc::from(pool.manager_name());

        let transport = Arc::new(HttpWorkerTransport::from_config(&config.dispatcher));
        let dispatcher = Arc::new(Dispatcher::new(
            pool.clone(),
            transport,
            Some(DispatchConfig {
                worker_timeout: Duration::from_secs(config.dispatcher.worker_timeout_seconds),
            }),
        ));

        let dataset_loader = Arc::new(CachedDatasetLoader::from_config(&config.evaluation));
        let evaluation = Arc::new(EvaluationEngine::new(
            dispatcher.clone(),
            Arc::new(CsvMetricsRepository::new(&config.evaluation.metrics_path)),
            dataset_loader.clone(),
            Some(EngineConfig {
                sentinels: Sentinels {
                    unresolved: config.evaluation.unresolved_sentinel.clone(),
                    no_entity: config.evaluation.no_entity_sentinel.clone(),
                },
            }),
        ));

        let state = AppState {
            dispatcher,
            evaluation,
            pool,
            aliases: Arc::new(JsonAliasRegistry::from_config(&config.aliases)),
            manager_name,
            metrics_handle,
        };

        let router = create_app(state, config.server.cors_enabled).layer(TimeoutLayer::new(
            Duration::from_secs(config.server.request_timeout_seconds),
        ));

        Self {
            config,
            router,
            dataset_loader,
        }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// 绑定配置中的地址并运行到收到关闭信号
    pub async fn run(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let bind_address = &self.config.server.bind_address;
        let listener = TcpListener::bind(bind_address)
            .await
            .with_context(|| format!("绑定地址失败: {bind_address}"))?;

        self.warm_up_dataset();
        self.serve(listener, shutdown_rx).await
    }

    pub async fn serve(
        &self,
        listener: TcpListener,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<()> {
        let address = listener.local_addr().context("读取监听地址失败")?;
        info!("API服务器启动在 http://{}", address);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("API服务器收到关闭信号");
            })
            .await
            .context("API服务器运行失败")?;

        info!("API服务器已停止");
        Ok(())
    }

    /// 启动时后台准备参考数据集，失败时留到第一次评估再重试
    fn warm_up_dataset(&self) {
        let loader = Arc::clone(&self.dataset_loader);
        tokio::spawn(async move {
            if let Err(e) = loader.load_default().await {
                warn!("预加载参考数据集失败: {}", e);
            }
        });
    }
}
