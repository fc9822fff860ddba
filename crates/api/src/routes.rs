use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use gateway_dispatcher::{Dispatcher, EvaluationEngine};
use gateway_domain::{AliasRepository, WorkerPool};
use gateway_observability::PrometheusHandle;

use crate::handlers::{
    admin::{update_containers, update_model, update_wikidata, worker_logs},
    aliases::{add_alias, add_many_aliases, delete_alias, get_alias, list_aliases},
    evaluation::run_evaluation,
    health::health_check,
    metrics::render_metrics,
    model::infer,
    status::{logs_page, status_page},
};

/// API应用状态，所有服务在进程内各只有一个实例
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub evaluation: Arc<EvaluationEngine>,
    pub pool: Arc<dyn WorkerPool>,
    pub aliases: Arc<dyn AliasRepository>,
    /// 管理进程名，状态页单独展示
    pub manager_name: Arc<str>,
    pub metrics_handle: Option<PrometheusHandle>,
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(render_metrics))
        // 推理与评估
        .route("/model", post(infer))
        .route("/test", post(run_evaluation))
        // Worker管理
        .route("/update/containers", get(update_containers))
        .route("/update/wikidata", get(update_wikidata))
        .route("/update/model", get(update_model))
        .route("/worker/{name}", get(worker_logs))
        .route("/status", get(status_page))
        .route("/logs/{name}", get(logs_page))
        // 别名
        .route("/aliases", get(list_aliases))
        .route("/aliases/add/{label}", post(add_alias))
        .route("/aliases/add_many", post(add_many_aliases))
        .route("/aliases/delete/{label}", get(delete_alias))
        .route("/aliases/get/{label}", get(get_alias))
        .with_state(state)
}
