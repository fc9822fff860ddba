use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::{error, info};

use crate::{error::ApiResult, response::accepted, routes::AppState};

const UPDATE_WIKIDATA_SCRIPT: &str = "python update_wikidata.py";
const UPDATE_MODEL_SCRIPT: &str = "python update_model.py";

/// 后台依次重启全部Worker，立即返回
pub async fn update_containers(State(state): State<AppState>) -> impl IntoResponse {
    let pool = state.pool.clone();
    tokio::spawn(async move {
        match pool.replace_all().await {
            Ok(()) => info!("全部Worker已重启"),
            Err(e) => error!("重启全部Worker失败: {}", e),
        }
    });
    accepted("已开始重启全部Worker")
}

pub async fn update_wikidata(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    state.pool.run_maintenance(UPDATE_WIKIDATA_SCRIPT).await?;
    Ok(accepted(format!("已开始运行 {UPDATE_WIKIDATA_SCRIPT}")))
}

pub async fn update_model(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    state.pool.run_maintenance(UPDATE_MODEL_SCRIPT).await?;
    Ok(accepted(format!("已开始运行 {UPDATE_MODEL_SCRIPT}")))
}

/// 原始日志文本
pub async fn worker_logs(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<String> {
    Ok(state.pool.logs(&name).await?)
}
