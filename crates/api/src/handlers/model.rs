use axum::{body::Bytes, extract::State, Json};
use serde_json::Value;

use gateway_domain::InferenceRequest;

use super::parse_json;
use crate::{error::ApiResult, routes::AppState};

/// 转发推理请求，Worker的响应原样返回
pub async fn infer(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let body: Value = parse_json(&body)?;
    let response = state
        .dispatcher
        .dispatch(&InferenceRequest::new(body))
        .await?;
    Ok(Json(response.body))
}
