use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

use gateway_errors::GatewayError;

use super::parse_json;
use crate::{error::ApiResult, response::done, routes::AppState};

pub async fn list_aliases(
    State(state): State<AppState>,
) -> ApiResult<Json<BTreeMap<String, Vec<String>>>> {
    Ok(Json(state.aliases.list().await?))
}

pub async fn get_alias(
    State(state): State<AppState>,
    Path(label): Path<String>,
) -> ApiResult<Json<Vec<String>>> {
    let ids = state
        .aliases
        .get(&label)
        .await?
        .ok_or_else(|| GatewayError::alias_not_found(&label))?;
    Ok(Json(ids))
}

pub async fn add_alias(
    State(state): State<AppState>,
    Path(label): Path<String>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let entity_ids: Vec<String> = parse_json(&body)?;
    state.aliases.add(&label, entity_ids).await?;
    Ok(done(format!("别名 {label} 已更新")))
}

pub async fn add_many_aliases(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let aliases: BTreeMap<String, Vec<String>> = parse_json(&body)?;
    let count = aliases.len();
    state.aliases.add_many(aliases).await?;
    Ok(done(format!("已更新 {count} 个别名")))
}

pub async fn delete_alias(
    State(state): State<AppState>,
    Path(label): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.aliases.delete(&label).await?;
    Ok(done(format!("别名 {label} 已删除")))
}
