pub mod admin;
pub mod aliases;
pub mod evaluation;
pub mod health;
pub mod metrics;
pub mod model;
pub mod status;

use serde::de::DeserializeOwned;

use crate::error::{ApiError, ApiResult};

/// 请求体一律按JSON解析，不要求 `Content-Type: application/json`
pub(crate) fn parse_json<T: DeserializeOwned>(body: &[u8]) -> ApiResult<T> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("请求体不是有效的JSON: {e}")))
}
