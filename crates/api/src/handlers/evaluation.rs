use axum::{body::Bytes, extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use gateway_domain::MetricsRecord;

use super::parse_json;
use crate::{
    error::{ApiError, ApiResult},
    routes::AppState,
};

/// 请求体可以为空，也可以不带 `test_filename`，此时使用参考数据集
#[derive(Debug, Default, Deserialize)]
pub struct EvaluationRequest {
    #[serde(default)]
    pub test_filename: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EvaluationSummary {
    pub precision: f64,
    pub recall: f64,
    pub promote: bool,
    pub previous_best_precision: f64,
    pub previous_best_recall: f64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl From<MetricsRecord> for EvaluationSummary {
    fn from(record: MetricsRecord) -> Self {
        Self {
            precision: record.new_precision,
            recall: record.new_recall,
            promote: record.promote,
            previous_best_precision: record.previous_best_precision,
            previous_best_recall: record.previous_best_recall,
            timestamp: record.timestamp,
        }
    }
}

fn parse_request(body: &[u8]) -> ApiResult<EvaluationRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(EvaluationRequest::default());
    }
    let value: serde_json::Value = parse_json(body)?;
    if value.is_null() {
        return Ok(EvaluationRequest::default());
    }
    serde_json::from_value(value).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// 运行一次评估
pub async fn run_evaluation(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<EvaluationSummary>> {
    let request = parse_request(&body)?;
    info!("收到评估请求: {:?}", request);

    let record = state
        .evaluation
        .evaluate_dataset(request.test_filename.as_deref())
        .await?;
    Ok(Json(record.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_variants() {
        assert!(parse_request(b"").unwrap().test_filename.is_none());
        assert!(parse_request(b"null").unwrap().test_filename.is_none());
        assert!(parse_request(b"{}").unwrap().test_filename.is_none());
        assert_eq!(
            parse_request(br#"{"test_filename": "/data/custom.json"}"#)
                .unwrap()
                .test_filename
                .as_deref(),
            Some("/data/custom.json")
        );
        assert!(matches!(
            parse_request(br#"{"test_filename": 5}"#),
            Err(ApiError::BadRequest(_))
        ));
    }
}
