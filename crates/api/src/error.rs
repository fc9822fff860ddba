use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gateway_errors::GatewayError;
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("请求参数错误: {0}")]
    BadRequest(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Gateway(e) => match e {
                GatewayError::PoolExhausted => StatusCode::SERVICE_UNAVAILABLE,
                GatewayError::DegenerateEvaluation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                GatewayError::Application(_) => StatusCode::BAD_GATEWAY,
                GatewayError::WorkerNotFound { .. } | GatewayError::AliasNotFound { .. } => {
                    StatusCode::NOT_FOUND
                }
                GatewayError::MaintenanceBusy(_) => StatusCode::CONFLICT,
                GatewayError::Dataset(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::Gateway(e) => e.kind(),
            ApiError::BadRequest(_) => "BAD_REQUEST",
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::Gateway(e) => e.user_message(),
            ApiError::BadRequest(_) => "请求参数错误",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("请求处理失败: {}", self);
        }

        let body = Json(json!({
            "error": {
                "kind": self.kind(),
                "message": self.message(),
                "code": status.as_u16(),
                "detail": self.to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(error: GatewayError) -> StatusCode {
        ApiError::from(error).into_response().status()
    }

    #[test]
    fn test_gateway_errors_map_to_status_codes() {
        assert_eq!(
            status_of(GatewayError::PoolExhausted),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(GatewayError::DegenerateEvaluation {
                num_found: 0,
                num_relevant: 3
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(GatewayError::application("bad reply")),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(GatewayError::worker_not_found("x")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(GatewayError::alias_not_found("x")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(GatewayError::MaintenanceBusy("python update_model.py".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(GatewayError::dataset("missing")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(GatewayError::storage("disk full")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_bad_request() {
        let response = ApiError::BadRequest("test_filename 必须是字符串".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
