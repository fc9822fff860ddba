use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use gateway_config::DispatcherConfig;
use gateway_domain::{Endpoint, InferenceRequest, InferenceResponse, WorkerTransport};
use gateway_errors::{GatewayError, GatewayResult};

/// 通过HTTP POST把推理请求转发给Worker
///
/// 超时由分发器统一控制，这里的客户端不设置请求超时。
pub struct HttpWorkerTransport {
    client: reqwest::Client,
    path: String,
}

impl HttpWorkerTransport {
    pub fn new<P: Into<String>>(path: P) -> Self {
        Self {
            client: reqwest::Client::new(),
            path: path.into(),
        }
    }

    pub fn from_config(config: &DispatcherConfig) -> Self {
        Self::new(config.worker_path.clone())
    }

    fn classify(endpoint: &Endpoint, error: reqwest::Error) -> GatewayError {
        if error.is_connect() || error.is_timeout() {
            GatewayError::transport(endpoint.address(), error.to_string())
        } else {
            GatewayError::application(format!("Worker {endpoint} 请求失败: {error}"))
        }
    }
}

#[async_trait]
impl WorkerTransport for HttpWorkerTransport {
    async fn send(
        &self,
        endpoint: &Endpoint,
        request: &InferenceRequest,
    ) -> GatewayResult<InferenceResponse> {
        let url = endpoint.url(&self.path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request.body)
            .send()
            .await
            .map_err(|e| Self::classify(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::application(format!(
                "Worker {endpoint} 返回 HTTP {status}: {body}"
            )));
        }

        // Worker不一定设置 Content-Type，按原始字节解析
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Self::classify(endpoint, e))?;
        let body: Value = serde_json::from_slice(&bytes).map_err(|e| {
            GatewayError::application(format!("Worker {endpoint} 返回的不是JSON: {e}"))
        })?;

        Ok(InferenceResponse::new(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;
    use tokio::net::TcpListener;

    async fn serve(router: Router) -> Endpoint {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Endpoint::new("worker", "127.0.0.1", port)
    }

    #[tokio::test]
    async fn test_forwards_body_and_returns_reply_verbatim() {
        let router = Router::new().route(
            "/model",
            post(|Json(body): Json<Value>| async move { Json(json!([body["entity_substr"]])) }),
        );
        let endpoint = serve(router).await;
        let transport = HttpWorkerTransport::new("/model");

        let request = InferenceRequest::new(json!({"entity_substr": [["москва"]]}));
        let response = transport.send(&endpoint, &request).await.unwrap();

        assert_eq!(response.body, json!([[["москва"]]]));
    }

    #[tokio::test]
    async fn test_reply_without_json_content_type_is_parsed() {
        let router = Router::new().route("/model", post(|| async { "[1, 2]" }));
        let endpoint = serve(router).await;
        let transport = HttpWorkerTransport::new("/model");

        let response = transport
            .send(&endpoint, &InferenceRequest::new(json!({})))
            .await
            .unwrap();
        assert_eq!(response.body, json!([1, 2]));
    }

    #[tokio::test]
    async fn test_refused_connection_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let transport = HttpWorkerTransport::new("/model");
        let endpoint = Endpoint::new("dead", "127.0.0.1", port);
        let err = transport
            .send(&endpoint, &InferenceRequest::new(json!({})))
            .await
            .unwrap_err();

        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_error_status_is_application_error() {
        let router = Router::new().route(
            "/model",
            post(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let endpoint = serve(router).await;
        let transport = HttpWorkerTransport::new("/model");

        let err = transport
            .send(&endpoint, &InferenceRequest::new(json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Application(ref m) if m.contains("boom")));
    }

    #[tokio::test]
    async fn test_non_json_reply_is_application_error() {
        let router = Router::new().route("/model", post(|| async { "not json" }));
        let endpoint = serve(router).await;
        let transport = HttpWorkerTransport::new("/model");

        let err = transport
            .send(&endpoint, &InferenceRequest::new(json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Application(_)));
    }
}
