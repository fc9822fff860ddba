use async_trait::async_trait;
use gateway_errors::GatewayResult;

use crate::entities::{Endpoint, InferenceRequest, InferenceResponse};

/// 向单个Worker发送一次推理请求
///
/// 连接不可达必须返回 `GatewayError::Transport`，其余失败返回
/// `GatewayError::Application`，分发器据此决定是否故障转移。
#[async_trait]
pub trait WorkerTransport: Send + Sync {
    async fn send(
        &self,
        endpoint: &Endpoint,
        request: &InferenceRequest,
    ) -> GatewayResult<InferenceResponse>;
}
