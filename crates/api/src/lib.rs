//! # Gateway API
//!
//! 实体链接网关的HTTP接口，基于Axum构建。
//!
//! 路由层只做参数解析和结果渲染，推理分发、评估、Worker管理和别名存储
//! 都委托给 [`AppState`] 中的服务。
//!
//! ## API 端点
//!
//! ### 推理与评估
//! - `POST /model` - 转发推理请求到存活的Worker，原样返回Worker的JSON
//! - `POST /test` - 在参考数据集或指定文件上评估模型，决定是否晋升
//!
//! ### Worker管理
//! - `GET /update/containers` - 后台依次重启全部Worker
//! - `GET /update/wikidata`, `GET /update/model` - 在管理进程上运行维护脚本
//! - `GET /worker/{name}` - 原始日志文本
//! - `GET /status`, `GET /logs/{name}` - HTML状态页与日志页
//!
//! ### 别名
//! - `GET /aliases`, `GET /aliases/get/{label}`, `GET /aliases/delete/{label}`
//! - `POST /aliases/add/{label}`, `POST /aliases/add_many`
//!
//! ### 系统
//! - `GET /health`, `GET /metrics`
//!
//! ## 错误响应
//!
//! ```json
//! {
//!   "error": {
//!     "kind": "POOL_EXHAUSTED",
//!     "message": "当前没有存活的Worker，请稍后重试",
//!     "code": 503,
//!     "detail": "没有可用的Worker",
//!     "timestamp": "2024-01-01T00:00:00Z"
//!   }
//! }
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

use axum::Router;
use tower::ServiceBuilder;

use middleware::{cors_layer, request_logging, trace_layer};
pub use routes::{create_routes, AppState};

/// 创建完整的API应用
pub fn create_app(state: AppState, cors_enabled: bool) -> Router {
    let router = create_routes(state).layer(
        ServiceBuilder::new()
            .layer(trace_layer())
            .layer(axum::middleware::from_fn(request_logging)),
    );

    if cors_enabled {
        router.layer(cors_layer())
    } else {
        router
    }
}
