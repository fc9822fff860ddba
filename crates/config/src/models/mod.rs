pub mod api_observability;
pub mod app_config;
pub mod dispatcher_evaluation;
pub mod pool;

pub use api_observability::{LogFormat, ObservabilityConfig, ServerConfig};
pub use app_config::AppConfig;
pub use dispatcher_evaluation::{AliasConfig, DispatcherConfig, EvaluationConfig};
pub use pool::{PoolConfig, SupervisorConfig, WorkerSpec};
