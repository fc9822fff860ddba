//! 日志与指标初始化
//!
//! 进程启动时调用一次 [`init_logging`]，需要暴露 `/metrics` 时再调用
//! [`init_metrics`] 安装全局的Prometheus recorder。

pub mod logging;
pub mod prometheus;

pub use logging::init_logging;
pub use prometheus::{describe_metrics, init_metrics, PrometheusHandle};
