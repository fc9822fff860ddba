//! 网关的外部适配器
//!
//! 每个模块实现 `gateway-domain` 中的一个端口：HTTP Worker传输、受管Worker池、
//! 基于命令模板的进程管理、CSV指标历史、带缓存的数据集加载以及JSON别名表。

pub mod alias_registry;
pub mod dataset;
pub mod http_transport;
pub mod metrics_store;
pub mod supervisor;
pub mod worker_pool;

pub use alias_registry::JsonAliasRegistry;
pub use dataset::CachedDatasetLoader;
pub use http_transport::HttpWorkerTransport;
pub use metrics_store::CsvMetricsRepository;
pub use supervisor::CommandSupervisor;
pub use worker_pool::ManagedWorkerPool;
