pub mod dataset;
pub mod supervisor;
pub mod transport;
pub mod worker_pool;

pub use dataset::DatasetLoader;
pub use supervisor::WorkerSupervisor;
pub use transport::WorkerTransport;
pub use worker_pool::{WorkerPool, WorkerStats};
