#[cfg(test)]
pub mod mocks {
    // Re-export shared mock implementations from testing-utils
    pub use gateway_testing_utils::{
        endpoints, reply, InMemoryMetricsRepository, MockWorkerPool, SampleBuilder,
        ScriptedTransport, StaticDatasetLoader, WorkerBehavior,
    };
}
