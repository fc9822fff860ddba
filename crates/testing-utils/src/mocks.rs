//! Mock implementations for all port and repository traits
//!
//! In-memory doubles that can be used for unit testing without worker
//! processes, containers or files on disk.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use gateway_domain::{
    AliasRepository, DatasetLoader, Endpoint, InferenceRequest, InferenceResponse,
    MetricsRecord, MetricsRepository, Sample, WorkerPool, WorkerStats, WorkerSupervisor,
    WorkerTransport,
};
use gateway_errors::{GatewayError, GatewayResult};
use serde_json::Value;

/// Polls `condition` until it holds, panicking after two seconds
async fn wait_until<F: Fn() -> bool>(condition: F, what: &str) {
    let result = tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(result.is_ok(), "timed out waiting for {what}");
}

/// Mock implementation of WorkerPool with a fixed rotation
pub struct MockWorkerPool {
    endpoints: Mutex<Vec<Endpoint>>,
    cursor: AtomicUsize,
    replaced: Mutex<Vec<Endpoint>>,
    maintenance: Mutex<Vec<String>>,
    replace_delay: Duration,
    fail_replacements: bool,
    remove_on_replace: bool,
}

impl MockWorkerPool {
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        Self {
            endpoints: Mutex::new(endpoints),
            cursor: AtomicUsize::new(0),
            replaced: Mutex::new(Vec::new()),
            maintenance: Mutex::new(Vec::new()),
            replace_delay: Duration::ZERO,
            fail_replacements: false,
            remove_on_replace: false,
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    /// Replacements sleep for `delay` after being recorded
    pub fn with_replace_delay(mut self, delay: Duration) -> Self {
        self.replace_delay = delay;
        self
    }

    pub fn failing_replacements(mut self) -> Self {
        self.fail_replacements = true;
        self
    }

    /// Replaced endpoints leave the rotation, as if their worker never came back
    pub fn removing_replaced(mut self) -> Self {
        self.remove_on_replace = true;
        self
    }

    pub fn replaced_names(&self) -> Vec<String> {
        self.replaced
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }

    pub fn maintenance_scripts(&self) -> Vec<String> {
        self.maintenance.lock().unwrap().clone()
    }

    pub async fn wait_for_replacements(&self, count: usize) {
        wait_until(
            || self.replaced.lock().unwrap().len() >= count,
            "worker replacements",
        )
        .await;
    }
}

#[async_trait]
impl WorkerPool for MockWorkerPool {
    fn next_endpoint(&self) -> Option<Endpoint> {
        let endpoints = self.endpoints.lock().unwrap();
        if endpoints.is_empty() {
            return None;
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % endpoints.len();
        Some(endpoints[index].clone())
    }

    fn live_count(&self) -> usize {
        self.endpoints.lock().unwrap().len()
    }

    async fn replace(&self, endpoint: &Endpoint) -> GatewayResult<()> {
        self.replaced.lock().unwrap().push(endpoint.clone());
        if self.remove_on_replace {
            self.endpoints.lock().unwrap().retain(|e| e != endpoint);
        }
        if !self.replace_delay.is_zero() {
            tokio::time::sleep(self.replace_delay).await;
        }
        if self.fail_replacements {
            return Err(GatewayError::Internal(format!(
                "cannot restart {}",
                endpoint.name
            )));
        }
        Ok(())
    }

    async fn replace_all(&self) -> GatewayResult<()> {
        let endpoints = self.endpoints.lock().unwrap().clone();
        for endpoint in endpoints {
            self.replace(&endpoint).await?;
        }
        Ok(())
    }

    async fn stats(&self) -> GatewayResult<WorkerStats> {
        let mut stats: WorkerStats = self
            .endpoints
            .lock()
            .unwrap()
            .iter()
            .map(|e| (e.name.clone(), "running".to_string()))
            .collect();
        stats.insert("manager".to_string(), "running".to_string());
        Ok(stats)
    }

    async fn logs(&self, name: &str) -> GatewayResult<String> {
        let known = name == "manager"
            || self
                .endpoints
                .lock()
                .unwrap()
                .iter()
                .any(|e| e.name == name);
        if known {
            Ok(format!("{name} started\n{name} ready"))
        } else {
            Err(GatewayError::worker_not_found(name))
        }
    }

    async fn run_maintenance(&self, script: &str) -> GatewayResult<()> {
        self.maintenance.lock().unwrap().push(script.to_string());
        Ok(())
    }
}

/// Behaviour of one scripted worker call
#[derive(Debug, Clone)]
pub enum WorkerBehavior {
    Respond(Value),
    /// Connection refused
    Refuse,
    /// Never answers
    Hang,
    /// Application-level failure
    Fail(String),
}

/// Mock implementation of WorkerTransport driven by per-endpoint scripts
///
/// Each endpoint plays its script in order; the last behaviour repeats.
/// Endpoints without a script refuse connections.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<WorkerBehavior>>>,
    calls: Mutex<Vec<String>>,
    latency: Duration,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps before answering, so spawned tasks get to run
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn script(&self, name: &str, behaviors: Vec<WorkerBehavior>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(name.to_string(), behaviors.into());
    }

    /// Endpoint names in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn next_behavior(&self, name: &str) -> WorkerBehavior {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(name) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(WorkerBehavior::Refuse),
            Some(queue) => queue.front().cloned().unwrap_or(WorkerBehavior::Refuse),
            None => WorkerBehavior::Refuse,
        }
    }
}

#[async_trait]
impl WorkerTransport for ScriptedTransport {
    async fn send(
        &self,
        endpoint: &Endpoint,
        _request: &InferenceRequest,
    ) -> GatewayResult<InferenceResponse> {
        self.calls.lock().unwrap().push(endpoint.name.clone());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match self.next_behavior(&endpoint.name) {
            WorkerBehavior::Respond(body) => Ok(InferenceResponse::new(body)),
            WorkerBehavior::Refuse => Err(GatewayError::transport(
                endpoint.address(),
                "connection refused",
            )),
            WorkerBehavior::Hang => std::future::pending().await,
            WorkerBehavior::Fail(message) => Err(GatewayError::application(message)),
        }
    }
}

/// Mock implementation of MetricsRepository
#[derive(Default)]
pub struct InMemoryMetricsRepository {
    records: Mutex<Vec<MetricsRecord>>,
}

impl InMemoryMetricsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<MetricsRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    pub fn records(&self) -> Vec<MetricsRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetricsRepository for InMemoryMetricsRepository {
    async fn load_all(&self) -> GatewayResult<Vec<MetricsRecord>> {
        Ok(self.records())
    }

    async fn append(&self, record: &MetricsRecord) -> GatewayResult<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Mock implementation of DatasetLoader
pub struct StaticDatasetLoader {
    default_samples: Vec<Sample>,
    locations: Mutex<HashMap<String, Vec<Sample>>>,
    default_loads: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl StaticDatasetLoader {
    pub fn new(default_samples: Vec<Sample>) -> Self {
        Self {
            default_samples,
            locations: Mutex::new(HashMap::new()),
            default_loads: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn with_location(self, location: &str, samples: Vec<Sample>) -> Self {
        self.locations
            .lock()
            .unwrap()
            .insert(location.to_string(), samples);
        self
    }

    pub fn default_loads(&self) -> usize {
        self.default_loads.load(Ordering::SeqCst)
    }

    pub fn requested_locations(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl DatasetLoader for StaticDatasetLoader {
    async fn load_default(&self) -> GatewayResult<Vec<Sample>> {
        self.default_loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.default_samples.clone())
    }

    async fn load_from(&self, location: &str) -> GatewayResult<Vec<Sample>> {
        self.requested.lock().unwrap().push(location.to_string());
        self.locations
            .lock()
            .unwrap()
            .get(location)
            .cloned()
            .ok_or_else(|| GatewayError::dataset(format!("无法读取 {location}")))
    }
}

/// Mock implementation of AliasRepository
#[derive(Default)]
pub struct InMemoryAliasRepository {
    aliases: Mutex<BTreeMap<String, Vec<String>>>,
}

impl InMemoryAliasRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AliasRepository for InMemoryAliasRepository {
    async fn list(&self) -> GatewayResult<BTreeMap<String, Vec<String>>> {
        Ok(self.aliases.lock().unwrap().clone())
    }

    async fn get(&self, label: &str) -> GatewayResult<Option<Vec<String>>> {
        Ok(self.aliases.lock().unwrap().get(label).cloned())
    }

    async fn add(&self, label: &str, entity_ids: Vec<String>) -> GatewayResult<()> {
        let mut aliases = self.aliases.lock().unwrap();
        let ids = aliases.entry(label.to_string()).or_default();
        for id in entity_ids {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(())
    }

    async fn add_many(&self, new_aliases: BTreeMap<String, Vec<String>>) -> GatewayResult<()> {
        for (label, ids) in new_aliases {
            self.add(&label, ids).await?;
        }
        Ok(())
    }

    async fn delete(&self, label: &str) -> GatewayResult<()> {
        self.aliases
            .lock()
            .unwrap()
            .remove(label)
            .map(|_| ())
            .ok_or_else(|| GatewayError::alias_not_found(label))
    }
}

/// Mock implementation of WorkerSupervisor that counts restarts
pub struct MockSupervisor {
    restarts: Mutex<Vec<String>>,
    scripts: Mutex<Vec<(String, String)>>,
    restart_delay: Duration,
    script_delay: Duration,
    fail_restarts: bool,
}

impl MockSupervisor {
    pub fn new() -> Self {
        Self {
            restarts: Mutex::new(Vec::new()),
            scripts: Mutex::new(Vec::new()),
            restart_delay: Duration::ZERO,
            script_delay: Duration::ZERO,
            fail_restarts: false,
        }
    }

    pub fn with_restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay = delay;
        self
    }

    pub fn with_script_delay(mut self, delay: Duration) -> Self {
        self.script_delay = delay;
        self
    }

    pub fn failing_restarts(mut self) -> Self {
        self.fail_restarts = true;
        self
    }

    pub fn restarts(&self) -> Vec<String> {
        self.restarts.lock().unwrap().clone()
    }

    pub fn restart_count(&self, name: &str) -> usize {
        self.restarts
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.as_str() == name)
            .count()
    }

    /// (process name, script) pairs in start order
    pub fn scripts(&self) -> Vec<(String, String)> {
        self.scripts.lock().unwrap().clone()
    }

    pub async fn wait_for_scripts(&self, count: usize) {
        wait_until(|| self.scripts.lock().unwrap().len() >= count, "scripts").await;
    }
}

impl Default for MockSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkerSupervisor for MockSupervisor {
    async fn restart(&self, name: &str) -> GatewayResult<()> {
        self.restarts.lock().unwrap().push(name.to_string());
        if !self.restart_delay.is_zero() {
            tokio::time::sleep(self.restart_delay).await;
        }
        if self.fail_restarts {
            return Err(GatewayError::Internal(format!("restart of {name} failed")));
        }
        Ok(())
    }

    async fn status(&self, _name: &str) -> GatewayResult<String> {
        Ok("running".to_string())
    }

    async fn logs(&self, name: &str) -> GatewayResult<String> {
        Ok(format!("{name} started\n{name} ready"))
    }

    async fn run_script(&self, name: &str, script: &str) -> GatewayResult<()> {
        self.scripts
            .lock()
            .unwrap()
            .push((name.to_string(), script.to_string()));
        if !self.script_delay.is_zero() {
            tokio::time::sleep(self.script_delay).await;
        }
        Ok(())
    }
}
