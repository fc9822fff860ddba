use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use gateway_config::PoolConfig;
use gateway_domain::{Endpoint, WorkerPool, WorkerStats, WorkerSupervisor};
use gateway_errors::{GatewayError, GatewayResult};

#[derive(Debug, Default)]
struct ReplacementState {
    replacing: HashSet<String>,
    last_replaced: HashMap<String, Instant>,
}

/// 受管的Worker池
///
/// 正在替换的Worker暂时退出轮转。同一Worker的替换在进行中或刚完成
/// （冷却期内）时，重复的替换请求直接忽略，因此并发的故障转移只会触发一次重启。
pub struct ManagedWorkerPool {
    endpoints: Vec<Endpoint>,
    manager_name: String,
    supervisor: Arc<dyn WorkerSupervisor>,
    cooldown: Duration,
    cursor: AtomicUsize,
    state: Arc<Mutex<ReplacementState>>,
    maintenance_running: Arc<AtomicBool>,
}

/// 替换结束（包括被取消）时把Worker放回轮转
struct ReplacementGuard {
    state: Arc<Mutex<ReplacementState>>,
    name: String,
    succeeded: bool,
}

impl Drop for ReplacementGuard {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        state.replacing.remove(&self.name);
        if self.succeeded {
            state.last_replaced.insert(self.name.clone(), Instant::now());
        }
    }
}

fn lock(state: &Mutex<ReplacementState>) -> MutexGuard<'_, ReplacementState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ManagedWorkerPool {
    pub fn new(
        endpoints: Vec<Endpoint>,
        manager_name: impl Into<String>,
        supervisor: Arc<dyn WorkerSupervisor>,
        cooldown: Duration,
    ) -> Self {
        Self {
            endpoints,
            manager_name: manager_name.into(),
            supervisor,
            cooldown,
            cursor: AtomicUsize::new(0),
            state: Arc::new(Mutex::new(ReplacementState::default())),
            maintenance_running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn from_config(config: &PoolConfig, supervisor: Arc<dyn WorkerSupervisor>) -> Self {
        let endpoints = config
            .workers
            .iter()
            .map(|w| Endpoint::new(w.name.clone(), w.host.clone(), w.port))
            .collect();
        Self::new(
            endpoints,
            config.manager_name.clone(),
            supervisor,
            Duration::from_secs(config.replace_cooldown_seconds),
        )
    }

    pub fn manager_name(&self) -> &str {
        &self.manager_name
    }

    pub fn is_maintenance_running(&self) -> bool {
        self.maintenance_running.load(Ordering::SeqCst)
    }

    fn live_endpoints(&self) -> Vec<&Endpoint> {
        let state = lock(&self.state);
        self.endpoints
            .iter()
            .filter(|e| !state.replacing.contains(&e.name))
            .collect()
    }

    fn is_known(&self, name: &str) -> bool {
        name == self.manager_name || self.endpoints.iter().any(|e| e.name == name)
    }

    /// 登记一次替换；已在替换中或仍在冷却期时返回None
    fn begin_replacement(&self, name: &str) -> Option<ReplacementGuard> {
        let mut state = lock(&self.state);

        if state.replacing.contains(name) {
            debug!("Worker {} 正在替换中，忽略重复请求", name);
            return None;
        }
        if let Some(at) = state.last_replaced.get(name) {
            if at.elapsed() < self.cooldown {
                debug!("Worker {} 刚刚完成替换，忽略重复请求", name);
                return None;
            }
        }

        state.replacing.insert(name.to_string());
        Some(ReplacementGuard {
            state: Arc::clone(&self.state),
            name: name.to_string(),
            succeeded: false,
        })
    }
}

#[async_trait]
impl WorkerPool for ManagedWorkerPool {
    /// 游标在完整的地址列表上推进并跳过替换中的Worker，
    /// 某个Worker退出轮转不会改变其余Worker的位置
    fn next_endpoint(&self) -> Option<Endpoint> {
        let state = lock(&self.state);
        let len = self.endpoints.len();
        for _ in 0..len {
            let index = self.cursor.fetch_add(1, Ordering::Relaxed) % len;
            let endpoint = &self.endpoints[index];
            if !state.replacing.contains(&endpoint.name) {
                return Some(endpoint.clone());
            }
        }
        None
    }

    fn live_count(&self) -> usize {
        self.live_endpoints().len()
    }

    async fn replace(&self, endpoint: &Endpoint) -> GatewayResult<()> {
        if !self.endpoints.iter().any(|e| e.name == endpoint.name) {
            return Err(GatewayError::worker_not_found(&endpoint.name));
        }
        let Some(mut guard) = self.begin_replacement(&endpoint.name) else {
            return Ok(());
        };

        info!("重启Worker {}", endpoint);
        metrics::counter!("gateway_worker_replacements_total").increment(1);

        self.supervisor.restart(&endpoint.name).await?;
        guard.succeeded = true;
        info!("Worker {} 已重新加入轮转", endpoint);
        Ok(())
    }

    async fn replace_all(&self) -> GatewayResult<()> {
        let mut failed = Vec::new();
        for endpoint in &self.endpoints {
            if let Err(e) = self.replace(endpoint).await {
                error!("重启Worker {} 失败: {}", endpoint, e);
                failed.push(endpoint.name.clone());
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(GatewayError::Internal(format!(
                "以下Worker重启失败: {}",
                failed.join(", ")
            )))
        }
    }

    async fn stats(&self) -> GatewayResult<WorkerStats> {
        let replacing = lock(&self.state).replacing.clone();
        let mut stats = WorkerStats::new();

        for name in self
            .endpoints
            .iter()
            .map(|e| e.name.as_str())
            .chain(std::iter::once(self.manager_name.as_str()))
        {
            let status = if replacing.contains(name) {
                "replacing".to_string()
            } else {
                self.supervisor.status(name).await.unwrap_or_else(|e| {
                    warn!("无法获取 {} 的状态: {}", name, e);
                    "unknown".to_string()
                })
            };
            stats.insert(name.to_string(), status);
        }

        Ok(stats)
    }

    async fn logs(&self, name: &str) -> GatewayResult<String> {
        if !self.is_known(name) {
            return Err(GatewayError::worker_not_found(name));
        }
        self.supervisor.logs(name).await
    }

    async fn run_maintenance(&self, script: &str) -> GatewayResult<()> {
        if self
            .maintenance_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(GatewayError::MaintenanceBusy(script.to_string()));
        }

        let supervisor = Arc::clone(&self.supervisor);
        let running = Arc::clone(&self.maintenance_running);
        let manager = self.manager_name.clone();
        let script = script.to_string();

        tokio::spawn(async move {
            match supervisor.run_script(&manager, &script).await {
                Ok(()) => info!("维护脚本 {} 已完成", script),
                Err(e) => error!("维护脚本 {} 失败: {}", script, e),
            }
            running.store(false, Ordering::SeqCst);
        });

        Ok(())
    }
}
