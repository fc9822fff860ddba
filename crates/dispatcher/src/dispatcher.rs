use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use gateway_domain::{Endpoint, InferenceRequest, InferenceResponse, WorkerPool, WorkerTransport};
use gateway_errors::{GatewayError, GatewayResult};

/// 分发器配置
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// 单次Worker调用超时，超时与连接失败同样处理
    pub worker_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            worker_timeout: Duration::from_secs(60),
        }
    }
}

/// 请求分发器
///
/// 每次调用最多尝试 N 个不同的地址，N 为进入循环时的存活Worker数量。
/// 连接失败（含超时）时记录告警、后台触发该地址的Worker替换并换下一个地址；
/// 其余错误直接返回给调用方，不重试。
pub struct Dispatcher {
    pool: Arc<dyn WorkerPool>,
    transport: Arc<dyn WorkerTransport>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(
        pool: Arc<dyn WorkerPool>,
        transport: Arc<dyn WorkerTransport>,
        config: Option<DispatchConfig>,
    ) -> Self {
        Self {
            pool,
            transport,
            config: config.unwrap_or_default(),
        }
    }

    pub async fn dispatch(&self, request: &InferenceRequest) -> GatewayResult<InferenceResponse> {
        let request_id = Uuid::new_v4();
        let attempts = self.pool.live_count();

        if attempts == 0 {
            warn!(%request_id, "Worker池为空，无法分发请求");
            metrics::counter!("gateway_dispatch_total", "outcome" => "exhausted").increment(1);
            return Err(GatewayError::PoolExhausted);
        }

        let mut tried: HashSet<String> = HashSet::with_capacity(attempts);
        for attempt in 1..=attempts {
            let Some(endpoint) = self.next_untried(&tried, attempts) else {
                debug!(%request_id, attempt, "轮转中已没有未尝试过的Worker");
                break;
            };
            tried.insert(endpoint.name.clone());

            debug!(%request_id, attempt, attempts, "分发请求到 {}", endpoint);

            match self.send_with_timeout(&endpoint, request).await {
                Ok(response) => {
                    metrics::counter!("gateway_dispatch_total", "outcome" => "ok").increment(1);
                    return Ok(response);
                }
                Err(e) if e.is_transport() => {
                    warn!(%request_id, "{} 不可用，重启Worker容器: {}", endpoint, e);
                    metrics::counter!("gateway_dispatch_failover_total").increment(1);
                    self.schedule_replacement(endpoint);
                }
                Err(e) => {
                    metrics::counter!("gateway_dispatch_total", "outcome" => "error").increment(1);
                    return Err(e);
                }
            }
        }

        error!(%request_id, "尝试了 {} 个Worker均不可用", attempts);
        metrics::counter!("gateway_dispatch_total", "outcome" => "exhausted").increment(1);
        Err(GatewayError::PoolExhausted)
    }

    /// 从轮转中取一个本次调用尚未尝试过的地址。
    /// 并发请求共享游标，最多多取一轮以越过已尝试的地址
    fn next_untried(&self, tried: &HashSet<String>, attempts: usize) -> Option<Endpoint> {
        (0..attempts + tried.len())
            .map_while(|_| self.pool.next_endpoint())
            .find(|endpoint| !tried.contains(&endpoint.name))
    }

    async fn send_with_timeout(
        &self,
        endpoint: &Endpoint,
        request: &InferenceRequest,
    ) -> GatewayResult<InferenceResponse> {
        match tokio::time::timeout(
            self.config.worker_timeout,
            self.transport.send(endpoint, request),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout {
                endpoint: endpoint.address(),
                seconds: self.config.worker_timeout.as_secs(),
            }),
        }
    }

    /// 后台替换Worker，调用方不等待其完成；替换失败只记录日志
    fn schedule_replacement(&self, endpoint: Endpoint) {
        let pool = Arc::clone(&self.pool);
        tokio::spawn(async move {
            match pool.replace(&endpoint).await {
                Ok(()) => info!("Worker {} 替换请求已处理", endpoint),
                Err(e) => error!("替换Worker {} 失败: {}", endpoint, e),
            }
        });
    }
}
