use std::collections::BTreeMap;

use async_trait::async_trait;
use gateway_errors::GatewayResult;

use crate::entities::Endpoint;

/// 名称 -> 状态描述
pub type WorkerStats = BTreeMap<String, String>;

/// Worker池：维护存活的Worker地址并负责替换失效实例
#[async_trait]
pub trait WorkerPool: Send + Sync {
    /// 轮转取下一个存活地址，池为空时返回None
    fn next_endpoint(&self) -> Option<Endpoint>;

    /// 当前参与轮转的地址数量
    fn live_count(&self) -> usize;

    /// 替换指定地址上的Worker；对同一地址的并发重复调用必须是幂等的
    async fn replace(&self, endpoint: &Endpoint) -> GatewayResult<()>;

    /// 依次替换全部Worker
    async fn replace_all(&self) -> GatewayResult<()>;

    /// 所有Worker及管理进程的状态
    async fn stats(&self) -> GatewayResult<WorkerStats>;

    async fn logs(&self, name: &str) -> GatewayResult<String>;

    /// 在管理进程上后台运行维护脚本
    async fn run_maintenance(&self, script: &str) -> GatewayResult<()>;
}
