use async_trait::async_trait;
use gateway_errors::GatewayResult;

/// Worker进程生命周期管理（容器重启、状态、日志、脚本执行）
#[async_trait]
pub trait WorkerSupervisor: Send + Sync {
    async fn restart(&self, name: &str) -> GatewayResult<()>;

    async fn status(&self, name: &str) -> GatewayResult<String>;

    async fn logs(&self, name: &str) -> GatewayResult<String>;

    /// 在指定进程内运行脚本并等待其结束
    async fn run_script(&self, name: &str, script: &str) -> GatewayResult<()>;
}
