use anyhow::{Context, Result};
use metrics::{describe_counter, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

pub use metrics_exporter_prometheus::PrometheusHandle;

/// 安装全局Prometheus recorder，返回用于渲染 `/metrics` 的句柄
pub fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("安装Prometheus指标记录器失败")?;
    describe_metrics();
    info!("Prometheus指标已启用");
    Ok(handle)
}

pub fn describe_metrics() {
    describe_counter!(
        "gateway_dispatch_total",
        Unit::Count,
        "按结果（ok/error/exhausted）统计的分发请求数"
    );
    describe_counter!(
        "gateway_dispatch_failover_total",
        Unit::Count,
        "因Worker不可达而换用下一个地址的次数"
    );
    describe_counter!(
        "gateway_worker_replacements_total",
        Unit::Count,
        "实际执行的Worker重启次数"
    );
    describe_counter!(
        "gateway_evaluation_runs_total",
        Unit::Count,
        "完成的评估次数，按是否晋升区分"
    );
}
