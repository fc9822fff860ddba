//! 模型精度评估
//!
//! 通过分发器逐条回放标注样本（复用全部故障转移逻辑），汇总精度与召回率，
//! 与指标历史中的最佳值比较。只有当任一指标严格超过历史最佳时才追加一条
//! `promote = true` 的记录；未提升的结果只作为返回值，不落盘。

mod promotion;
mod scoring;

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use gateway_domain::{DatasetLoader, InferenceRequest, MetricsRecord, MetricsRepository, Sample};
use gateway_errors::{GatewayError, GatewayResult};

use crate::dispatcher::Dispatcher;

pub use promotion::HistoricalBest;
pub use scoring::{EvaluationCounts, Scores, Sentinels};

#[derive(Debug, Clone, Default)]
pub struct EvaluationConfig {
    pub sentinels: Sentinels,
}

pub struct EvaluationEngine {
    dispatcher: Arc<Dispatcher>,
    metrics_repo: Arc<dyn MetricsRepository>,
    dataset_loader: Arc<dyn DatasetLoader>,
    config: EvaluationConfig,
    // 读取历史与追加记录必须串行，否则并发评估可能写入非单调的最佳值
    promotion_lock: Mutex<()>,
}

impl EvaluationEngine {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        metrics_repo: Arc<dyn MetricsRepository>,
        dataset_loader: Arc<dyn DatasetLoader>,
        config: Option<EvaluationConfig>,
    ) -> Self {
        Self {
            dispatcher,
            metrics_repo,
            dataset_loader,
            config: config.unwrap_or_default(),
            promotion_lock: Mutex::new(()),
        }
    }

    /// 评估指定位置的数据集；位置为空时使用内置参考数据集
    pub async fn evaluate_dataset(&self, location: Option<&str>) -> GatewayResult<MetricsRecord> {
        let samples = match location.map(str::trim).filter(|l| !l.is_empty()) {
            Some(location) => {
                info!("使用数据集 {} 进行评估", location);
                self.dataset_loader.load_from(location).await?
            }
            None => {
                info!("使用内置参考数据集进行评估");
                self.dataset_loader.load_default().await?
            }
        };

        self.evaluate(&samples).await
    }

    pub async fn evaluate(&self, samples: &[Sample]) -> GatewayResult<MetricsRecord> {
        let counts = self.score_samples(samples).await?;
        let scores = counts.scores()?;

        info!(
            num_correct = counts.num_correct,
            num_found = counts.num_found,
            num_relevant = counts.num_relevant,
            "评估完成: precision={:.3}, recall={:.3}",
            scores.precision,
            scores.recall
        );

        self.decide_promotion(&scores).await
    }

    /// 逐条分发样本并汇总计数，任何非连接错误都会中止本次评估
    pub async fn score_samples(&self, samples: &[Sample]) -> GatewayResult<EvaluationCounts> {
        let mut counts = EvaluationCounts::default();

        for (index, sample) in samples.iter().enumerate() {
            let request = InferenceRequest::from_sample(sample);
            let response = self.dispatcher.dispatch(&request).await?;
            let batches = response.linked_batches()?;
            let linked = batches.first().ok_or_else(|| {
                GatewayError::application(format!("样本 {index} 的Worker响应为空"))
            })?;

            counts.record_sample(linked, &sample.gold_entities, &self.config.sentinels);
            debug!(index, ?counts, "样本已评估");
        }

        Ok(counts)
    }

    async fn decide_promotion(&self, scores: &Scores) -> GatewayResult<MetricsRecord> {
        let _guard = self.promotion_lock.lock().await;

        let history = self.metrics_repo.load_all().await?;
        let best = HistoricalBest::from_records(&history);

        if best.is_improved_by(scores) {
            let record = best.record_for(scores, true, Utc::now());
            self.metrics_repo.append(&record).await?;
            info!(
                "指标超过历史最佳 (precision {:.3} -> {:.3}, recall {:.3} -> {:.3})，标记模型晋升",
                best.precision, scores.precision, best.recall, scores.recall
            );
            metrics::counter!("gateway_evaluation_runs_total", "promoted" => "true").increment(1);
            Ok(record)
        } else {
            info!(
                "指标未超过历史最佳 (precision {:.3}, recall {:.3})，不记录",
                best.precision, best.recall
            );
            metrics::counter!("gateway_evaluation_runs_total", "promoted" => "false").increment(1);
            Ok(best.record_for(scores, false, Utc::now()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::mocks::*;
    use serde_json::json;

    fn engine(
        transport: Arc<ScriptedTransport>,
        metrics_repo: Arc<InMemoryMetricsRepository>,
        loader: Arc<StaticDatasetLoader>,
    ) -> EvaluationEngine {
        let pool = Arc::new(MockWorkerPool::new(endpoints(&["a"])));
        let dispatcher = Arc::new(Dispatcher::new(pool, transport, None));
        EvaluationEngine::new(dispatcher, metrics_repo, loader, None)
    }

    #[tokio::test]
    async fn test_empty_location_uses_default_dataset() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.script("a", vec![WorkerBehavior::Respond(reply(&["Q1"]))]);
        let loader = Arc::new(StaticDatasetLoader::new(vec![SampleBuilder::new()
            .mention("москва", "Q1")
            .build()]));
        let metrics_repo = Arc::new(InMemoryMetricsRepository::new());
        let engine = engine(transport, metrics_repo, loader.clone());

        engine.evaluate_dataset(Some("  ")).await.unwrap();
        engine.evaluate_dataset(None).await.unwrap();
        assert_eq!(loader.default_loads(), 2);
        assert!(loader.requested_locations().is_empty());
    }

    #[tokio::test]
    async fn test_empty_worker_batch_is_application_error() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.script("a", vec![WorkerBehavior::Respond(json!([]))]);
        let loader = Arc::new(StaticDatasetLoader::new(vec![]));
        let metrics_repo = Arc::new(InMemoryMetricsRepository::new());
        let engine = engine(transport, metrics_repo.clone(), loader);

        let samples = vec![SampleBuilder::new().mention("москва", "Q1").build()];
        let err = engine.evaluate(&samples).await.unwrap_err();
        assert!(matches!(err, GatewayError::Application(_)));
        assert!(metrics_repo.records().is_empty());
    }
}
