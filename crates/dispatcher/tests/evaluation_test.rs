use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use gateway_domain::{MetricsRecord, Sample};
use gateway_errors::GatewayError;
use gateway_testing_utils::{
    endpoints, reply, InMemoryMetricsRepository, MockWorkerPool, SampleBuilder,
    ScriptedTransport, StaticDatasetLoader, WorkerBehavior,
};

use gateway_dispatcher::{DispatchConfig, Dispatcher, EvaluationEngine};

struct Harness {
    engine: EvaluationEngine,
    pool: Arc<MockWorkerPool>,
    metrics_repo: Arc<InMemoryMetricsRepository>,
}

fn harness(
    names: &[&str],
    transport: Arc<ScriptedTransport>,
    metrics_repo: InMemoryMetricsRepository,
    samples: Vec<Sample>,
) -> Harness {
    let pool = Arc::new(MockWorkerPool::new(endpoints(names)));
    let metrics_repo = Arc::new(metrics_repo);
    let dispatcher = Arc::new(Dispatcher::new(
        pool.clone(),
        transport,
        Some(DispatchConfig {
            worker_timeout: Duration::from_millis(100),
        }),
    ));
    let engine = EvaluationEngine::new(
        dispatcher,
        metrics_repo.clone(),
        Arc::new(StaticDatasetLoader::new(samples)),
        None,
    );
    Harness {
        engine,
        pool,
        metrics_repo,
    }
}

fn three_mention_sample() -> Sample {
    SampleBuilder::new()
        .with_sentence("москва париж берлин")
        .mention("москва", "Q649")
        .mention("париж", "Q90")
        .mention("берлин", "0")
        .build()
}

fn history(precision: f64, recall: f64) -> MetricsRecord {
    MetricsRecord {
        timestamp: Utc::now(),
        previous_best_precision: 0.0,
        new_precision: precision,
        previous_best_recall: 0.0,
        new_recall: recall,
        promote: true,
    }
}

#[tokio::test]
async fn test_evaluation_scores_and_promotes_on_empty_history() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.script(
        "a",
        vec![WorkerBehavior::Respond(reply(&["Q649", "not in wiki", "Q1"]))],
    );
    let h = harness(
        &["a"],
        transport,
        InMemoryMetricsRepository::new(),
        vec![three_mention_sample()],
    );

    let record = h.engine.evaluate_dataset(None).await.unwrap();

    assert_eq!(record.new_precision, 0.5);
    assert_eq!(record.new_recall, 0.5);
    assert_eq!(record.previous_best_precision, 0.0);
    assert_eq!(record.previous_best_recall, 0.0);
    assert!(record.promote);
    assert_eq!(h.metrics_repo.records(), vec![record]);
}

#[tokio::test]
async fn test_evaluation_is_deterministic() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.script(
        "a",
        vec![WorkerBehavior::Respond(reply(&["Q649", "Q90", "Q1"]))],
    );
    let h = harness(
        &["a"],
        transport,
        InMemoryMetricsRepository::new(),
        vec![three_mention_sample()],
    );

    let first = h.engine.evaluate_dataset(None).await.unwrap();
    let second = h.engine.evaluate_dataset(None).await.unwrap();

    assert_eq!(first.new_precision, second.new_precision);
    assert_eq!(first.new_recall, second.new_recall);
    assert!(first.promote);
    assert!(!second.promote);
    assert_eq!(h.metrics_repo.records().len(), 1);
}

#[tokio::test]
async fn test_promotion_requires_strict_improvement_over_history() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.script(
        "a",
        vec![WorkerBehavior::Respond(reply(&["Q649", "not in wiki", "Q1"]))],
    );
    let h = harness(
        &["a"],
        transport,
        InMemoryMetricsRepository::with_records(vec![history(0.5, 0.2), history(0.1, 0.5)]),
        vec![three_mention_sample()],
    );

    let record = h.engine.evaluate_dataset(None).await.unwrap();

    assert!(!record.promote);
    assert_eq!(record.previous_best_precision, 0.5);
    assert_eq!(record.previous_best_recall, 0.5);
    assert_eq!(h.metrics_repo.records().len(), 2);
}

#[tokio::test]
async fn test_persisted_best_never_decreases() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.script(
        "a",
        vec![
            WorkerBehavior::Respond(reply(&["Q649", "not in wiki", "Q1"])),
            WorkerBehavior::Respond(reply(&["Q1", "Q2", "Q3"])),
            WorkerBehavior::Respond(reply(&["Q649", "Q90", "Q1"])),
        ],
    );
    let h = harness(
        &["a"],
        transport,
        InMemoryMetricsRepository::new(),
        vec![three_mention_sample()],
    );

    for _ in 0..3 {
        let _ = h.engine.evaluate_dataset(None).await;
    }

    let records = h.metrics_repo.records();
    assert!(records.iter().all(|r| r.promote));
    for pair in records.windows(2) {
        assert!(
            pair[1].new_precision > pair[0].new_precision
                || pair[1].new_recall > pair[0].new_recall
        );
        assert_eq!(pair[1].previous_best_precision, pair[0].new_precision);
    }
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn test_degenerate_evaluation_writes_no_record() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.script(
        "a",
        vec![WorkerBehavior::Respond(reply(&[
            "not in wiki",
            "not in wiki",
            "not in wiki",
        ]))],
    );
    let h = harness(
        &["a"],
        transport,
        InMemoryMetricsRepository::new(),
        vec![three_mention_sample()],
    );

    let err = h.engine.evaluate_dataset(None).await.unwrap_err();

    assert!(matches!(
        err,
        GatewayError::DegenerateEvaluation { num_found: 0, .. }
    ));
    assert!(h.metrics_repo.records().is_empty());
}

#[tokio::test]
async fn test_evaluation_survives_worker_crash_between_samples() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.script(
        "a",
        vec![
            WorkerBehavior::Respond(reply(&["Q649", "Q90", "Q1"])),
            WorkerBehavior::Refuse,
        ],
    );
    transport.script(
        "b",
        vec![WorkerBehavior::Respond(reply(&["Q649", "Q90", "Q1"]))],
    );
    let samples = vec![
        three_mention_sample(),
        three_mention_sample(),
        three_mention_sample(),
    ];
    let h = harness(
        &["a", "b"],
        transport,
        InMemoryMetricsRepository::new(),
        samples,
    );

    let record = h.engine.evaluate_dataset(None).await.unwrap();

    assert_eq!(record.new_precision, 0.667);
    assert_eq!(record.new_recall, 1.0);
    h.pool.wait_for_replacements(1).await;
    assert!(h.pool.replaced_names().iter().all(|name| name == "a"));
}
