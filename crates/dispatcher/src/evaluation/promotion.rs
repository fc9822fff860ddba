use chrono::{DateTime, Utc};

use gateway_domain::MetricsRecord;

use super::scoring::Scores;

/// 历史最佳精度/召回率，空历史视为0
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HistoricalBest {
    pub precision: f64,
    pub recall: f64,
}

impl HistoricalBest {
    pub fn from_records(records: &[MetricsRecord]) -> Self {
        records.iter().fold(Self::default(), |best, record| Self {
            precision: best.precision.max(record.new_precision),
            recall: best.recall.max(record.new_recall),
        })
    }

    /// 任一指标严格超过历史最佳即晋升
    pub fn is_improved_by(&self, scores: &Scores) -> bool {
        scores.precision > self.precision || scores.recall > self.recall
    }

    pub fn record_for(&self, scores: &Scores, promote: bool, timestamp: DateTime<Utc>) -> MetricsRecord {
        MetricsRecord {
            timestamp,
            previous_best_precision: self.precision,
            new_precision: scores.precision,
            previous_best_recall: self.recall,
            new_recall: scores.recall,
            promote,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(precision: f64, recall: f64) -> MetricsRecord {
        MetricsRecord {
            timestamp: Utc::now(),
            previous_best_precision: 0.0,
            new_precision: precision,
            previous_best_recall: 0.0,
            new_recall: recall,
            promote: true,
        }
    }

    #[test]
    fn test_empty_history_is_zero_baseline() {
        let best = HistoricalBest::from_records(&[]);
        assert_eq!(best, HistoricalBest::default());
        assert!(best.is_improved_by(&Scores {
            precision: 0.001,
            recall: 0.0
        }));
    }

    #[test]
    fn test_maxima_are_taken_per_metric() {
        let best = HistoricalBest::from_records(&[record(0.8, 0.4), record(0.6, 0.7)]);
        assert_eq!(best.precision, 0.8);
        assert_eq!(best.recall, 0.7);
    }

    #[test]
    fn test_improvement_requires_strict_increase() {
        let best = HistoricalBest {
            precision: 0.8,
            recall: 0.7,
        };
        assert!(!best.is_improved_by(&Scores {
            precision: 0.8,
            recall: 0.7
        }));
        assert!(best.is_improved_by(&Scores {
            precision: 0.5,
            recall: 0.701
        }));
        assert!(best.is_improved_by(&Scores {
            precision: 0.81,
            recall: 0.1
        }));
    }

    #[test]
    fn test_record_carries_previous_best() {
        let best = HistoricalBest {
            precision: 0.8,
            recall: 0.7,
        };
        let now = Utc::now();
        let record = best.record_for(
            &Scores {
                precision: 0.9,
                recall: 0.6,
            },
            true,
            now,
        );
        assert_eq!(record.timestamp, now);
        assert_eq!(record.previous_best_precision, 0.8);
        assert_eq!(record.new_precision, 0.9);
        assert_eq!(record.previous_best_recall, 0.7);
        assert_eq!(record.new_recall, 0.6);
        assert!(record.promote);
    }
}
