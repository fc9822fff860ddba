use serde::{Deserialize, Serialize};

use gateway_domain::LinkedEntities;
use gateway_errors::{GatewayError, GatewayResult};

/// 评估中使用的两个哨兵值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentinels {
    /// Worker未能链接到任何实体
    pub unresolved: String,
    /// 标注中该提及没有可链接的实体
    pub no_entity: String,
}

impl Default for Sentinels {
    fn default() -> Self {
        Self {
            unresolved: "not in wiki".to_string(),
            no_entity: "0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationCounts {
    pub num_correct: u64,
    pub num_found: u64,
    pub num_relevant: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub precision: f64,
    pub recall: f64,
}

impl EvaluationCounts {
    /// 统计一个提及；空候选列表视为未链接
    pub fn record(&mut self, top: Option<&str>, gold: &str, sentinels: &Sentinels) {
        let resolved = top.filter(|id| *id != sentinels.unresolved);

        if let Some(id) = resolved {
            self.num_found += 1;
            if id == gold {
                self.num_correct += 1;
            }
        }
        if gold != sentinels.no_entity {
            self.num_relevant += 1;
        }
    }

    /// 按位置对齐统计一个样本，多出的提及或标注被忽略
    pub fn record_sample(&mut self, linked: &LinkedEntities, gold: &[String], sentinels: &Sentinels) {
        for (top, gold) in linked.top_candidates().zip(gold) {
            self.record(top, gold, sentinels);
        }
    }

    pub fn scores(&self) -> GatewayResult<Scores> {
        if self.num_found == 0 || self.num_relevant == 0 {
            return Err(GatewayError::DegenerateEvaluation {
                num_found: self.num_found,
                num_relevant: self.num_relevant,
            });
        }

        Ok(Scores {
            precision: round3(self.num_correct as f64 / self.num_found as f64),
            recall: round3(self.num_correct as f64 / self.num_relevant as f64),
        })
    }
}

pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
