use std::fmt;

use chrono::{DateTime, Utc};
use gateway_errors::{GatewayError, GatewayResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Worker实例的网络地址，成员关系由Worker池维护
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub name: String,
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new<N: Into<String>, H: Into<String>>(name: N, host: H, port: u16) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}:{}{}", self.host, self.port, path)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}:{})", self.name, self.host, self.port)
    }
}

/// 发往Worker的请求体，分发器原样透传
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InferenceRequest {
    pub body: Value,
}

impl InferenceRequest {
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    /// 将单个评估样本包装成只含一个元素的批次
    pub fn from_sample(sample: &Sample) -> Self {
        Self::new(json!({
            "entity_substr": [sample.entity_substr],
            "entity_offsets": [sample.entity_offsets],
            "tags": [sample.tags],
            "sentences_offsets": [sample.sentences_offsets],
            "sentences": [sample.sentences],
            "probas": [sample.probas],
        }))
    }
}

/// Worker返回的响应体，分发器原样透传
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InferenceResponse {
    pub body: Value,
}

impl InferenceResponse {
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    /// 按批次解析实体链接结果，格式不符视为Worker应用错误
    pub fn linked_batches(&self) -> GatewayResult<Vec<LinkedEntities>> {
        serde_json::from_value(self.body.clone())
            .map_err(|e| GatewayError::application(format!("无法解析Worker响应: {e}")))
    }
}

/// 单个提及的候选实体，按置信度排序
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Candidates {
    Ranked(Vec<String>),
    Single(String),
}

impl Candidates {
    pub fn top(&self) -> Option<&str> {
        match self {
            Candidates::Ranked(ids) => ids.first().map(String::as_str),
            Candidates::Single(id) => Some(id.as_str()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawLinkedEntities(Value, Value, Value, Vec<Candidates>, Value, Value, Value);

/// 批次中一个元素的链接结果
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawLinkedEntities")]
pub struct LinkedEntities {
    pub entity_substr: Value,
    pub confidences: Value,
    pub entity_offsets: Value,
    pub entity_ids: Vec<Candidates>,
    pub entity_tags: Value,
    pub entity_labels: Value,
    pub status: Value,
}

impl From<RawLinkedEntities> for LinkedEntities {
    fn from(raw: RawLinkedEntities) -> Self {
        let RawLinkedEntities(
            entity_substr,
            confidences,
            entity_offsets,
            entity_ids,
            entity_tags,
            entity_labels,
            status,
        ) = raw;
        Self {
            entity_substr,
            confidences,
            entity_offsets,
            entity_ids,
            entity_tags,
            entity_labels,
            status,
        }
    }
}

impl LinkedEntities {
    /// 每个提及的首选候选，空候选列表返回None
    pub fn top_candidates(&self) -> impl Iterator<Item = Option<&str>> {
        self.entity_ids.iter().map(Candidates::top)
    }
}

/// 带标注的评估样本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub entity_substr: Vec<String>,
    pub entity_offsets: Vec<[usize; 2]>,
    pub tags: Vec<String>,
    #[serde(default)]
    pub probas: Value,
    pub sentences: Vec<String>,
    pub sentences_offsets: Vec<[usize; 2]>,
    pub gold_entities: Vec<String>,
}

/// 一次评估的结果，`promote = true` 的记录才会写入历史
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub timestamp: DateTime<Utc>,
    pub previous_best_precision: f64,
    pub new_precision: f64,
    pub previous_best_recall: f64,
    pub new_recall: f64,
    pub promote: bool,
}
