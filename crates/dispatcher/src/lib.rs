//! 网关核心
//!
//! - `dispatcher`: 带故障转移的请求分发，连接失败时异步替换Worker并换下一个地址重试
//! - `evaluation`: 通过分发器回放标注数据集，计算精度/召回率并决定是否晋升模型

pub mod dispatcher;
pub mod evaluation;

#[cfg(test)]
pub mod test_utils;

pub use dispatcher::{DispatchConfig, Dispatcher};
pub use evaluation::{
    EvaluationConfig, EvaluationCounts, EvaluationEngine, HistoricalBest, Scores, Sentinels,
};
