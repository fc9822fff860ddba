//! 存储抽象
//!
//! 指标历史只追加不改写；别名表是简单的标签到实体ID映射

use std::collections::BTreeMap;

use async_trait::async_trait;
use gateway_errors::GatewayResult;

use crate::entities::MetricsRecord;

/// 评估指标历史
#[async_trait]
pub trait MetricsRepository: Send + Sync {
    /// 按写入顺序读取全部记录，存储不存在时返回空列表
    async fn load_all(&self) -> GatewayResult<Vec<MetricsRecord>>;
    async fn append(&self, record: &MetricsRecord) -> GatewayResult<()>;
}

/// 别名表
#[async_trait]
pub trait AliasRepository: Send + Sync {
    async fn list(&self) -> GatewayResult<BTreeMap<String, Vec<String>>>;
    async fn get(&self, label: &str) -> GatewayResult<Option<Vec<String>>>;
    async fn add(&self, label: &str, entity_ids: Vec<String>) -> GatewayResult<()>;
    async fn add_many(&self, aliases: BTreeMap<String, Vec<String>>) -> GatewayResult<()>;
    async fn delete(&self, label: &str) -> GatewayResult<()>;
}
