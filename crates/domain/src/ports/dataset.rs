use async_trait::async_trait;
use gateway_errors::GatewayResult;

use crate::entities::Sample;

#[async_trait]
pub trait DatasetLoader: Send + Sync {
    /// 内置的参考数据集，首次使用时下载并缓存
    async fn load_default(&self) -> GatewayResult<Vec<Sample>>;

    async fn load_from(&self, location: &str) -> GatewayResult<Vec<Sample>>;
}
