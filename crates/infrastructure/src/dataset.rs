use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::info;

use gateway_config::EvaluationConfig;
use gateway_domain::{DatasetLoader, Sample};
use gateway_errors::{GatewayError, GatewayResult};

/// 评估数据集加载器
///
/// 参考数据集首次使用时下载到本地缓存文件（文件已存在则跳过下载），
/// 解析结果在进程内只保留一份。
pub struct CachedDatasetLoader {
    client: reqwest::Client,
    url: String,
    cache_path: PathBuf,
    default_samples: OnceCell<Vec<Sample>>,
}

impl CachedDatasetLoader {
    pub fn new<U: Into<String>, P: Into<PathBuf>>(url: U, cache_path: P) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            cache_path: cache_path.into(),
            default_samples: OnceCell::new(),
        }
    }

    pub fn from_config(config: &EvaluationConfig) -> Self {
        Self::new(config.dataset_url.clone(), config.dataset_cache_path.clone())
    }

    async fn ensure_cached(&self) -> GatewayResult<()> {
        if tokio::fs::try_exists(&self.cache_path).await? {
            return Ok(());
        }

        info!("下载参考数据集 {} -> {}", self.url, self.cache_path.display());
        let bytes = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| GatewayError::dataset(format!("下载数据集 {} 失败: {e}", self.url)))?
            .bytes()
            .await
            .map_err(|e| GatewayError::dataset(format!("下载数据集 {} 失败: {e}", self.url)))?;

        if let Some(parent) = self.cache_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let partial = self.cache_path.with_extension("part");
        tokio::fs::write(&partial, &bytes).await?;
        tokio::fs::rename(&partial, &self.cache_path).await?;
        Ok(())
    }
}

async fn read_samples(path: &Path) -> GatewayResult<Vec<Sample>> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| GatewayError::dataset(format!("无法读取数据集 {}: {e}", path.display())))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| GatewayError::dataset(format!("数据集 {} 格式错误: {e}", path.display())))
}

#[async_trait]
impl DatasetLoader for CachedDatasetLoader {
    async fn load_default(&self) -> GatewayResult<Vec<Sample>> {
        let samples = self
            .default_samples
            .get_or_try_init(|| async {
                self.ensure_cached().await?;
                let samples = read_samples(&self.cache_path).await?;
                info!("参考数据集共 {} 条样本", samples.len());
                Ok::<_, GatewayError>(samples)
            })
            .await?;
        Ok(samples.clone())
    }

    async fn load_from(&self, location: &str) -> GatewayResult<Vec<Sample>> {
        read_samples(Path::new(location)).await
    }
}
