use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use gateway_config::AliasConfig;
use gateway_domain::AliasRepository;
use gateway_errors::{GatewayError, GatewayResult};

type AliasMap = BTreeMap<String, Vec<String>>;

/// JSON文件保存的别名表（标签 -> 实体ID列表）
///
/// 每次操作都重新读取文件，维护脚本可能在网关之外修改它。
/// 写入先落到临时文件再重命名，读者不会看到写了一半的内容。
pub struct JsonAliasRegistry {
    path: PathBuf,
    lock: RwLock<()>,
}

impl JsonAliasRegistry {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn from_config(config: &AliasConfig) -> Self {
        Self::new(config.path.clone())
    }

    async fn read_map(&self) -> GatewayResult<AliasMap> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(AliasMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AliasMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_map(&self, aliases: &AliasMap) -> GatewayResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_vec_pretty(aliases)?;
        let temp = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp, content).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }

    fn merge(aliases: &mut AliasMap, label: String, entity_ids: Vec<String>) {
        let ids = aliases.entry(label).or_default();
        for id in entity_ids {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
}

#[async_trait]
impl AliasRepository for JsonAliasRegistry {
    async fn list(&self) -> GatewayResult<AliasMap> {
        let _guard = self.lock.read().await;
        self.read_map().await
    }

    async fn get(&self, label: &str) -> GatewayResult<Option<Vec<String>>> {
        let _guard = self.lock.read().await;
        Ok(self.read_map().await?.remove(label))
    }

    async fn add(&self, label: &str, entity_ids: Vec<String>) -> GatewayResult<()> {
        let _guard = self.lock.write().await;
        let mut aliases = self.read_map().await?;
        Self::merge(&mut aliases, label.to_string(), entity_ids);
        self.write_map(&aliases).await?;
        info!("别名 {} 已更新", label);
        Ok(())
    }

    async fn add_many(&self, new_aliases: AliasMap) -> GatewayResult<()> {
        let _guard = self.lock.write().await;
        let mut aliases = self.read_map().await?;
        let count = new_aliases.len();
        for (label, ids) in new_aliases {
            Self::merge(&mut aliases, label, ids);
        }
        self.write_map(&aliases).await?;
        info!("批量更新了 {} 个别名", count);
        Ok(())
    }

    async fn delete(&self, label: &str) -> GatewayResult<()> {
        let _guard = self.lock.write().await;
        let mut aliases = self.read_map().await?;
        if aliases.remove(label).is_none() {
            return Err(GatewayError::alias_not_found(label));
        }
        self.write_map(&aliases).await?;
        info!("别名 {} 已删除", label);
        Ok(())
    }
}
