use crate::validation::{ConfigValidator, ValidationUtils};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// 单次Worker调用超时，超时按连接失败处理
    pub worker_timeout_seconds: u64,
    pub worker_path: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            worker_timeout_seconds: 60,
            worker_path: "/model".to_string(),
        }
    }
}

impl ConfigValidator for DispatcherConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_timeout_seconds(
            self.worker_timeout_seconds,
            "dispatcher.worker_timeout_seconds",
        )?;
        ValidationUtils::validate_not_empty(&self.worker_path, "dispatcher.worker_path")?;
        if !self.worker_path.starts_with('/') {
            return Err(crate::ConfigError::Validation(
                "dispatcher.worker_path must start with '/'".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub metrics_path: String,
    pub dataset_url: String,
    pub dataset_cache_path: String,
    pub unresolved_sentinel: String,
    pub no_entity_sentinel: String,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            metrics_path: "/data/metrics_score_history.csv".to_string(),
            dataset_url: "http://files.deeppavlov.ai/rkn_data/el_test_samples.json".to_string(),
            dataset_cache_path: "/data/el_test_samples.json".to_string(),
            unresolved_sentinel: "not in wiki".to_string(),
            no_entity_sentinel: "0".to_string(),
        }
    }
}

impl ConfigValidator for EvaluationConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_not_empty(&self.metrics_path, "evaluation.metrics_path")?;
        ValidationUtils::validate_url(&self.dataset_url, "evaluation.dataset_url")?;
        ValidationUtils::validate_not_empty(
            &self.dataset_cache_path,
            "evaluation.dataset_cache_path",
        )?;
        ValidationUtils::validate_not_empty(
            &self.unresolved_sentinel,
            "evaluation.unresolved_sentinel",
        )?;
        ValidationUtils::validate_not_empty(
            &self.no_entity_sentinel,
            "evaluation.no_entity_sentinel",
        )?;
        if self.unresolved_sentinel == self.no_entity_sentinel {
            return Err(crate::ConfigError::Validation(
                "evaluation sentinels must differ".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasConfig {
    pub path: String,
}

impl Default for AliasConfig {
    fn default() -> Self {
        Self {
            path: "/data/aliases.json".to_string(),
        }
    }
}

impl ConfigValidator for AliasConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_not_empty(&self.path, "aliases.path")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatcher_config_validation() {
        let config = DispatcherConfig::default();
        assert!(config.validate().is_ok());

        let mut invalid = config.clone();
        invalid.worker_timeout_seconds = 0;
        assert!(invalid.validate().is_err());

        let mut invalid = config;
        invalid.worker_path = "model".to_string();
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_evaluation_config_validation() {
        let config = EvaluationConfig::default();
        assert!(config.validate().is_ok());

        let mut invalid = config.clone();
        invalid.no_entity_sentinel = invalid.unresolved_sentinel.clone();
        assert!(invalid.validate().is_err());

        let mut invalid = config;
        invalid.dataset_url = "files.deeppavlov.ai".to_string();
        assert!(invalid.validate().is_err());
    }
}
