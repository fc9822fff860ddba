use std::collections::HashSet;

use crate::validation::{ConfigValidator, ValidationUtils};
use serde::{Deserialize, Serialize};

/// 单个Worker容器的地址定义
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkerSpec {
    pub name: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub workers: Vec<WorkerSpec>,
    pub manager_name: String,
    /// 替换完成后在此时间窗口内的重复替换请求视为已处理
    pub replace_cooldown_seconds: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: vec![
                WorkerSpec {
                    name: "el-worker-1".to_string(),
                    host: "el-worker-1".to_string(),
                    port: 8000,
                },
                WorkerSpec {
                    name: "el-worker-2".to_string(),
                    host: "el-worker-2".to_string(),
                    port: 8000,
                },
            ],
            manager_name: "manager".to_string(),
            replace_cooldown_seconds: 10,
        }
    }
}

impl ConfigValidator for PoolConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        if self.workers.is_empty() {
            return Err(crate::ConfigError::Validation(
                "pool.workers cannot be empty".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for worker in &self.workers {
            ValidationUtils::validate_not_empty(&worker.name, "pool.workers.name")?;
            ValidationUtils::validate_not_empty(&worker.host, "pool.workers.host")?;
            ValidationUtils::validate_port(worker.port, "pool.workers.port")?;
            if !names.insert(worker.name.as_str()) {
                return Err(crate::ConfigError::Validation(format!(
                    "Duplicate worker name: {}",
                    worker.name
                )));
            }
        }

        ValidationUtils::validate_not_empty(&self.manager_name, "pool.manager_name")?;
        if names.contains(self.manager_name.as_str()) {
            return Err(crate::ConfigError::Validation(format!(
                "pool.manager_name collides with a worker name: {}",
                self.manager_name
            )));
        }

        Ok(())
    }
}

/// Worker进程生命周期命令模板，`{name}` 为容器名，`{script}` 为维护脚本
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    pub restart_command: String,
    pub status_command: String,
    pub logs_command: String,
    pub maintenance_command: String,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            restart_command: "docker restart {name}".to_string(),
            status_command: "docker inspect --format {{.State.Status}} {name}".to_string(),
            logs_command: "docker logs --tail 1000 {name}".to_string(),
            maintenance_command: "docker exec {name} {script}".to_string(),
        }
    }
}

impl ConfigValidator for SupervisorConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_template(
            &self.restart_command,
            "{name}",
            "supervisor.restart_command",
        )?;
        ValidationUtils::validate_template(
            &self.status_command,
            "{name}",
            "supervisor.status_command",
        )?;
        ValidationUtils::validate_template(&self.logs_command, "{name}", "supervisor.logs_command")?;
        ValidationUtils::validate_template(
            &self.maintenance_command,
            "{script}",
            "supervisor.maintenance_command",
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_config_validation() {
        let config = PoolConfig::default();
        assert!(config.validate().is_ok());

        let mut invalid = config.clone();
        invalid.workers.clear();
        assert!(invalid.validate().is_err());

        let mut invalid = config.clone();
        invalid.workers[1].name = invalid.workers[0].name.clone();
        assert!(invalid.validate().is_err());

        let mut invalid = config.clone();
        invalid.workers[0].port = 0;
        assert!(invalid.validate().is_err());

        let mut invalid = config;
        invalid.manager_name = "el-worker-1".to_string();
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_supervisor_config_validation() {
        let config = SupervisorConfig::default();
        assert!(config.validate().is_ok());

        let mut invalid = config.clone();
        invalid.restart_command = "docker restart".to_string();
        assert!(invalid.validate().is_err());

        let mut invalid = config.clone();
        invalid.maintenance_command = "docker exec {name}".to_string();
        assert!(invalid.validate().is_err());

        let mut invalid = config.clone();
        invalid.maintenance_command = r#"docker exec {name} sh -c "{script}"#.to_string();
        assert!(invalid.validate().is_err());

        let mut quoted = config;
        quoted.maintenance_command = r#"docker exec {name} sh -c "cd /app && {script}""#.to_string();
        assert!(quoted.validate().is_ok());
    }
}
