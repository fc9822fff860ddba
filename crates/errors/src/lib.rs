use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("没有可用的Worker")]
    PoolExhausted,
    #[error("Worker {endpoint} 连接失败: {message}")]
    Transport { endpoint: String, message: String },
    #[error("Worker {endpoint} 请求超时 ({seconds}秒)")]
    Timeout { endpoint: String, seconds: u64 },
    #[error("Worker响应错误: {0}")]
    Application(String),
    #[error("评估结果无效: num_found={num_found}, num_relevant={num_relevant}")]
    DegenerateEvaluation { num_found: u64, num_relevant: u64 },
    #[error("Worker未找到: {name}")]
    WorkerNotFound { name: String },
    #[error("别名未找到: {label}")]
    AliasNotFound { label: String },
    #[error("维护任务正在运行: {0}")]
    MaintenanceBusy(String),
    #[error("数据集错误: {0}")]
    Dataset(String),
    #[error("存储错误: {0}")]
    Storage(String),
    #[error("序列化错误: {0}")]
    Serialization(String),
    #[error("配置错误: {0}")]
    Configuration(String),
    #[error("内部错误: {0}")]
    Internal(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    pub fn transport<E: Into<String>, M: Into<String>>(endpoint: E, message: M) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }
    pub fn application<S: Into<String>>(msg: S) -> Self {
        Self::Application(msg.into())
    }
    pub fn worker_not_found<S: Into<String>>(name: S) -> Self {
        Self::WorkerNotFound { name: name.into() }
    }
    pub fn alias_not_found<S: Into<String>>(label: S) -> Self {
        Self::AliasNotFound {
            label: label.into(),
        }
    }
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }
    pub fn dataset<S: Into<String>>(msg: S) -> Self {
        Self::Dataset(msg.into())
    }
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// 连接级失败：分发器会就地恢复（替换Worker并重试），不向调用方暴露
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            GatewayError::Transport { .. } | GatewayError::Timeout { .. }
        )
    }

    /// 机器可读的错误类型
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::PoolExhausted => "POOL_EXHAUSTED",
            GatewayError::Transport { .. } => "TRANSPORT_FAILURE",
            GatewayError::Timeout { .. } => "TRANSPORT_TIMEOUT",
            GatewayError::Application(_) => "APPLICATION_FAILURE",
            GatewayError::DegenerateEvaluation { .. } => "DEGENERATE_EVALUATION",
            GatewayError::WorkerNotFound { .. } => "WORKER_NOT_FOUND",
            GatewayError::AliasNotFound { .. } => "ALIAS_NOT_FOUND",
            GatewayError::MaintenanceBusy(_) => "MAINTENANCE_BUSY",
            GatewayError::Dataset(_) => "DATASET_ERROR",
            GatewayError::Storage(_) => "STORAGE_ERROR",
            GatewayError::Serialization(_) => "SERIALIZATION_ERROR",
            GatewayError::Configuration(_) => "CONFIGURATION_ERROR",
            GatewayError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn user_message(&self) -> &str {
        match self {
            GatewayError::PoolExhausted => "当前没有存活的Worker，请稍后重试",
            GatewayError::Transport { .. } | GatewayError::Timeout { .. } => {
                "Worker暂时不可用，请稍后重试"
            }
            GatewayError::Application(_) => "Worker返回了无效的响应",
            GatewayError::DegenerateEvaluation { .. } => {
                "评估样本无法计算精度或召回率，请检查数据集"
            }
            GatewayError::WorkerNotFound { .. } => "请求的Worker不存在",
            GatewayError::AliasNotFound { .. } => "请求的别名不存在",
            GatewayError::MaintenanceBusy(_) => "维护脚本正在运行，请等待其完成",
            GatewayError::Dataset(_) => "评估数据集无法读取",
            _ => "系统繁忙，请稍后重试",
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        GatewayError::Storage(err.to_string())
    }
}

impl From<anyhow::Error> for GatewayError {
    fn from(err: anyhow::Error) -> Self {
        GatewayError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests;
