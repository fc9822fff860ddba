use crate::*;

#[test]
fn test_gateway_error_display() {
    assert_eq!(GatewayError::PoolExhausted.to_string(), "没有可用的Worker");

    let transport = GatewayError::transport("el-worker-1:8000", "connection refused");
    assert_eq!(
        transport.to_string(),
        "Worker el-worker-1:8000 连接失败: connection refused"
    );

    let degenerate = GatewayError::DegenerateEvaluation {
        num_found: 0,
        num_relevant: 3,
    };
    assert_eq!(
        degenerate.to_string(),
        "评估结果无效: num_found=0, num_relevant=3"
    );

    let alias = GatewayError::alias_not_found("москва");
    assert_eq!(alias.to_string(), "别名未找到: москва");
}

#[test]
fn test_only_connection_failures_are_transport() {
    assert!(GatewayError::transport("a", "refused").is_transport());
    assert!(GatewayError::Timeout {
        endpoint: "a".to_string(),
        seconds: 5
    }
    .is_transport());

    assert!(!GatewayError::PoolExhausted.is_transport());
    assert!(!GatewayError::application("bad json").is_transport());
    assert!(!GatewayError::DegenerateEvaluation {
        num_found: 0,
        num_relevant: 0
    }
    .is_transport());
}

#[test]
fn test_pool_exhausted_is_distinguishable_from_timeout() {
    let exhausted = GatewayError::PoolExhausted;
    let timeout = GatewayError::Timeout {
        endpoint: "a".to_string(),
        seconds: 60,
    };
    assert_ne!(exhausted.kind(), timeout.kind());
    assert_eq!(exhausted.kind(), "POOL_EXHAUSTED");
    assert_eq!(timeout.kind(), "TRANSPORT_TIMEOUT");
}

#[test]
fn test_error_conversions() {
    let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: GatewayError = json_err.into();
    assert!(matches!(err, GatewayError::Serialization(_)));

    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let err: GatewayError = io_err.into();
    assert!(matches!(err, GatewayError::Storage(_)));

    let err: GatewayError = anyhow::anyhow!("boom").into();
    assert!(matches!(err, GatewayError::Internal(_)));
}

#[test]
fn test_user_message() {
    assert_eq!(
        GatewayError::PoolExhausted.user_message(),
        "当前没有存活的Worker，请稍后重试"
    );
    assert_eq!(
        GatewayError::Internal("x".to_string()).user_message(),
        "系统繁忙，请稍后重试"
    );
}
