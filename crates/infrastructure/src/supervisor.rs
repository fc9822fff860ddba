use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use gateway_config::SupervisorConfig;
use gateway_domain::WorkerSupervisor;
use gateway_errors::{GatewayError, GatewayResult};

/// 通过外部命令管理Worker进程（默认是 docker CLI）
///
/// 模板按shell规则切分成参数（支持引号），`{name}` 替换为进程名；
/// 单独成词的 `{script}` 展开为脚本的各个参数，不经过shell。
pub struct CommandSupervisor {
    templates: SupervisorConfig,
}

struct CommandOutput {
    stdout: String,
    stderr: String,
}

impl CommandSupervisor {
    pub fn new(templates: SupervisorConfig) -> Self {
        Self { templates }
    }

    fn render(template: &str, name: &str, script: &str) -> GatewayResult<(String, Vec<String>)> {
        let tokens = shlex::split(template)
            .ok_or_else(|| GatewayError::config_error(format!("命令模板引号不匹配: {template}")))?;

        let mut args = Vec::with_capacity(tokens.len());
        for token in tokens {
            if token == "{script}" {
                let script_args = shlex::split(script)
                    .ok_or_else(|| GatewayError::config_error(format!("脚本引号不匹配: {script}")))?;
                args.extend(script_args);
            } else {
                args.push(token.replace("{name}", name).replace("{script}", script));
            }
        }

        if args.is_empty() {
            return Err(GatewayError::config_error("命令模板为空"));
        }
        let program = args.remove(0);
        Ok((program, args))
    }

    async fn run(&self, template: &str, name: &str, script: &str) -> GatewayResult<CommandOutput> {
        let (program, args) = Self::render(template, name, script)?;
        debug!("执行命令: {} {:?}", program, args);

        let output = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| GatewayError::Internal(format!("启动命令 {program} 失败: {e}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(GatewayError::Internal(format!(
                "命令 {program} 执行失败 ({}): {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

#[async_trait]
impl WorkerSupervisor for CommandSupervisor {
    async fn restart(&self, name: &str) -> GatewayResult<()> {
        self.run(&self.templates.restart_command, name, "").await?;
        info!("进程 {} 已重启", name);
        Ok(())
    }

    async fn status(&self, name: &str) -> GatewayResult<String> {
        let output = self.run(&self.templates.status_command, name, "").await?;
        Ok(output.stdout.trim().to_string())
    }

    async fn logs(&self, name: &str) -> GatewayResult<String> {
        // docker logs 会把容器的stderr原样输出到stderr
        let output = self.run(&self.templates.logs_command, name, "").await?;
        Ok(output.stdout + &output.stderr)
    }

    async fn run_script(&self, name: &str, script: &str) -> GatewayResult<()> {
        info!("在 {} 中运行脚本: {}", name, script);
        self.run(&self.templates.maintenance_command, name, script)
            .await?;
        info!("脚本 {} 运行结束", script);
        Ok(())
    }
}
