use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use gateway_domain::{MetricsRecord, MetricsRepository};
use gateway_errors::{GatewayError, GatewayResult};

const HEADER: &str = "time,old_precision,new_precision,old_recall,new_recall,update_model";
const COLUMNS: [&str; 6] = [
    "time",
    "old_precision",
    "new_precision",
    "old_recall",
    "new_recall",
    "update_model",
];

/// 以CSV文件保存的评估指标历史，只追加不改写
///
/// 读取时按表头定位列，兼容由其他工具生成、列顺序不同的历史文件。
pub struct CsvMetricsRepository {
    path: PathBuf,
}

impl CsvMetricsRepository {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    fn format_row(record: &MetricsRecord) -> String {
        format!(
            "{},{},{},{},{},{}\n",
            record.timestamp.to_rfc3339(),
            record.previous_best_precision,
            record.new_precision,
            record.previous_best_recall,
            record.new_recall,
            if record.promote { "True" } else { "False" }
        )
    }

    fn parse(&self, content: &str) -> GatewayResult<Vec<MetricsRecord>> {
        let mut lines = content.lines().filter(|l| !l.trim().is_empty());
        let Some(header) = lines.next() else {
            return Ok(Vec::new());
        };

        let names: Vec<&str> = header.split(',').map(str::trim).collect();
        let mut positions = [0usize; 6];
        for (slot, column) in positions.iter_mut().zip(COLUMNS) {
            *slot = names.iter().position(|n| *n == column).ok_or_else(|| {
                GatewayError::storage(format!(
                    "指标文件 {} 缺少列 {column}",
                    self.path.display()
                ))
            })?;
        }

        lines
            .enumerate()
            .map(|(index, line)| {
                let fields: Vec<&str> = line.split(',').map(str::trim).collect();
                Self::parse_row(&fields, &positions).map_err(|reason| {
                    GatewayError::storage(format!(
                        "指标文件 {} 第 {} 行无效: {reason}",
                        self.path.display(),
                        index + 2
                    ))
                })
            })
            .collect()
    }

    fn parse_row(fields: &[&str], positions: &[usize; 6]) -> Result<MetricsRecord, String> {
        let field = |i: usize| {
            fields
                .get(positions[i])
                .copied()
                .ok_or_else(|| format!("缺少字段 {}", COLUMNS[i]))
        };
        let number = |i: usize| -> Result<f64, String> {
            field(i)?
                .parse::<f64>()
                .map_err(|e| format!("{}: {e}", COLUMNS[i]))
        };

        Ok(MetricsRecord {
            timestamp: parse_time(field(0)?)?,
            previous_best_precision: number(1)?,
            new_precision: number(2)?,
            previous_best_recall: number(3)?,
            new_recall: number(4)?,
            promote: parse_flag(field(5)?)?,
        })
    }
}

fn parse_time(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(time) = DateTime::parse_from_rfc3339(value) {
        return Ok(time.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("time: {e}"))
}

fn parse_flag(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(format!("update_model: {other}")),
    }
}

#[async_trait]
impl MetricsRepository for CsvMetricsRepository {
    async fn load_all(&self) -> GatewayResult<Vec<MetricsRecord>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("指标文件 {} 不存在，视为空历史", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        self.parse(&content)
    }

    async fn append(&self, record: &MetricsRecord) -> GatewayResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let mut content = String::new();
        if file.metadata().await?.len() == 0 {
            content.push_str(HEADER);
            content.push('\n');
        }
        content.push_str(&Self::format_row(record));

        file.write_all(content.as_bytes()).await?;
        file.flush().await?;

        info!("已写入指标记录到 {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn record(precision: f64, recall: f64, promote: bool) -> MetricsRecord {
        MetricsRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            previous_best_precision: 0.25,
            new_precision: precision,
            previous_best_recall: 0.125,
            new_recall: recall,
            promote,
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_history() {
        let dir = TempDir::new().unwrap();
        let repo = CsvMetricsRepository::new(dir.path().join("metrics.csv"));
        assert!(repo.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_writes_header_once_and_preserves_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("metrics.csv");
        let repo = CsvMetricsRepository::new(&path);

        let first = record(0.5, 0.5, true);
        let second = record(0.667, 0.75, true);
        repo.append(&first).await.unwrap();
        repo.append(&second).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().filter(|l| *l == HEADER).count(), 1);
        assert_eq!(content.lines().count(), 3);
        assert!(content.lines().nth(1).unwrap().ends_with(",True"));

        assert_eq!(repo.load_all().await.unwrap(), vec![first, second]);
    }

    #[tokio::test]
    async fn test_reads_history_with_other_column_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metrics.csv");
        std::fs::write(
            &path,
            "update_model,time,new_precision,new_recall,old_precision,old_recall\n\
             True,2023-11-02 10:15:30.123456,0.812,0.774,0.0,0.0\n",
        )
        .unwrap();

        let records = CsvMetricsRepository::new(&path).load_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].new_precision, 0.812);
        assert_eq!(records[0].new_recall, 0.774);
        assert!(records[0].promote);
    }

    #[tokio::test]
    async fn test_corrupt_row_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metrics.csv");
        std::fs::write(&path, format!("{HEADER}\n2024-05-01T12:00:00Z,abc,0.5,0.1,0.5,True\n"))
            .unwrap();

        let err = CsvMetricsRepository::new(&path).load_all().await.unwrap_err();
        assert!(matches!(err, GatewayError::Storage(ref m) if m.contains("第 2 行")));
    }
}
