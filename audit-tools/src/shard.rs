//! 本地分片審計驅動
//!
//! 從任意異步讀取源按塊讀取分片，餵入新的 `AuditStream` 並完成審計。
//! 多個分片之間互不共享狀態，批量審計時每個分片一個任務並發執行。

use crate::audit_stream::AuditStream;
use crate::config::{validate_config, AuditConfig};
use crate::error::{AuditError, Result};
use crate::types::AuditRecords;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info, warn};

/// 單個分片的審計結果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShardAudit {
    /// 分片路徑
    pub shard: PathBuf,

    #[serde(flatten)]
    pub records: AuditRecords,
}

/// 讀完 `reader` 的全部數據並完成審計
///
/// # 錯誤
/// - 配置無效時返回 `Config`
/// - 讀取失敗時返回 `Io`，此時審計被放棄，不產生任何記錄
pub async fn audit_reader<R>(mut reader: R, config: &AuditConfig) -> Result<AuditRecords>
where
    R: AsyncRead + Unpin,
{
    validate_config(config)?;

    let mut audit = AuditStream::new(config.num_challenges)?;
    let mut buffer = vec![0u8; config.chunk_size];

    loop {
        let read = reader.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        audit.ingest(&buffer[..read])?;
    }

    debug!("Reached end of shard after {} bytes", audit.bytes_ingested());

    audit.complete()
}

/// 審計單個分片文件
pub async fn audit_file<P: AsRef<Path>>(path: P, config: &AuditConfig) -> Result<ShardAudit> {
    let path = path.as_ref();
    info!("Starting audit precomputation for shard: {}", path.display());

    let file = tokio::fs::File::open(path).await?;
    let records = audit_reader(file, config).await?;

    Ok(ShardAudit {
        shard: path.to_path_buf(),
        records,
    })
}

/// 並發審計多個分片文件
///
/// # 返回
/// - 與輸入順序一致的結果列表，單個分片失敗不影響其他分片
pub async fn audit_files_batch(paths: &[PathBuf], config: &AuditConfig) -> Vec<Result<ShardAudit>> {
    info!("Starting batch audit for {} shards", paths.len());

    let tasks: Vec<_> = paths
        .iter()
        .map(|path| {
            let path = path.clone();
            let config = config.clone();
            tokio::spawn(async move { audit_file(&path, &config).await })
        })
        .collect();

    let mut results = Vec::with_capacity(tasks.len());

    for (path, task) in paths.iter().zip(tasks) {
        let result = match task.await {
            Ok(result) => result,
            Err(e) => {
                warn!("Audit task for {} panicked: {}", path.display(), e);
                Err(AuditError::Abandoned)
            }
        };

        if let Err(e) = &result {
            warn!("Batch audit of {} failed: {}", path.display(), e);
        }
        results.push(result);
    }

    let successful = results.iter().filter(|r| r.is_ok()).count();
    info!("Batch audit completed: {}/{} successful", successful, paths.len());

    results
}
