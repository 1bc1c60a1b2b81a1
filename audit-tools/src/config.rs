//! 配置管理模塊
//!
//! 負責加載和驗證審計參數（挑戰數量、讀取分片時的塊大小）

use crate::error::{AuditError, Result};
use config::{Config, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 默認挑戰數量
pub const DEFAULT_NUM_CHALLENGES: usize = 12;

/// 默認讀取塊大小（64 KiB）
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// 審計配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// 每個分片預計算的挑戰數量
    pub num_challenges: usize,

    /// 從分片讀取數據時每塊的字節數
    pub chunk_size: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            num_challenges: DEFAULT_NUM_CHALLENGES,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// 從配置文件加載審計配置
///
/// # 參數
/// - `config_path`: 配置文件路徑（支持 TOML、JSON、YAML）
///
/// # 示例
/// ```no_run
/// use audit_tools::config::load_config;
///
/// let config = load_config("audit.toml").expect("Failed to load config");
/// println!("Challenges per shard: {}", config.num_challenges);
/// ```
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<AuditConfig> {
    let config = Config::builder()
        .add_source(File::from(config_path.as_ref()))
        .build()
        .map_err(|e| AuditError::Config(format!("Failed to load config file: {}", e)))?;

    let audit_config: AuditConfig = config
        .try_deserialize()
        .map_err(|e| AuditError::Config(format!("Failed to parse config: {}", e)))?;

    validate_config(&audit_config)?;

    Ok(audit_config)
}

/// 從環境變量加載配置
///
/// 環境變量前綴: `AUDIT_`
/// 示例: `AUDIT_NUM_CHALLENGES`, `AUDIT_CHUNK_SIZE`
pub fn load_config_from_env() -> Result<AuditConfig> {
    let config = Config::builder()
        .add_source(config::Environment::with_prefix("AUDIT").try_parsing(true))
        .build()
        .map_err(|e| AuditError::Config(format!("Failed to load env vars: {}", e)))?;

    let audit_config: AuditConfig = config
        .try_deserialize()
        .map_err(|e| AuditError::Config(format!("Failed to parse env config: {}", e)))?;

    validate_config(&audit_config)?;

    Ok(audit_config)
}

/// 驗證配置的有效性
pub fn validate_config(config: &AuditConfig) -> Result<()> {
    if config.num_challenges == 0 {
        return Err(AuditError::Config(
            "num_challenges must be greater than 0".to_string(),
        ));
    }

    if config.chunk_size == 0 {
        return Err(AuditError::Config(
            "chunk_size must be greater than 0".to_string(),
        ));
    }

    Ok(())
}
