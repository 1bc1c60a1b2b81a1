//! 審計工具統一錯誤類型定義
//!
//! 使用 thiserror crate 定義審計流程中可能遇到的所有錯誤。
//! 所有錯誤都是調用方誤用或輸入格式錯誤，不做內部重試。

use merkle_commitment::MerkleError;
use thiserror::Error;

/// 審計錯誤類型
#[derive(Error, Debug)]
pub enum AuditError {
    /// 無效的構造參數
    ///
    /// 挑戰數量為 0 時返回，實例不會被部分構造
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// 數據流已完成
    ///
    /// 在 `complete()` 之後調用 `ingest()`，或重複調用 `complete()`
    #[error("Audit stream already finalized")]
    StreamAlreadyFinalized,

    /// 記錄尚未就緒
    ///
    /// 在 `complete()` 之前讀取公開/私密記錄
    #[error("Audit records not ready: stream is still open")]
    NotReady,

    /// 無效的審計記錄
    ///
    /// 重建時遇到非法十六進制、空列表或葉子數量不匹配
    #[error("Malformed audit record: {0}")]
    MalformedRecord(String),

    /// 審計在完成前被丟棄
    #[error("Audit stream abandoned before completion")]
    Abandoned,

    /// 默克爾承諾錯誤
    #[error("Merkle commitment error: {0}")]
    Commitment(#[from] MerkleError),

    /// 配置錯誤
    ///
    /// 當配置文件格式錯誤或參數不合法時返回此錯誤
    #[error("Configuration error: {0}")]
    Config(String),

    /// 序列化/反序列化錯誤
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O 錯誤
    ///
    /// 讀取分片文件失敗時返回此錯誤
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result 類型別名
pub type Result<T> = std::result::Result<T, AuditError>;

/// 從 JSON 錯誤轉換
impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        AuditError::Serialization(err.to_string())
    }
}

/// 從十六進制解碼錯誤轉換
impl From<hex::FromHexError> for AuditError {
    fn from(err: hex::FromHexError) -> Self {
        AuditError::MalformedRecord(format!("Invalid hex: {}", err))
    }
}
