//! 審計記錄數據類型
//!
//! 審計完成後導出兩份記錄：
//! - 公開記錄：補齊後的葉子列表，可以交給存儲節點或第三方
//! - 私密記錄：根、深度與全部挑戰，審計方在逐個揭示挑戰前必須保密

use serde::{Deserialize, Serialize};

/// 審計數據流狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditState {
    /// 接收分片數據中
    Open,
    /// 已完成，記錄只讀
    Finalized,
    /// 從持久化記錄直接重建
    Reconstructed,
}

impl AuditState {
    /// 記錄是否可讀
    pub fn has_records(&self) -> bool {
        !matches!(self, AuditState::Open)
    }
}

/// 公開記錄
///
/// 按順序排列的十六進制葉子哈希（含填充葉子），
/// 即 `commitment.level(commitment.levels())`。序列化為 JSON 字符串數組。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct PublicRecord(Vec<String>);

impl PublicRecord {
    pub fn new(leaves: Vec<String>) -> Self {
        Self(leaves)
    }

    pub fn leaves(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

/// 私密記錄
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrivateRecord {
    /// 默克爾根（十六進制）
    pub root: String,

    /// 樹深度，等於 log2(公開記錄長度)
    pub depth: usize,

    /// 原始順序的十六進制挑戰，數量等於挑戰數（不補齊）
    pub challenges: Vec<String>,
}

/// 一次審計完成後的全部記錄
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditRecords {
    pub public: PublicRecord,
    pub private: PrivateRecord,
}
