//! 挑戰響應累加器
//!
//! 每個挑戰對應一個可恢復的哈希上下文，分片數據按到達順序逐塊餵入，
//! 數據流結束時輸出該挑戰的響應葉子：
//!
//! ```text
//! intermediate = SHA3-256(challenge || shard_data)
//! leaf         = SHA3-256(intermediate)
//! ```
//!
//! 第二次哈希使葉子無法通過對單次哈希的直接代數操作得到。

use crate::challenge::Challenge;
use crate::error::{AuditError, Result};
use sha3::{Digest, Sha3_256};

/// 響應葉子（32 字節，可公開）
pub type ResponseLeaf = [u8; 32];

/// 單個挑戰的增量哈希上下文
#[derive(Debug, Clone)]
pub struct ResponseAccumulator {
    /// `None` 表示已經 finalize
    hasher: Option<Sha3_256>,
}

impl ResponseAccumulator {
    /// 以挑戰值作為哈希輸入的前綴創建累加器
    pub fn new(challenge: &Challenge) -> Self {
        let mut hasher = Sha3_256::new();
        hasher.update(challenge);
        Self {
            hasher: Some(hasher),
        }
    }

    /// 追加一段分片數據
    ///
    /// # 錯誤
    /// - 已經 finalize 時返回 `StreamAlreadyFinalized`
    pub fn feed(&mut self, chunk: &[u8]) -> Result<()> {
        let hasher = self
            .hasher
            .as_mut()
            .ok_or(AuditError::StreamAlreadyFinalized)?;
        hasher.update(chunk);
        Ok(())
    }

    /// 計算響應葉子，只能調用一次
    ///
    /// # 錯誤
    /// - 重複調用時返回 `StreamAlreadyFinalized`
    pub fn finalize(&mut self) -> Result<ResponseLeaf> {
        let hasher = self
            .hasher
            .take()
            .ok_or(AuditError::StreamAlreadyFinalized)?;

        let intermediate = hasher.finalize();
        Ok(Sha3_256::digest(intermediate).into())
    }

    pub fn is_finalized(&self) -> bool {
        self.hasher.is_none()
    }
}
