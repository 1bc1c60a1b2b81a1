//! 挑戰集合
//!
//! 每次審計在創建時生成固定數量的 32 字節秘密挑戰。
//! 挑戰順序決定葉子順序，審計生命週期內不可變。

use crate::error::{AuditError, Result};
use crate::random::RandomSource;
use tracing::debug;

/// 單個挑戰的字節長度（256 位）
pub const CHALLENGE_SIZE: usize = 32;

/// 單個挑戰值
pub type Challenge = [u8; CHALLENGE_SIZE];

/// 有序挑戰集合
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeSet {
    challenges: Vec<Challenge>,
}

impl ChallengeSet {
    /// 從隨機源生成 `n` 個挑戰
    ///
    /// 對隨機源恰好調用 `n` 次，每次 32 字節，按生成順序保存。
    ///
    /// # 錯誤
    /// - `n == 0` 時返回 `InvalidConfiguration`
    pub fn generate<R: RandomSource + ?Sized>(n: usize, source: &mut R) -> Result<Self> {
        if n == 0 {
            return Err(AuditError::InvalidConfiguration(
                "number of challenges must be greater than 0".to_string(),
            ));
        }

        let challenges = (0..n)
            .map(|_| {
                let mut challenge = [0u8; CHALLENGE_SIZE];
                source.next_bytes(&mut challenge);
                challenge
            })
            .collect();

        debug!("Generated {} challenges", n);

        Ok(Self { challenges })
    }

    /// 從十六進制記錄恢復挑戰（不重新生成）
    ///
    /// # 錯誤
    /// - 列表為空、十六進制非法或長度不是 32 字節時返回 `MalformedRecord`
    pub fn from_hex<S: AsRef<str>>(encoded: &[S]) -> Result<Self> {
        if encoded.is_empty() {
            return Err(AuditError::MalformedRecord(
                "challenge list is empty".to_string(),
            ));
        }

        let challenges = encoded
            .iter()
            .enumerate()
            .map(|(i, value)| decode_fixed(value.as_ref(), "challenge", i))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { challenges })
    }

    /// 按原始順序導出十六進制挑戰
    pub fn to_hex(&self) -> Vec<String> {
        self.challenges.iter().map(hex::encode).collect()
    }

    pub fn get(&self, index: usize) -> Option<&Challenge> {
        self.challenges.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Challenge> {
        self.challenges.iter()
    }

    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }
}

/// 解碼一個 32 字節的十六進制值
///
/// 只接受小寫十六進制，與導出的記錄逐字一致。
pub(crate) fn decode_fixed(value: &str, kind: &str, index: usize) -> Result<[u8; 32]> {
    if value.bytes().any(|b| b.is_ascii_uppercase()) {
        return Err(AuditError::MalformedRecord(format!(
            "{} {}: hex must be lowercase",
            kind, index
        )));
    }

    let bytes = hex::decode(value)
        .map_err(|e| AuditError::MalformedRecord(format!("{} {}: invalid hex: {}", kind, index, e)))?;

    <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| {
        AuditError::MalformedRecord(format!(
            "{} {}: expected 32 bytes, got {}",
            kind,
            index,
            bytes.len()
        ))
    })
}
