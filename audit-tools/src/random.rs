//! 安全隨機源
//!
//! 挑戰值必須不可預測，生產環境只使用操作系統 CSPRNG。
//! 隨機源作為策略注入 `AuditStream`，測試可以替換為固定值。

use rand::rngs::OsRng;
use rand::RngCore;

/// 密碼學安全隨機字節源
pub trait RandomSource {
    /// 用隨機字節填滿 `dest`
    fn next_bytes(&mut self, dest: &mut [u8]);
}

/// 操作系統隨機源（`getrandom`）
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn next_bytes(&mut self, dest: &mut [u8]) {
        OsRng.fill_bytes(dest);
    }
}
