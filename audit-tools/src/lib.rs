//! 分片可取回性審計（PoR）挑戰生成工具
//!
//! 審計方對分片數據只讀一遍，即可預計算一組秘密挑戰及其期望響應，
//! 之後無需保留分片本身:
//! 1. 生成 N 個 32 字節隨機挑戰
//! 2. 分片數據按順序流經每個挑戰的增量哈希上下文
//! 3. 數據流結束後得到 N 個響應葉子，構建默克爾承諾
//! 4. 導出公開記錄（葉子）與私密記錄（根、深度、挑戰）
//!
//! 之後每輪審計只揭示一個挑戰，存儲節點返回的響應可以對照已發布的承諾驗證。
//!
//! # 架構
//!
//! ```text
//! ┌──────────────┐
//! │ AuditStream  │  ← 編排：ingest → complete → 記錄
//! └──────┬───────┘
//!        │
//!   ┌────┴─────────┬──────────────────┬───────────────────┐
//!   ▼              ▼                  ▼                   ▼
//! ChallengeSet  ResponseAccumulator  MerkleCommitment   Records
//! (RandomSource)  (SHA3-256 x2)      (merkle-commitment)
//! ```
//!
//! # 示例用法
//!
//! ```
//! use audit_tools::AuditStream;
//!
//! let mut audit = audit_tools::create(6)?;
//! audit.ingest(b"shard bytes")?;
//! audit.complete()?;
//!
//! let public = audit.public_record()?;
//! let private = audit.private_record()?;
//!
//! // 之後只憑記錄即可恢復
//! let restored = AuditStream::from_records(&private.challenges, public.leaves())?;
//! assert_eq!(restored.private_record()?.root, private.root);
//! # Ok::<(), audit_tools::AuditError>(())
//! ```

// 公開模塊
pub mod audit_stream;
pub mod challenge;
pub mod config;
pub mod error;
pub mod random;
pub mod response;
pub mod shard;
pub mod types;

// Re-export 常用類型
pub use audit_stream::{AuditCompletion, AuditStream};
pub use challenge::{Challenge, ChallengeSet, CHALLENGE_SIZE};
pub use config::AuditConfig;
pub use error::{AuditError, Result};
pub use random::{OsRandom, RandomSource};
pub use response::{ResponseAccumulator, ResponseLeaf};
pub use types::{AuditRecords, AuditState, PrivateRecord, PublicRecord};

/// 使用操作系統隨機源創建審計，等同於 `AuditStream::new`
pub fn create(num_challenges: usize) -> Result<AuditStream> {
    AuditStream::new(num_challenges)
}
