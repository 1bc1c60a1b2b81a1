//! 審計數據流（編排器）
//!
//! # 生命週期
//!
//! ```text
//!   create(n) ──► Open ──ingest()*──► complete() ──► Finalized
//!                                                        │
//!   from_records(challenges, leaves) ──────────► Reconstructed
//! ```
//!
//! - `Open`：挑戰與累加器已創建，按到達順序接收分片數據
//! - `Finalized`：所有累加器已 finalize，默克爾承諾已構建，記錄只讀
//! - `Reconstructed`：從持久化記錄直接進入只讀狀態，對外行為與 `Finalized` 相同
//!
//! # 完成信號
//!
//! `complete()` 先構建承諾並切換狀態，然後才通過 `watch` 通道發布記錄，
//! 觀察者只會看到「尚未完成」或「完整記錄」，不會看到部分構建的樹。
//! 在 `Open` 狀態下丟棄實例即放棄審計，等待者收到 `Abandoned`。

use crate::challenge::{decode_fixed, ChallengeSet};
use crate::error::{AuditError, Result};
use crate::random::{OsRandom, RandomSource};
use crate::response::ResponseAccumulator;
use crate::types::{AuditRecords, AuditState, PrivateRecord, PublicRecord};
use merkle_commitment::{next_power_of_two, MerkleCommitment, MerkleError, MerkleProof};
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

/// 內部階段；承諾只在完成後存在
enum Phase {
    Open {
        accumulators: Vec<ResponseAccumulator>,
    },
    Finalized {
        commitment: MerkleCommitment,
    },
    Reconstructed {
        commitment: MerkleCommitment,
    },
}

/// 審計挑戰/響應預計算數據流
///
/// # 示例
///
/// ```
/// use audit_tools::AuditStream;
///
/// let mut audit = AuditStream::new(12)?;
/// audit.ingest(b"test")?;
/// audit.ingest(b"shard")?;
/// let records = audit.complete()?;
///
/// assert_eq!(records.public.len(), 16);
/// assert_eq!(records.private.depth, 4);
/// assert_eq!(records.private.challenges.len(), 12);
/// # Ok::<(), audit_tools::AuditError>(())
/// ```
pub struct AuditStream {
    challenges: ChallengeSet,
    phase: Phase,
    bytes_ingested: u64,
    completion: watch::Sender<Option<AuditRecords>>,
}

impl AuditStream {
    /// 使用操作系統隨機源創建審計
    ///
    /// # 錯誤
    /// - `num_challenges == 0` 時返回 `InvalidConfiguration`
    pub fn new(num_challenges: usize) -> Result<Self> {
        Self::create_with_source(num_challenges, &mut OsRandom)
    }

    /// 使用注入的隨機源創建審計
    ///
    /// 生成 `num_challenges` 個挑戰，並為每個挑戰創建一個以該挑戰為前綴的累加器。
    pub fn create_with_source<R: RandomSource + ?Sized>(
        num_challenges: usize,
        source: &mut R,
    ) -> Result<Self> {
        let challenges = ChallengeSet::generate(num_challenges, source)?;
        let accumulators = challenges.iter().map(ResponseAccumulator::new).collect();

        info!("Created audit stream with {} challenges", num_challenges);

        Ok(Self {
            challenges,
            phase: Phase::Open { accumulators },
            bytes_ingested: 0,
            completion: watch::channel(None).0,
        })
    }

    /// 從持久化記錄重建審計（不需要原始分片）
    ///
    /// 挑戰直接取自 `challenges`，承諾直接由 `leaves` 構建，不重新哈希。
    ///
    /// # 錯誤
    /// 返回 `MalformedRecord`，當：
    /// - 任一列表為空
    /// - 十六進制非法或值不是 32 字節
    /// - 葉子數量不是 2 的冪，或與挑戰數量補齊後的值不一致
    pub fn from_records<C, L>(challenges: &[C], leaves: &[L]) -> Result<Self>
    where
        C: AsRef<str>,
        L: AsRef<str>,
    {
        let challenges = ChallengeSet::from_hex(challenges)?;

        if leaves.is_empty() {
            return Err(AuditError::MalformedRecord("leaf list is empty".to_string()));
        }

        let leaves = leaves
            .iter()
            .enumerate()
            .map(|(i, leaf)| decode_fixed(leaf.as_ref(), "leaf", i))
            .collect::<Result<Vec<_>>>()?;

        if leaves.len() < 2 || !leaves.len().is_power_of_two() {
            return Err(AuditError::MalformedRecord(format!(
                "leaf count {} is not a power of two",
                leaves.len()
            )));
        }

        let expected = next_power_of_two(challenges.len());
        if leaves.len() != expected {
            return Err(AuditError::MalformedRecord(format!(
                "{} challenges require {} leaves, got {}",
                challenges.len(),
                expected,
                leaves.len()
            )));
        }

        let commitment = MerkleCommitment::build(leaves)?;

        debug!(
            "Reconstructed audit stream: {} challenges, depth {}, root {}",
            challenges.len(),
            commitment.levels(),
            &commitment.root_hex()[..16]
        );

        let mut stream = Self {
            challenges,
            phase: Phase::Reconstructed { commitment },
            bytes_ingested: 0,
            completion: watch::channel(None).0,
        };
        let records = stream.records()?;
        stream.completion.send_replace(Some(records));

        Ok(stream)
    }

    /// 從完整的公開/私密記錄重建，並校驗根與深度
    ///
    /// # 錯誤
    /// - 重建出的根或深度與私密記錄不一致時返回 `MalformedRecord`
    pub fn from_parts(private: &PrivateRecord, public: &PublicRecord) -> Result<Self> {
        let stream = Self::from_records(&private.challenges, public.leaves())?;
        let rebuilt = stream.private_record()?;

        if rebuilt.root != private.root {
            warn!(
                "Root mismatch on reconstruction: expected {}, rebuilt {}",
                private.root, rebuilt.root
            );
            return Err(AuditError::MalformedRecord(format!(
                "root mismatch: record has {}, leaves give {}",
                private.root, rebuilt.root
            )));
        }

        if rebuilt.depth != private.depth {
            return Err(AuditError::MalformedRecord(format!(
                "depth mismatch: record has {}, leaves give {}",
                private.depth, rebuilt.depth
            )));
        }

        Ok(stream)
    }

    /// 將一段分片數據餵給每個累加器
    ///
    /// # 錯誤
    /// - 非 `Open` 狀態時返回 `StreamAlreadyFinalized`，狀態不變
    pub fn ingest(&mut self, chunk: &[u8]) -> Result<()> {
        let accumulators = match &mut self.phase {
            Phase::Open { accumulators } => accumulators,
            _ => {
                warn!("Rejected {} bytes: audit stream already finalized", chunk.len());
                return Err(AuditError::StreamAlreadyFinalized);
            }
        };

        for accumulator in accumulators.iter_mut() {
            accumulator.feed(chunk)?;
        }
        self.bytes_ingested += chunk.len() as u64;

        trace!("Ingested {} bytes (total {})", chunk.len(), self.bytes_ingested);

        Ok(())
    }

    /// 結束數據流：計算全部葉子、構建承諾並發布記錄
    ///
    /// # 錯誤
    /// - 重複調用時返回 `StreamAlreadyFinalized`
    pub fn complete(&mut self) -> Result<AuditRecords> {
        let accumulators = match &self.phase {
            Phase::Open { accumulators } => accumulators,
            _ => {
                warn!("complete() called on a finalized audit stream");
                return Err(AuditError::StreamAlreadyFinalized);
            }
        };

        // 在副本上 finalize，構建失敗時累加器保持可用，狀態仍為 Open
        let leaves = accumulators
            .iter()
            .map(|accumulator| accumulator.clone().finalize())
            .collect::<Result<Vec<_>>>()?;
        let commitment = MerkleCommitment::build(leaves)?;

        self.phase = Phase::Finalized { commitment };

        // 狀態切換完成後才發布
        let records = self.records()?;
        self.completion.send_replace(Some(records.clone()));

        info!(
            "Audit completed: {} bytes, {} challenges, {} leaves, depth {}, root {}",
            self.bytes_ingested,
            self.challenges.len(),
            records.public.len(),
            records.private.depth,
            &records.private.root[..16]
        );

        Ok(records)
    }

    /// 公開記錄：補齊後的十六進制葉子列表
    ///
    /// # 錯誤
    /// - `Open` 狀態下返回 `NotReady`
    pub fn public_record(&self) -> Result<PublicRecord> {
        let commitment = self.commitment().ok_or(AuditError::NotReady)?;
        Ok(PublicRecord::new(commitment.level_hex(commitment.levels())?))
    }

    /// 私密記錄：根、深度與原始順序的挑戰
    ///
    /// # 錯誤
    /// - `Open` 狀態下返回 `NotReady`
    pub fn private_record(&self) -> Result<PrivateRecord> {
        let commitment = self.commitment().ok_or(AuditError::NotReady)?;
        Ok(PrivateRecord {
            root: commitment.root_hex(),
            depth: commitment.levels(),
            challenges: self.challenges.to_hex(),
        })
    }

    /// 兩份記錄
    pub fn records(&self) -> Result<AuditRecords> {
        Ok(AuditRecords {
            public: self.public_record()?,
            private: self.private_record()?,
        })
    }

    /// 揭示單個挑戰（十六進制），用於向存儲節點發起一輪審計
    pub fn challenge(&self, index: usize) -> Result<String> {
        if self.commitment().is_none() {
            return Err(AuditError::NotReady);
        }

        self.challenges
            .get(index)
            .map(hex::encode)
            .ok_or_else(|| self.index_error(index))
    }

    /// 第 `index` 個響應葉子的默克爾證明
    pub fn proof(&self, index: usize) -> Result<MerkleProof> {
        let commitment = self.commitment().ok_or(AuditError::NotReady)?;

        if index >= self.challenges.len() {
            return Err(self.index_error(index));
        }

        Ok(commitment.generate_proof(index)?)
    }

    /// 訂閱完成信號
    pub fn subscribe(&self) -> AuditCompletion {
        AuditCompletion {
            receiver: self.completion.subscribe(),
        }
    }

    pub fn state(&self) -> AuditState {
        match self.phase {
            Phase::Open { .. } => AuditState::Open,
            Phase::Finalized { .. } => AuditState::Finalized,
            Phase::Reconstructed { .. } => AuditState::Reconstructed,
        }
    }

    /// 已完成或重建時的默克爾承諾
    pub fn commitment(&self) -> Option<&MerkleCommitment> {
        match &self.phase {
            Phase::Open { .. } => None,
            Phase::Finalized { commitment } | Phase::Reconstructed { commitment } => {
                Some(commitment)
            }
        }
    }

    pub fn num_challenges(&self) -> usize {
        self.challenges.len()
    }

    /// 已接收的分片字節數（重建的實例為 0）
    pub fn bytes_ingested(&self) -> u64 {
        self.bytes_ingested
    }

    fn index_error(&self, index: usize) -> AuditError {
        AuditError::Commitment(MerkleError::InvalidLeafIndex {
            index,
            total: self.challenges.len(),
        })
    }
}

impl std::fmt::Debug for AuditStream {
    // 不輸出挑戰值
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditStream")
            .field("state", &self.state())
            .field("num_challenges", &self.challenges.len())
            .field("bytes_ingested", &self.bytes_ingested)
            .finish()
    }
}

/// 審計完成信號
///
/// 每個實例只會完成一次；完成後的記錄對所有訂閱者可見。
#[derive(Debug, Clone)]
pub struct AuditCompletion {
    receiver: watch::Receiver<Option<AuditRecords>>,
}

impl AuditCompletion {
    /// 等待審計完成
    ///
    /// # 錯誤
    /// - 數據流在完成前被丟棄時返回 `Abandoned`
    pub async fn wait(mut self) -> Result<AuditRecords> {
        let records = self
            .receiver
            .wait_for(Option::is_some)
            .await
            .map_err(|_| AuditError::Abandoned)?;

        records.clone().ok_or(AuditError::Abandoned)
    }

    /// 不阻塞地讀取記錄，未完成時返回 `None`
    pub fn try_records(&self) -> Option<AuditRecords> {
        self.receiver.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 總是返回全零的隨機源
    struct ZeroSource;

    impl RandomSource for ZeroSource {
        fn next_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }
    }

    /// 按調用次數遞增的確定性隨機源
    struct SequenceSource(u8);

    impl RandomSource for SequenceSource {
        fn next_bytes(&mut self, dest: &mut [u8]) {
            self.0 = self.0.wrapping_add(1);
            dest.fill(self.0);
        }
    }

    fn completed(n: usize, shard: &[u8]) -> AuditStream {
        let mut audit = AuditStream::new(n).unwrap();
        audit.ingest(shard).unwrap();
        audit.complete().unwrap();
        audit
    }

    #[test]
    fn test_create_generates_challenges() {
        let audit = AuditStream::new(24).unwrap();

        assert_eq!(audit.state(), AuditState::Open);
        assert_eq!(audit.num_challenges(), 24);
        assert!(audit.commitment().is_none());
    }

    #[test]
    fn test_create_zero_fails() {
        assert!(matches!(
            AuditStream::new(0),
            Err(AuditError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_zero_challenge_regression_tree() {
        let mut audit = AuditStream::create_with_source(6, &mut ZeroSource).unwrap();
        audit.complete().unwrap();

        let commitment = audit.commitment().unwrap();
        let leaves = commitment.level(commitment.levels()).unwrap();

        assert_eq!(leaves.len(), 8);
        assert_eq!(
            hex::encode(leaves[0]),
            "3ffcf92d9c820def681c81ab1dffa44c3166539addb445c7731921af69bce8c7"
        );
        // 相同挑戰、相同數據 → 前 6 個葉子相同
        assert!(leaves[..6].iter().all(|leaf| *leaf == leaves[0]));
        assert_eq!(leaves[6], merkle_commitment::padding_leaf());
    }

    #[test]
    fn test_public_record_is_bottom_level() {
        let audit = completed(12, b"testshard");
        let public = audit.public_record().unwrap();
        let commitment = audit.commitment().unwrap();
        let bottom = commitment.level_hex(commitment.levels()).unwrap();

        assert_eq!(public.len(), 16);
        for leaf in public.leaves() {
            assert!(bottom.contains(leaf));
        }
    }

    #[test]
    fn test_private_record_contents() {
        let audit = completed(12, b"testshard");
        let private = audit.private_record().unwrap();
        let commitment = audit.commitment().unwrap();

        assert_eq!(private.root, commitment.root_hex());
        assert_eq!(private.depth, commitment.levels());
        assert_eq!(private.depth, 4);
        assert_eq!(private.challenges, audit.challenges.to_hex());
    }

    #[test]
    fn test_misuse_is_rejected() {
        let mut audit = AuditStream::new(4).unwrap();

        assert!(matches!(audit.public_record(), Err(AuditError::NotReady)));
        assert!(matches!(audit.private_record(), Err(AuditError::NotReady)));
        assert!(matches!(audit.challenge(0), Err(AuditError::NotReady)));
        assert!(matches!(audit.proof(0), Err(AuditError::NotReady)));

        audit.ingest(b"data").unwrap();
        let records = audit.complete().unwrap();

        assert!(matches!(
            audit.ingest(b"more"),
            Err(AuditError::StreamAlreadyFinalized)
        ));
        assert!(matches!(
            audit.complete(),
            Err(AuditError::StreamAlreadyFinalized)
        ));

        // 誤用不改變狀態
        assert_eq!(audit.state(), AuditState::Finalized);
        assert_eq!(audit.bytes_ingested(), 4);
        assert_eq!(audit.records().unwrap(), records);
    }

    #[test]
    fn test_root_is_deterministic() {
        let run = || {
            let mut audit = AuditStream::create_with_source(5, &mut SequenceSource(0)).unwrap();
            audit.ingest(b"test").unwrap();
            audit.ingest(b"shard").unwrap();
            audit.complete().unwrap().private.root
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_single_byte_change_changes_root() {
        let root = |shard: &[u8]| {
            let mut audit = AuditStream::create_with_source(3, &mut SequenceSource(0)).unwrap();
            audit.ingest(shard).unwrap();
            audit.complete().unwrap().private.root
        };

        assert_ne!(root(b"testshard"), root(b"testshare"));
    }

    #[test]
    fn test_from_records_roundtrip() {
        let original = completed(12, b"testshard");
        let public = original.public_record().unwrap();
        let private = original.private_record().unwrap();

        let rebuilt = AuditStream::from_records(&private.challenges, public.leaves()).unwrap();

        assert_eq!(rebuilt.state(), AuditState::Reconstructed);
        assert_eq!(rebuilt.public_record().unwrap(), public);
        assert_eq!(rebuilt.private_record().unwrap(), private);
        assert_eq!(rebuilt.bytes_ingested(), 0);
    }

    #[test]
    fn test_reconstructed_stream_is_read_only() {
        let original = completed(3, b"abc");
        let records = original.records().unwrap();
        let mut rebuilt =
            AuditStream::from_parts(&records.private, &records.public).unwrap();

        assert!(matches!(
            rebuilt.ingest(b"x"),
            Err(AuditError::StreamAlreadyFinalized)
        ));
        assert!(matches!(
            rebuilt.complete(),
            Err(AuditError::StreamAlreadyFinalized)
        ));
    }

    #[test]
    fn test_from_records_rejects_malformed_input() {
        let original = completed(6, b"shard");
        let public = original.public_record().unwrap().into_inner();
        let challenges = original.private_record().unwrap().challenges;
        let none: Vec<String> = Vec::new();

        let cases: Vec<(Vec<String>, Vec<String>)> = vec![
            (none.clone(), public.clone()),
            (challenges.clone(), none.clone()),
            (challenges.clone(), public[..6].to_vec()),
            (challenges.clone(), public[..4].to_vec()),
            (challenges[..2].to_vec(), public.clone()),
            (challenges.clone(), {
                let mut bad = public.clone();
                bad[0] = "not hex".to_string();
                bad
            }),
            (challenges.clone(), {
                let mut short = public.clone();
                short[1] = "abcd".to_string();
                short
            }),
        ];

        for (c, l) in cases {
            assert!(matches!(
                AuditStream::from_records(&c, &l),
                Err(AuditError::MalformedRecord(_))
            ));
        }
    }

    #[test]
    fn test_from_parts_detects_root_mismatch() {
        let audit = completed(4, b"shard");
        let public = audit.public_record().unwrap();
        let mut private = audit.private_record().unwrap();
        private.root = "00".repeat(32);

        assert!(matches!(
            AuditStream::from_parts(&private, &public),
            Err(AuditError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_from_parts_detects_depth_mismatch() {
        let audit = completed(3, b"shard");
        let public = audit.public_record().unwrap();
        let mut private = audit.private_record().unwrap();
        assert_eq!(private.depth, 2);
        private.depth += 1;

        // 根正確，只有深度不一致
        assert!(matches!(
            AuditStream::from_parts(&private, &public),
            Err(AuditError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_from_records_rejects_uppercase_hex() {
        let audit = completed(3, b"shard");
        let public = audit.public_record().unwrap().into_inner();
        let private = audit.private_record().unwrap();

        let upper_leaves: Vec<String> = public.iter().map(|l| l.to_uppercase()).collect();
        let upper_challenges: Vec<String> =
            private.challenges.iter().map(|c| c.to_uppercase()).collect();

        assert!(matches!(
            AuditStream::from_records(&private.challenges, &upper_leaves),
            Err(AuditError::MalformedRecord(_))
        ));
        assert!(matches!(
            AuditStream::from_records(&upper_challenges, &public),
            Err(AuditError::MalformedRecord(_))
        ));

        // 大寫的根與重建結果不同
        let mut upper_root = private.clone();
        upper_root.root = private.root.to_uppercase();
        assert!(matches!(
            AuditStream::from_parts(&upper_root, &PublicRecord::new(public)),
            Err(AuditError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_disclosed_challenge_and_proof() {
        let audit = completed(5, b"shard");
        let private = audit.private_record().unwrap();
        let commitment = audit.commitment().unwrap();

        assert_eq!(audit.challenge(2).unwrap(), private.challenges[2]);

        let proof = audit.proof(2).unwrap();
        assert!(proof.verify(&commitment.leaves()[2], &commitment.root()));

        // 填充葉子沒有對應的挑戰
        assert!(matches!(audit.challenge(5), Err(AuditError::Commitment(_))));
        assert!(matches!(audit.proof(5), Err(AuditError::Commitment(_))));
    }

    #[test]
    fn test_single_challenge_pads_to_two() {
        let audit = completed(1, b"shard");

        assert_eq!(audit.public_record().unwrap().len(), 2);
        assert_eq!(audit.private_record().unwrap().depth, 1);
    }

    #[tokio::test]
    async fn test_completion_signal_fires_once() {
        let mut audit = AuditStream::new(12).unwrap();
        let completion = audit.subscribe();
        assert!(completion.try_records().is_none());

        let waiter = tokio::spawn(completion.clone().wait());

        audit.ingest(b"testshard").unwrap();
        let records = audit.complete().unwrap();

        assert_eq!(waiter.await.unwrap().unwrap(), records);
        assert_eq!(completion.try_records(), Some(records));
    }

    #[tokio::test]
    async fn test_completion_after_drop_still_delivers() {
        let mut audit = AuditStream::new(2).unwrap();
        let completion = audit.subscribe();
        let records = audit.complete().unwrap();
        drop(audit);

        assert_eq!(completion.wait().await.unwrap(), records);
    }

    #[tokio::test]
    async fn test_abandoned_stream() {
        let mut audit = AuditStream::new(3).unwrap();
        audit.ingest(b"partial").unwrap();
        let completion = audit.subscribe();
        drop(audit);

        assert!(matches!(completion.wait().await, Err(AuditError::Abandoned)));
    }

    #[tokio::test]
    async fn test_reconstructed_completion_is_immediate() {
        let original = completed(3, b"abc");
        let records = original.records().unwrap();
        let rebuilt = AuditStream::from_parts(&records.private, &records.public).unwrap();

        assert_eq!(rebuilt.subscribe().wait().await.unwrap(), records);
    }
}
