//! Padded binary Merkle commitment
//!
//! # Layout
//!
//! The leaf list is padded with [`padding_leaf`] up to the next power of two
//! (minimum 2), real leaves first. Levels are indexed from the top:
//!
//! ```text
//! level 0            root
//! level 1        n01      n23
//! level 2 (=depth) L0  L1  L2  PAD
//! ```
//!
//! so `level(0) == [root]` and `level(levels())` is the full padded leaf list.

use crate::error::{MerkleError, Result};
use crate::hash::{hash_node, next_power_of_two, padding_leaf, Node};
use crate::proof::MerkleProof;
use tracing::debug;

/// Merkle commitment over a list of already-hashed leaves
///
/// # Example
///
/// ```rust
/// use merkle_commitment::MerkleCommitment;
///
/// let commitment = MerkleCommitment::build(vec![[1u8; 32], [2u8; 32], [3u8; 32]]).unwrap();
///
/// assert_eq!(commitment.levels(), 2);
/// assert_eq!(commitment.padded_leaf_count(), 4);
/// assert_eq!(commitment.level(0).unwrap(), &[commitment.root()]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleCommitment {
    /// layers[0] = [root], layers[depth] = padded leaves
    layers: Vec<Vec<Node>>,

    /// Number of real (non-padding) leaves
    leaf_count: usize,
}

impl MerkleCommitment {
    /// Build the commitment, padding the leaves to a power of two
    ///
    /// # Errors
    /// - Returns `EmptyLeaves` if `leaves` is empty
    pub fn build(leaves: Vec<Node>) -> Result<Self> {
        if leaves.is_empty() {
            return Err(MerkleError::EmptyLeaves);
        }

        let leaf_count = leaves.len();
        let padded = next_power_of_two(leaf_count);

        let mut current = leaves;
        current.resize(padded, padding_leaf());

        let mut layers = vec![current.clone()];
        while current.len() > 1 {
            let next: Vec<Node> = current
                .chunks_exact(2)
                .map(|pair| hash_node(&pair[0], &pair[1]))
                .collect();
            layers.push(next.clone());
            current = next;
        }

        // Built bottom-up, stored top-down
        layers.reverse();

        debug!(
            leaf_count,
            padded_leaf_count = padded,
            depth = layers.len() - 1,
            "Built Merkle commitment"
        );

        Ok(Self { layers, leaf_count })
    }

    /// Topmost hash
    pub fn root(&self) -> Node {
        self.layers[0][0]
    }

    /// Topmost hash, hex-encoded
    pub fn root_hex(&self) -> String {
        hex::encode(self.root())
    }

    /// Depth of the tree: number of levels between the root and the leaves
    pub fn levels(&self) -> usize {
        self.layers.len() - 1
    }

    /// Nodes at depth `level` (0 = root, `levels()` = padded leaves)
    pub fn level(&self, level: usize) -> Result<&[Node]> {
        self.layers
            .get(level)
            .map(Vec::as_slice)
            .ok_or(MerkleError::LevelOutOfRange {
                level,
                depth: self.levels(),
            })
    }

    /// Nodes at depth `level`, hex-encoded
    pub fn level_hex(&self, level: usize) -> Result<Vec<String>> {
        Ok(self.level(level)?.iter().map(hex::encode).collect())
    }

    /// The padded leaf list
    pub fn leaves(&self) -> &[Node] {
        &self.layers[self.levels()]
    }

    /// Number of real leaves the commitment was built from
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Number of leaves including padding
    pub fn padded_leaf_count(&self) -> usize {
        self.leaves().len()
    }

    /// Inclusion proof for a real leaf
    ///
    /// # Errors
    /// - Returns `InvalidLeafIndex` if `leaf_index` points past the real leaves
    pub fn generate_proof(&self, leaf_index: usize) -> Result<MerkleProof> {
        if leaf_index >= self.leaf_count {
            return Err(MerkleError::InvalidLeafIndex {
                index: leaf_index,
                total: self.leaf_count,
            });
        }

        let mut path = Vec::with_capacity(self.levels());
        let mut index = leaf_index;

        // Walk from the leaves (bottom layer) up to just below the root
        for layer in self.layers[1..].iter().rev() {
            path.push(layer[index ^ 1]);
            index >>= 1;
        }

        Ok(MerkleProof::new(path, leaf_index as u64))
    }
}
