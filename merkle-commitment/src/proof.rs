//! Inclusion proofs
//!
//! Verification walks the path bottom-up:
//! - bit i of the index is 0: current node is on the left, `H(current || sibling)`
//! - bit i of the index is 1: current node is on the right, `H(sibling || current)`

use crate::hash::{hash_node, Node};
use serde::{Deserialize, Serialize};

/// Merkle inclusion proof for one leaf
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MerkleProof {
    /// Sibling hashes from the leaf level up to the root's children
    pub path: Vec<Node>,

    /// Leaf index; its bits select left/right at each level
    pub leaf_index: u64,
}

impl MerkleProof {
    pub fn new(path: Vec<Node>, leaf_index: u64) -> Self {
        Self { path, leaf_index }
    }

    /// Check that `leaf` is committed under `root` at `leaf_index`
    ///
    /// The leaf is compared as-is; it is not hashed again.
    pub fn verify(&self, leaf: &Node, root: &Node) -> bool {
        let mut current = *leaf;
        let mut index = self.leaf_index;

        for sibling in &self.path {
            current = if index & 1 == 0 {
                hash_node(&current, sibling)
            } else {
                hash_node(sibling, &current)
            };
            index >>= 1;
        }

        // Leftover bits mean the index does not fit a tree of this depth
        index == 0 && &current == root
    }

    /// Proof depth (tree height)
    pub fn depth(&self) -> usize {
        self.path.len()
    }
}
