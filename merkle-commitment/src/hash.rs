//! Node hashing primitives
//!
//! All hashes are Blake2b-256 with a one-byte domain prefix, so that a
//! padding leaf can never collide with an internal node:
//! - `LEAF_PREFIX = [0]` for the filler leaf
//! - `INNER_PREFIX = [1]` for internal nodes, `H(0x01 || left || right)`
//!
//! Real leaves are handed in already hashed and are committed as-is.

use fastcrypto::hash::{Blake2b256, HashFunction};

/// Size of every node in the tree
pub const NODE_SIZE: usize = 32;

/// A single tree node (leaf or internal)
pub type Node = [u8; NODE_SIZE];

const LEAF_PREFIX: [u8; 1] = [0];
const INNER_PREFIX: [u8; 1] = [1];

/// Hash two children into their parent node
///
/// # Example
///
/// ```rust
/// use merkle_commitment::hash::hash_node;
///
/// let parent = hash_node(&[0x01u8; 32], &[0x02u8; 32]);
/// assert_ne!(parent, hash_node(&[0x02u8; 32], &[0x01u8; 32]));
/// ```
pub fn hash_node(left: &Node, right: &Node) -> Node {
    let mut hasher = Blake2b256::default();
    hasher.update(&INNER_PREFIX);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().digest
}

/// Deterministic filler used to pad the leaf list up to a power of two
pub fn padding_leaf() -> Node {
    let mut hasher = Blake2b256::default();
    hasher.update(&LEAF_PREFIX);
    hasher.finalize().digest
}

/// Smallest power of two that can hold `n` leaves (never less than 2)
///
/// ```rust
/// use merkle_commitment::hash::next_power_of_two;
///
/// assert_eq!(next_power_of_two(1), 2);
/// assert_eq!(next_power_of_two(6), 8);
/// assert_eq!(next_power_of_two(16), 16);
/// ```
pub fn next_power_of_two(n: usize) -> usize {
    n.max(2).next_power_of_two()
}
