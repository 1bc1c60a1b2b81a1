//! Padded binary Merkle commitment over fixed-size leaves
//!
//! Builds a Blake2b-256 hash tree over an ordered list of 32-byte leaves,
//! padding to the next power of two, and exposes the root, the depth and
//! every level of the tree.
//!
//! # Quick Start
//!
//! ```rust
//! use merkle_commitment::MerkleCommitment;
//!
//! let leaves = vec![[0x11u8; 32], [0x22u8; 32], [0x33u8; 32]];
//! let commitment = MerkleCommitment::build(leaves).unwrap();
//!
//! // Padded to 4 leaves, depth 2
//! assert_eq!(commitment.level(commitment.levels()).unwrap().len(), 4);
//!
//! // Prove leaf 1 belongs to the tree
//! let proof = commitment.generate_proof(1).unwrap();
//! assert!(proof.verify(&[0x22u8; 32], &commitment.root()));
//! ```

pub mod error;
pub mod hash;
pub mod proof;
pub mod tree;

// Re-export commonly used types
pub use error::{MerkleError, Result};
pub use hash::{hash_node, next_power_of_two, padding_leaf, Node, NODE_SIZE};
pub use proof::MerkleProof;
pub use tree::MerkleCommitment;
