/// Error type definitions
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MerkleError {
    #[error("Cannot build commitment from an empty leaf list")]
    EmptyLeaves,

    #[error("Level {level} out of range (tree depth: {depth})")]
    LevelOutOfRange { level: usize, depth: usize },

    #[error("Invalid leaf index: {index} (total leaves: {total})")]
    InvalidLeafIndex { index: usize, total: usize },
}

pub type Result<T> = std::result::Result<T, MerkleError>;
