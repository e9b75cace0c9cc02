use ballot_types::BlockNumber;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("block {0} not found")]
    BlockNotFound(BlockNumber),

    #[error("block {0} is already stored")]
    DuplicateBlock(BlockNumber),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("store is corrupted: {0}")]
    Corruption(String),
}
