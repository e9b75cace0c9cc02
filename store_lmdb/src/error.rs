use ballot_types::BlockNumber;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(String),

    #[error("block {0} not found")]
    BlockNotFound(BlockNumber),

    #[error("corrupted entry: {0}")]
    Corruption(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<heed::Error> for LmdbError {
    fn from(e: heed::Error) -> Self {
        LmdbError::Heed(e.to_string())
    }
}

impl From<LmdbError> for ballot_store::StoreError {
    fn from(e: LmdbError) -> Self {
        match e {
            LmdbError::BlockNotFound(number) => ballot_store::StoreError::BlockNotFound(number),
            LmdbError::Corruption(msg) => ballot_store::StoreError::Corruption(msg),
            other => ballot_store::StoreError::Backend(other.to_string()),
        }
    }
}
