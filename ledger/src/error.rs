use ballot_types::{Address, BlockNumber};
use ballot_voting::{ParamsError, VotingError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Rejected(#[from] VotingError),

    #[error("storage error: {0}")]
    Storage(#[from] ballot_store::StoreError),

    #[error("block codec error: {0}")]
    Codec(String),

    #[error("corrupted block {block}: {reason}")]
    Corrupted { block: BlockNumber, reason: String },

    #[error("invalid voting parameters: {0}")]
    InvalidParams(#[from] ParamsError),

    #[error("store belongs to administrator {stored}, not {configured}")]
    AdministratorMismatch { stored: Address, configured: Address },

    #[error("replay failed at block {block}: {source}")]
    Replay {
        block: BlockNumber,
        source: VotingError,
    },
}

impl LedgerError {
    /// The domain error, if the command itself was refused.
    pub fn rejection(&self) -> Option<&VotingError> {
        match self {
            LedgerError::Rejected(e) => Some(e),
            _ => None,
        }
    }
}

impl From<bincode::Error> for LedgerError {
    fn from(e: bincode::Error) -> Self {
        LedgerError::Codec(e.to_string())
    }
}
