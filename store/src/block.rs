//! Block storage trait.

use crate::StoreError;
use ballot_types::BlockNumber;

/// Append-only storage of encoded ledger blocks, keyed by block number.
pub trait BlockStore: Send + Sync {
    /// Store a block. Fails with [`StoreError::DuplicateBlock`] if `number` is taken.
    fn put_block(&self, number: BlockNumber, block_bytes: &[u8]) -> Result<(), StoreError>;

    /// Retrieve a block by number.
    fn get_block(&self, number: BlockNumber) -> Result<Vec<u8>, StoreError>;

    /// All blocks with `from <= number <= to`, ascending.
    fn blocks_in_range(
        &self,
        from: BlockNumber,
        to: BlockNumber,
    ) -> Result<Vec<(BlockNumber, Vec<u8>)>, StoreError>;

    /// Highest stored block number, `None` for an empty store.
    fn latest_block(&self) -> Result<Option<BlockNumber>, StoreError>;

    /// Total number of blocks in the store.
    fn block_count(&self) -> Result<u64, StoreError>;

    /// Every stored block, ascending.
    fn all_blocks(&self) -> Result<Vec<(BlockNumber, Vec<u8>)>, StoreError> {
        self.blocks_in_range(BlockNumber::GENESIS, BlockNumber::new(u64::MAX))
    }
}
