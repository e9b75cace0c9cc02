//! Thread-safe in-memory block store for tests and ephemeral daemons.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use ballot_types::BlockNumber;

use crate::{BlockStore, StoreError};

#[derive(Debug, Default)]
pub struct MemoryBlockStore {
    blocks: Mutex<BTreeMap<BlockNumber, Vec<u8>>>,
}

impl MemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn blocks(&self) -> MutexGuard<'_, BTreeMap<BlockNumber, Vec<u8>>> {
        self.blocks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BlockStore for MemoryBlockStore {
    fn put_block(&self, number: BlockNumber, block_bytes: &[u8]) -> Result<(), StoreError> {
        let mut blocks = self.blocks();
        if blocks.contains_key(&number) {
            return Err(StoreError::DuplicateBlock(number));
        }
        blocks.insert(number, block_bytes.to_vec());
        Ok(())
    }

    fn get_block(&self, number: BlockNumber) -> Result<Vec<u8>, StoreError> {
        self.blocks()
            .get(&number)
            .cloned()
            .ok_or_else(|| StoreError::BlockNotFound(number))
    }

    fn blocks_in_range(
        &self,
        from: BlockNumber,
        to: BlockNumber,
    ) -> Result<Vec<(BlockNumber, Vec<u8>)>, StoreError> {
        if from > to {
            return Ok(Vec::new());
        }
        Ok(self
            .blocks()
            .range(from..=to)
            .map(|(n, bytes)| (*n, bytes.clone()))
            .collect())
    }

    fn latest_block(&self) -> Result<Option<BlockNumber>, StoreError> {
        Ok(self.blocks().keys().next_back().copied())
    }

    fn block_count(&self) -> Result<u64, StoreError> {
        Ok(self.blocks().len() as u64)
    }
}
